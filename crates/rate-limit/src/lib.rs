//! Pacing and retry primitives shared by all outbound provider clients.
//!
//! Providers used by the tracer allow single-digit requests per second, so
//! every client serializes its calls through a [`Pacer`] and wraps each
//! request in the [`RateLimiter`] retry envelope.

use {
    rand::Rng,
    std::{future::Future, time::Duration},
    tokio::{
        sync::Mutex,
        time::{Instant, sleep, sleep_until},
    },
};

/// Minimum-interval rate limiter. `wait` blocks until the next permitted
/// slot and advances the internal "last call" timestamp monotonically, so
/// concurrent callers are serialized.
#[derive(Debug)]
pub struct Pacer {
    min_interval: Duration,
    last_call: Mutex<Option<Instant>>,
}

impl Pacer {
    /// # Panics
    ///
    /// Panics unless `requests_per_second` is positive.
    pub fn new(requests_per_second: f64) -> Self {
        assert!(
            requests_per_second > 0.,
            "requests_per_second must be > 0"
        );
        Self {
            min_interval: Duration::from_secs_f64(1. / requests_per_second),
            last_call: Mutex::new(None),
        }
    }

    pub async fn wait(&self) {
        let mut last_call = self.last_call.lock().await;
        if let Some(last) = *last_call {
            let next = last + self.min_interval;
            if next > Instant::now() {
                sleep_until(next).await;
            }
        }
        *last_call = Some(Instant::now());
    }
}

/// Capped exponential backoff with decorrelated jitter.
#[derive(Clone, Copy, Debug)]
pub struct Backoff {
    pub base: Duration,
    pub cap: Duration,
}

impl Default for Backoff {
    fn default() -> Self {
        Self {
            base: Duration::from_millis(500),
            cap: Duration::from_secs(8),
        }
    }
}

impl Backoff {
    /// `min(cap, base * 2^attempt)` scaled by a uniform random factor in
    /// `[0.7, 1.3]`.
    pub fn delay(&self, attempt: u32) -> Duration {
        let exponential = self.base.as_secs_f64() * 2f64.powf(f64::from(attempt));
        let capped = exponential.min(self.cap.as_secs_f64());
        let jitter = rand::thread_rng().gen_range(0.7..=1.3);
        Duration::from_secs_f64(capped * jitter)
    }

    pub async fn sleep(&self, attempt: u32) {
        sleep(self.delay(attempt)).await;
    }
}

/// The outcome of a single request attempt, as reported by the caller's
/// closure. Both variants are retried; the distinction exists so throttling
/// responses can be logged and surfaced as such.
#[derive(Debug, thiserror::Error)]
pub enum RequestError {
    /// The provider explicitly signalled throttling.
    #[error("rate limited: {0}")]
    RateLimited(String),
    /// Transport, decoding or provider-protocol failure.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// All attempts were used up without a successful response.
#[derive(Debug, thiserror::Error)]
#[error("provider call failed after {attempts} attempts: {source}")]
pub struct Error {
    pub attempts: u32,
    #[source]
    pub source: RequestError,
}

/// Retry envelope around a single logical request: paces every attempt,
/// backs off after each failure and gives up after `max_attempts`, reporting
/// the last cause.
#[derive(Debug)]
pub struct RateLimiter {
    pacer: Pacer,
    backoff: Backoff,
    max_attempts: u32,
}

impl RateLimiter {
    /// # Panics
    ///
    /// Panics unless `max_attempts` is positive.
    pub fn new(requests_per_second: f64, max_attempts: u32) -> Self {
        assert!(max_attempts > 0, "max_attempts must be > 0");
        Self {
            pacer: Pacer::new(requests_per_second),
            backoff: Backoff::default(),
            max_attempts,
        }
    }

    pub fn with_backoff(mut self, backoff: Backoff) -> Self {
        self.backoff = backoff;
        self
    }

    pub async fn execute<T, F, Fut>(&self, mut request: F) -> Result<T, Error>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, RequestError>>,
    {
        let mut attempt = 0;
        loop {
            self.pacer.wait().await;
            let error = match request().await {
                Ok(value) => return Ok(value),
                Err(error) => error,
            };
            tracing::debug!(attempt, %error, "provider call failed");
            if attempt + 1 >= self.max_attempts {
                return Err(Error {
                    attempts: self.max_attempts,
                    source: error,
                });
            }
            self.backoff.sleep(attempt).await;
            attempt += 1;
        }
    }
}
