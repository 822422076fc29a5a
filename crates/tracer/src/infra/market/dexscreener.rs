//! DexScreener pair lookups.

use {
    super::{Pair, PairFetching, Result},
    crate::domain::eth::{self, Address},
    anyhow::Context,
    async_trait::async_trait,
    bigdecimal::BigDecimal,
    rate_limit::{Backoff, RateLimiter, RequestError},
    serde::Deserialize,
    std::{str::FromStr, time::Duration},
    url::Url,
};

#[derive(Clone, Debug)]
pub struct Config {
    pub base_url: Url,
    /// When set, pairs from other chains are discarded.
    pub chain_id: Option<String>,
    pub requests_per_second: f64,
    pub timeout: Duration,
    pub max_attempts: u32,
    pub backoff: Backoff,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: "https://api.dexscreener.com/latest/dex".parse().unwrap(),
            chain_id: Some("ethereum".to_string()),
            requests_per_second: 2.,
            timeout: Duration::from_secs(10),
            max_attempts: 3,
            backoff: Backoff::default(),
        }
    }
}

pub struct Dexscreener {
    config: Config,
    http: reqwest::Client,
    rate_limiter: RateLimiter,
}

impl Dexscreener {
    pub fn new(config: Config) -> Self {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .unwrap();
        let rate_limiter =
            RateLimiter::new(config.requests_per_second, config.max_attempts)
                .with_backoff(config.backoff);
        Self {
            config,
            http,
            rate_limiter,
        }
    }

    fn pair(&self, row: PairRow) -> Option<Pair> {
        if let Some(chain_id) = &self.config.chain_id {
            if row.chain_id != *chain_id {
                return None;
            }
        }
        Some(Pair {
            chain_id: row.chain_id,
            dex_id: row.dex_id,
            pair_address: row.pair_address,
            base_token: row.base_token.map(|token| token.address).unwrap_or_default(),
            quote_token: row.quote_token.map(|token| token.address).unwrap_or_default(),
            price_usd: row.price_usd.as_deref().and_then(|price| BigDecimal::from_str(price).ok()),
            liquidity_usd: row.liquidity.and_then(|liquidity| dec(&liquidity.usd)),
            volume_24h: row.volume.and_then(|volume| dec(&volume.h24)),
            fdv: dec(&row.fdv),
            market_cap: dec(&row.market_cap),
            pair_created_at: row.pair_created_at.map(created_at_seconds),
        })
    }
}

#[async_trait]
impl PairFetching for Dexscreener {
    async fn pairs(&self, token_address: Address) -> Result<Vec<Pair>> {
        let url = format!(
            "{}/tokens/{}",
            self.config.base_url.as_str().trim_end_matches('/'),
            eth::lowercase(&token_address),
        );
        let response = self
            .rate_limiter
            .execute(|| {
                let request = self.http.get(&url);
                async move {
                    let response: Response = request
                        .send()
                        .await
                        .context("request failed")?
                        .error_for_status()
                        .context("bad response status")?
                        .json()
                        .await
                        .context("invalid response body")?;
                    Ok::<_, RequestError>(response)
                }
            })
            .await
            .map_err(anyhow::Error::new)?;
        Ok(response
            .pairs
            .unwrap_or_default()
            .into_iter()
            .filter_map(|row| self.pair(row))
            .collect())
    }
}

/// Lenient decimal decoding: the provider mixes strings and numbers. The
/// JSON text converts to `BigDecimal` without a detour through `f64`.
fn dec(value: &serde_json::Value) -> Option<BigDecimal> {
    match value {
        serde_json::Value::String(text) => BigDecimal::from_str(text).ok(),
        serde_json::Value::Number(number) => BigDecimal::from_str(&number.to_string()).ok(),
        _ => None,
    }
}

/// The provider reports pool creation in milliseconds; anything implausibly
/// large for seconds is treated as such.
fn created_at_seconds(raw: i64) -> i64 {
    if raw > 10_000_000_000 { raw / 1000 } else { raw }
}

#[derive(Debug, Deserialize)]
struct Response {
    #[serde(default)]
    pairs: Option<Vec<PairRow>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PairRow {
    #[serde(default)]
    chain_id: String,
    #[serde(default)]
    dex_id: String,
    #[serde(default)]
    pair_address: String,
    #[serde(default)]
    base_token: Option<TokenRef>,
    #[serde(default)]
    quote_token: Option<TokenRef>,
    #[serde(default)]
    price_usd: Option<String>,
    #[serde(default)]
    liquidity: Option<Liquidity>,
    #[serde(default)]
    volume: Option<Volume>,
    #[serde(default)]
    fdv: serde_json::Value,
    #[serde(default)]
    market_cap: serde_json::Value,
    #[serde(default)]
    pair_created_at: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct TokenRef {
    #[serde(default)]
    address: String,
}

#[derive(Debug, Deserialize)]
struct Liquidity {
    #[serde(default)]
    usd: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct Volume {
    #[serde(default)]
    h24: serde_json::Value,
}
