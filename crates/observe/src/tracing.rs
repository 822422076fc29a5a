use tracing_subscriber::EnvFilter;

/// Initializes the global tracing subscriber with the given default filter.
/// `RUST_LOG` overrides the default. Logs go to stderr so stdout stays free
/// for program output.
///
/// # Panics
///
/// Panics if a global subscriber was already installed.
pub fn initialize(default_filter: &str) {
    let filter = std::env::var("RUST_LOG").unwrap_or_else(|_| default_filter.to_string());
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_writer(std::io::stderr)
        .init();
}
