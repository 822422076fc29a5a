use {
    crate::domain::eth::Address,
    bigdecimal::BigDecimal,
    std::{path::PathBuf, time::Duration},
    url::Url,
};

/// Builds a value-flow graph rooted at a seed address and writes it as JSON
/// plus a Markdown summary.
#[derive(Debug, clap::Parser)]
pub struct Arguments {
    /// Seed address to trace.
    #[clap(long, env)]
    pub seed: Address,

    /// Lookback window in days.
    #[clap(long, env, default_value = "30")]
    pub days: u32,

    /// Number of expansion hops; 0 only fetches edges incident to the seed.
    #[clap(long, env, default_value = "2")]
    pub hops: u32,

    /// Drop transfers below this USD value; 0 disables the filter.
    #[clap(long, env, default_value = "100")]
    pub min_usd: BigDecimal,

    /// Pin the upper end of the time window (unix seconds) instead of using
    /// the wall clock. Useful for reproducible runs.
    #[clap(long, env)]
    pub now_ts: Option<i64>,

    /// Limit on edges kept per visited address; 0 = unlimited.
    #[clap(long, env, default_value = "0")]
    pub max_edges_per_address: usize,

    /// Limit on total edges in the graph; 0 = unlimited.
    #[clap(long, env, default_value = "0")]
    pub max_total_edges: usize,

    /// Drop token transfers whose USD value cannot be resolved.
    #[clap(long, env)]
    pub ignore_unknown_price: bool,

    /// Tag every node as a non-contract without probing the chain.
    #[clap(long, env)]
    pub skip_contract_check: bool,

    /// Skip the token risk table in the summary.
    #[clap(long, env)]
    pub skip_token_risk: bool,

    /// Output directory for graph.json and summary.md.
    #[clap(long, env, default_value = "out")]
    pub out: PathBuf,

    #[clap(long, env)]
    pub etherscan_api_key: String,

    #[clap(long, env, default_value = "https://api.etherscan.io/v2/api")]
    pub etherscan_url: Url,

    #[clap(long, env, default_value = "1")]
    pub chain_id: u64,

    #[clap(long, env, default_value = "4.0")]
    pub etherscan_requests_per_second: f64,

    #[clap(long, env, default_value = "15s", value_parser = humantime::parse_duration)]
    pub etherscan_timeout: Duration,

    #[clap(long, env, default_value = "5")]
    pub etherscan_max_attempts: u32,

    #[clap(long, env, default_value = "1000")]
    pub etherscan_page_size: usize,

    #[clap(long, env, default_value = "https://api.dexscreener.com/latest/dex")]
    pub dexscreener_url: Url,

    /// DexScreener chain filter; pairs on other chains are ignored.
    #[clap(long, env, default_value = "ethereum")]
    pub dexscreener_chain_id: String,

    #[clap(long, env, default_value = "2.0")]
    pub dexscreener_requests_per_second: f64,

    #[clap(long, env, default_value = "10s", value_parser = humantime::parse_duration)]
    pub dexscreener_timeout: Duration,

    #[clap(long, env, default_value = "3")]
    pub dexscreener_max_attempts: u32,

    /// USD price used for the native asset.
    #[clap(long, env, default_value = "3000")]
    pub native_usd: BigDecimal,

    /// Token addresses priced at exactly 1 USD. Defaults to the mainnet
    /// USDC/USDT/DAI set when empty.
    #[clap(long, env, use_value_delimiter = true)]
    pub stablecoins: Vec<Address>,

    /// Fixed token price overrides as `address=price` pairs.
    #[clap(long, env, use_value_delimiter = true, value_parser = parse_fixed_price)]
    pub fixed_token_usd: Vec<(Address, BigDecimal)>,

    /// Tokens whose pooled liquidity totals below this are flagged thin.
    #[clap(long, env, default_value = "10000")]
    pub min_liquidity_usd: BigDecimal,

    /// Pools younger than this many hours are flagged as recent.
    #[clap(long, env, default_value = "72")]
    pub new_pair_hours: i64,
}

fn parse_fixed_price(value: &str) -> Result<(Address, BigDecimal), String> {
    let (address, price) = value
        .split_once('=')
        .ok_or_else(|| format!("expected `address=price`, got `{value}`"))?;
    let address = address
        .trim()
        .parse()
        .map_err(|err| format!("invalid address in `{value}`: {err}"))?;
    let price = price
        .trim()
        .parse()
        .map_err(|err| format!("invalid price in `{value}`: {err}"))?;
    Ok((address, price))
}
