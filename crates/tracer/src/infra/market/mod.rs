//! Liquidity-pool market data, used as the pricing fallback and for token
//! risk heuristics.

use {crate::domain::eth::Address, async_trait::async_trait, bigdecimal::BigDecimal};

pub mod dexscreener;

pub use dexscreener::Dexscreener;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
#[error("market data source failed: {0:#}")]
pub struct Error(pub anyhow::Error);

impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self(err)
    }
}

/// A liquidity pool quoted by the market-data provider. Fields the provider
/// leaves out are absent rather than zeroed so consumers can tell "no data"
/// from "zero".
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Pair {
    pub chain_id: String,
    pub dex_id: String,
    pub pair_address: String,
    pub base_token: String,
    pub quote_token: String,
    pub price_usd: Option<BigDecimal>,
    pub liquidity_usd: Option<BigDecimal>,
    pub volume_24h: Option<BigDecimal>,
    pub fdv: Option<BigDecimal>,
    pub market_cap: Option<BigDecimal>,
    /// Pool creation time in unix seconds.
    pub pair_created_at: Option<i64>,
}

/// Looks up the liquidity pools a token trades in.
#[async_trait]
pub trait PairFetching: Send + Sync {
    async fn pairs(&self, token_address: Address) -> Result<Vec<Pair>>;
}
