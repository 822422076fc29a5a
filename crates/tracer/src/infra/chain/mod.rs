//! Port for chain facts needed by the tracer, with a live paged-REST
//! implementation and an in-memory one for tests and offline use.

use {
    crate::domain::eth::{Address, B256, U256},
    async_trait::async_trait,
    futures::stream::BoxStream,
    std::ops::RangeInclusive,
};

pub mod etherscan;
pub mod fake;

pub use {etherscan::Etherscan, fake::FakeChainData};

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("data source failed: {0:#}")]
    DataSource(anyhow::Error),
}

impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self::DataSource(err)
    }
}

impl From<rate_limit::Error> for Error {
    fn from(err: rate_limit::Error) -> Self {
        Self::DataSource(anyhow::Error::new(err))
    }
}

/// Sort order for transfer iteration.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Sort {
    Ascending,
    Descending,
}

impl Sort {
    fn as_str(&self) -> &'static str {
        match self {
            Self::Ascending => "asc",
            Self::Descending => "desc",
        }
    }
}

/// Which side of a timestamp a block lookup resolves to.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Closest {
    Before,
    After,
}

impl Closest {
    fn as_str(&self) -> &'static str {
        match self {
            Self::Before => "before",
            Self::After => "after",
        }
    }
}

/// A value-bearing top-level transaction in the native currency.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct NativeTransfer {
    pub tx_hash: B256,
    pub block_number: u64,
    pub timestamp: i64,
    pub from: Address,
    pub to: Address,
    /// Native value in wei.
    pub value: U256,
}

/// A fungible-token transfer event.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TokenTransfer {
    pub tx_hash: B256,
    pub block_number: u64,
    pub timestamp: i64,
    pub from: Address,
    pub to: Address,
    pub token_address: Address,
    /// Raw units before decimal scaling.
    pub value: U256,
    pub symbol: Option<String>,
    pub decimals: Option<u32>,
}

/// Best-effort token metadata, collected as a side effect of token-transfer
/// iteration.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct TokenMeta {
    pub token_address: Address,
    pub symbol: Option<String>,
    pub decimals: Option<u32>,
    pub name: Option<String>,
}

/// Chain facts needed to build a value-flow graph. Transfer iteration is
/// lazy: implementations drive pagination internally and yield one row at a
/// time, so the engine controls backpressure by simply not pulling.
#[async_trait]
pub trait ChainDataFetching: Send + Sync {
    async fn block_at_time(&self, timestamp: i64, closest: Closest) -> Result<u64>;

    fn native_transfers(
        &self,
        address: Address,
        blocks: RangeInclusive<u64>,
        sort: Sort,
    ) -> BoxStream<'_, Result<NativeTransfer>>;

    fn token_transfers(
        &self,
        address: Address,
        blocks: RangeInclusive<u64>,
        sort: Sort,
        token_address: Option<Address>,
    ) -> BoxStream<'_, Result<TokenTransfer>>;

    async fn is_contract(&self, address: Address) -> Result<bool>;

    async fn token_meta(&self, token_address: Address) -> TokenMeta;
}
