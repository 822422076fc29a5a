//! USD pricing for the native asset and for tokens.
//!
//! Token resolution order: fixed overrides, then the stablecoin set, then
//! the process-local cache, then a liquidity-pool lookup. A token that
//! cannot be priced is reported as unknown; a trace never aborts because of
//! an unpriceable token.

use {
    crate::{
        domain::eth::{self, Address},
        infra::market::{Pair, PairFetching},
    },
    alloy_primitives::address,
    async_trait::async_trait,
    bigdecimal::BigDecimal,
    std::{
        collections::{HashMap, HashSet},
        sync::{Arc, Mutex},
    },
};

#[async_trait]
pub trait PriceEstimating: Send + Sync {
    async fn native_usd(&self, timestamp: i64) -> BigDecimal;

    async fn token_usd(&self, token_address: Address, timestamp: i64) -> Option<BigDecimal>;
}

#[derive(Clone, Debug)]
pub struct Config {
    /// Anchor price for the native asset; historical native pricing is out
    /// of scope.
    pub native_usd: BigDecimal,
    pub fixed_token_usd: HashMap<Address, BigDecimal>,
    /// Tokens priced at exactly 1 USD.
    pub stablecoins: HashSet<Address>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            native_usd: BigDecimal::from(3000),
            fixed_token_usd: HashMap::new(),
            stablecoins: HashSet::from([
                // USDC
                address!("a0b86991c6218b36c1d19d4a2e9eb0ce3606eb48"),
                // USDT
                address!("dac17f958d2ee523a2206206994597c13d831ec7"),
                // DAI
                address!("6b175474e89094c44da98b954eedeac495271d0f"),
            ]),
        }
    }
}

pub struct Resolver {
    config: Config,
    market: Option<Arc<dyn PairFetching>>,
    cache: Mutex<HashMap<Address, BigDecimal>>,
}

impl Resolver {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            market: None,
            cache: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_market(mut self, market: Arc<dyn PairFetching>) -> Self {
        self.market = Some(market);
        self
    }
}

#[async_trait]
impl PriceEstimating for Resolver {
    async fn native_usd(&self, _timestamp: i64) -> BigDecimal {
        self.config.native_usd.clone()
    }

    async fn token_usd(&self, token_address: Address, _timestamp: i64) -> Option<BigDecimal> {
        if let Some(price) = self.config.fixed_token_usd.get(&token_address) {
            return Some(price.clone());
        }
        if self.config.stablecoins.contains(&token_address) {
            return Some(BigDecimal::from(1));
        }
        if let Some(price) = self.cache.lock().unwrap().get(&token_address) {
            return Some(price.clone());
        }
        let market = self.market.as_ref()?;
        let pairs = match market.pairs(token_address).await {
            Ok(pairs) => pairs,
            Err(error) => {
                tracing::debug!(
                    token = %eth::lowercase(&token_address),
                    %error,
                    "pair lookup failed, price unknown"
                );
                return None;
            }
        };
        let price = deepest_pair(&pairs)?.price_usd.clone()?;
        self.cache
            .lock()
            .unwrap()
            .insert(token_address, price.clone());
        Some(price)
    }
}

/// The pair with the highest USD liquidity; absent liquidity counts as zero
/// and ties go to the last pair seen.
fn deepest_pair(pairs: &[Pair]) -> Option<&Pair> {
    let zero = BigDecimal::from(0);
    pairs.iter().max_by(|a, b| {
        let a = a.liquidity_usd.as_ref().unwrap_or(&zero);
        let b = b.liquidity_usd.as_ref().unwrap_or(&zero);
        a.cmp(b)
    })
}
