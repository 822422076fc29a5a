//! Token risk heuristics derived from liquidity-pool market data. Risk never
//! drives traversal; it only annotates reports.

use {
    crate::{
        domain::eth::Address,
        infra::market::{Pair, PairFetching},
    },
    async_trait::async_trait,
    bigdecimal::BigDecimal,
    std::sync::Arc,
};

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RiskFlag {
    LiquidityThin,
    SingleDexPairOnly,
    PairCreatedRecently,
}

impl RiskFlag {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::LiquidityThin => "liquidity_thin",
            Self::SingleDexPairOnly => "single_dex_pair_only",
            Self::PairCreatedRecently => "pair_created_recently",
        }
    }

    fn weight(&self) -> u32 {
        match self {
            Self::LiquidityThin => 15,
            Self::SingleDexPairOnly => 10,
            Self::PairCreatedRecently => 10,
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RiskLabel {
    Unknown,
    LowRisk,
    MediumRisk,
    HighRisk,
    ScamConfirmed,
}

impl RiskLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unknown => "unknown",
            Self::LowRisk => "low_risk",
            Self::MediumRisk => "medium_risk",
            Self::HighRisk => "high_risk",
            Self::ScamConfirmed => "scam_confirmed",
        }
    }

    fn from_score(score: u32) -> Self {
        match score {
            80.. => Self::ScamConfirmed,
            50.. => Self::HighRisk,
            25.. => Self::MediumRisk,
            1.. => Self::LowRisk,
            0 => Self::Unknown,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct TokenRisk {
    pub token_address: Address,
    pub label: RiskLabel,
    pub score: u32,
    pub flags: Vec<RiskFlag>,
    pub pair_count: usize,
    pub total_liquidity_usd: BigDecimal,
    pub newest_pair_age_hours: Option<i64>,
    /// Set when the market-data lookup failed and the token could not be
    /// assessed.
    pub note: Option<String>,
}

#[async_trait]
pub trait TokenRiskAssessing: Send + Sync {
    async fn assess(&self, token_address: Address, now_ts: i64) -> TokenRisk;
}

#[derive(Clone, Debug)]
pub struct Config {
    /// Tokens whose pooled liquidity totals below this are flagged thin.
    pub min_liquidity_usd: BigDecimal,
    /// Pools younger than this many hours are flagged as recent.
    pub new_pair_hours: i64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            min_liquidity_usd: BigDecimal::from(10_000),
            new_pair_hours: 72,
        }
    }
}

pub struct MarketRisk {
    config: Config,
    market: Arc<dyn PairFetching>,
}

impl MarketRisk {
    pub fn new(config: Config, market: Arc<dyn PairFetching>) -> Self {
        Self { config, market }
    }

    fn analyze(&self, token_address: Address, pairs: &[Pair], now_ts: i64) -> TokenRisk {
        let zero = BigDecimal::from(0);
        let mut total_liquidity = zero.clone();
        let mut max_liquidity = zero.clone();
        let mut max_volume = zero.clone();
        let mut created: Vec<i64> = Vec::new();
        for pair in pairs {
            if let Some(liquidity) = &pair.liquidity_usd {
                total_liquidity = total_liquidity + liquidity;
                if *liquidity > max_liquidity {
                    max_liquidity = liquidity.clone();
                }
            }
            if let Some(volume) = &pair.volume_24h {
                if *volume > max_volume {
                    max_volume = volume.clone();
                }
            }
            if let Some(created_at) = pair.pair_created_at {
                created.push(created_at);
            }
        }
        let newest_age_hours = created
            .iter()
            .max()
            .map(|created_at| (now_ts - created_at).max(0) / 3600);

        let mut flags = Vec::new();
        if pairs.is_empty()
            || total_liquidity == zero
            || total_liquidity < self.config.min_liquidity_usd
            || (max_liquidity > zero && max_volume > &max_liquidity * BigDecimal::from(5))
        {
            flags.push(RiskFlag::LiquidityThin);
        }
        if pairs.len() == 1 {
            flags.push(RiskFlag::SingleDexPairOnly);
        }
        if newest_age_hours.is_some_and(|age| age <= self.config.new_pair_hours) {
            flags.push(RiskFlag::PairCreatedRecently);
        }

        let score = flags.iter().map(RiskFlag::weight).sum::<u32>().min(100);
        TokenRisk {
            token_address,
            label: RiskLabel::from_score(score),
            score,
            flags,
            pair_count: pairs.len(),
            total_liquidity_usd: total_liquidity,
            newest_pair_age_hours: newest_age_hours,
            note: None,
        }
    }
}

#[async_trait]
impl TokenRiskAssessing for MarketRisk {
    async fn assess(&self, token_address: Address, now_ts: i64) -> TokenRisk {
        match self.market.pairs(token_address).await {
            Ok(pairs) => self.analyze(token_address, &pairs, now_ts),
            Err(error) => TokenRisk {
                token_address,
                label: RiskLabel::Unknown,
                score: 0,
                flags: Vec::new(),
                pair_count: 0,
                total_liquidity_usd: BigDecimal::from(0),
                newest_pair_age_hours: None,
                note: Some(error.to_string()),
            },
        }
    }
}
