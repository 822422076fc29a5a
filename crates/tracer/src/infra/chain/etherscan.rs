//! Etherscan-backed chain data source.
//!
//! All endpoints share one REST surface addressed by `module`/`action` query
//! parameters. Paged actions are iterated with a fixed page size until a
//! short or empty page; every call runs through the rate-limiting retry
//! envelope.

use {
    super::{
        ChainDataFetching, Closest, Error, NativeTransfer, Result, Sort, TokenMeta, TokenTransfer,
    },
    crate::domain::eth::{self, Address, B256, U256},
    anyhow::{Context, anyhow},
    async_stream::try_stream,
    async_trait::async_trait,
    futures::{TryStreamExt, stream::BoxStream},
    rate_limit::{Backoff, RateLimiter, RequestError},
    serde::Deserialize,
    serde_with::{DisplayFromStr, NoneAsEmptyString, serde_as},
    std::{collections::HashMap, ops::RangeInclusive, sync::Mutex, time::Duration},
    url::Url,
};

#[derive(Clone, Debug)]
pub struct Config {
    pub base_url: Url,
    pub api_key: String,
    pub chain_id: u64,
    pub requests_per_second: f64,
    pub timeout: Duration,
    pub max_attempts: u32,
    pub page_size: usize,
    pub backoff: Backoff,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: "https://api.etherscan.io/v2/api".parse().unwrap(),
            api_key: String::new(),
            chain_id: 1,
            requests_per_second: 4.,
            timeout: Duration::from_secs(15),
            max_attempts: 5,
            page_size: 1000,
            backoff: Backoff::default(),
        }
    }
}

pub struct Etherscan {
    config: Config,
    chain_id: String,
    http: reqwest::Client,
    rate_limiter: RateLimiter,
    is_contract_cache: Mutex<HashMap<Address, bool>>,
    token_meta_cache: Mutex<HashMap<Address, TokenMeta>>,
}

impl Etherscan {
    pub fn new(config: Config) -> Self {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .unwrap();
        let rate_limiter =
            RateLimiter::new(config.requests_per_second, config.max_attempts)
                .with_backoff(config.backoff);
        Self {
            chain_id: config.chain_id.to_string(),
            http,
            rate_limiter,
            config,
            is_contract_cache: Default::default(),
            token_meta_cache: Default::default(),
        }
    }

    async fn call(
        &self,
        params: &[(&'static str, String)],
    ) -> Result<serde_json::Value, rate_limit::Error> {
        self.rate_limiter
            .execute(|| {
                let request = self
                    .http
                    .get(self.config.base_url.clone())
                    .query(params)
                    .query(&[
                        ("apikey", self.config.api_key.as_str()),
                        ("chainid", self.chain_id.as_str()),
                    ]);
                async move {
                    let envelope: Envelope = request
                        .send()
                        .await
                        .context("request failed")?
                        .error_for_status()
                        .context("bad response status")?
                        .json()
                        .await
                        .context("invalid response body")?;
                    if envelope.status.as_deref() == Some("0") {
                        let message = envelope.message.unwrap_or_default();
                        if message.to_lowercase().contains("rate") {
                            return Err(RequestError::RateLimited(message));
                        }
                    }
                    Ok(envelope.result)
                }
            })
            .await
    }

    /// Iterates a paged list action. Pagination stops at the first page that
    /// comes back empty or shorter than the configured page size.
    fn pages<Row>(&self, params: Vec<(&'static str, String)>) -> BoxStream<'_, Result<Row>>
    where
        Row: serde::de::DeserializeOwned + Send + 'static,
    {
        Box::pin(try_stream! {
            let mut page = 1_u64;
            loop {
                let mut request = params.clone();
                request.push(("page", page.to_string()));
                request.push(("offset", self.config.page_size.to_string()));
                let result = self.call(&request).await.map_err(Error::from)?;
                let rows: Vec<Row> = if result.is_array() {
                    serde_json::from_value(result)
                        .context("invalid transfer rows")
                        .map_err(Error::from)?
                } else {
                    Vec::new()
                };
                let count = rows.len();
                for row in rows {
                    yield row;
                }
                if count < self.config.page_size {
                    break;
                }
                page += 1;
            }
        })
    }
}

#[async_trait]
impl ChainDataFetching for Etherscan {
    async fn block_at_time(&self, timestamp: i64, closest: Closest) -> Result<u64> {
        let result = self
            .call(&[
                ("module", "block".to_string()),
                ("action", "getblocknobytime".to_string()),
                ("timestamp", timestamp.to_string()),
                ("closest", closest.as_str().to_string()),
            ])
            .await?;
        result
            .as_str()
            .and_then(|block| block.parse().ok())
            .ok_or_else(|| Error::DataSource(anyhow!("invalid block number result: {result}")))
    }

    fn native_transfers(
        &self,
        address: Address,
        blocks: RangeInclusive<u64>,
        sort: Sort,
    ) -> BoxStream<'_, Result<NativeTransfer>> {
        let mut rows = self.pages::<NativeRow>(vec![
            ("module", "account".to_string()),
            ("action", "txlist".to_string()),
            ("address", eth::lowercase(&address)),
            ("startblock", blocks.start().to_string()),
            ("endblock", blocks.end().to_string()),
            ("sort", sort.as_str().to_string()),
        ]);
        Box::pin(try_stream! {
            while let Some(row) = rows.try_next().await? {
                // Contract creations have no counterparty.
                let Some(to) = row.to else { continue };
                yield NativeTransfer {
                    tx_hash: row.hash,
                    block_number: row.block_number,
                    timestamp: row.timestamp,
                    from: row.from,
                    to,
                    value: row.value,
                };
            }
        })
    }

    fn token_transfers(
        &self,
        address: Address,
        blocks: RangeInclusive<u64>,
        sort: Sort,
        token_address: Option<Address>,
    ) -> BoxStream<'_, Result<TokenTransfer>> {
        let mut params = vec![
            ("module", "account".to_string()),
            ("action", "tokentx".to_string()),
            ("address", eth::lowercase(&address)),
            ("startblock", blocks.start().to_string()),
            ("endblock", blocks.end().to_string()),
            ("sort", sort.as_str().to_string()),
        ];
        if let Some(token) = token_address {
            params.push(("contractaddress", eth::lowercase(&token)));
        }
        let mut rows = self.pages::<TokenRow>(params);
        Box::pin(try_stream! {
            while let Some(row) = rows.try_next().await? {
                {
                    let mut cache = self.token_meta_cache.lock().unwrap();
                    cache
                        .entry(row.contract_address)
                        .or_insert_with(|| TokenMeta {
                            token_address: row.contract_address,
                            symbol: row.token_symbol.clone(),
                            decimals: row.token_decimal,
                            name: None,
                        });
                }
                let Some(to) = row.to else { continue };
                yield TokenTransfer {
                    tx_hash: row.hash,
                    block_number: row.block_number,
                    timestamp: row.timestamp,
                    from: row.from,
                    to,
                    token_address: row.contract_address,
                    value: row.value,
                    symbol: row.token_symbol,
                    decimals: row.token_decimal,
                };
            }
        })
    }

    async fn is_contract(&self, address: Address) -> Result<bool> {
        if let Some(cached) = self.is_contract_cache.lock().unwrap().get(&address) {
            return Ok(*cached);
        }
        let result = self
            .call(&[
                ("module", "proxy".to_string()),
                ("action", "eth_getCode".to_string()),
                ("address", eth::lowercase(&address)),
                ("tag", "latest".to_string()),
            ])
            .await?;
        let code = result.as_str().unwrap_or("0x");
        let is_contract = !matches!(code, "0x" | "0x0");
        self.is_contract_cache
            .lock()
            .unwrap()
            .insert(address, is_contract);
        Ok(is_contract)
    }

    async fn token_meta(&self, token_address: Address) -> TokenMeta {
        self.token_meta_cache
            .lock()
            .unwrap()
            .get(&token_address)
            .cloned()
            .unwrap_or(TokenMeta {
                token_address,
                ..Default::default()
            })
    }
}

#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    result: serde_json::Value,
}

#[serde_as]
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NativeRow {
    hash: B256,
    #[serde_as(as = "DisplayFromStr")]
    block_number: u64,
    #[serde_as(as = "DisplayFromStr")]
    #[serde(rename = "timeStamp")]
    timestamp: i64,
    from: Address,
    #[serde_as(as = "NoneAsEmptyString")]
    #[serde(default)]
    to: Option<Address>,
    #[serde_as(as = "DisplayFromStr")]
    value: U256,
}

#[serde_as]
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TokenRow {
    hash: B256,
    #[serde_as(as = "DisplayFromStr")]
    block_number: u64,
    #[serde_as(as = "DisplayFromStr")]
    #[serde(rename = "timeStamp")]
    timestamp: i64,
    from: Address,
    #[serde_as(as = "NoneAsEmptyString")]
    #[serde(default)]
    to: Option<Address>,
    contract_address: Address,
    #[serde_as(as = "DisplayFromStr")]
    value: U256,
    #[serde_as(as = "NoneAsEmptyString")]
    #[serde(default)]
    token_symbol: Option<String>,
    #[serde_as(as = "NoneAsEmptyString")]
    #[serde(default)]
    token_decimal: Option<u32>,
}
