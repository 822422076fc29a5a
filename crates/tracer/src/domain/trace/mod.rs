//! The tracing engine: a bounded breadth-first expansion over counterparties
//! with an ordered edge pipeline applied to every visited address.

use {
    super::{
        eth::{self, Address, AssetKind, NATIVE_DECIMALS, NATIVE_SYMBOL},
        graph::{Edge, EdgeKey, Graph},
    },
    crate::infra::{
        chain::{self, ChainDataFetching, Closest, Sort},
        pricing::PriceEstimating,
    },
    bigdecimal::BigDecimal,
    futures::TryStreamExt,
    std::{
        collections::{BTreeSet, HashSet, VecDeque},
        ops::RangeInclusive,
        sync::Arc,
    },
    tokio_util::sync::CancellationToken,
};

pub mod progress;

pub use progress::{Event, LogSink, Phase, ProgressSink};

/// Immutable per-run configuration.
#[derive(Clone, Debug)]
pub struct TraceConfig {
    pub seed: Address,
    /// Lookback window in days.
    pub days: u32,
    /// BFS depth; 0 fetches only edges incident to the seed.
    pub hops: u32,
    /// Edges with a known USD value below this are dropped; 0 disables the
    /// filter. Edges with an unknown value are always kept.
    pub min_usd: BigDecimal,
    /// Pinned "now" in unix seconds; unset or non-positive means wall clock.
    pub now_ts: Option<i64>,
    /// 0 = unlimited.
    pub max_edges_per_address: usize,
    /// 0 = unlimited.
    pub max_total_edges: usize,
    /// Drop token edges whose USD value is unknown.
    pub ignore_unknown_price: bool,
    /// Tag every node `is_contract = false` without probing the chain.
    pub skip_contract_check: bool,
}

impl TraceConfig {
    pub fn new(seed: Address) -> Self {
        Self {
            seed,
            days: 30,
            hops: 2,
            min_usd: BigDecimal::from(0),
            now_ts: None,
            max_edges_per_address: 0,
            max_total_edges: 0,
            ignore_unknown_price: false,
            skip_contract_check: false,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    DataSource(#[from] chain::Error),
    #[error("trace cancelled")]
    Cancelled,
    #[error("tracer failed: {0:#}")]
    Internal(anyhow::Error),
}

/// Builds a value-flow graph rooted at a seed address. All collaborators are
/// reached through ports, so live and in-memory sources substitute freely.
pub struct Tracer {
    chain: Arc<dyn ChainDataFetching>,
    prices: Arc<dyn PriceEstimating>,
    progress: Option<Arc<dyn ProgressSink>>,
    cancellation: Option<CancellationToken>,
}

/// Counters for the contract tagging policy.
#[derive(Debug, Default)]
struct Tagging {
    checked: u64,
    errors: u64,
}

impl Tracer {
    pub fn new(chain: Arc<dyn ChainDataFetching>, prices: Arc<dyn PriceEstimating>) -> Self {
        Self {
            chain,
            prices,
            progress: None,
            cancellation: None,
        }
    }

    pub fn with_progress(mut self, sink: Arc<dyn ProgressSink>) -> Self {
        self.progress = Some(sink);
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    /// Runs the trace to completion and returns the populated graph. The
    /// graph is never returned partially populated: a chain failure aborts
    /// the whole run.
    pub async fn trace(&self, config: &TraceConfig) -> Result<Graph, Error> {
        let now_ts = match config.now_ts {
            Some(ts) if ts > 0 => ts,
            _ => chrono::Utc::now().timestamp(),
        };
        let start_ts = now_ts - i64::from(config.days) * 86_400;

        self.emit(Event::Start {
            seed: config.seed,
            days: config.days,
            hops: config.hops,
            min_usd: config.min_usd.clone(),
            start_ts,
            now_ts,
        });

        let start_block = self
            .chain
            .block_at_time(start_ts, Closest::After)
            .await
            .map_err(|error| self.data_source_failed(error))?;
        let end_block = self
            .chain
            .block_at_time(now_ts, Closest::Before)
            .await
            .map_err(|error| self.data_source_failed(error))?;
        let blocks = start_block..=end_block;

        let mut graph = Graph::default();
        let mut queue = VecDeque::from([(config.seed, 0_u32)]);
        let mut visited: HashSet<(Address, u32)> = HashSet::new();
        let mut seen_keys: HashSet<EdgeKey> = HashSet::new();
        let mut tagging = Tagging::default();
        let mut processed = 0_u64;

        while let Some((address, depth)) = queue.pop_front() {
            if let Some(token) = &self.cancellation {
                if token.is_cancelled() {
                    return Err(Error::Cancelled);
                }
            }
            if depth > config.hops || !visited.insert((address, depth)) {
                continue;
            }

            self.ensure_node(&mut graph, address, config, &mut tagging)
                .await;

            let mut batch = Vec::new();
            self.native_edges(address, depth, blocks.clone(), &mut batch)
                .await?;
            self.token_edges(address, depth, blocks.clone(), config, &mut batch)
                .await?;

            apply_min_usd(&mut batch, &config.min_usd);
            dedupe(&mut batch);
            rank(&mut batch);
            if config.max_edges_per_address > 0 {
                batch.truncate(config.max_edges_per_address);
            }
            if config.max_total_edges > 0 {
                let remaining = config.max_total_edges.saturating_sub(graph.edges().len());
                if remaining == 0 {
                    break;
                }
                batch.truncate(remaining);
            }

            let mut accepted = Vec::new();
            for edge in batch {
                // The same transfer is discoverable from both endpoints, so
                // multi-hop expansion needs a run-wide dedupe on top of the
                // per-batch one.
                if !seen_keys.insert(edge.key()) {
                    continue;
                }
                let (from, to) = (edge.from, edge.to);
                graph.append_edge(edge.clone());
                self.ensure_node(&mut graph, from, config, &mut tagging).await;
                self.ensure_node(&mut graph, to, config, &mut tagging).await;
                accepted.push(edge);
            }

            if depth < config.hops {
                let neighbors: BTreeSet<Address> = accepted
                    .iter()
                    .flat_map(|edge| [edge.from, edge.to])
                    .filter(|neighbor| *neighbor != address)
                    .collect();
                for neighbor in neighbors {
                    queue.push_back((neighbor, depth + 1));
                }
            }

            processed += 1;
            self.emit(Event::Visit {
                address,
                depth,
                queue_len: queue.len(),
                processed,
                edges_so_far: graph.edges().len(),
            });

            if config.max_total_edges > 0 && graph.edges().len() >= config.max_total_edges {
                break;
            }
        }

        self.emit(Event::Done {
            processed,
            nodes: graph.node_count(),
            edges: graph.edges().len(),
            contract_checked: tagging.checked,
            contract_errors: tagging.errors,
        });
        Ok(graph)
    }

    async fn native_edges(
        &self,
        address: Address,
        depth: u32,
        blocks: RangeInclusive<u64>,
        batch: &mut Vec<Edge>,
    ) -> Result<(), Error> {
        self.emit(Event::Fetch {
            phase: Phase::Native,
            address,
            depth,
        });
        let mut count = 0;
        let mut transfers = self.chain.native_transfers(address, blocks, Sort::Ascending);
        while let Some(transfer) = transfers
            .try_next()
            .await
            .map_err(|error| self.data_source_failed(error))?
        {
            if transfer.value.is_zero() {
                continue;
            }
            let amount = number::u256_to_big_decimal_scaled(&transfer.value, NATIVE_DECIMALS);
            let usd_value = &amount * self.prices.native_usd(transfer.timestamp).await;
            batch.push(Edge {
                from: transfer.from,
                to: transfer.to,
                tx_hash: transfer.tx_hash,
                timestamp: transfer.timestamp,
                asset: AssetKind::Native,
                token_address: None,
                symbol: Some(NATIVE_SYMBOL.to_string()),
                amount,
                usd_value: Some(usd_value),
            });
            count += 1;
        }
        drop(transfers);
        self.emit(Event::FetchDone {
            phase: Phase::Native,
            address,
            count,
        });
        Ok(())
    }

    async fn token_edges(
        &self,
        address: Address,
        depth: u32,
        blocks: RangeInclusive<u64>,
        config: &TraceConfig,
        batch: &mut Vec<Edge>,
    ) -> Result<(), Error> {
        self.emit(Event::Fetch {
            phase: Phase::Token,
            address,
            depth,
        });
        let mut count = 0;
        let mut transfers = self
            .chain
            .token_transfers(address, blocks, Sort::Ascending, None);
        while let Some(transfer) = transfers
            .try_next()
            .await
            .map_err(|error| self.data_source_failed(error))?
        {
            let amount = match transfer.decimals {
                Some(decimals) => number::u256_to_big_decimal_scaled(&transfer.value, decimals),
                None => number::u256_to_big_decimal(&transfer.value),
            };
            let price = self
                .prices
                .token_usd(transfer.token_address, transfer.timestamp)
                .await;
            if price.is_none() && config.ignore_unknown_price {
                continue;
            }
            let usd_value = price.map(|price| &amount * price);
            batch.push(Edge {
                from: transfer.from,
                to: transfer.to,
                tx_hash: transfer.tx_hash,
                timestamp: transfer.timestamp,
                asset: AssetKind::Token,
                token_address: Some(transfer.token_address),
                symbol: transfer.symbol,
                amount,
                usd_value,
            });
            count += 1;
        }
        drop(transfers);
        self.emit(Event::FetchDone {
            phase: Phase::Token,
            address,
            count,
        });
        Ok(())
    }

    /// Ensures the node exists, deciding its contract tag on first
    /// observation per the tagging policy.
    async fn ensure_node(
        &self,
        graph: &mut Graph,
        address: Address,
        config: &TraceConfig,
        tagging: &mut Tagging,
    ) {
        if graph.contains_node(&address) {
            return;
        }
        let is_contract = if config.skip_contract_check {
            false
        } else {
            tagging.checked += 1;
            let is_contract = match self.chain.is_contract(address).await {
                Ok(is_contract) => is_contract,
                Err(error) => {
                    tagging.errors += 1;
                    tracing::debug!(
                        address = %eth::lowercase(&address),
                        %error,
                        "contract check failed"
                    );
                    false
                }
            };
            if tagging.checked % 25 == 0 {
                self.emit(Event::ContractProgress {
                    checked: tagging.checked,
                    errors: tagging.errors,
                });
            }
            is_contract
        };
        graph.ensure_node(address, is_contract);
    }

    fn data_source_failed(&self, error: chain::Error) -> Error {
        self.emit(Event::Error {
            message: error.to_string(),
        });
        Error::DataSource(error)
    }

    fn emit(&self, event: Event) {
        let Some(sink) = &self.progress else { return };
        if let Err(error) = sink.on_event(&event) {
            tracing::debug!(%error, "progress sink failed");
        }
    }
}

/// Drops edges whose USD value is known and below the threshold. Unknown
/// values are kept so suspicious unpriceable tokens stay visible.
fn apply_min_usd(batch: &mut Vec<Edge>, min_usd: &BigDecimal) {
    if *min_usd <= BigDecimal::from(0) {
        return;
    }
    batch.retain(|edge| match &edge.usd_value {
        Some(usd_value) => usd_value >= min_usd,
        None => true,
    });
}

/// Per-batch dedupe by edge key; the first occurrence wins.
fn dedupe(batch: &mut Vec<Edge>) {
    let mut seen = HashSet::new();
    batch.retain(|edge| seen.insert(edge.key()));
}

/// Stable sort by USD value descending; unknown values rank as -1 so they
/// sort last while preserving their relative order.
fn rank(batch: &mut [Edge]) {
    let unknown = BigDecimal::from(-1);
    batch.sort_by(|a, b| {
        let a = a.usd_value.as_ref().unwrap_or(&unknown);
        let b = b.usd_value.as_ref().unwrap_or(&unknown);
        b.cmp(a)
    });
}
