//! Progress events emitted while a trace runs. Emission is best-effort:
//! a failing sink is logged and never affects the traversal.

use {
    crate::domain::eth::{self, Address},
    bigdecimal::BigDecimal,
};

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Phase {
    Native,
    Token,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Native => "native",
            Self::Token => "token",
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    Start {
        seed: Address,
        days: u32,
        hops: u32,
        min_usd: BigDecimal,
        start_ts: i64,
        now_ts: i64,
    },
    Fetch {
        phase: Phase,
        address: Address,
        depth: u32,
    },
    FetchDone {
        phase: Phase,
        address: Address,
        count: usize,
    },
    ContractProgress {
        checked: u64,
        errors: u64,
    },
    Visit {
        address: Address,
        depth: u32,
        queue_len: usize,
        processed: u64,
        edges_so_far: usize,
    },
    Done {
        processed: u64,
        nodes: usize,
        edges: usize,
        contract_checked: u64,
        contract_errors: u64,
    },
    Error {
        message: String,
    },
}

/// Receives engine progress events. Implementations cannot abort the trace:
/// returned errors are logged at debug level and otherwise ignored.
pub trait ProgressSink: Send + Sync {
    fn on_event(&self, event: &Event) -> anyhow::Result<()>;
}

/// Forwards events to `tracing` logs.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogSink;

impl ProgressSink for LogSink {
    fn on_event(&self, event: &Event) -> anyhow::Result<()> {
        match event {
            Event::Start {
                seed,
                days,
                hops,
                min_usd,
                start_ts,
                now_ts,
            } => tracing::info!(
                seed = %eth::lowercase(seed),
                days,
                hops,
                %min_usd,
                start_ts,
                now_ts,
                "starting trace"
            ),
            Event::Fetch {
                phase,
                address,
                depth,
            } => tracing::debug!(
                phase = phase.as_str(),
                address = %eth::lowercase(address),
                depth,
                "fetching transfers"
            ),
            Event::FetchDone {
                phase,
                address,
                count,
            } => tracing::debug!(
                phase = phase.as_str(),
                address = %eth::lowercase(address),
                count,
                "fetched transfers"
            ),
            Event::ContractProgress { checked, errors } => {
                tracing::debug!(checked, errors, "contract checks")
            }
            Event::Visit {
                address,
                depth,
                queue_len,
                processed,
                edges_so_far,
            } => tracing::info!(
                address = %eth::lowercase(address),
                depth,
                queue_len,
                processed,
                edges_so_far,
                "visited address"
            ),
            Event::Done {
                processed,
                nodes,
                edges,
                contract_checked,
                contract_errors,
            } => tracing::info!(
                processed,
                nodes,
                edges,
                contract_checked,
                contract_errors,
                "trace finished"
            ),
            Event::Error { message } => tracing::warn!(%message, "trace error"),
        }
        Ok(())
    }
}
