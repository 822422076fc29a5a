//! Failure propagation and cancellation.

use {
    crate::{
        domain::{
            eth::Address,
            trace::{Error, Event},
        },
        infra::chain::{
            self, ChainDataFetching, Closest, NativeTransfer, Sort, TokenMeta, TokenTransfer,
        },
        tests::setup::{self, FakePrices, RecordingSink},
    },
    async_trait::async_trait,
    futures::{StreamExt, stream, stream::BoxStream},
    std::{ops::RangeInclusive, sync::Arc},
    tokio_util::sync::CancellationToken,
};

/// Chain source whose block lookups fail.
struct NoBlocks;

#[async_trait]
impl ChainDataFetching for NoBlocks {
    async fn block_at_time(&self, _timestamp: i64, _closest: Closest) -> chain::Result<u64> {
        Err(chain::Error::DataSource(anyhow::anyhow!("provider down")))
    }

    fn native_transfers(
        &self,
        _address: Address,
        _blocks: RangeInclusive<u64>,
        _sort: Sort,
    ) -> BoxStream<'_, chain::Result<NativeTransfer>> {
        stream::empty().boxed()
    }

    fn token_transfers(
        &self,
        _address: Address,
        _blocks: RangeInclusive<u64>,
        _sort: Sort,
        _token_address: Option<Address>,
    ) -> BoxStream<'_, chain::Result<TokenTransfer>> {
        stream::empty().boxed()
    }

    async fn is_contract(&self, _address: Address) -> chain::Result<bool> {
        Ok(false)
    }

    async fn token_meta(&self, token_address: Address) -> TokenMeta {
        TokenMeta {
            token_address,
            ..Default::default()
        }
    }
}

/// Chain source whose transfer iteration fails mid-stream.
struct BrokenIteration;

#[async_trait]
impl ChainDataFetching for BrokenIteration {
    async fn block_at_time(&self, _timestamp: i64, _closest: Closest) -> chain::Result<u64> {
        Ok(10)
    }

    fn native_transfers(
        &self,
        _address: Address,
        _blocks: RangeInclusive<u64>,
        _sort: Sort,
    ) -> BoxStream<'_, chain::Result<NativeTransfer>> {
        stream::iter([Err(chain::Error::DataSource(anyhow::anyhow!(
            "decode failed"
        )))])
        .boxed()
    }

    fn token_transfers(
        &self,
        _address: Address,
        _blocks: RangeInclusive<u64>,
        _sort: Sort,
        _token_address: Option<Address>,
    ) -> BoxStream<'_, chain::Result<TokenTransfer>> {
        stream::empty().boxed()
    }

    async fn is_contract(&self, _address: Address) -> chain::Result<bool> {
        Err(chain::Error::DataSource(anyhow::anyhow!("probe failed")))
    }

    async fn token_meta(&self, token_address: Address) -> TokenMeta {
        TokenMeta {
            token_address,
            ..Default::default()
        }
    }
}

fn tracer(chain: impl ChainDataFetching + 'static) -> crate::domain::trace::Tracer {
    crate::domain::trace::Tracer::new(Arc::new(chain), Arc::new(FakePrices::default()))
}

#[tokio::test]
async fn failed_block_lookup_aborts_the_trace() {
    let result = tracer(NoBlocks).trace(&setup::config(0xaa)).await;
    assert!(matches!(result, Err(Error::DataSource(_))));
}

#[tokio::test]
async fn failed_iteration_aborts_and_surfaces_an_event() {
    let sink = Arc::new(RecordingSink::default());
    let tracer = tracer(BrokenIteration).with_progress(sink.clone());

    let result = tracer.trace(&setup::config(0xaa)).await;
    assert!(matches!(result, Err(Error::DataSource(_))));

    let events = sink.0.lock().unwrap();
    assert!(events.iter().any(|event| matches!(
        event,
        Event::Error { message } if message.contains("decode failed")
    )));
}

/// Empty chain whose contract probes fail.
struct FailingProbes;

#[async_trait]
impl ChainDataFetching for FailingProbes {
    async fn block_at_time(&self, _timestamp: i64, _closest: Closest) -> chain::Result<u64> {
        Ok(10)
    }

    fn native_transfers(
        &self,
        _address: Address,
        _blocks: RangeInclusive<u64>,
        _sort: Sort,
    ) -> BoxStream<'_, chain::Result<NativeTransfer>> {
        stream::empty().boxed()
    }

    fn token_transfers(
        &self,
        _address: Address,
        _blocks: RangeInclusive<u64>,
        _sort: Sort,
        _token_address: Option<Address>,
    ) -> BoxStream<'_, chain::Result<TokenTransfer>> {
        stream::empty().boxed()
    }

    async fn is_contract(&self, _address: Address) -> chain::Result<bool> {
        Err(chain::Error::DataSource(anyhow::anyhow!("probe failed")))
    }

    async fn token_meta(&self, token_address: Address) -> TokenMeta {
        TokenMeta {
            token_address,
            ..Default::default()
        }
    }
}

#[tokio::test]
async fn contract_check_failures_degrade_to_false() {
    let sink = Arc::new(RecordingSink::default());
    let tracer = tracer(FailingProbes).with_progress(sink.clone());

    let graph = tracer.trace(&setup::config(0xaa)).await.unwrap();

    assert!(!graph.node(&setup::address(0xaa)).unwrap().is_contract);
    let events = sink.0.lock().unwrap();
    assert!(events.iter().any(|event| matches!(
        event,
        Event::Done { contract_checked: 1, contract_errors: 1, .. }
    )));
}

#[tokio::test]
async fn contract_probe_error_counts_into_done_event() {
    let chain = setup::chain()
        .with_native_transfers(vec![setup::native(0x01, 0xaa, 0xbb, 10_u128.pow(18))]);
    let sink = Arc::new(RecordingSink::default());
    let tracer = setup::tracer(chain, FakePrices::default()).with_progress(sink.clone());

    tracer.trace(&setup::config(0xaa)).await.unwrap();

    let events = sink.0.lock().unwrap();
    assert!(events.iter().any(|event| matches!(
        event,
        Event::Done { contract_checked: 2, contract_errors: 0, .. }
    )));
}

#[tokio::test]
async fn cancellation_stops_the_run() {
    let chain = setup::chain()
        .with_native_transfers(vec![setup::native(0x01, 0xaa, 0xbb, 10_u128.pow(18))]);
    let token = CancellationToken::new();
    token.cancel();
    let tracer = setup::tracer(chain, FakePrices::default()).with_cancellation(token);

    let result = tracer.trace(&setup::config(0xaa)).await;
    assert!(matches!(result, Err(Error::Cancelled)));
}
