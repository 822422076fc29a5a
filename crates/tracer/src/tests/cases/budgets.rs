//! Per-address and total edge budgets.

use {
    crate::{
        domain::trace::TraceConfig,
        tests::setup::{self, FakePrices},
    },
    bigdecimal::BigDecimal,
};

fn five_transfers() -> Vec<crate::infra::chain::NativeTransfer> {
    (1..=5)
        .map(|n| setup::native(n, 0xaa, 0xb0 + n, u128::from(n) * 10_u128.pow(18)))
        .collect()
}

#[tokio::test]
async fn total_cap_truncates_and_stops_traversal() {
    let chain = setup::chain().with_native_transfers(five_transfers());
    let tracer = setup::tracer(chain, FakePrices::default().with_native(10_000));

    let config = TraceConfig {
        hops: 3,
        max_total_edges: 2,
        ..setup::config(0xaa)
    };
    let graph = tracer.trace(&config).await.unwrap();

    assert_eq!(graph.edges().len(), 2);
    // The traversal stopped before visiting any neighbor.
    assert_eq!(graph.node_count(), 3);
}

#[tokio::test]
async fn per_address_cap_keeps_highest_valued_edges() {
    let chain = setup::chain().with_native_transfers(five_transfers());
    let tracer = setup::tracer(chain, FakePrices::default().with_native(10));

    let config = TraceConfig {
        max_edges_per_address: 2,
        ..setup::config(0xaa)
    };
    let graph = tracer.trace(&config).await.unwrap();

    assert_eq!(graph.edges().len(), 2);
    // Ranked descending by USD value before the cap: 5 ETH then 4 ETH.
    assert_eq!(graph.edges()[0].usd_value, Some(BigDecimal::from(50)));
    assert_eq!(graph.edges()[1].usd_value, Some(BigDecimal::from(40)));
}

#[tokio::test]
async fn total_cap_spans_multiple_addresses() {
    let chain = setup::chain().with_token_transfers(vec![
        setup::token(0x01, 0xaa, 0xbb, 0x70, 100),
        setup::token(0x02, 0xbb, 0xcc, 0x70, 100),
        setup::token(0x03, 0xcc, 0xdd, 0x70, 100),
    ]);
    let tracer = setup::tracer(chain, FakePrices::default().with_token(0x70, 1));

    let config = TraceConfig {
        hops: 3,
        max_total_edges: 2,
        ..setup::config(0xaa)
    };
    let graph = tracer.trace(&config).await.unwrap();

    assert_eq!(graph.edges().len(), 2);
}

#[tokio::test]
async fn uncapped_run_keeps_the_whole_batch() {
    let chain = setup::chain().with_native_transfers(five_transfers());
    let tracer = setup::tracer(chain, FakePrices::default());

    let graph = tracer.trace(&setup::config(0xaa)).await.unwrap();
    assert_eq!(graph.edges().len(), 5);
}
