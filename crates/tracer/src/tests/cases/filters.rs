//! The min-USD filter and the unknown-price policy.

use {
    crate::{
        domain::{eth::AssetKind, trace::TraceConfig},
        tests::setup::{self, FakePrices},
    },
    bigdecimal::BigDecimal,
};

#[tokio::test]
async fn unknown_price_tokens_are_dropped_on_request() {
    let chain = setup::chain().with_token_transfers(vec![setup::token(0x01, 0xaa, 0xbb, 0x70, 100)]);
    // No price configured for the token.
    let tracer = setup::tracer(chain, FakePrices::default());

    let config = TraceConfig {
        ignore_unknown_price: true,
        ..setup::config(0xaa)
    };
    let graph = tracer.trace(&config).await.unwrap();

    assert!(graph.edges().is_empty());
    // Only the seed node, ensured at visit time.
    assert_eq!(graph.node_count(), 1);
    assert!(graph.contains_node(&setup::address(0xaa)));
}

#[tokio::test]
async fn unknown_price_tokens_are_kept_by_default() {
    let chain = setup::chain().with_token_transfers(vec![setup::token(0x01, 0xaa, 0xbb, 0x70, 100)]);
    let tracer = setup::tracer(chain, FakePrices::default());

    let graph = tracer.trace(&setup::config(0xaa)).await.unwrap();

    assert_eq!(graph.edges().len(), 1);
    assert_eq!(graph.edges()[0].usd_value, None);
}

#[tokio::test]
async fn min_usd_drops_known_and_keeps_unknown() {
    // One native edge worth 500 USD and one token edge without a price.
    let chain = setup::chain()
        .with_native_transfers(vec![setup::native(0x01, 0xaa, 0xbb, 10_u128.pow(18))])
        .with_token_transfers(vec![setup::token(0x02, 0xaa, 0xcc, 0x70, 100)]);
    let tracer = setup::tracer(chain, FakePrices::default().with_native(500));

    let config = TraceConfig {
        min_usd: BigDecimal::from(1000),
        ..setup::config(0xaa)
    };
    let graph = tracer.trace(&config).await.unwrap();

    assert_eq!(graph.edges().len(), 1);
    let edge = &graph.edges()[0];
    assert_eq!(edge.asset, AssetKind::Token);
    assert_eq!(edge.usd_value, None);
}

#[tokio::test]
async fn min_usd_zero_keeps_everything() {
    let chain = setup::chain()
        .with_native_transfers(vec![setup::native(0x01, 0xaa, 0xbb, 1)]);
    let tracer = setup::tracer(chain, FakePrices::default());

    let graph = tracer.trace(&setup::config(0xaa)).await.unwrap();
    assert_eq!(graph.edges().len(), 1);
}
