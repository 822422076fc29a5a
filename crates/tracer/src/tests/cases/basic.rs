//! Edge construction from raw transfers.

use {
    crate::{
        domain::eth::AssetKind,
        tests::setup::{self, FakePrices},
    },
    bigdecimal::BigDecimal,
    maplit::hashmap,
    std::str::FromStr,
};

#[tokio::test]
async fn single_native_transfer_builds_one_edge() {
    let chain = setup::chain()
        .with_native_transfers(vec![setup::native(0xee, 0xaa, 0xbb, 10_u128.pow(18))]);
    let tracer = setup::tracer(chain, FakePrices::default().with_native(2500));

    let graph = tracer.trace(&setup::config(0xaa)).await.unwrap();

    assert_eq!(graph.edges().len(), 1);
    assert_eq!(graph.node_count(), 2);
    let edge = &graph.edges()[0];
    assert_eq!(edge.from, setup::address(0xaa));
    assert_eq!(edge.to, setup::address(0xbb));
    assert_eq!(edge.asset, AssetKind::Native);
    assert_eq!(edge.symbol.as_deref(), Some("ETH"));
    assert_eq!(edge.amount, BigDecimal::from(1));
    assert_eq!(edge.usd_value, Some(BigDecimal::from(2500)));
    assert!(graph.contains_node(&setup::address(0xaa)));
    assert!(graph.contains_node(&setup::address(0xbb)));
}

#[tokio::test]
async fn zero_value_transactions_are_ignored() {
    let chain = setup::chain().with_native_transfers(vec![setup::native(0xee, 0xaa, 0xbb, 0)]);
    let tracer = setup::tracer(chain, FakePrices::default());

    let graph = tracer.trace(&setup::config(0xaa)).await.unwrap();

    assert!(graph.edges().is_empty());
    // The seed node is still ensured at visit time.
    assert_eq!(graph.node_count(), 1);
}

#[tokio::test]
async fn token_amounts_are_scaled_by_decimals() {
    let chain = setup::chain().with_token_transfers(vec![setup::token(0x01, 0xaa, 0xbb, 0x70, 125)]);
    let tracer = setup::tracer(chain, FakePrices::default().with_token(0x70, 2));

    let graph = tracer.trace(&setup::config(0xaa)).await.unwrap();

    let edge = &graph.edges()[0];
    assert_eq!(edge.asset, AssetKind::Token);
    assert_eq!(edge.token_address, Some(setup::address(0x70)));
    assert_eq!(edge.symbol.as_deref(), Some("TKN"));
    // raw 125 with 2 decimals is 1.25, worth 2.50 at 2 USD.
    assert_eq!(edge.amount, BigDecimal::from_str("1.25").unwrap());
    assert_eq!(edge.usd_value, Some(BigDecimal::from_str("2.50").unwrap()));
}

#[tokio::test]
async fn unknown_decimals_keep_raw_amount() {
    let mut transfer = setup::token(0x01, 0xaa, 0xbb, 0x70, 125);
    transfer.decimals = None;
    let chain = setup::chain().with_token_transfers(vec![transfer]);
    let tracer = setup::tracer(chain, FakePrices::default());

    let graph = tracer.trace(&setup::config(0xaa)).await.unwrap();
    assert_eq!(graph.edges()[0].amount, BigDecimal::from(125));
}

#[tokio::test]
async fn contract_tags_come_from_the_chain() {
    let chain = setup::chain()
        .with_native_transfers(vec![setup::native(0xee, 0xaa, 0xbb, 10_u128.pow(18))])
        .with_contracts(hashmap! { setup::address(0xbb) => true });
    let tracer = setup::tracer(chain, FakePrices::default());

    let graph = tracer.trace(&setup::config(0xaa)).await.unwrap();

    assert!(!graph.node(&setup::address(0xaa)).unwrap().is_contract);
    assert!(graph.node(&setup::address(0xbb)).unwrap().is_contract);
}

#[tokio::test]
async fn skip_contract_check_tags_everything_false() {
    let chain = setup::chain()
        .with_native_transfers(vec![setup::native(0xee, 0xaa, 0xbb, 10_u128.pow(18))])
        .with_contracts(hashmap! { setup::address(0xbb) => true });
    let tracer = setup::tracer(chain, FakePrices::default());

    let config = crate::domain::trace::TraceConfig {
        skip_contract_check: true,
        ..setup::config(0xaa)
    };
    let graph = tracer.trace(&config).await.unwrap();
    assert!(!graph.node(&setup::address(0xbb)).unwrap().is_contract);
}
