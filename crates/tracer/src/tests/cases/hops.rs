//! Breadth-first expansion over counterparties.

use crate::{
    domain::trace::{Event, TraceConfig},
    tests::setup::{self, FakePrices, RecordingSink},
};

#[tokio::test]
async fn expansion_follows_neighbors() {
    let chain = setup::chain().with_token_transfers(vec![
        setup::token(0x01, 0xaa, 0xbb, 0x70, 100),
        setup::token(0x02, 0xbb, 0xcc, 0x70, 200),
    ]);
    let tracer = setup::tracer(chain, FakePrices::default().with_token(0x70, 1));

    let config = TraceConfig {
        hops: 2,
        ..setup::config(0xaa)
    };
    let graph = tracer.trace(&config).await.unwrap();

    assert_eq!(graph.edges().len(), 2);
    assert_eq!(graph.node_count(), 3);
    assert!(graph.contains_node(&setup::address(0xcc)));
}

#[tokio::test]
async fn zero_hops_only_covers_the_seed() {
    let chain = setup::chain().with_token_transfers(vec![
        setup::token(0x01, 0xaa, 0xbb, 0x70, 100),
        setup::token(0x02, 0xbb, 0xcc, 0x70, 200),
    ]);
    let tracer = setup::tracer(chain, FakePrices::default().with_token(0x70, 1));

    let graph = tracer.trace(&setup::config(0xaa)).await.unwrap();

    assert_eq!(graph.edges().len(), 1);
    assert!(!graph.contains_node(&setup::address(0xcc)));
}

#[tokio::test]
async fn neighbors_are_visited_in_sorted_order() {
    let chain = setup::chain().with_native_transfers(vec![
        setup::native(0x01, 0xaa, 0xdd, 10_u128.pow(18)),
        setup::native(0x02, 0xaa, 0xbb, 10_u128.pow(18)),
        setup::native(0x03, 0xcc, 0xaa, 10_u128.pow(18)),
    ]);
    let tracer = setup::tracer(chain, FakePrices::default());
    let sink = std::sync::Arc::new(RecordingSink::default());
    let tracer = tracer.with_progress(sink.clone());

    let config = TraceConfig {
        hops: 1,
        ..setup::config(0xaa)
    };
    tracer.trace(&config).await.unwrap();

    let visits: Vec<_> = sink
        .0
        .lock()
        .unwrap()
        .iter()
        .filter_map(|event| match event {
            Event::Visit { address, .. } => Some(*address),
            _ => None,
        })
        .collect();
    assert_eq!(
        visits,
        vec![
            setup::address(0xaa),
            setup::address(0xbb),
            setup::address(0xcc),
            setup::address(0xdd),
        ]
    );
}

#[tokio::test]
async fn address_depth_pairs_are_processed_once() {
    // Both seed neighbors forward to the same address, which must be
    // processed a single time at depth 2.
    let chain = setup::chain().with_token_transfers(vec![
        setup::token(0x01, 0xaa, 0xbb, 0x70, 100),
        setup::token(0x02, 0xaa, 0xcc, 0x70, 100),
        setup::token(0x03, 0xbb, 0xdd, 0x70, 100),
        setup::token(0x04, 0xcc, 0xdd, 0x70, 100),
    ]);
    let tracer = setup::tracer(chain, FakePrices::default().with_token(0x70, 1));
    let sink = std::sync::Arc::new(RecordingSink::default());
    let tracer = tracer.with_progress(sink.clone());

    let config = TraceConfig {
        hops: 2,
        ..setup::config(0xaa)
    };
    let graph = tracer.trace(&config).await.unwrap();

    assert_eq!(graph.edges().len(), 4);
    let dd_visits = sink
        .0
        .lock()
        .unwrap()
        .iter()
        .filter(|event| {
            matches!(
                event,
                Event::Visit { address, .. } if *address == setup::address(0xdd)
            )
        })
        .count();
    assert_eq!(dd_visits, 1);
}
