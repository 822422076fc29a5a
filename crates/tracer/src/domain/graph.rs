//! The directed multigraph returned by a trace.

use {
    super::eth::{Address, AssetKind, B256},
    bigdecimal::BigDecimal,
    indexmap::IndexMap,
};

/// A counterparty observed during a trace.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Node {
    pub address: Address,
    pub is_contract: bool,
}

/// A single observed transfer. Immutable once constructed.
#[derive(Clone, Debug, PartialEq)]
pub struct Edge {
    pub from: Address,
    pub to: Address,
    pub tx_hash: B256,
    pub timestamp: i64,
    pub asset: AssetKind,
    /// Set for token edges, absent for native ones.
    pub token_address: Option<Address>,
    pub symbol: Option<String>,
    /// Amount in nominal units (wei / raw units scaled by decimals).
    pub amount: BigDecimal,
    /// `amount * price`, absent when the token could not be priced.
    pub usd_value: Option<BigDecimal>,
}

/// Identity under which edges are deduplicated: the same transfer is
/// discoverable from both of its endpoints during multi-hop expansion.
pub type EdgeKey = (B256, Address, Address, AssetKind, Option<Address>);

impl Edge {
    pub fn key(&self) -> EdgeKey {
        (
            self.tx_hash,
            self.from,
            self.to,
            self.asset,
            self.token_address,
        )
    }
}

/// Nodes keyed by address, edges in insertion order.
#[derive(Clone, Debug, Default)]
pub struct Graph {
    nodes: IndexMap<Address, Node>,
    edges: Vec<Edge>,
}

impl Graph {
    /// Inserts the node if absent. An existing node's `is_contract` flag is
    /// never overwritten: the first observation decides the tag for the run.
    pub fn ensure_node(&mut self, address: Address, is_contract: bool) {
        self.nodes.entry(address).or_insert(Node {
            address,
            is_contract,
        });
    }

    pub fn contains_node(&self, address: &Address) -> bool {
        self.nodes.contains_key(address)
    }

    pub fn append_edge(&mut self, edge: Edge) {
        self.edges.push(edge);
    }

    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    pub fn node(&self, address: &Address) -> Option<&Node> {
        self.nodes.get(address)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }
}
