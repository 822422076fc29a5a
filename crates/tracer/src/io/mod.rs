//! Output writers for a finished trace: the canonical graph JSON document
//! and an investigator-friendly Markdown summary.

use {
    crate::{
        domain::{
            eth::{self, Address, AssetKind, B256},
            graph::{Edge, Graph},
        },
        infra::risk::TokenRisk,
    },
    anyhow::{Context, Result},
    bigdecimal::BigDecimal,
    serde::Serialize,
    std::{
        fmt::Write,
        path::{Path, PathBuf},
    },
};

#[derive(Debug, Serialize)]
struct GraphDocument<'a> {
    nodes: Vec<NodeDocument>,
    edges: Vec<EdgeDocument<'a>>,
}

#[derive(Debug, Serialize)]
struct NodeDocument {
    address: Address,
    is_contract: bool,
}

#[derive(Debug, Serialize)]
struct EdgeDocument<'a> {
    from: Address,
    to: Address,
    tx_hash: B256,
    timestamp: i64,
    asset_type: AssetKind,
    token_address: Option<Address>,
    symbol: Option<&'a str>,
    amount: String,
    usd_value: Option<String>,
}

impl<'a> From<&'a Graph> for GraphDocument<'a> {
    fn from(graph: &'a Graph) -> Self {
        Self {
            nodes: graph
                .nodes()
                .map(|node| NodeDocument {
                    address: node.address,
                    is_contract: node.is_contract,
                })
                .collect(),
            edges: graph
                .edges()
                .iter()
                .map(|edge| EdgeDocument {
                    from: edge.from,
                    to: edge.to,
                    tx_hash: edge.tx_hash,
                    timestamp: edge.timestamp,
                    asset_type: edge.asset,
                    token_address: edge.token_address,
                    symbol: edge.symbol.as_deref(),
                    amount: decimal_string(&edge.amount),
                    usd_value: edge.usd_value.as_ref().map(decimal_string),
                })
                .collect(),
        }
    }
}

/// Decimals serialize as fixed-point strings to preserve precision.
fn decimal_string(value: &BigDecimal) -> String {
    value.clone().normalized().to_string()
}

/// The canonical serialization of a graph. Deterministic: node order is
/// insertion order and edge order is pipeline acceptance order.
pub fn graph_json(graph: &Graph) -> Result<String> {
    serde_json::to_string_pretty(&GraphDocument::from(graph)).context("serialize graph")
}

pub fn write_graph_json(graph: &Graph, out_dir: &Path) -> Result<PathBuf> {
    std::fs::create_dir_all(out_dir)
        .with_context(|| format!("create {}", out_dir.display()))?;
    let path = out_dir.join("graph.json");
    std::fs::write(&path, graph_json(graph)?)
        .with_context(|| format!("write {}", path.display()))?;
    Ok(path)
}

/// Renders the Markdown summary: totals, the top transfers by USD value and
/// the token risk table when risk was assessed.
pub fn summary_md(graph: &Graph, risks: &[TokenRisk]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "# Trace Summary");
    let _ = writeln!(out);
    let _ = writeln!(out, "- Nodes: **{}**", graph.node_count());
    let _ = writeln!(out, "- Edges: **{}**", graph.edges().len());
    let _ = writeln!(out);
    let _ = writeln!(out, "## Top Transfers (by USD value)");
    let _ = writeln!(out);

    let top = top_transfers(graph, 15);
    if top.is_empty() {
        let _ = writeln!(out, "_No transfers found in the selected window._");
    }
    for edge in top {
        let usd = match &edge.usd_value {
            Some(usd_value) => format!("{}", usd_value.round(2)),
            None => "unknown".to_string(),
        };
        let _ = writeln!(
            out,
            "- **{usd} USD** | {} {} | {}… → {}… | tx: {}",
            edge.asset.as_str(),
            edge.symbol.as_deref().unwrap_or(""),
            short(&edge.from),
            short(&edge.to),
            edge.tx_hash,
        );
    }

    if !risks.is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(out, "## Token Risk");
        let _ = writeln!(out);
        let _ = writeln!(out, "| Token | Label | Score | Pairs | Liquidity (USD) | Flags |");
        let _ = writeln!(out, "|---|---|---|---|---|---|");
        for risk in risks {
            let flags = risk
                .flags
                .iter()
                .map(|flag| flag.as_str())
                .collect::<Vec<_>>()
                .join(", ");
            let _ = writeln!(
                out,
                "| {} | {} | {} | {} | {} | {} |",
                eth::lowercase(&risk.token_address),
                risk.label.as_str(),
                risk.score,
                risk.pair_count,
                risk.total_liquidity_usd.round(2),
                flags,
            );
        }
    }
    out
}

pub fn write_summary_md(graph: &Graph, risks: &[TokenRisk], out_dir: &Path) -> Result<PathBuf> {
    std::fs::create_dir_all(out_dir)
        .with_context(|| format!("create {}", out_dir.display()))?;
    let path = out_dir.join("summary.md");
    std::fs::write(&path, summary_md(graph, risks))
        .with_context(|| format!("write {}", path.display()))?;
    Ok(path)
}

/// Highest-valued edges first, unknown values last.
fn top_transfers(graph: &Graph, limit: usize) -> Vec<&Edge> {
    let unknown = BigDecimal::from(-1);
    let mut edges: Vec<&Edge> = graph.edges().iter().collect();
    edges.sort_by(|a, b| {
        let a = a.usd_value.as_ref().unwrap_or(&unknown);
        let b = b.usd_value.as_ref().unwrap_or(&unknown);
        b.cmp(a)
    });
    edges.truncate(limit);
    edges
}

fn short(address: &Address) -> String {
    format!("0x{}", alloy_primitives::hex::encode(&address.as_slice()[..4]))
}
