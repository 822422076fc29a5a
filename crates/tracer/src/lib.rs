//! Value-flow tracer: builds an investigator-friendly graph of native and
//! fungible-token transfers reachable from a seed address within a bounded
//! time window and hop count.

pub mod arguments;
pub mod domain;
pub mod infra;
pub mod io;

#[cfg(test)]
mod tests;

use {
    crate::{
        arguments::Arguments,
        domain::{
            eth::Address,
            trace::{LogSink, TraceConfig, Tracer},
        },
        infra::{
            chain::{Etherscan, etherscan},
            market::{Dexscreener, dexscreener},
            pricing::{self, Resolver},
            risk::{self, MarketRisk, TokenRisk, TokenRiskAssessing},
        },
    },
    clap::Parser,
    std::{collections::BTreeSet, sync::Arc},
};

pub async fn start(args: impl Iterator<Item = String>) {
    let args = Arguments::parse_from(args);
    observe::tracing::initialize("tracer=debug,rate_limit=debug");
    observe::panic_hook::install();
    tracing::info!("running tracer with {args:#?}");
    if let Err(error) = run(args).await {
        tracing::error!(?error, "trace failed");
        std::process::exit(1);
    }
}

async fn run(args: Arguments) -> anyhow::Result<()> {
    let chain = Arc::new(Etherscan::new(etherscan::Config {
        base_url: args.etherscan_url.clone(),
        api_key: args.etherscan_api_key.clone(),
        chain_id: args.chain_id,
        requests_per_second: args.etherscan_requests_per_second,
        timeout: args.etherscan_timeout,
        max_attempts: args.etherscan_max_attempts,
        page_size: args.etherscan_page_size,
        ..Default::default()
    }));
    let market = Arc::new(Dexscreener::new(dexscreener::Config {
        base_url: args.dexscreener_url.clone(),
        chain_id: Some(args.dexscreener_chain_id.clone()),
        requests_per_second: args.dexscreener_requests_per_second,
        timeout: args.dexscreener_timeout,
        max_attempts: args.dexscreener_max_attempts,
        ..Default::default()
    }));
    let pricing_config = pricing::Config {
        native_usd: args.native_usd.clone(),
        fixed_token_usd: args.fixed_token_usd.iter().cloned().collect(),
        stablecoins: if args.stablecoins.is_empty() {
            pricing::Config::default().stablecoins
        } else {
            args.stablecoins.iter().copied().collect()
        },
    };
    let prices = Arc::new(Resolver::new(pricing_config).with_market(market.clone()));

    let config = TraceConfig {
        seed: args.seed,
        days: args.days,
        hops: args.hops,
        min_usd: args.min_usd.clone(),
        now_ts: args.now_ts,
        max_edges_per_address: args.max_edges_per_address,
        max_total_edges: args.max_total_edges,
        ignore_unknown_price: args.ignore_unknown_price,
        skip_contract_check: args.skip_contract_check,
    };
    let tracer = Tracer::new(chain, prices).with_progress(Arc::new(LogSink));
    let graph = tracer.trace(&config).await?;

    let risks = if args.skip_token_risk {
        Vec::new()
    } else {
        let assessor = MarketRisk::new(
            risk::Config {
                min_liquidity_usd: args.min_liquidity_usd.clone(),
                new_pair_hours: args.new_pair_hours,
            },
            market,
        );
        let now_ts = match config.now_ts {
            Some(ts) if ts > 0 => ts,
            _ => chrono::Utc::now().timestamp(),
        };
        let tokens: BTreeSet<Address> = graph
            .edges()
            .iter()
            .filter_map(|edge| edge.token_address)
            .collect();
        let mut risks: Vec<TokenRisk> = Vec::with_capacity(tokens.len());
        for token in tokens {
            risks.push(assessor.assess(token, now_ts).await);
        }
        risks
    };

    let graph_path = io::write_graph_json(&graph, &args.out)?;
    let summary_path = io::write_summary_md(&graph, &risks, &args.out)?;
    println!("Wrote: {}", graph_path.display());
    println!("Wrote: {}", summary_path.display());
    Ok(())
}
