//! Minimal CLI router.
//!
//! Loads an interaction-graph JSON file (`{"nodes": [u32, ...], "edges":
//! [[u, v, weight], ...]}`), runs `fpqa_mw::route`, and prints the mapping
//! and cost breakdown.

#![forbid(unsafe_code)]

use std::{env, fs, path::Path};

use fpqa_mw::router::{route, InteractionGraph};
use serde::Deserialize;

#[derive(Deserialize)]
struct GraphFile {
    nodes: Vec<u32>,
    edges: Vec<(u32, u32, f64)>,
}

fn parse_flag(args: &[String], key: &str) -> Option<String> {
    let mut it = args.iter();
    while let Some(a) = it.next() {
        if a == key {
            return it.next().cloned();
        }
    }
    None
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args: Vec<String> = env::args().collect();
    let graph_path =
        parse_flag(&args, "--graph").ok_or_else(|| anyhow::anyhow!("missing required --graph <path>"))?;
    let width: u32 = parse_flag(&args, "--width")
        .and_then(|s| s.parse().ok())
        .unwrap_or(8);
    let height: u32 = parse_flag(&args, "--height")
        .and_then(|s| s.parse().ok())
        .unwrap_or(8);
    let seed: u64 = parse_flag(&args, "--seed").and_then(|s| s.parse().ok()).unwrap_or(0);

    let path = Path::new(&graph_path);
    let text = fs::read_to_string(path).map_err(|e| anyhow::anyhow!("read {}: {e}", path.display()))?;
    let file: GraphFile =
        serde_json::from_str(&text).map_err(|e| anyhow::anyhow!("parse graph JSON {}: {e}", path.display()))?;

    let mut graph = InteractionGraph::new();
    for node in &file.nodes {
        graph.add_qubit(*node);
    }
    for (u, v, w) in &file.edges {
        graph.add_interaction(*u, *v, *w);
    }

    let result = route(&graph, width, height, seed).map_err(|e| anyhow::anyhow!("routing failed: {e}"))?;

    eprintln!(
        "routed {} qubits onto {width}x{height} grid (seed={seed})",
        graph.qubit_count()
    );
    for (qubit, (x, y)) in &result.mapping {
        eprintln!("  qubit {qubit} -> ({x}, {y})");
    }
    eprintln!(
        "cost: distance={} conflicts={} total={}",
        result.cost.total_distance, result.cost.aod_conflicts, result.cost.total_cost
    );
    eprintln!(
        "baseline total={} reduction={}%",
        result.baseline_cost.total_cost, result.reduction_percentage
    );
    println!("{}", serde_json::to_string_pretty(&result)?);

    Ok(())
}
