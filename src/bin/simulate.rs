//! Minimal CLI simulator.
//!
//! Runs the continuous-operation simulator for a Job file or a named
//! benchmark, streaming `TelemetryFrame`s as NDJSON to stdout. `--stop-after
//! <cycle>` requests a cooperative stop once that cycle's frame is
//! observed, exercising the same cancellation path a real transport adapter
//! would drive through `TelemetryBus::request_stop`.

#![forbid(unsafe_code)]

use std::{env, fs, path::Path, str::FromStr};

use fpqa_mw::schema::Job;
use fpqa_mw::simulator::{Benchmark, SimEvent, SimSource, Simulator};
use fpqa_mw::telemetry::ClientId;

fn parse_flag(args: &[String], key: &str) -> Option<String> {
    let mut it = args.iter();
    while let Some(a) = it.next() {
        if a == key {
            return it.next().cloned();
        }
    }
    None
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args: Vec<String> = env::args().collect();
    let cycles: u32 = parse_flag(&args, "--cycles").and_then(|s| s.parse().ok()).unwrap_or(100);
    let seed: u64 = parse_flag(&args, "--seed").and_then(|s| s.parse().ok()).unwrap_or(0);
    let stop_after: Option<u32> = parse_flag(&args, "--stop-after").and_then(|s| s.parse().ok());
    let client_id = ClientId::parse(&parse_flag(&args, "--client-id").unwrap_or_else(|| "cli-client".to_string()))
        .map_err(|e| anyhow::anyhow!("invalid --client-id: {e}"))?;

    let source = if let Some(job_path) = parse_flag(&args, "--job") {
        let path = Path::new(&job_path);
        let text = fs::read_to_string(path).map_err(|e| anyhow::anyhow!("read {}: {e}", path.display()))?;
        let job: Job =
            serde_json::from_str(&text).map_err(|e| anyhow::anyhow!("parse job JSON {}: {e}", path.display()))?;
        SimSource::Job(Box::new(job))
    } else {
        let name = parse_flag(&args, "--benchmark")
            .ok_or_else(|| anyhow::anyhow!("must pass either --job <path> or --benchmark <name>"))?;
        let benchmark = Benchmark::from_str(&name).map_err(|e| anyhow::anyhow!("invalid --benchmark: {e}"))?;
        SimSource::Benchmark(benchmark)
    };

    let sim = Simulator::with_tokio_clock();
    let (tx, mut rx) = tokio::sync::mpsc::channel(256);
    let handle = sim
        .start(client_id.clone(), source, cycles, seed, tx)
        .map_err(|e| anyhow::anyhow!("failed to start client: {e}"))?;

    eprintln!("client {client_id} running for up to {cycles} cycles (seed={seed})");

    while let Some(SimEvent::Frame(frame)) = rx.recv().await {
        println!("{}", serde_json::to_string(&frame)?);
        if let Some(stop_cycle) = stop_after {
            if frame.cycle >= stop_cycle {
                handle.stop();
            }
        }
    }

    handle.join().await.map_err(|e| anyhow::anyhow!("client task panicked: {e}"))?;
    Ok(())
}
