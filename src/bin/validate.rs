//! Minimal CLI validator.
//!
//! Loads a Job JSON file, runs `fpqa_mw::validate`, and prints a human
//! summary (or, with `--json`, the full `ValidationResult`). Exits non-zero
//! if the job is invalid.

#![forbid(unsafe_code)]

use std::{env, fs, path::Path};

use fpqa_mw::schema::Job;
use fpqa_mw::validate;

fn parse_flag(args: &[String], key: &str) -> Option<String> {
    let mut it = args.iter();
    while let Some(a) = it.next() {
        if a == key {
            return it.next().cloned();
        }
    }
    None
}

fn has_flag(args: &[String], key: &str) -> bool {
    args.iter().any(|a| a == key)
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args: Vec<String> = env::args().collect();
    let job_path = parse_flag(&args, "--job").ok_or_else(|| anyhow::anyhow!("missing required --job <path>"))?;
    let strict = has_flag(&args, "--strict");
    let as_json = has_flag(&args, "--json");

    let path = Path::new(&job_path);
    let text = fs::read_to_string(path).map_err(|e| anyhow::anyhow!("read {}: {e}", path.display()))?;
    let job: Job =
        serde_json::from_str(&text).map_err(|e| anyhow::anyhow!("parse job JSON {}: {e}", path.display()))?;

    let result = validate(&job, strict);

    if as_json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        eprintln!(
            "validated {} ({} errors, {} warnings, strict={strict})",
            job.job_id.as_deref().unwrap_or("<unnamed>"),
            result.errors.len(),
            result.warnings.len()
        );
        for error in &result.errors {
            eprintln!("  error: {error}");
        }
        for warning in &result.warnings {
            eprintln!("  warning[{:?}] {}: {}", warning.severity, warning.code, warning.message);
        }
        eprintln!(
            "total_movement_distance_um={} estimated_decoherence_cost={}",
            result.total_movement_distance_um, result.estimated_decoherence_cost
        );
    }

    if !result.is_valid {
        std::process::exit(1);
    }
    Ok(())
}
