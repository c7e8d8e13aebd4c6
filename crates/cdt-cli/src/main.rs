//! `cdt` entry point: config hashing, audit-log verification, and a
//! fixture-driven `run` of the full ingest → ... → position pipeline
//! (grounded on `mqk-cli::main`'s `clap` `Parser`/`Subcommand` shape and
//! `#[tokio::main]` error-propagation style; spec §7 "CLI-level failures
//! use `anyhow::Result` and `main` exits non-zero on `Err`").

mod composition;
mod fixture_exchange;

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use cdt_db::{AuditRepository, CandleRepository, PositionRepository};
use cdt_execution::{ExecutionConfig, ExecutionEngine};
use cdt_md::poll_and_ingest;
use cdt_schemas::Timeframe;

use composition::{baseline_param_version, wire, AppState};
use fixture_exchange::FileExchangeClient;

#[derive(Parser)]
#[command(name = "cdt")]
#[command(about = "Crypto derivatives trading bot core", long_about = None)]
struct Cli {
    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute layered config hash + print canonical JSON
    ConfigHash {
        /// Paths in merge order (base -> env -> overrides...)
        #[arg(required = true)]
        paths: Vec<String>,
    },

    /// Verify the hash chain of an append-only audit log
    AuditVerify {
        /// Path to the JSONL audit log
        path: PathBuf,
    },

    /// Wire the full pipeline in-memory and replay a fixture of candles
    /// through it.
    Run {
        #[arg(long)]
        symbol: String,

        /// "1m" or "5m"
        #[arg(long)]
        timeframe: String,

        /// JSON array of klines (openTimeMs/closeTimeMs/open/high/low/close/volume)
        #[arg(long)]
        klines: PathBuf,

        /// Where to append the hash-chained audit log
        #[arg(long, default_value = "cdt-audit.jsonl")]
        audit_log: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    init_tracing();

    let cli = Cli::parse();

    match cli.cmd {
        Commands::ConfigHash { paths } => {
            let path_refs: Vec<&str> = paths.iter().map(|s| s.as_str()).collect();
            let loaded = cdt_config::load_layered_yaml(&path_refs)?;
            println!("config_hash={}", loaded.config_hash);
            println!("{}", loaded.canonical_json);
        }

        Commands::AuditVerify { path } => {
            let result = cdt_audit::verify_hash_chain(&path)?;
            match result {
                cdt_audit::VerifyResult::Valid { lines } => {
                    println!("chain_valid=true lines={lines}");
                }
                cdt_audit::VerifyResult::Broken { line, reason } => {
                    println!("chain_valid=false line={line} reason={reason}");
                    std::process::exit(1);
                }
            }
        }

        Commands::Run { symbol, timeframe, klines, audit_log } => {
            run(&symbol, parse_timeframe(&timeframe)?, &klines, &audit_log).await?;
        }
    }

    Ok(())
}

async fn run(symbol: &str, timeframe: Timeframe, klines_path: &PathBuf, audit_log_path: &PathBuf) -> Result<()> {
    let state: &'static AppState = Box::leak(Box::new(AppState::new(vec![baseline_param_version()])));
    let writer = cdt_audit::AuditWriter::new(audit_log_path, true)
        .with_context(|| format!("open audit log {audit_log_path:?}"))?;
    let audit_writer = Arc::new(Mutex::new(writer));
    let approved = wire(state, audit_writer.clone());

    let exchange = FileExchangeClient::load(klines_path)
        .with_context(|| format!("load klines fixture {klines_path:?}"))?;

    poll_and_ingest(&exchange, &state.candles, &state.bus, symbol, timeframe, 260, state.now_ms())
        .await
        .map_err(|e| anyhow::anyhow!("ingest failed: {e}"))?;

    let plans: Vec<(cdt_schemas::TradePlan, f64, f64)> = approved.lock().unwrap().drain(..).collect();
    tracing::info!(count = plans.len(), "risk-approved plans queued for execution");

    let execution = ExecutionEngine {
        broker: &state.broker,
        orders: &state.orders,
        fills: &state.fills,
        positions: &state.positions,
        bus: &state.bus,
        config: ExecutionConfig::default(),
    };

    for (plan, qty, _final_leverage) in plans {
        let now_ms = state.now_ms();
        let outcome = execution.execute(&plan, qty, || true, now_ms).await;
        tracing::info!(symbol = %plan.symbol, engine = %plan.engine, ?outcome, "execution outcome");
    }

    println!(
        "candles_loaded={}",
        state.candles.load_recent(symbol, timeframe, state.now_ms(), usize::MAX).len()
    );
    println!("open_positions_total={}", state.positions.count_open_total());
    println!("audit_events={}", state.audits.list().len());
    println!("audit_log={}", audit_log_path.display());

    Ok(())
}

fn parse_timeframe(s: &str) -> Result<Timeframe> {
    match s {
        "1m" => Ok(Timeframe::M1),
        "5m" => Ok(Timeframe::M5),
        other => anyhow::bail!("unknown timeframe {other:?}, expected \"1m\" or \"5m\""),
    }
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .init();
}
