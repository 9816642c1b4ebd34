//! Spread Engine Binary
//!
//! Reads the latest signal, opens the configured structure, and exits.
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin spread-engine -- config.yaml
//! ```
//!
//! # Environment Variables
//!
//! - `SPREAD_ENGINE_CONFIG`: Config path when no argument is given (default: config.yaml)
//! - `RUST_LOG`: Overrides `observability.logging.level`
//!
//! Any `${VAR}` referenced from the config file is read from the
//! environment, after loading the nearest `.env`.
//!
//! # Exit Status
//!
//! `0` when the structure filled or the run was skipped (by the guard or the
//! trading window), `1` for timeouts and aborts, `2` when the engine could
//! not start.

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use spread_engine::application::ports::{AuditPort, BrokerPort, FinalStatus, SignalPort};
use spread_engine::application::use_cases::OpenStructureUseCase;
use spread_engine::config::{BrokerKind, Config, load_config};
use spread_engine::infrastructure::audit::{JsonLinesAuditSink, TracingAuditSink};
use spread_engine::infrastructure::broker::{PaperBroker, SchwabBrokerAdapter};
use spread_engine::infrastructure::signal::GammaWizardSignal;
use spread_engine::observability::init_logging;

#[tokio::main]
async fn main() -> ExitCode {
    load_dotenv();

    match run().await {
        Ok(FinalStatus::Success | FinalStatus::Skipped) => ExitCode::SUCCESS,
        Ok(_) => ExitCode::from(1),
        Err(err) => {
            eprintln!("spread-engine: {err:#}");
            ExitCode::from(2)
        }
    }
}

async fn run() -> anyhow::Result<FinalStatus> {
    let path = std::env::args()
        .nth(1)
        .or_else(|| std::env::var("SPREAD_ENGINE_CONFIG").ok())
        .unwrap_or_else(|| "config.yaml".to_string());
    let config = load_config(Some(&path)).with_context(|| format!("loading {path}"))?;
    init_logging(&config.observability.logging).context("initializing logging")?;

    tracing::info!(
        config = %path,
        broker = ?config.broker.kind,
        root = %config.structure.root,
        kind = ?config.structure.kind,
        "Starting spread engine"
    );

    let signal = Arc::new(
        GammaWizardSignal::new(&config.signal.to_client_config())
            .context("creating signal client")?,
    );

    match config.broker.kind {
        BrokerKind::Paper => {
            let paper = &config.broker.paper;
            let broker = PaperBroker::new()
                .with_cash(paper.cash)
                .with_fill_policy(paper.fill_policy());
            tracing::warn!("Paper broker selected; no orders leave this process");
            with_audit(&config, Arc::new(broker), signal).await
        }
        BrokerKind::Schwab => {
            let adapter_config = config
                .broker
                .schwab
                .to_adapter_config(&config.broker.retry);
            let broker =
                SchwabBrokerAdapter::new(adapter_config).context("creating Schwab adapter")?;
            with_audit(&config, Arc::new(broker), signal).await
        }
    }
}

async fn with_audit<B, S>(config: &Config, broker: Arc<B>, signal: Arc<S>) -> anyhow::Result<FinalStatus>
where
    B: BrokerPort,
    S: SignalPort,
{
    match config.audit.jsonl_path.as_deref() {
        Some(path) => open_structure(config, broker, signal, Arc::new(JsonLinesAuditSink::new(path))).await,
        None => open_structure(config, broker, signal, Arc::new(TracingAuditSink)).await,
    }
}

async fn open_structure<B, S, A>(
    config: &Config,
    broker: Arc<B>,
    signal: Arc<S>,
    audit: Arc<A>,
) -> anyhow::Result<FinalStatus>
where
    B: BrokerPort,
    S: SignalPort,
    A: AuditPort,
{
    let window = config
        .execution
        .trading_window()
        .context("parsing execution.trading_window")?;
    let use_case = OpenStructureUseCase::new(
        broker,
        signal,
        audit,
        config.structure_settings(),
        config.execution.knobs(),
        config.execution.order_lookback(),
    )
    .with_trading_window(window);

    match use_case.execute().await {
        Ok(report) => {
            tracing::info!(
                run_id = %report.run_id,
                structure = %report.structure.canonical_key(),
                target_qty = report.target_qty,
                status = ?report.final_status,
                reason = %report.reason_code,
                "Run complete"
            );
            Ok(report.final_status)
        }
        Err(err) => {
            if err.final_status() == FinalStatus::Abort {
                tracing::error!(error = %err, reason = err.reason_code(), "Run aborted");
            }
            Ok(err.final_status())
        }
    }
}

/// Load `.env` from the working directory or the nearest ancestor.
fn load_dotenv() {
    if dotenvy::dotenv().is_ok() {
        return;
    }

    if let Ok(cwd) = std::env::current_dir() {
        let mut dir = cwd.as_path();
        while let Some(parent) = dir.parent() {
            let env_path = parent.join(".env");
            if env_path.exists() {
                let _ = dotenvy::from_path(&env_path);
                return;
            }
            dir = parent;
        }
    }
}
