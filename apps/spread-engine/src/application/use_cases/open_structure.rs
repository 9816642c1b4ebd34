//! Open Structure Use Case
//!
//! One complete run: read the signal, size and build the structure, run the
//! guard, drive the repricing loop when the guard allows it, and write one
//! audit record whatever happens.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::application::ports::{
    AuditLeg, AuditPort, AuditRecord, BrokerError, BrokerPort, FinalStatus, SignalError,
    SignalPort,
};
use crate::application::services::{LegSetRegistry, SnapshotService};
use crate::application::use_cases::{ExecuteStructureUseCase, ReconcileStructureUseCase};
use crate::domain::execution::{ExecutionOutcome, ExecutionReport, PricingKnobs, TradingWindow};
use crate::domain::option_position::{
    CondorSpec, OptionPositionError, OptionRight, ShortPlacement, SpreadSide, Strike, Structure,
    VerticalSpec, build_condor, build_vertical,
};
use crate::domain::reconciliation::{GuardDecision, GuardEvaluation};
use crate::domain::shared::RunId;
use crate::domain::signal::{SideOverride, TradeSignal};
use crate::domain::sizing::{SizingRule, width_for};

/// Which structure the signal is turned into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StructureKind {
    /// Four-leg condor on both inner strikes.
    #[default]
    IronCondor,
    /// Put wing only, on the inner put strike.
    PutVertical,
    /// Call wing only, on the inner call strike.
    CallVertical,
}

/// Run-level choices that do not come from the signal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructureSettings {
    /// Option root for built symbols (e.g. `SPXW`).
    pub root: String,
    /// Structure shape.
    pub kind: StructureKind,
    /// Requested credit wing width in points; snapped to the grid.
    pub credit_width: Option<Decimal>,
    /// Where the short strikes sit.
    pub placement: ShortPlacement,
    /// Side override.
    pub side_override: SideOverride,
    /// Contract count rule.
    pub sizing: SizingRule,
    /// Cash figure used instead of the broker balance.
    pub cash_override: Option<Decimal>,
}

impl Default for StructureSettings {
    fn default() -> Self {
        Self {
            root: "SPXW".to_string(),
            kind: StructureKind::default(),
            credit_width: None,
            placement: ShortPlacement::default(),
            side_override: SideOverride::default(),
            sizing: SizingRule::default(),
            cash_override: None,
        }
    }
}

/// Errors that end a run before it reaches a trading outcome.
#[derive(Debug, thiserror::Error)]
pub enum RunError {
    /// Signal could not be read.
    #[error("Signal error: {0}")]
    Signal(#[from] SignalError),

    /// Structure could not be built from the signal.
    #[error("Structure error: {0}")]
    Structure(#[from] OptionPositionError),

    /// Broker failed before the loop started.
    #[error("Broker error: {0}")]
    Broker(#[from] BrokerError),

    /// Another run in this process holds the same legs.
    #[error("A run is already active for {structure_key}")]
    AlreadyRunning {
        /// Structure identity.
        structure_key: String,
    },

    /// Started outside the configured trading window.
    #[error("Outside trading window {window} (local time {local_time})")]
    OutsideTradingWindow {
        /// Configured window.
        window: String,
        /// Start time in the window's timezone.
        local_time: String,
    },
}

impl RunError {
    /// Reason code for audit records.
    #[must_use]
    pub fn reason_code(&self) -> &'static str {
        match self {
            Self::Signal(err) => err.reason_code(),
            Self::Structure(_) => "INVALID_STRUCTURE",
            Self::Broker(err) if err.is_transient() => "BROKER_UNAVAILABLE",
            Self::Broker(_) => "PERMANENT_BROKER_ERROR",
            Self::AlreadyRunning { .. } => "ALREADY_RUNNING",
            Self::OutsideTradingWindow { .. } => "SKIPPED_TIME_WINDOW",
        }
    }

    /// Status recorded for a run that ended this way.
    #[must_use]
    pub const fn final_status(&self) -> FinalStatus {
        match self {
            Self::OutsideTradingWindow { .. } => FinalStatus::Skipped,
            _ => FinalStatus::Abort,
        }
    }
}

/// Result of a run that reached the guard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    /// Correlation id, also written to the audit record.
    pub run_id: RunId,
    /// Signal the run acted on.
    pub signal: TradeSignal,
    /// Structure at the target quantity.
    pub structure: Structure,
    /// Units targeted.
    pub target_qty: u32,
    /// Guard result before the loop.
    pub evaluation: GuardEvaluation,
    /// Loop result, absent when the guard skipped.
    pub execution: Option<ExecutionReport>,
    /// Overall status.
    pub final_status: FinalStatus,
    /// Machine-readable reason.
    pub reason_code: String,
}

/// Use case for one signal-driven run.
pub struct OpenStructureUseCase<B, S, A>
where
    B: BrokerPort,
    S: SignalPort,
    A: AuditPort,
{
    broker: Arc<B>,
    signal: Arc<S>,
    audit: Arc<A>,
    reconcile: ReconcileStructureUseCase<B>,
    executor: ExecuteStructureUseCase<B>,
    registry: LegSetRegistry,
    settings: StructureSettings,
    trading_window: Option<TradingWindow>,
}

impl<B, S, A> OpenStructureUseCase<B, S, A>
where
    B: BrokerPort,
    S: SignalPort,
    A: AuditPort,
{
    /// Wire the use case. `order_lookback` bounds the working-order query.
    pub fn new(
        broker: Arc<B>,
        signal: Arc<S>,
        audit: Arc<A>,
        settings: StructureSettings,
        knobs: PricingKnobs,
        order_lookback: Duration,
    ) -> Self {
        let snapshots = Arc::new(SnapshotService::new(
            Arc::clone(&broker),
            settings.root.clone(),
            order_lookback,
        ));
        Self {
            reconcile: ReconcileStructureUseCase::new(Arc::clone(&snapshots)),
            executor: ExecuteStructureUseCase::new(Arc::clone(&broker), snapshots, knobs),
            broker,
            signal,
            audit,
            registry: LegSetRegistry::new(),
            settings,
            trading_window: None,
        }
    }

    /// Skip runs started outside `window`.
    #[must_use]
    pub fn with_trading_window(mut self, window: Option<TradingWindow>) -> Self {
        self.trading_window = window;
        self
    }

    /// Share a registry with other use cases in this process.
    #[must_use]
    pub fn with_registry(mut self, registry: LegSetRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Run once, now.
    ///
    /// # Errors
    ///
    /// Returns an error if the run starts outside the trading window, the
    /// signal is unusable, the structure cannot be built, the broker fails
    /// before the loop starts, or the same legs are already being worked.
    /// An audit record is written in every case.
    pub async fn execute(&self) -> Result<RunReport, RunError> {
        self.execute_at(Utc::now()).await
    }

    /// Run once as if started at `started_at`; only the trading window
    /// reads it.
    pub async fn execute_at(&self, started_at: DateTime<Utc>) -> Result<RunReport, RunError> {
        let run_id = RunId::generate();
        tracing::info!(run_id = %run_id, root = %self.settings.root, "Starting run");

        let mut audit = AuditRecord {
            run_id: run_id.clone(),
            recorded_at: started_at,
            structure_key: None,
            decision: None,
            legs: Vec::new(),
            target_qty: 0,
            final_status: FinalStatus::Abort,
            filled_qty: 0,
            order_id: None,
            price_used: None,
            reason_code: String::new(),
        };

        let result = match self.check_window(started_at) {
            Ok(()) => self.run(run_id, &mut audit).await,
            Err(err) => Err(err),
        };
        match &result {
            Ok(report) => {
                audit.final_status = report.final_status;
                audit.reason_code.clone_from(&report.reason_code);
            }
            Err(err @ RunError::OutsideTradingWindow { .. }) => {
                tracing::info!(reason = err.reason_code(), "{err}");
                audit.final_status = err.final_status();
                audit.decision = Some("SKIP".to_string());
                audit.reason_code = err.reason_code().to_string();
            }
            Err(err) => {
                tracing::error!(error = %err, reason = err.reason_code(), "Run failed");
                audit.final_status = err.final_status();
                audit.reason_code = err.reason_code().to_string();
            }
        }
        audit.recorded_at = Utc::now();
        if let Err(err) = self.audit.record(&audit).await {
            tracing::error!(error = %err, "Failed to write audit record");
        }

        result
    }

    fn check_window(&self, at: DateTime<Utc>) -> Result<(), RunError> {
        match &self.trading_window {
            Some(window) if !window.contains(at) => Err(RunError::OutsideTradingWindow {
                window: window.to_string(),
                local_time: window.local_label(at),
            }),
            _ => Ok(()),
        }
    }

    async fn run(&self, run_id: RunId, audit: &mut AuditRecord) -> Result<RunReport, RunError> {
        let signal = self.signal.latest_signal().await?;
        let side = signal.side(self.settings.side_override);
        let width = width_for(side, self.settings.credit_width);
        tracing::info!(
            expiration = %signal.expiration,
            inner_put = %signal.inner_put,
            inner_call = %signal.inner_call,
            cat1 = ?signal.cat1,
            cat2 = ?signal.cat2,
            side = %side,
            width = %width,
            "Signal received"
        );

        let target_qty = self.size(side, width).await;
        let structure = self.build(&signal, side, width, target_qty)?;
        let structure_key = structure.canonical_key();
        audit.structure_key = Some(structure_key.clone());
        audit.legs = structure.legs().iter().map(AuditLeg::from).collect();
        audit.target_qty = target_qty;

        let Some(_claim) = self.registry.try_acquire(structure.leg_keys()) else {
            return Err(RunError::AlreadyRunning { structure_key });
        };

        let evaluation = self.reconcile.execute(&structure, target_qty).await?;
        audit.decision = Some(evaluation.decision.label().to_string());

        let (execution, final_status, reason_code) = match evaluation.decision {
            GuardDecision::Skip { .. } => {
                let reason = evaluation.decision.reason_code().unwrap_or("SKIP");
                tracing::info!(structure = %structure_key, reason, "Guard skipped run");
                (None, FinalStatus::Skipped, reason.to_string())
            }
            GuardDecision::New { .. } | GuardDecision::RepriceExisting { .. } => {
                let report = self
                    .executor
                    .execute(&structure, target_qty, &evaluation)
                    .await;
                audit.filled_qty = report.filled_qty;
                audit.order_id.clone_from(&report.last_order_id);
                audit.price_used = report.last_price;
                let status = match report.outcome {
                    ExecutionOutcome::Success => FinalStatus::Success,
                    ExecutionOutcome::Timeout => FinalStatus::Timeout,
                    ExecutionOutcome::Abort => FinalStatus::Abort,
                };
                let reason = report.reason.to_string();
                (Some(report), status, reason)
            }
        };

        Ok(RunReport {
            run_id,
            signal,
            structure,
            target_qty,
            evaluation,
            execution,
            final_status,
            reason_code,
        })
    }

    /// Units to open. An unreadable balance sizes as zero cash, which the
    /// rules floor at one unit.
    async fn size(&self, side: SpreadSide, width: Strike) -> u32 {
        let sizing = &self.settings.sizing;
        let cash = match self.settings.cash_override {
            Some(cash) => cash,
            None if sizing.needs_cash() => match self.broker.get_account_cash().await {
                Ok(cash) => cash,
                Err(err) => {
                    tracing::warn!(error = %err, "Account cash unavailable, sizing at minimum");
                    Decimal::ZERO
                }
            },
            None => Decimal::ZERO,
        };
        let units = sizing.units(cash, side, width);
        tracing::info!(cash = %cash, units, rule = ?sizing, "Sized run");
        units
    }

    fn build(
        &self,
        signal: &TradeSignal,
        side: SpreadSide,
        width: Strike,
        quantity: u32,
    ) -> Result<Structure, OptionPositionError> {
        let root = self.settings.root.clone();
        // Push-out is a credit setting; debit days keep the signal's strikes.
        let placement = if side.is_credit() {
            self.settings.placement
        } else {
            ShortPlacement::SameShorts
        };
        let vertical = |right, inner| {
            build_vertical(&VerticalSpec {
                root: root.clone(),
                expiration: signal.expiration,
                right,
                inner,
                width,
                side,
                quantity,
            })
        };
        match self.settings.kind {
            StructureKind::IronCondor => build_condor(&CondorSpec {
                root: root.clone(),
                expiration: signal.expiration,
                inner_put: signal.inner_put,
                inner_call: signal.inner_call,
                put_width: width,
                call_width: width,
                side,
                placement,
                quantity,
            }),
            StructureKind::PutVertical => vertical(OptionRight::Put, signal.inner_put),
            StructureKind::CallVertical => vertical(OptionRight::Call, signal.inner_call),
        }
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use chrono::{NaiveDate, TimeZone};
    use rust_decimal_macros::dec;

    use super::*;
    use crate::application::ports::InMemoryAuditSink;
    use crate::infrastructure::broker::{FillPolicy, PaperBroker};

    struct FixedSignal(Result<TradeSignal, SignalError>);

    #[async_trait]
    impl SignalPort for FixedSignal {
        async fn latest_signal(&self) -> Result<TradeSignal, SignalError> {
            self.0.clone()
        }
    }

    fn signal(cat1: Decimal, cat2: Decimal) -> TradeSignal {
        TradeSignal {
            signal_date: NaiveDate::from_ymd_opt(2025, 12, 18),
            expiration: NaiveDate::from_ymd_opt(2025, 12, 19).unwrap(),
            inner_put: Strike::from_points(5800),
            inner_call: Strike::from_points(5900),
            cat1: Some(cat1),
            cat2: Some(cat2),
        }
    }

    fn use_case(
        broker: &Arc<PaperBroker>,
        signal: Result<TradeSignal, SignalError>,
        settings: StructureSettings,
    ) -> (
        OpenStructureUseCase<PaperBroker, FixedSignal, InMemoryAuditSink>,
        Arc<InMemoryAuditSink>,
    ) {
        let audit = Arc::new(InMemoryAuditSink::new());
        let knobs = PricingKnobs::default()
            .with_fallback_price(dec!(1.00))
            .with_schedule(3, Duration::from_secs(10), Duration::from_secs(240));
        let uc = OpenStructureUseCase::new(
            Arc::clone(broker),
            Arc::new(FixedSignal(signal)),
            Arc::clone(&audit),
            settings,
            knobs,
            Duration::from_secs(86_400),
        );
        (uc, audit)
    }

    #[tokio::test(start_paused = true)]
    async fn credit_condor_is_sized_from_cash_and_filled() {
        let broker = Arc::new(
            PaperBroker::new()
                .with_cash(dec!(16000))
                .with_fill_policy(FillPolicy::Immediately),
        );
        let settings = StructureSettings {
            sizing: SizingRule::PerEquity {
                dollars_per_unit: dec!(4000),
            },
            ..StructureSettings::default()
        };
        let (uc, audit) = use_case(&broker, Ok(signal(dec!(0.4), dec!(0.6))), settings);

        let report = uc.execute().await.unwrap();

        // 16000 / (4000 * 20/5) = 1
        assert_eq!(report.target_qty, 1);
        assert_eq!(report.structure.side(), SpreadSide::Credit);
        assert_eq!(report.final_status, FinalStatus::Success);
        assert_eq!(report.reason_code, "FILLED");

        let records = audit.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].decision.as_deref(), Some("NEW"));
        assert_eq!(records[0].legs.len(), 4);
        assert_eq!(records[0].filled_qty, 1);
        assert_eq!(records[0].price_used, Some(dec!(1.00)));
    }

    #[tokio::test(start_paused = true)]
    async fn debit_signal_builds_five_wide_put_vertical() {
        let broker = Arc::new(PaperBroker::new().with_fill_policy(FillPolicy::Immediately));
        let settings = StructureSettings {
            kind: StructureKind::PutVertical,
            sizing: SizingRule::Fixed { quantity: 2 },
            ..StructureSettings::default()
        };
        let (uc, _audit) = use_case(&broker, Ok(signal(dec!(0.6), dec!(0.4))), settings);

        let report = uc.execute().await.unwrap();

        assert_eq!(report.structure.side(), SpreadSide::Debit);
        assert_eq!(report.structure.canonical_key(), "251219:P5795-5800");
        assert_eq!(report.target_qty, 2);
        assert!(report.execution.unwrap().is_success());
    }

    #[tokio::test(start_paused = true)]
    async fn existing_position_skips_and_audits() {
        let broker = Arc::new(PaperBroker::new());
        let (uc, audit) = use_case(
            &broker,
            Ok(signal(dec!(0.4), dec!(0.6))),
            StructureSettings::default(),
        );
        let built = uc
            .build(
                &signal(dec!(0.4), dec!(0.6)),
                SpreadSide::Credit,
                width_for(SpreadSide::Credit, None),
                1,
            )
            .unwrap();
        for leg in built.legs() {
            let qty = Decimal::from(leg.role.sign());
            broker.add_position(&leg.symbol, qty);
        }

        let report = uc.execute().await.unwrap();

        assert_eq!(report.final_status, FinalStatus::Skipped);
        assert_eq!(report.reason_code, "AT_OR_ABOVE_TARGET");
        assert!(report.execution.is_none());
        assert_eq!(broker.calls().placed, 0);
        assert_eq!(audit.records()[0].final_status, FinalStatus::Skipped);
    }

    #[tokio::test]
    async fn signal_failure_is_audited_as_abort() {
        let broker = Arc::new(PaperBroker::new());
        let (uc, audit) = use_case(
            &broker,
            Err(SignalError::NoTradePayload),
            StructureSettings::default(),
        );

        let err = uc.execute().await.unwrap_err();

        assert!(matches!(err, RunError::Signal(SignalError::NoTradePayload)));
        let records = audit.records();
        assert_eq!(records[0].final_status, FinalStatus::Abort);
        assert_eq!(records[0].reason_code, "NO_TRADE_PAYLOAD");
        assert!(records[0].structure_key.is_none());
    }

    #[tokio::test]
    async fn concurrent_run_on_same_legs_is_rejected() {
        let broker = Arc::new(PaperBroker::new());
        let registry = LegSetRegistry::new();
        let (uc, audit) = use_case(
            &broker,
            Ok(signal(dec!(0.4), dec!(0.6))),
            StructureSettings::default(),
        );
        let uc = uc.with_registry(registry.clone());
        let built = uc
            .build(
                &signal(dec!(0.4), dec!(0.6)),
                SpreadSide::Credit,
                width_for(SpreadSide::Credit, None),
                1,
            )
            .unwrap();
        let _held = registry.try_acquire(built.leg_keys()).unwrap();

        let err = uc.execute().await.unwrap_err();

        assert!(matches!(err, RunError::AlreadyRunning { .. }));
        assert_eq!(audit.records()[0].reason_code, "ALREADY_RUNNING");
    }

    fn close_window() -> Option<TradingWindow> {
        TradingWindow::parse("16:08", "16:14", "America/New_York", true).ok()
    }

    #[tokio::test]
    async fn run_outside_window_is_skipped_before_the_signal() {
        let broker = Arc::new(PaperBroker::new());
        let (uc, audit) = use_case(
            &broker,
            Err(SignalError::NoTradePayload),
            StructureSettings::default(),
        );
        let uc = uc.with_trading_window(close_window());
        // Thursday 15:30 New York
        let at = Utc.with_ymd_and_hms(2025, 12, 18, 20, 30, 0).unwrap();

        let err = uc.execute_at(at).await.unwrap_err();

        assert!(matches!(err, RunError::OutsideTradingWindow { .. }));
        assert_eq!(err.final_status(), FinalStatus::Skipped);
        let records = audit.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].final_status, FinalStatus::Skipped);
        assert_eq!(records[0].decision.as_deref(), Some("SKIP"));
        assert_eq!(records[0].reason_code, "SKIPPED_TIME_WINDOW");
        assert_eq!(broker.calls().placed, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn run_inside_window_trades() {
        let broker = Arc::new(PaperBroker::new().with_fill_policy(FillPolicy::Immediately));
        let (uc, audit) = use_case(
            &broker,
            Ok(signal(dec!(0.4), dec!(0.6))),
            StructureSettings::default(),
        );
        let uc = uc.with_trading_window(close_window());
        // Thursday 16:10 New York
        let at = Utc.with_ymd_and_hms(2025, 12, 18, 21, 10, 0).unwrap();

        let report = uc.execute_at(at).await.unwrap();

        assert_eq!(report.final_status, FinalStatus::Success);
        assert_eq!(audit.records()[0].reason_code, "FILLED");
    }

    #[test]
    fn broker_errors_map_to_reason_codes() {
        let transient = RunError::Broker(BrokerError::RateLimited {
            retry_after_secs: None,
        });
        let permanent = RunError::Broker(BrokerError::AuthenticationFailed {
            message: "expired".to_string(),
        });
        assert_eq!(transient.reason_code(), "BROKER_UNAVAILABLE");
        assert_eq!(permanent.reason_code(), "PERMANENT_BROKER_ERROR");
    }
}
