// Allow unwrap/expect in tests - tests should panic on unexpected errors
// Allow test-specific patterns and pedantic lints in test code
#![cfg_attr(
    test,
    allow(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::significant_drop_tightening,
        clippy::too_many_lines,
        clippy::match_same_arms,
        clippy::needless_pass_by_value,
        clippy::option_if_let_else,
        clippy::default_trait_access,
        clippy::items_after_statements
    )
)]

//! Spread Engine - Rust Core Library
//!
//! Opens one multi-leg option structure per trading signal and works it to
//! a fill with a bounded, cancel-aware repricing loop.
//!
//! # Architecture (Clean Architecture + DDD + Hexagonal)
//!
//! ## Layers (inside → outside)
//!
//! - **Domain**: Pure logic with no I/O
//!   - `option_position`: OCC symbol codec, canonical leg keys, vertical and condor builders
//!   - `reconciliation`: Position/order snapshots and the NEW/REPRICE/SKIP guard
//!   - `execution`: Fair price, tick rounding, repricing state, outcome reports
//!   - `sizing`: Contract count and wing width
//!   - `signal`: Signal fields and credit/debit selection
//!
//! - **Application**: Use cases and orchestration
//!   - `ports`: `BrokerPort`, `SignalPort`, `AuditPort`
//!   - `services`: Snapshot aggregation, in-process leg-set registry
//!   - `use_cases`: `ReconcileStructure`, `ExecuteStructure`, `OpenStructure`
//!
//! - **Infrastructure**: Adapters
//!   - `broker`: Schwab trader API, in-memory paper broker
//!   - `signal`: GammaWizard HTTP client
//!   - `audit`: Log and JSON-lines sinks
//!
//! Configuration and logging setup live in `config` and `observability`.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]

// =============================================================================
// Clean Architecture Layers
// =============================================================================

/// Domain layer - Core business logic with no external dependencies.
pub mod domain;

/// Application layer - Use cases and port definitions.
pub mod application;

/// Infrastructure layer - Adapters and external integrations.
pub mod infrastructure;

/// YAML configuration with environment interpolation.
pub mod config;

/// Logging setup.
pub mod observability;

// =============================================================================
// Re-exports from Clean Architecture
// =============================================================================

// Domain re-exports
pub use domain::execution::{
    ExecutionOutcome, ExecutionReport, PricingKnobs, ReasonCode, TradingWindow,
};
pub use domain::option_position::{
    CanonicalLegKey, OptionRight, OptionSymbol, ShortPlacement, SpreadSide, Strike, Structure,
};
pub use domain::reconciliation::{GuardDecision, GuardEvaluation};
pub use domain::shared::{BrokerId, RunId};
pub use domain::signal::{SideOverride, TradeSignal};
pub use domain::sizing::SizingRule;

// Application re-exports
pub use application::ports::{
    AuditPort, AuditRecord, BrokerError, BrokerPort, FinalStatus, InMemoryAuditSink, SignalError,
    SignalPort,
};
pub use application::use_cases::{
    ExecuteStructureUseCase, OpenStructureUseCase, ReconcileStructureUseCase, RunError, RunReport,
    StructureKind, StructureSettings,
};

// Infrastructure re-exports
pub use infrastructure::audit::{JsonLinesAuditSink, TracingAuditSink};
pub use infrastructure::broker::{PaperBroker, SchwabBrokerAdapter, SchwabConfig, SchwabError};
pub use infrastructure::signal::{GammaWizardConfig, GammaWizardSignal};
