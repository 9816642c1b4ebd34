//! Audit Port (Driven Port)
//!
//! One record per run, whatever the outcome.

use std::sync::RwLock;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::option_position::{LegIntent, LegRole};
use crate::domain::shared::{BrokerId, RunId};

/// Final status of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FinalStatus {
    /// Target fully held.
    Success,
    /// Ran out of time or cycles.
    Timeout,
    /// Stopped by an error.
    Abort,
    /// Guard declined to trade.
    Skipped,
}

/// Leg as written to the audit trail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditLeg {
    /// Fixed-width symbol.
    pub symbol: String,
    /// Opening direction.
    pub role: LegRole,
    /// Contracts.
    pub quantity: u32,
}

impl From<&LegIntent> for AuditLeg {
    fn from(leg: &LegIntent) -> Self {
        Self {
            symbol: leg.symbol.to_string(),
            role: leg.role,
            quantity: leg.quantity,
        }
    }
}

/// Machine-readable record of one run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditRecord {
    /// Run correlation id.
    pub run_id: RunId,
    /// When the record was written.
    pub recorded_at: DateTime<Utc>,
    /// Structure identity, when one was built.
    pub structure_key: Option<String>,
    /// Guard decision label (`NEW`, `REPRICE_EXISTING`, `SKIP`), when reached.
    pub decision: Option<String>,
    /// Legs, when a structure was built.
    pub legs: Vec<AuditLeg>,
    /// Units targeted.
    pub target_qty: u32,
    /// Outcome.
    pub final_status: FinalStatus,
    /// Units filled during the run.
    pub filled_qty: u32,
    /// Last order id.
    pub order_id: Option<BrokerId>,
    /// Last price submitted.
    pub price_used: Option<Decimal>,
    /// Machine-readable reason.
    pub reason_code: String,
}

/// Audit sink errors.
#[derive(Debug, thiserror::Error)]
pub enum AuditError {
    /// Record could not be encoded.
    #[error("Failed to encode audit record: {0}")]
    Encode(#[from] serde_json::Error),

    /// Record could not be written.
    #[error("Failed to write audit record: {0}")]
    Io(#[from] std::io::Error),
}

/// Port for writing audit records.
#[async_trait]
pub trait AuditPort: Send + Sync {
    /// Persist one record.
    async fn record(&self, record: &AuditRecord) -> Result<(), AuditError>;
}

/// In-memory audit sink (for testing and dry runs).
#[derive(Debug, Default)]
pub struct InMemoryAuditSink {
    records: RwLock<Vec<AuditRecord>>,
}

impl InMemoryAuditSink {
    /// Create an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records written so far.
    #[must_use]
    pub fn records(&self) -> Vec<AuditRecord> {
        self.records
            .read()
            .map(|records| records.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl AuditPort for InMemoryAuditSink {
    async fn record(&self, record: &AuditRecord) -> Result<(), AuditError> {
        if let Ok(mut records) = self.records.write() {
            records.push(record.clone());
        }
        Ok(())
    }
}
