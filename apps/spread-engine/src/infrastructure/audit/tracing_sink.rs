//! Audit records as log events.

use async_trait::async_trait;

use crate::application::ports::{AuditError, AuditPort, AuditRecord};

/// Writes each record as an `INFO` event on the `audit` target.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingAuditSink;

#[async_trait]
impl AuditPort for TracingAuditSink {
    async fn record(&self, record: &AuditRecord) -> Result<(), AuditError> {
        let json = serde_json::to_string(record)?;
        tracing::info!(
            target: "audit",
            run_id = %record.run_id,
            final_status = ?record.final_status,
            reason_code = %record.reason_code,
            record = %json,
            "Run recorded"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::application::ports::FinalStatus;
    use crate::domain::shared::RunId;

    #[tokio::test]
    async fn records_without_error() {
        let record = AuditRecord {
            run_id: RunId::generate(),
            recorded_at: Utc::now(),
            structure_key: None,
            decision: None,
            legs: Vec::new(),
            target_qty: 0,
            final_status: FinalStatus::Abort,
            filled_qty: 0,
            order_id: None,
            price_used: None,
            reason_code: "SIGNAL_UNAVAILABLE".to_string(),
        };
        assert!(TracingAuditSink.record(&record).await.is_ok());
    }
}
