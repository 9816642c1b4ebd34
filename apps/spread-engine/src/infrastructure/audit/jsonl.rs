//! JSON-lines audit file.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use crate::application::ports::{AuditError, AuditPort, AuditRecord};

/// Appends one record per line. Concurrent writers in this process are
/// serialized; the file is opened per record so rotation needs no restart.
#[derive(Debug)]
pub struct JsonLinesAuditSink {
    path: PathBuf,
    lock: Mutex<()>,
}

impl JsonLinesAuditSink {
    /// Sink writing to `path`; parent directories are created on first write.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    /// Target file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl AuditPort for JsonLinesAuditSink {
    async fn record(&self, record: &AuditRecord) -> Result<(), AuditError> {
        let mut line = serde_json::to_vec(record)?;
        line.push(b'\n');

        let _guard = self.lock.lock().await;
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(&line).await?;
        file.flush().await?;
        tracing::debug!(path = %self.path.display(), run_id = %record.run_id, "Audit record appended");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use rust_decimal_macros::dec;

    use super::*;
    use crate::application::ports::FinalStatus;
    use crate::domain::shared::{BrokerId, RunId};

    fn record(status: FinalStatus) -> AuditRecord {
        AuditRecord {
            run_id: RunId::generate(),
            recorded_at: Utc::now(),
            structure_key: Some("251219:P5780-5800:C5900-5920".to_string()),
            decision: Some("NEW".to_string()),
            legs: Vec::new(),
            target_qty: 2,
            final_status: status,
            filled_qty: 2,
            order_id: Some(BrokerId::new("1001")),
            price_used: Some(dec!(1.45)),
            reason_code: "FILLED".to_string(),
        }
    }

    #[tokio::test]
    async fn appends_one_line_per_record() {
        let dir = tempfile::tempdir().unwrap();
        let sink = JsonLinesAuditSink::new(dir.path().join("nested").join("audit.jsonl"));

        sink.record(&record(FinalStatus::Success)).await.unwrap();
        sink.record(&record(FinalStatus::Timeout)).await.unwrap();

        let text = std::fs::read_to_string(sink.path()).unwrap();
        let lines: Vec<serde_json::Value> = text
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["finalStatus"], "SUCCESS");
        assert_eq!(lines[0]["priceUsed"], "1.45");
        assert_eq!(lines[0]["orderId"], "1001");
        assert_eq!(lines[1]["finalStatus"], "TIMEOUT");
    }
}
