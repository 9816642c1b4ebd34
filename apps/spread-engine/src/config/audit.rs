//! Audit sink settings.

use serde::{Deserialize, Serialize};

/// Where run records go: the `audit` log target by default, or a
/// JSON-lines file when a path is set.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuditConfig {
    /// JSON-lines file to append to.
    #[serde(default)]
    pub jsonl_path: Option<String>,
}
