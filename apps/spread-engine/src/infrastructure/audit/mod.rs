//! Audit Sinks
//!
//! - [`TracingAuditSink`]: one structured `tracing` event per run
//! - [`JsonLinesAuditSink`]: appends one JSON object per line to a file

mod jsonl;
mod tracing_sink;

pub use jsonl::JsonLinesAuditSink;
pub use tracing_sink::TracingAuditSink;
