//! Application Ports (Driven)
//!
//! Interfaces this application uses to reach external systems. Adapters in
//! the infrastructure layer implement them; tests implement them in memory.

mod audit_port;
mod broker_port;
mod signal_port;

pub use audit_port::{AuditError, AuditLeg, AuditPort, AuditRecord, FinalStatus, InMemoryAuditSink};
pub use broker_port::{
    BrokerError, BrokerOrder, BrokerOrderLeg, BrokerPort, BrokerPosition, InstrumentFields,
    OrderWindow, SpreadOrderRequest,
};
pub use signal_port::{SignalError, SignalPort};
