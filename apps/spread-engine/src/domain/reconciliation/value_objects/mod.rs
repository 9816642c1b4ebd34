//! Reconciliation Value Objects

mod order_status;
mod position_snapshot;
mod working_order;

pub use order_status::OrderStatus;
pub use position_snapshot::PositionSnapshot;
pub use working_order::WorkingOrder;
