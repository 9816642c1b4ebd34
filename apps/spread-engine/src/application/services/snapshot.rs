//! Position/Order Snapshot Aggregator
//!
//! Reduces raw broker listings to the two views the guard needs: signed
//! quantity per contract, and working orders whose leg set matches a
//! target exactly.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use rust_decimal::Decimal;

use crate::application::ports::{
    BrokerError, BrokerOrder, BrokerPort, BrokerPosition, InstrumentFields, OrderWindow,
};
use crate::domain::option_position::{CanonicalLegKey, OptionSymbol};
use crate::domain::reconciliation::{PositionSnapshot, WorkingOrder};

/// Quantities smaller than this are broker rounding noise.
const QTY_EPSILON: Decimal = Decimal::from_parts(1, 0, 0, false, 9);

/// Canonical key for a broker leg: symbol first, then structured fields.
#[must_use]
pub fn resolve_leg_key(
    symbol: &str,
    instrument: &InstrumentFields,
    default_root: &str,
) -> Option<CanonicalLegKey> {
    if let Ok(parsed) = OptionSymbol::parse(symbol) {
        return Some(*parsed.key());
    }
    let (Some(expiration), Some(put_call), Some(strike)) = (
        instrument.expiration.as_deref(),
        instrument.put_call.as_deref(),
        instrument.strike,
    ) else {
        return None;
    };
    OptionSymbol::from_instrument_fields(default_root, expiration, put_call, strike)
        .ok()
        .map(|s| *s.key())
}

/// Sum option positions per canonical key.
#[must_use]
pub fn aggregate_positions(records: &[BrokerPosition], default_root: &str) -> PositionSnapshot {
    let mut snapshot = PositionSnapshot::new();
    for record in records.iter().filter(|r| r.is_option()) {
        let qty = record.net_quantity();
        if qty.abs() < QTY_EPSILON {
            continue;
        }
        match resolve_leg_key(&record.symbol, &record.instrument, default_root) {
            Some(key) => snapshot.accumulate(key, qty),
            None => tracing::debug!(symbol = %record.symbol, "Skipping position with unresolvable contract"),
        }
    }
    snapshot
}

/// Reduce a broker order to a [`WorkingOrder`]; `None` if any leg is unresolvable.
#[must_use]
pub fn to_working_order(order: &BrokerOrder, default_root: &str) -> Option<WorkingOrder> {
    let keys = order
        .legs
        .iter()
        .map(|leg| resolve_leg_key(&leg.symbol, &leg.instrument, default_root))
        .collect::<Option<BTreeSet<_>>>()?;
    Some(WorkingOrder {
        id: order.id.clone(),
        keys,
        status: order.status,
    })
}

/// Fetches fresh snapshots from the broker.
pub struct SnapshotService<B>
where
    B: BrokerPort,
{
    broker: Arc<B>,
    default_root: String,
    order_lookback: Duration,
}

impl<B> SnapshotService<B>
where
    B: BrokerPort,
{
    /// Create a new snapshot service.
    pub fn new(broker: Arc<B>, default_root: impl Into<String>, order_lookback: Duration) -> Self {
        Self {
            broker,
            default_root: default_root.into(),
            order_lookback,
        }
    }

    /// Current signed positions.
    pub async fn positions(&self) -> Result<PositionSnapshot, BrokerError> {
        let records = self.broker.get_positions().await?;
        Ok(aggregate_positions(&records, &self.default_root))
    }

    /// Non-terminal orders whose leg set equals `target`.
    pub async fn working_orders_matching(
        &self,
        target: &BTreeSet<CanonicalLegKey>,
    ) -> Result<Vec<WorkingOrder>, BrokerError> {
        let orders = self
            .broker
            .list_orders(OrderWindow::lookback(self.order_lookback))
            .await?;
        Ok(orders
            .iter()
            .filter(|o| !o.status.is_terminal())
            .filter_map(|o| to_working_order(o, &self.default_root))
            .filter(|o| o.matches(target))
            .collect())
    }
}
