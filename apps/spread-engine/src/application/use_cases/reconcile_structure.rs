//! Reconcile Structure Use Case
//!
//! Snapshot the broker and run the guard for one structure.

use std::sync::Arc;

use crate::application::ports::{BrokerError, BrokerPort};
use crate::application::services::SnapshotService;
use crate::domain::option_position::Structure;
use crate::domain::reconciliation::{GuardEvaluation, evaluate};

/// Use case for deciding NEW / REPRICE_EXISTING / SKIP against live state.
pub struct ReconcileStructureUseCase<B>
where
    B: BrokerPort,
{
    snapshots: Arc<SnapshotService<B>>,
}

impl<B> ReconcileStructureUseCase<B>
where
    B: BrokerPort,
{
    /// Create a new ReconcileStructureUseCase.
    pub const fn new(snapshots: Arc<SnapshotService<B>>) -> Self {
        Self { snapshots }
    }

    /// Evaluate the guard for `structure` at `target_qty` units.
    pub async fn execute(
        &self,
        structure: &Structure,
        target_qty: u32,
    ) -> Result<GuardEvaluation, BrokerError> {
        // Orders before positions: a fill landing between the two reads then
        // shows up as a position instead of vanishing from both.
        let working = self
            .snapshots
            .working_orders_matching(&structure.leg_keys())
            .await?;
        let positions = self.snapshots.positions().await?;
        let evaluation = evaluate(structure, target_qty, &positions, &working);

        tracing::info!(
            structure = %structure.canonical_key(),
            decision = evaluation.decision.label(),
            reason = evaluation.decision.reason_code().unwrap_or(""),
            remainder = evaluation.decision.remainder(),
            units_open = evaluation.units_open,
            working_orders = evaluation.working_order_ids.len(),
            "Guard evaluated"
        );

        Ok(evaluation)
    }
}
