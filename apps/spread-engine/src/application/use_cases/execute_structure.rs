//! Execute Structure Use Case
//!
//! Bounded repricing loop. Every cycle re-derives the remainder from a fresh
//! snapshot, so fills that land between cycles are never resubmitted.
//!
//! # Cycle
//!
//! 1. Snapshot working orders and positions; remainder zero ends the loop.
//! 2. Keep one matching working order, cancel any duplicates.
//! 3. Price from live mids. No order working: place one. Order working and
//!    price moved by a tick or more: replace it.
//! 4. Sleep; past the budget or cycle limit, cancel and time out.

use std::collections::BTreeSet;
use std::sync::Arc;

use tokio::time::Instant;

use crate::application::ports::{BrokerError, BrokerPort, SpreadOrderRequest};
use crate::application::services::SnapshotService;
use crate::domain::execution::{
    ExecutionMode, ExecutionOutcome, ExecutionReport, ExecutionState, PricingKnobs, ReasonCode,
    fair_price, price_moved,
};
use crate::domain::option_position::{CanonicalLegKey, OptionSymbol, Structure};
use crate::domain::reconciliation::{
    GuardDecision, GuardEvaluation, SkipReason, evaluate, units_open,
};
use crate::domain::shared::BrokerId;

enum CycleStep {
    Continue,
    Filled,
    WouldClose,
}

/// Use case that drives a structure to its target quantity.
pub struct ExecuteStructureUseCase<B>
where
    B: BrokerPort,
{
    broker: Arc<B>,
    snapshots: Arc<SnapshotService<B>>,
    knobs: PricingKnobs,
}

impl<B> ExecuteStructureUseCase<B>
where
    B: BrokerPort,
{
    /// Create a new ExecuteStructureUseCase.
    pub const fn new(broker: Arc<B>, snapshots: Arc<SnapshotService<B>>, knobs: PricingKnobs) -> Self {
        Self {
            broker,
            snapshots,
            knobs,
        }
    }

    /// Pricing knobs in effect.
    pub const fn knobs(&self) -> &PricingKnobs {
        &self.knobs
    }

    /// Run the loop for a NEW or REPRICE_EXISTING decision.
    ///
    /// `structure` supplies legs and side; its leg quantity is ignored in
    /// favor of the remainder computed each cycle.
    pub async fn execute(
        &self,
        structure: &Structure,
        target_qty: u32,
        evaluation: &GuardEvaluation,
    ) -> ExecutionReport {
        let mode = match evaluation.decision {
            GuardDecision::New { .. } => ExecutionMode::New,
            _ => ExecutionMode::Reprice,
        };
        let mut state = ExecutionState::new(
            structure.clone(),
            target_qty,
            mode,
            evaluation.decision.remainder(),
        );
        let target_keys = structure.leg_keys();
        let deadline = Instant::now() + self.knobs.time_budget;

        tracing::info!(
            structure = %structure.canonical_key(),
            side = %structure.side(),
            target_qty,
            remainder = state.remainder,
            mode = ?mode,
            "Starting execution loop"
        );

        loop {
            state.cycle_count += 1;

            match self.run_cycle(&mut state, &target_keys).await {
                Ok(CycleStep::Continue) => state.consecutive_failures = 0,
                Ok(CycleStep::Filled) => {
                    return finish(&state, ExecutionOutcome::Success, ReasonCode::Filled, None);
                }
                Ok(CycleStep::WouldClose) => {
                    tracing::error!(
                        cycle = state.cycle_count,
                        "Positions now oppose the structure; stopping"
                    );
                    return self
                        .stop(&mut state, &target_keys, ExecutionOutcome::Abort, ReasonCode::WouldClose, None)
                        .await;
                }
                Err(err) if err.is_permanent() => {
                    tracing::error!(cycle = state.cycle_count, error = %err, "Permanent broker error");
                    return self
                        .stop(
                            &mut state,
                            &target_keys,
                            ExecutionOutcome::Abort,
                            ReasonCode::PermanentBrokerError,
                            Some(err.to_string()),
                        )
                        .await;
                }
                Err(err) => {
                    state.consecutive_failures += 1;
                    tracing::warn!(
                        cycle = state.cycle_count,
                        consecutive_failures = state.consecutive_failures,
                        error = %err,
                        "Transient broker error, will retry next cycle"
                    );
                    if state.consecutive_failures >= self.knobs.max_consecutive_failures {
                        return self
                            .stop(
                                &mut state,
                                &target_keys,
                                ExecutionOutcome::Abort,
                                ReasonCode::TransientRetriesExhausted,
                                Some(err.to_string()),
                            )
                            .await;
                    }
                }
            }

            if state.cycle_count >= self.knobs.max_cycles {
                return self
                    .stop(&mut state, &target_keys, ExecutionOutcome::Timeout, ReasonCode::MaxCycles, None)
                    .await;
            }

            let wake = std::cmp::min(Instant::now() + self.knobs.poll_interval, deadline);
            tokio::time::sleep_until(wake).await;

            if Instant::now() >= deadline {
                return self
                    .stop(
                        &mut state,
                        &target_keys,
                        ExecutionOutcome::Timeout,
                        ReasonCode::DeadlineExceeded,
                        None,
                    )
                    .await;
            }
        }
    }

    async fn run_cycle(
        &self,
        state: &mut ExecutionState,
        target_keys: &BTreeSet<CanonicalLegKey>,
    ) -> Result<CycleStep, BrokerError> {
        // Orders before positions, as in the guard use case.
        let working = self.snapshots.working_orders_matching(target_keys).await?;
        let positions = self.snapshots.positions().await?;
        let evaluation = evaluate(&state.structure, state.target_qty, &positions, &working);

        if matches!(
            evaluation.decision,
            GuardDecision::Skip {
                reason: SkipReason::WouldClose
            }
        ) {
            return Ok(CycleStep::WouldClose);
        }

        state.remainder = evaluation.decision.remainder();
        if state.remainder == 0 {
            for id in &evaluation.working_order_ids {
                self.cancel_quietly(id, "target reached").await;
            }
            tracing::info!(
                cycle = state.cycle_count,
                filled_qty = state.filled_qty(),
                "Target quantity reached"
            );
            return Ok(CycleStep::Filled);
        }

        let keep = evaluation
            .working_order_ids
            .iter()
            .find(|id| state.last_order_id.as_ref() == Some(*id))
            .or_else(|| evaluation.working_order_ids.first())
            .cloned();
        for id in &evaluation.working_order_ids {
            if Some(id) != keep.as_ref() {
                self.cancel_quietly(id, "duplicate working order").await;
            }
        }

        let symbols: Vec<OptionSymbol> = state
            .structure
            .legs()
            .iter()
            .map(|leg| leg.symbol.clone())
            .collect();
        let quotes = self.broker.get_quotes(&symbols).await?;
        let Some(price) = fair_price(&state.structure, &quotes, &self.knobs) else {
            tracing::warn!(
                cycle = state.cycle_count,
                quoted_legs = quotes.len(),
                "Missing two-sided quotes, holding this cycle"
            );
            return Ok(CycleStep::Continue);
        };

        let order = SpreadOrderRequest::net(&state.structure, state.remainder, price);
        match keep {
            None => {
                let order_id = self.broker.place_order(&order).await?;
                tracing::info!(
                    cycle = state.cycle_count,
                    order_id = %order_id,
                    price = %price,
                    quantity = state.remainder,
                    "Placed order"
                );
                state.record_submission(order_id, price);
            }
            Some(order_id) if price_moved(state.last_submitted_price, price, self.knobs.tick) => {
                let new_id = self.broker.replace_order(&order_id, &order).await?;
                tracing::info!(
                    cycle = state.cycle_count,
                    old_order_id = %order_id,
                    order_id = %new_id,
                    previous_price = ?state.last_submitted_price,
                    price = %price,
                    quantity = state.remainder,
                    "Replaced order"
                );
                state.record_submission(new_id, price);
            }
            Some(order_id) => {
                tracing::debug!(
                    cycle = state.cycle_count,
                    order_id = %order_id,
                    price = %price,
                    "Price unchanged, leaving order working"
                );
                state.last_order_id.get_or_insert(order_id);
            }
        }

        Ok(CycleStep::Continue)
    }

    /// Cancel everything still working, refresh the remainder, and report.
    ///
    /// A fill that lands before the cancel is reported as success.
    async fn stop(
        &self,
        state: &mut ExecutionState,
        target_keys: &BTreeSet<CanonicalLegKey>,
        outcome: ExecutionOutcome,
        reason: ReasonCode,
        detail: Option<String>,
    ) -> ExecutionReport {
        match self.snapshots.working_orders_matching(target_keys).await {
            Ok(working) => {
                for order in &working {
                    self.cancel_quietly(&order.id, "loop stopping").await;
                }
            }
            Err(err) => {
                tracing::warn!(error = %err, "Could not list working orders for cleanup");
                if let Some(id) = state.last_order_id.clone() {
                    self.cancel_quietly(&id, "loop stopping").await;
                }
            }
        }

        if let Ok(positions) = self.snapshots.positions().await {
            let units = units_open(state.structure.legs(), &positions);
            state.remainder = state.target_qty.saturating_sub(units);
        }

        if state.remainder == 0 {
            return finish(state, ExecutionOutcome::Success, ReasonCode::Filled, None);
        }
        finish(state, outcome, reason, detail)
    }

    async fn cancel_quietly(&self, order_id: &BrokerId, why: &str) {
        match self.broker.cancel_order(order_id).await {
            Ok(()) => tracing::info!(order_id = %order_id, reason = why, "Canceled order"),
            Err(err) => tracing::warn!(order_id = %order_id, reason = why, error = %err, "Cancel failed"),
        }
    }
}

fn finish(
    state: &ExecutionState,
    outcome: ExecutionOutcome,
    reason: ReasonCode,
    detail: Option<String>,
) -> ExecutionReport {
    let report = ExecutionReport::from_state(state, outcome, reason, detail);
    tracing::info!(
        outcome = ?report.outcome,
        reason = %report.reason,
        remainder = report.remainder,
        filled_qty = report.filled_qty,
        last_price = ?report.last_price,
        order_id = ?report.last_order_id.as_ref().map(BrokerId::as_str),
        cycles = report.cycles,
        "Execution finished"
    );
    report
}
