//! Guard scenarios against a paper account.
//!
//! Positions and working orders are seeded on the paper broker and read
//! back through the snapshot service, so leg-key resolution and order
//! matching run exactly as they do against a live broker.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use test_case::test_case;

use spread_engine::application::ports::SpreadOrderRequest;
use spread_engine::application::services::SnapshotService;
use spread_engine::application::use_cases::ReconcileStructureUseCase;
use spread_engine::domain::option_position::{
    CondorSpec, ShortPlacement, SpreadSide, Strike, Structure, build_condor,
};
use spread_engine::domain::reconciliation::{
    GuardDecision, OrderStatus, RepriceReason, SkipReason,
};
use spread_engine::infrastructure::broker::PaperBroker;

fn condor(side: SpreadSide) -> Structure {
    build_condor(&CondorSpec {
        root: "SPXW".to_string(),
        expiration: NaiveDate::from_ymd_opt(2025, 12, 19).unwrap(),
        inner_put: Strike::from_points(5800),
        inner_call: Strike::from_points(5900),
        put_width: Strike::from_points(20),
        call_width: Strike::from_points(20),
        side,
        placement: ShortPlacement::SameShorts,
        quantity: 1,
    })
    .unwrap()
}

/// Hold `units` of every leg in the direction the structure opens it.
fn hold(broker: &PaperBroker, structure: &Structure, units: i64) {
    for leg in structure.legs() {
        broker.add_position(&leg.symbol, Decimal::from(leg.role.sign() * units));
    }
}

fn guard(broker: &Arc<PaperBroker>) -> ReconcileStructureUseCase<PaperBroker> {
    let snapshots = SnapshotService::new(Arc::clone(broker), "SPXW", Duration::from_secs(86_400));
    ReconcileStructureUseCase::new(Arc::new(snapshots))
}

#[test_case(0, 4, GuardDecision::New { remainder: 4 } ; "A: flat account opens the full target")]
#[test_case(2, 4, GuardDecision::New { remainder: 2 } ; "B: aligned units reduce the remainder")]
#[test_case(4, 4, GuardDecision::Skip { reason: SkipReason::AtOrAboveTarget } ; "C: target already held")]
#[test_case(6, 4, GuardDecision::Skip { reason: SkipReason::AtOrAboveTarget } ; "above target")]
#[tokio::test]
async fn aligned_holdings(units: i64, target: u32, expected: GuardDecision) {
    let structure = condor(SpreadSide::Credit);
    let broker = Arc::new(PaperBroker::new());
    hold(&broker, &structure, units);

    let evaluation = guard(&broker).execute(&structure, target).await.unwrap();

    assert_eq!(evaluation.decision, expected);
    assert!(evaluation.decision.remainder() <= target);
}

#[test_case(0 ; "long put wing")]
#[test_case(1 ; "short put")]
#[test_case(2 ; "short call")]
#[test_case(3 ; "long call wing")]
#[tokio::test]
async fn d_single_opposite_leg_would_close(flipped: usize) {
    let structure = condor(SpreadSide::Credit);
    let broker = Arc::new(PaperBroker::new());
    hold(&broker, &structure, 2);
    let leg = &structure.legs()[flipped];
    // Net the leg to one contract against the opening direction.
    broker.add_position(&leg.symbol, Decimal::from(-leg.role.sign() * 3));

    let evaluation = guard(&broker).execute(&structure, 4).await.unwrap();

    assert_eq!(
        evaluation.decision,
        GuardDecision::Skip {
            reason: SkipReason::WouldClose
        }
    );
}

#[tokio::test]
async fn would_close_dominates_a_working_order() {
    let structure = condor(SpreadSide::Credit);
    let broker = Arc::new(PaperBroker::new());
    broker.seed_working_order(&SpreadOrderRequest::net(&structure, 4, dec!(1.50)));
    let leg = &structure.legs()[1];
    broker.add_position(&leg.symbol, Decimal::from(-leg.role.sign()));

    let evaluation = guard(&broker).execute(&structure, 4).await.unwrap();

    assert_eq!(
        evaluation.decision,
        GuardDecision::Skip {
            reason: SkipReason::WouldClose
        }
    );
}

#[tokio::test]
async fn matching_working_order_is_repriced() {
    let structure = condor(SpreadSide::Credit);
    let broker = Arc::new(PaperBroker::new());
    let id = broker.seed_working_order(&SpreadOrderRequest::net(&structure, 4, dec!(1.50)));

    let evaluation = guard(&broker).execute(&structure, 4).await.unwrap();

    assert_eq!(
        evaluation.decision,
        GuardDecision::RepriceExisting {
            remainder: 4,
            reason: RepriceReason::WorkingOrder
        }
    );
    assert_eq!(evaluation.working_order_ids, vec![id]);
}

#[test_case(OrderStatus::PendingReplace ; "pending replace")]
#[test_case(OrderStatus::PendingCancel ; "pending cancel")]
#[test_case(OrderStatus::New ; "new")]
#[test_case(OrderStatus::Unknown ; "unrecognized status")]
#[tokio::test]
async fn in_flight_order_blocks_a_new_submission(status: OrderStatus) {
    let structure = condor(SpreadSide::Credit);
    let broker = Arc::new(PaperBroker::new());
    let id = broker.seed_working_order(&SpreadOrderRequest::net(&structure, 1, dec!(1.50)));
    broker.set_order_status(&id, status);

    let evaluation = guard(&broker).execute(&structure, 1).await.unwrap();

    assert_eq!(
        evaluation.decision,
        GuardDecision::RepriceExisting {
            remainder: 1,
            reason: RepriceReason::WorkingOrder
        }
    );
    assert_eq!(evaluation.working_order_ids, vec![id]);
}

#[test_case(OrderStatus::Canceled ; "canceled")]
#[test_case(OrderStatus::Replaced ; "replaced")]
#[test_case(OrderStatus::Rejected ; "rejected")]
#[tokio::test]
async fn terminal_order_does_not_block(status: OrderStatus) {
    let structure = condor(SpreadSide::Credit);
    let broker = Arc::new(PaperBroker::new());
    let id = broker.seed_working_order(&SpreadOrderRequest::net(&structure, 1, dec!(1.50)));
    broker.set_order_status(&id, status);

    let evaluation = guard(&broker).execute(&structure, 1).await.unwrap();

    assert_eq!(evaluation.decision, GuardDecision::New { remainder: 1 });
    assert!(evaluation.working_order_ids.is_empty());
}

#[tokio::test]
async fn order_on_other_legs_is_ignored() {
    let structure = condor(SpreadSide::Credit);
    let other = build_condor(&CondorSpec {
        root: "SPXW".to_string(),
        expiration: NaiveDate::from_ymd_opt(2025, 12, 19).unwrap(),
        inner_put: Strike::from_points(5750),
        inner_call: Strike::from_points(5900),
        put_width: Strike::from_points(20),
        call_width: Strike::from_points(20),
        side: SpreadSide::Credit,
        placement: ShortPlacement::SameShorts,
        quantity: 1,
    })
    .unwrap();
    let broker = Arc::new(PaperBroker::new());
    broker.seed_working_order(&SpreadOrderRequest::net(&other, 1, dec!(1.50)));

    let evaluation = guard(&broker).execute(&structure, 1).await.unwrap();
    assert_eq!(evaluation.decision, GuardDecision::New { remainder: 1 });
    assert!(evaluation.working_order_ids.is_empty());
}

#[tokio::test]
async fn half_filled_condor_is_continued_not_reopened() {
    let structure = condor(SpreadSide::Credit);
    let broker = Arc::new(PaperBroker::new());
    // Put wing filled, call wing flat.
    for leg in &structure.legs()[..2] {
        broker.add_position(&leg.symbol, Decimal::from(leg.role.sign()));
    }

    let first = guard(&broker).execute(&structure, 3).await.unwrap();
    let second = guard(&broker).execute(&structure, 3).await.unwrap();

    assert_eq!(
        first.decision,
        GuardDecision::RepriceExisting {
            remainder: 3,
            reason: RepriceReason::PartialOverlap
        }
    );
    assert_eq!(first.units_open, 0);
    assert_eq!(first, second);
}
