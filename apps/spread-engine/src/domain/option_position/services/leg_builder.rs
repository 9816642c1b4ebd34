//! Leg Builder
//!
//! Turns signal strikes into oriented legs. In every wing the leg nearer
//! the money is short for a credit and long for a debit; the outer leg
//! takes the opposite role.

use chrono::NaiveDate;

use crate::domain::option_position::errors::OptionPositionError;
use crate::domain::option_position::value_objects::{
    LegIntent, OptionRight, OptionSymbol, ShortPlacement, SpreadSide, Strike, Structure,
};

/// Inputs for a four-leg condor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CondorSpec {
    /// Option root (e.g. `SPXW`).
    pub root: String,
    /// Expiration shared by all legs.
    pub expiration: NaiveDate,
    /// Put-side inner strike from the signal.
    pub inner_put: Strike,
    /// Call-side inner strike from the signal.
    pub inner_call: Strike,
    /// Put wing width.
    pub put_width: Strike,
    /// Call wing width.
    pub call_width: Strike,
    /// Credit or debit.
    pub side: SpreadSide,
    /// Short strike placement.
    pub placement: ShortPlacement,
    /// Contracts per leg.
    pub quantity: u32,
}

/// Inputs for a two-leg vertical.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerticalSpec {
    /// Option root.
    pub root: String,
    /// Expiration.
    pub expiration: NaiveDate,
    /// Wing right.
    pub right: OptionRight,
    /// Strike nearer the money.
    pub inner: Strike,
    /// Distance to the outer strike.
    pub width: Strike,
    /// Credit or debit.
    pub side: SpreadSide,
    /// Contracts per leg.
    pub quantity: u32,
}

/// Build an oriented iron condor.
pub fn build_condor(spec: &CondorSpec) -> Result<Structure, OptionPositionError> {
    check_common(spec.quantity, &[spec.put_width, spec.call_width])?;

    let (inner_put, inner_call) = match spec.placement {
        ShortPlacement::SameShorts => (spec.inner_put, spec.inner_call),
        ShortPlacement::PushedOut { offset } => {
            if !spec.side.is_credit() {
                return Err(OptionPositionError::invalid(
                    "pushed-out shorts apply to credit structures only",
                ));
            }
            if !offset.is_positive() {
                return Err(OptionPositionError::invalid("push-out offset must be positive"));
            }
            (
                sub(spec.inner_put, offset)?,
                add(spec.inner_call, offset)?,
            )
        }
    };

    if inner_put >= inner_call {
        return Err(OptionPositionError::invalid(format!(
            "put wing ({inner_put}) must sit below call wing ({inner_call})"
        )));
    }

    let [put_low, put_high] = wing(
        &spec.root,
        spec.expiration,
        OptionRight::Put,
        inner_put,
        spec.put_width,
        spec.side,
        spec.quantity,
    )?;
    let [call_low, call_high] = wing(
        &spec.root,
        spec.expiration,
        OptionRight::Call,
        inner_call,
        spec.call_width,
        spec.side,
        spec.quantity,
    )?;

    Ok(Structure::IronCondor {
        side: spec.side,
        put_width: spec.put_width,
        call_width: spec.call_width,
        placement: spec.placement,
        legs: [put_low, put_high, call_low, call_high],
    })
}

/// Build an oriented vertical.
pub fn build_vertical(spec: &VerticalSpec) -> Result<Structure, OptionPositionError> {
    check_common(spec.quantity, &[spec.width])?;
    let legs = wing(
        &spec.root,
        spec.expiration,
        spec.right,
        spec.inner,
        spec.width,
        spec.side,
        spec.quantity,
    )?;
    Ok(Structure::Vertical {
        side: spec.side,
        right: spec.right,
        width: spec.width,
        legs,
    })
}

fn check_common(quantity: u32, widths: &[Strike]) -> Result<(), OptionPositionError> {
    if quantity == 0 {
        return Err(OptionPositionError::invalid("quantity must be at least 1"));
    }
    if widths.iter().any(|w| !w.is_positive()) {
        return Err(OptionPositionError::invalid("wing width must be positive"));
    }
    Ok(())
}

/// Two legs of one wing, ordered by strike.
fn wing(
    root: &str,
    expiration: NaiveDate,
    right: OptionRight,
    inner: Strike,
    width: Strike,
    side: SpreadSide,
    quantity: u32,
) -> Result<[LegIntent; 2], OptionPositionError> {
    let inner_role = side.inner_role();
    let inner_leg = |strike| -> Result<LegIntent, OptionPositionError> {
        Ok(LegIntent::new(
            OptionSymbol::build(root, expiration, right, strike)?,
            inner_role,
            quantity,
        ))
    };
    let outer_leg = |strike| -> Result<LegIntent, OptionPositionError> {
        Ok(LegIntent::new(
            OptionSymbol::build(root, expiration, right, strike)?,
            inner_role.flip(),
            quantity,
        ))
    };

    match right {
        OptionRight::Put => Ok([outer_leg(sub(inner, width)?)?, inner_leg(inner)?]),
        OptionRight::Call => Ok([inner_leg(inner)?, outer_leg(add(inner, width)?)?]),
    }
}

fn sub(a: Strike, b: Strike) -> Result<Strike, OptionPositionError> {
    a.checked_sub(b)
        .filter(|s| s.is_representable())
        .ok_or_else(|| OptionPositionError::invalid(format!("strike {a} - {b} is out of range")))
}

fn add(a: Strike, b: Strike) -> Result<Strike, OptionPositionError> {
    a.checked_add(b)
        .filter(|s| s.is_representable())
        .ok_or_else(|| OptionPositionError::invalid(format!("strike {a} + {b} is out of range")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::option_position::value_objects::LegRole;

    fn spec(side: SpreadSide) -> CondorSpec {
        CondorSpec {
            root: "SPXW".to_string(),
            expiration: NaiveDate::from_ymd_opt(2025, 12, 19).unwrap(),
            inner_put: Strike::from_points(100),
            inner_call: Strike::from_points(120),
            put_width: Strike::from_points(5),
            call_width: Strike::from_points(5),
            side,
            placement: ShortPlacement::SameShorts,
            quantity: 1,
        }
    }

    fn summary(structure: &Structure) -> Vec<(LegRole, OptionRight, i64)> {
        structure
            .legs()
            .iter()
            .map(|l| (l.role, l.symbol.right(), l.symbol.strike().mills() / 1000))
            .collect()
    }

    #[test]
    fn credit_condor_orientation() {
        let s = build_condor(&spec(SpreadSide::Credit)).unwrap();
        assert_eq!(
            summary(&s),
            vec![
                (LegRole::OpenLong, OptionRight::Put, 95),
                (LegRole::OpenShort, OptionRight::Put, 100),
                (LegRole::OpenShort, OptionRight::Call, 120),
                (LegRole::OpenLong, OptionRight::Call, 125),
            ]
        );
        assert_eq!(s.canonical_key(), "251219:P95-100:C120-125");
    }

    #[test]
    fn debit_condor_inverts_both_wings() {
        let s = build_condor(&spec(SpreadSide::Debit)).unwrap();
        assert_eq!(
            summary(&s),
            vec![
                (LegRole::OpenShort, OptionRight::Put, 95),
                (LegRole::OpenLong, OptionRight::Put, 100),
                (LegRole::OpenLong, OptionRight::Call, 120),
                (LegRole::OpenShort, OptionRight::Call, 125),
            ]
        );
    }

    #[test]
    fn pushed_out_shorts_move_away_from_money() {
        let mut s = spec(SpreadSide::Credit);
        s.placement = ShortPlacement::PushedOut {
            offset: Strike::from_points(5),
        };
        s.put_width = Strike::from_points(10);
        let built = build_condor(&s).unwrap();
        assert_eq!(
            summary(&built),
            vec![
                (LegRole::OpenLong, OptionRight::Put, 85),
                (LegRole::OpenShort, OptionRight::Put, 95),
                (LegRole::OpenShort, OptionRight::Call, 125),
                (LegRole::OpenLong, OptionRight::Call, 130),
            ]
        );
    }

    #[test]
    fn pushed_out_rejected_for_debit() {
        let mut s = spec(SpreadSide::Debit);
        s.placement = ShortPlacement::PushedOut {
            offset: Strike::from_points(5),
        };
        assert!(build_condor(&s).is_err());
    }

    #[test]
    fn crossed_wings_rejected() {
        let mut s = spec(SpreadSide::Credit);
        s.inner_put = Strike::from_points(120);
        assert!(build_condor(&s).is_err());
    }

    #[test]
    fn zero_width_and_quantity_rejected() {
        let mut s = spec(SpreadSide::Credit);
        s.call_width = Strike::ZERO;
        assert!(build_condor(&s).is_err());

        let mut s = spec(SpreadSide::Credit);
        s.quantity = 0;
        assert!(build_condor(&s).is_err());
    }

    #[test]
    fn negative_outer_strike_rejected() {
        let mut s = spec(SpreadSide::Credit);
        s.inner_put = Strike::from_points(3);
        assert!(build_condor(&s).is_err());
    }

    #[test]
    fn put_vertical_orientation() {
        let v = build_vertical(&VerticalSpec {
            root: "SPXW".to_string(),
            expiration: NaiveDate::from_ymd_opt(2025, 12, 19).unwrap(),
            right: OptionRight::Put,
            inner: Strike::from_points(100),
            width: Strike::from_points(5),
            side: SpreadSide::Credit,
            quantity: 2,
        })
        .unwrap();
        assert_eq!(
            summary(&v),
            vec![
                (LegRole::OpenLong, OptionRight::Put, 95),
                (LegRole::OpenShort, OptionRight::Put, 100),
            ]
        );
        assert_eq!(v.quantity(), 2);
        assert_eq!(v.canonical_key(), "251219:P95-100");
    }

    #[test]
    fn call_vertical_debit_orientation() {
        let v = build_vertical(&VerticalSpec {
            root: "SPXW".to_string(),
            expiration: NaiveDate::from_ymd_opt(2025, 12, 19).unwrap(),
            right: OptionRight::Call,
            inner: Strike::from_points(120),
            width: Strike::from_points(5),
            side: SpreadSide::Debit,
            quantity: 1,
        })
        .unwrap();
        assert_eq!(
            summary(&v),
            vec![
                (LegRole::OpenLong, OptionRight::Call, 120),
                (LegRole::OpenShort, OptionRight::Call, 125),
            ]
        );
    }

    #[test]
    fn with_quantity_resizes_every_leg() {
        let s = build_condor(&spec(SpreadSide::Credit)).unwrap().with_quantity(7);
        assert!(s.legs().iter().all(|l| l.quantity == 7));
        assert_eq!(s.leg_keys().len(), 4);
    }
}
