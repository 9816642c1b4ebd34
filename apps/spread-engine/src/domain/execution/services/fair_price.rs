//! Fair Price
//!
//! Net price for a structure from per-leg midpoints. Credits are quoted as
//! the positive amount received (sell mids minus buy mids); debits as the
//! positive amount paid.

use std::collections::HashMap;

use rust_decimal::{Decimal, RoundingStrategy};

use crate::domain::execution::value_objects::{PricingKnobs, Quote};
use crate::domain::option_position::{CanonicalLegKey, LegRole, Structure};

/// Round `price` to the nearest multiple of `tick` (halves away from zero).
#[must_use]
pub fn round_to_tick(price: Decimal, tick: Decimal) -> Decimal {
    if tick <= Decimal::ZERO {
        return price;
    }
    (price / tick).round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero) * tick
}

/// Midpoint for every leg, or `None` if any leg lacks a two-sided quote.
#[must_use]
pub fn leg_mids(
    structure: &Structure,
    quotes: &HashMap<CanonicalLegKey, Quote>,
) -> Option<Vec<(LegRole, Decimal)>> {
    structure
        .legs()
        .iter()
        .map(|leg| {
            quotes
                .get(leg.key())
                .and_then(Quote::mid)
                .map(|mid| (leg.role, mid))
        })
        .collect()
}

/// Price to submit: mid net, conceded by `edge`, rounded to tick, clamped.
///
/// Falls back to `knobs.fallback_price` when a leg has no usable quote;
/// returns `None` if there is neither.
#[must_use]
pub fn fair_price(
    structure: &Structure,
    quotes: &HashMap<CanonicalLegKey, Quote>,
    knobs: &PricingKnobs,
) -> Option<Decimal> {
    let raw = match leg_mids(structure, quotes) {
        Some(mids) => {
            let credit_net: Decimal = mids
                .iter()
                .map(|(role, mid)| match role {
                    LegRole::OpenShort => *mid,
                    LegRole::OpenLong => -*mid,
                })
                .sum();
            if structure.side().is_credit() {
                credit_net - knobs.edge
            } else {
                -credit_net + knobs.edge
            }
        }
        None => knobs.fallback_price?,
    };
    Some(clamp(round_to_tick(raw, knobs.tick), knobs))
}

fn clamp(price: Decimal, knobs: &PricingKnobs) -> Decimal {
    let floored = price.max(knobs.min_price);
    knobs.max_price.map_or(floored, |cap| floored.min(cap))
}

/// True when `new` differs from `previous` by at least one tick.
#[must_use]
pub fn price_moved(previous: Option<Decimal>, new: Decimal, tick: Decimal) -> bool {
    previous.is_none_or(|prev| (new - prev).abs() >= tick)
}
