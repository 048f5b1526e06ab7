//! Decimal helpers shared by the aggregator and the planner

use bigdecimal::{BigDecimal, RoundingMode};

use crate::types::{Balances, MemberId};

/// Round `value` to `scale` decimal places, halves away from zero
pub fn round_half_up(value: &BigDecimal, scale: i64) -> BigDecimal {
    value.with_scale_round(scale, RoundingMode::HalfUp)
}

/// Whether `value` is closer to zero than `tolerance`
///
/// The tolerance itself is the smallest meaningful amount, so a balance of
/// exactly one cent still needs settling.
pub fn is_negligible(value: &BigDecimal, tolerance: &BigDecimal) -> bool {
    value.abs() < *tolerance
}

/// One hundredth, the default tolerance and smallest displayed unit
pub fn cent() -> BigDecimal {
    BigDecimal::from(1) / BigDecimal::from(100)
}

/// Smallest step representable with `scale` decimal places
pub fn unit(scale: i64) -> BigDecimal {
    BigDecimal::new(1.into(), scale)
}

/// Round every balance to `scale` places so the results add up to the
/// rounded total of the input
///
/// Members are rounded half-up first. The drift against the rounded total is
/// then removed one unit at a time, starting with the members whose rounding
/// moved them furthest in the direction of the drift (ties by member id).
/// No member ends up a whole unit away from its exact balance.
pub fn round_preserving_total(balances: &Balances, scale: i64) -> Balances {
    let zero = BigDecimal::from(0);
    let step = unit(scale);
    let target = round_half_up(&balances.total(), scale);

    let mut entries: Vec<(MemberId, BigDecimal, BigDecimal)> = balances
        .iter()
        .map(|(member, exact)| {
            let rounded = round_half_up(exact, scale);
            let error = &rounded - exact;
            (member.clone(), rounded, error)
        })
        .collect();

    let mut drift = entries
        .iter()
        .fold(BigDecimal::from(0), |sum, (_, rounded, _)| sum + rounded)
        - &target;
    if drift == zero {
        return entries.into_iter().map(|(member, rounded, _)| (member, rounded)).collect();
    }

    let pull_down = drift > zero;
    entries.sort_by(|a, b| {
        let by_error = if pull_down { b.2.cmp(&a.2) } else { a.2.cmp(&b.2) };
        by_error.then_with(|| a.0.cmp(&b.0))
    });

    for (_, rounded, _) in entries.iter_mut() {
        if drift == zero {
            break;
        }
        if pull_down {
            *rounded -= &step;
            drift -= &step;
        } else {
            *rounded += &step;
            drift += &step;
        }
    }

    entries.into_iter().map(|(member, rounded, _)| (member, rounded)).collect()
}
