//! Greedy settlement planning over net balances
//!
//! Balances are first rounded to the settlement scale in a way that keeps
//! their total, so a ledger that nets to zero still nets to exactly zero.
//! Creditors (positive balance) and debtors (negative balance) are then each
//! sorted by descending absolute balance, ties broken by ascending member id.
//! Two cursors walk both lists: every step moves `min(|debt|, credit)` from
//! the current debtor to the current creditor and advances whichever side has
//! been paid down below the tolerance.
//!
//! Members below the tolerance are left out of that pass. If it strands a
//! member on one side, the stranded amount is swept against whatever is still
//! open on the other side, small balances included.
//!
//! The plan is not guaranteed to use the fewest possible transfers, but it is
//! deterministic and linear after sorting.

use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use crate::types::*;
use crate::utils::money::{cent, is_negligible, round_preserving_total};

/// Ordered transfers plus any leftover the matching could not place
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SettlementPlan {
    pub transfers: Vec<SettlementTransfer>,
    /// Set when the input balances did not sum to zero
    pub unbalanced: Option<UnbalancedLedger>,
}

impl SettlementPlan {
    pub fn is_balanced(&self) -> bool {
        self.unbalanced.is_none()
    }

    /// Balances after every transfer of the plan has been paid
    pub fn apply_to(&self, balances: &Balances) -> Balances {
        let mut after = balances.clone();
        for transfer in &self.transfers {
            after.credit(&transfer.from, &transfer.amount);
            after.debit(&transfer.to, &transfer.amount);
        }
        after
    }
}

/// Greedy two-pointer settlement planner
#[derive(Debug, Clone)]
pub struct SettlementPlanner {
    tolerance: BigDecimal,
    scale: i64,
}

impl Default for SettlementPlanner {
    fn default() -> Self {
        Self::new(cent())
    }
}

impl SettlementPlanner {
    /// Planner settling to cents with the given tolerance
    pub fn new(tolerance: BigDecimal) -> Self {
        Self {
            tolerance,
            scale: 2,
        }
    }

    /// Decimal places transfer amounts are expressed in
    ///
    /// The tolerance should be at least one unit at this scale.
    pub fn with_scale(mut self, scale: i64) -> Self {
        self.scale = scale;
        self
    }

    pub fn tolerance(&self) -> &BigDecimal {
        &self.tolerance
    }

    pub fn scale(&self) -> i64 {
        self.scale
    }

    /// Plan transfers for full-precision balances
    ///
    /// The ledger is reported as unbalanced when the balances, rounded to the
    /// settlement scale, do not total zero within the tolerance.
    pub fn plan(&self, balances: &Balances) -> SettlementPlan {
        let zero = BigDecimal::from(0);
        let net_total = balances.total();
        let quantized = round_preserving_total(balances, self.scale);
        let quantized_total = quantized.total();

        let mut creditors: Vec<(MemberId, BigDecimal)> = Vec::new();
        let mut debtors: Vec<(MemberId, BigDecimal)> = Vec::new();
        for (member, balance) in quantized {
            if balance > zero {
                creditors.push((member, balance));
            } else if balance < zero {
                // debts are tracked as positive magnitudes
                debtors.push((member, balance.abs()));
            }
        }
        creditors.sort_by(largest_first);
        debtors.sort_by(largest_first);

        let mut transfers = Vec::new();
        let tolerance = &self.tolerance;

        // sorting puts members below the tolerance last
        let main_debtors = open_positions(&debtors, |owed| !is_negligible(owed, tolerance));
        let main_creditors = open_positions(&creditors, |owed| !is_negligible(owed, tolerance));
        match_greedy(
            &mut debtors,
            &main_debtors,
            &mut creditors,
            &main_creditors,
            |left| is_negligible(left, tolerance),
            &mut transfers,
        );

        let stranded_debtors = open_positions(&debtors, |owed| !is_negligible(owed, tolerance));
        let stranded_creditors = open_positions(&creditors, |owed| !is_negligible(owed, tolerance));
        if !stranded_debtors.is_empty() {
            let pool = open_positions(&creditors, |owed| *owed > zero);
            match_greedy(
                &mut debtors,
                &stranded_debtors,
                &mut creditors,
                &pool,
                |left| *left == zero,
                &mut transfers,
            );
        } else if !stranded_creditors.is_empty() {
            let pool = open_positions(&debtors, |owed| *owed > zero);
            match_greedy(
                &mut debtors,
                &pool,
                &mut creditors,
                &stranded_creditors,
                |left| *left == zero,
                &mut transfers,
            );
        }

        let unbalanced = if is_negligible(&quantized_total, tolerance) {
            None
        } else {
            let unmatched: Vec<(MemberId, BigDecimal)> = debtors
                .iter()
                .filter(|(_, owed)| !is_negligible(owed, tolerance))
                .map(|(member, owed)| (member.clone(), -owed.clone()))
                .chain(
                    creditors
                        .iter()
                        .filter(|(_, owed)| !is_negligible(owed, tolerance))
                        .cloned(),
                )
                .collect();
            tracing::warn!(
                %net_total,
                unmatched = unmatched.len(),
                "balances do not net to zero; settlement plan is partial"
            );
            Some(UnbalancedLedger {
                net_total,
                unmatched,
            })
        };

        tracing::debug!(
            transfers = transfers.len(),
            members = balances.len(),
            "planned settlement"
        );

        SettlementPlan {
            transfers,
            unbalanced,
        }
    }
}

fn largest_first(a: &(MemberId, BigDecimal), b: &(MemberId, BigDecimal)) -> Ordering {
    b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0))
}

/// Indices of the entries whose remaining amount satisfies `open`, in order
fn open_positions(
    entries: &[(MemberId, BigDecimal)],
    open: impl Fn(&BigDecimal) -> bool,
) -> Vec<usize> {
    entries
        .iter()
        .enumerate()
        .filter(|(_, (_, amount))| open(amount))
        .map(|(idx, _)| idx)
        .collect()
}

/// Two-pointer matching of the selected debtors against the selected
/// creditors; a cursor moves on once `done` holds for its remaining amount
fn match_greedy(
    debtors: &mut [(MemberId, BigDecimal)],
    debtor_order: &[usize],
    creditors: &mut [(MemberId, BigDecimal)],
    creditor_order: &[usize],
    done: impl Fn(&BigDecimal) -> bool,
    transfers: &mut Vec<SettlementTransfer>,
) {
    let zero = BigDecimal::from(0);
    let (mut d, mut c) = (0, 0);

    while d < debtor_order.len() && c < creditor_order.len() {
        let debtor = &mut debtors[debtor_order[d]];
        let creditor = &mut creditors[creditor_order[c]];
        let amount = debtor.1.clone().min(creditor.1.clone());

        if amount > zero {
            debtor.1 -= &amount;
            creditor.1 -= &amount;
            transfers.push(SettlementTransfer {
                from: debtor.0.clone(),
                to: creditor.0.clone(),
                amount,
            });
        }

        if done(&debtor.1) {
            d += 1;
        }
        if done(&creditor.1) {
            c += 1;
        }
    }
}
