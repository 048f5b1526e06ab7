//! Folding bill records into per-member net balances

use serde::{Deserialize, Serialize};

use crate::types::*;
use crate::utils::validation::check_bill_invariants;

/// Result of folding a sequence of bills
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Aggregation {
    /// Full-precision balances; round only when reporting
    pub balances: Balances,
    /// Records left out because they broke a bill invariant
    pub rejected: Vec<RejectedBill>,
    pub bills_applied: usize,
    pub bills_skipped_settled: usize,
}

impl Aggregation {
    pub fn has_rejections(&self) -> bool {
        !self.rejected.is_empty()
    }
}

/// Turns bill records into signed net balances
///
/// Each bill credits its payer with the full amount and debits every
/// participant with an equal share. Settled bills are ignored and invalid
/// ones are reported without stopping the fold.
#[derive(Debug, Clone, Copy, Default)]
pub struct LedgerAggregator;

impl LedgerAggregator {
    pub fn new() -> Self {
        Self
    }

    pub fn aggregate<'a, I>(&self, bills: I) -> Aggregation
    where
        I: IntoIterator<Item = &'a BillRecord>,
    {
        let mut aggregation = Aggregation::default();

        for (index, bill) in bills.into_iter().enumerate() {
            if bill.settled {
                tracing::debug!(bill_id = %bill.id, "skipping settled bill");
                aggregation.bills_skipped_settled += 1;
                continue;
            }

            if let Err(reason) = check_bill_invariants(bill) {
                tracing::warn!(bill_id = %bill.id, index, %reason, "rejecting bill");
                aggregation.rejected.push(RejectedBill {
                    index,
                    bill_id: bill.id.clone(),
                    reason,
                });
                continue;
            }

            let Some(share) = bill.share_per_person() else {
                continue;
            };
            for member in &bill.split_between {
                aggregation.balances.debit(member, &share);
            }
            aggregation.balances.credit(&bill.paid_by, &bill.amount);
            aggregation.bills_applied += 1;
        }

        tracing::debug!(
            applied = aggregation.bills_applied,
            rejected = aggregation.rejected.len(),
            skipped_settled = aggregation.bills_skipped_settled,
            members = aggregation.balances.len(),
            "aggregated bills"
        );

        aggregation
    }
}
