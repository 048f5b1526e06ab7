use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use household_ledger::{
    utils::{cent, is_negligible, round_half_up},
    BillId, BillRecord, HouseholdId, LedgerAggregator, MemberId, SettlementPlanner,
};
use proptest::prelude::*;

const MEMBERS: [&str; 6] = ["ana", "ben", "cleo", "dev", "eli", "fay"];

/// Bills over a fixed roster: amount in `unit`s, a payer index and a split mask
fn bills_in_units(unit: BigDecimal) -> impl Strategy<Value = Vec<BillRecord>> {
    prop::collection::vec((1i64..=50_000, 0usize..6, 1u8..64), 0..=25).prop_map(move |raw| {
        raw.into_iter()
            .enumerate()
            .map(|(idx, (units, payer, mask))| {
                let split = MEMBERS
                    .iter()
                    .enumerate()
                    .filter(|(bit, _)| mask & (1 << bit) != 0)
                    .map(|(_, id)| MemberId::from(*id))
                    .collect();
                BillRecord::new(
                    BillId::new(format!("bill-{idx}")),
                    HouseholdId::from("home"),
                    format!("expense {idx}"),
                    &unit * BigDecimal::from(units),
                    MemberId::from(MEMBERS[payer]),
                    split,
                    NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
                )
            })
            .collect()
    })
}

/// Arbitrary amounts in cents
fn bills_strategy() -> impl Strategy<Value = Vec<BillRecord>> {
    bills_in_units(BigDecimal::new(1.into(), 2))
}

/// Amounts of a few cents, where rounding residue dominates
fn tiny_bills_strategy() -> impl Strategy<Value = Vec<BillRecord>> {
    bills_in_units(BigDecimal::new(1.into(), 4)).prop_map(|bills| {
        bills
            .into_iter()
            .map(|mut bill| {
                bill.amount = round_half_up(&bill.amount, 2).max(cent());
                bill
            })
            .collect()
    })
}

proptest! {
    #[test]
    fn balances_sum_to_zero(bills in bills_strategy()) {
        let aggregation = LedgerAggregator::new().aggregate(&bills);
        prop_assert!(aggregation.rejected.is_empty());
        prop_assert!(is_negligible(&aggregation.balances.total(), &cent()));
    }

    #[test]
    fn settlement_never_suggests_negligible_transfers(bills in bills_strategy()) {
        let balances = LedgerAggregator::new().aggregate(&bills).balances;
        let plan = SettlementPlanner::default().plan(&balances);

        prop_assert!(plan
            .transfers
            .iter()
            .all(|t| !is_negligible(&t.amount, &cent()) && round_half_up(&t.amount, 2) == t.amount));
    }

    #[test]
    fn settlement_clears_all_balances(bills in bills_strategy()) {
        let balances = LedgerAggregator::new().aggregate(&bills).balances;
        let plan = SettlementPlanner::default().plan(&balances);

        prop_assert!(plan.is_balanced());
        for (_, balance) in &plan.apply_to(&balances) {
            prop_assert!(is_negligible(balance, &cent()));
        }
    }

    #[test]
    fn settlement_clears_cent_sized_bills(bills in tiny_bills_strategy()) {
        let balances = LedgerAggregator::new().aggregate(&bills).balances;
        let plan = SettlementPlanner::default().plan(&balances);

        prop_assert!(plan.is_balanced());
        for (_, balance) in &plan.apply_to(&balances) {
            prop_assert!(is_negligible(balance, &cent()));
        }
    }

    #[test]
    fn bill_order_does_not_change_the_outcome(bills in bills_strategy()) {
        let forward = LedgerAggregator::new().aggregate(&bills).balances;
        let mut reversed_bills = bills.clone();
        reversed_bills.reverse();
        let backward = LedgerAggregator::new().aggregate(&reversed_bills).balances;

        prop_assert_eq!(&forward, &backward);

        let planner = SettlementPlanner::default();
        prop_assert_eq!(planner.plan(&forward), planner.plan(&backward));
    }

    #[test]
    fn rounding_twice_is_a_no_op(cents in -10_000_000i64..10_000_000, extra in 0u32..1000) {
        let value = BigDecimal::new(cents.into(), 2) + BigDecimal::new(extra.into(), 5);
        let once = round_half_up(&value, 2);
        prop_assert_eq!(round_half_up(&once, 2), once);
    }
}
