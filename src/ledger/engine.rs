//! Engine facade combining aggregation, settlement planning and display

use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;
use crate::ledger::{LedgerAggregator, SettlementPlan, SettlementPlanner};
use crate::types::*;
use crate::utils::money::round_half_up;

/// Balances of one household
///
/// `balances` is rounded for display. Settlement planning takes `exact`: the
/// rounded values need not total zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BalanceReport {
    pub household_id: HouseholdId,
    pub balances: Balances,
    #[serde(skip)]
    pub exact: Balances,
    pub rejected: Vec<RejectedBill>,
}

/// Settlement plan with member names resolved
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SettlementSummary {
    pub transfers: Vec<TransferView>,
    pub unbalanced: Option<UnbalancedLedger>,
}

impl SettlementSummary {
    pub fn is_balanced(&self) -> bool {
        self.unbalanced.is_none()
    }
}

/// Pure entry point for computing balances and settlements
///
/// Holds no state besides its configuration, so one engine can serve any
/// number of concurrent callers.
#[derive(Debug, Clone, Default)]
pub struct SettlementEngine {
    config: EngineConfig,
}

impl SettlementEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an engine with a validated configuration
    pub fn with_config(config: EngineConfig) -> LedgerResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn aggregator(&self) -> LedgerAggregator {
        LedgerAggregator::new()
    }

    pub fn planner(&self) -> SettlementPlanner {
        SettlementPlanner::new(self.config.tolerance.clone()).with_scale(self.config.display_scale)
    }

    /// Net balance per member over the household's unsettled bills, both at
    /// full precision and rounded to the display scale
    pub fn compute_balances(&self, household_id: &HouseholdId, bills: &[BillRecord]) -> BalanceReport {
        let aggregation = self.aggregator().aggregate(bills);
        tracing::debug!(
            household = %household_id,
            members = aggregation.balances.len(),
            "computed household balances"
        );

        BalanceReport {
            household_id: household_id.clone(),
            balances: aggregation.balances.rounded(self.config.display_scale),
            exact: aggregation.balances,
            rejected: aggregation.rejected,
        }
    }

    /// Settlement plan for full-precision `balances` with names taken from
    /// `directory`
    pub fn compute_settlements(
        &self,
        balances: &Balances,
        directory: &MemberDirectory,
    ) -> SettlementSummary {
        let plan = self.planner().plan(balances);
        self.describe(plan, directory)
    }

    /// Attach display names to a plan and round its amounts
    pub fn describe(&self, plan: SettlementPlan, directory: &MemberDirectory) -> SettlementSummary {
        let transfers = plan
            .transfers
            .into_iter()
            .map(|transfer| TransferView {
                from_name: display_name(directory, &transfer.from),
                to_name: display_name(directory, &transfer.to),
                amount: self.round(&transfer.amount),
                from: transfer.from,
                to: transfer.to,
            })
            .collect();

        SettlementSummary {
            transfers,
            unbalanced: plan.unbalanced,
        }
    }

    /// Balance lines for display, one per member in id order
    pub fn balance_views(
        &self,
        balances: &Balances,
        directory: &MemberDirectory,
    ) -> Vec<MemberBalanceView> {
        balances
            .iter()
            .map(|(member, balance)| {
                let profile = directory.get(member);
                MemberBalanceView {
                    member: member.clone(),
                    name: display_name(directory, member),
                    email: profile.map(|p| p.email.clone()).unwrap_or_default(),
                    balance: self.round(balance),
                }
            })
            .collect()
    }

    fn round(&self, amount: &BigDecimal) -> BigDecimal {
        round_half_up(amount, self.config.display_scale)
    }
}

fn display_name(directory: &MemberDirectory, member: &MemberId) -> String {
    match directory.get(member) {
        Some(profile) => profile.name.clone(),
        None => {
            tracing::warn!(%member, "member missing from directory");
            member.to_string()
        }
    }
}
