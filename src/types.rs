//! Core types and data structures for the household ledger

use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::btree_map;
use std::collections::BTreeMap;
use std::fmt;

use crate::utils::money::round_half_up;

/// Opaque identity of a household member
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MemberId(String);

impl MemberId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MemberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for MemberId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Opaque identity of a household (the group bills belong to)
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HouseholdId(String);

impl HouseholdId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for HouseholdId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for HouseholdId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Opaque identity of a stored bill
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BillId(String);

impl BillId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generate a fresh random bill id
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BillId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for BillId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// A bill paid by one member and shared between several
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BillRecord {
    /// Unique identifier for the bill
    pub id: BillId,
    /// Household the bill belongs to
    pub household_id: HouseholdId,
    /// Short human-readable label ("Groceries", "Electricity")
    pub title: String,
    /// Total charged, must be positive
    pub amount: BigDecimal,
    /// Member who paid the full amount
    pub paid_by: MemberId,
    /// Members sharing the cost equally; the payer does not have to be one of them
    pub split_between: Vec<MemberId>,
    /// Settled bills no longer count towards balances
    pub settled: bool,
    /// When the expense happened
    pub date: NaiveDate,
}

impl BillRecord {
    /// Create a new unsettled bill
    pub fn new(
        id: BillId,
        household_id: HouseholdId,
        title: String,
        amount: BigDecimal,
        paid_by: MemberId,
        split_between: Vec<MemberId>,
        date: NaiveDate,
    ) -> Self {
        Self {
            id,
            household_id,
            title,
            amount,
            paid_by,
            split_between,
            settled: false,
            date,
        }
    }

    /// Share of the amount owed by each participant, at full precision
    ///
    /// Returns `None` when nobody shares the bill.
    pub fn share_per_person(&self) -> Option<BigDecimal> {
        if self.split_between.is_empty() {
            return None;
        }
        Some(&self.amount / BigDecimal::from(self.split_between.len() as u64))
    }
}

/// Draft of a bill submitted by a household member
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewBill {
    pub title: String,
    pub amount: BigDecimal,
    pub paid_by: MemberId,
    pub split_between: Vec<MemberId>,
    /// Defaults to today (UTC) when absent
    pub date: Option<NaiveDate>,
}

impl NewBill {
    pub fn new(
        title: impl Into<String>,
        amount: BigDecimal,
        paid_by: MemberId,
        split_between: Vec<MemberId>,
    ) -> Self {
        Self {
            title: title.into(),
            amount,
            paid_by,
            split_between,
            date: None,
        }
    }

    /// Set the date the expense happened
    pub fn on(mut self, date: NaiveDate) -> Self {
        self.date = Some(date);
        self
    }
}

/// Signed net balance per member: positive means the member is owed money,
/// negative means the member owes money
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Balances(BTreeMap<MemberId, BigDecimal>);

impl Balances {
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Balance of a member, `None` if the member never appeared
    pub fn get(&self, member: &MemberId) -> Option<&BigDecimal> {
        self.0.get(member)
    }

    /// Add `delta` to a member's balance, starting from zero
    pub fn credit(&mut self, member: &MemberId, delta: &BigDecimal) {
        match self.0.get_mut(member) {
            Some(balance) => *balance += delta,
            None => {
                self.0.insert(member.clone(), delta.clone());
            }
        }
    }

    /// Subtract `delta` from a member's balance, starting from zero
    pub fn debit(&mut self, member: &MemberId, delta: &BigDecimal) {
        match self.0.get_mut(member) {
            Some(balance) => *balance -= delta,
            None => {
                self.0.insert(member.clone(), -delta.clone());
            }
        }
    }

    pub fn iter(&self) -> btree_map::Iter<'_, MemberId, BigDecimal> {
        self.0.iter()
    }

    pub fn members(&self) -> impl Iterator<Item = &MemberId> {
        self.0.keys()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Sum of all balances; zero for any closed set of bills
    pub fn total(&self) -> BigDecimal {
        self.0.values().sum()
    }

    /// Copy of the balances rounded half-up to `scale` decimal places
    pub fn rounded(&self, scale: i64) -> Balances {
        self.0
            .iter()
            .map(|(member, balance)| (member.clone(), round_half_up(balance, scale)))
            .collect()
    }
}

impl FromIterator<(MemberId, BigDecimal)> for Balances {
    fn from_iter<T: IntoIterator<Item = (MemberId, BigDecimal)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for Balances {
    type Item = (MemberId, BigDecimal);
    type IntoIter = btree_map::IntoIter<MemberId, BigDecimal>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a Balances {
    type Item = (&'a MemberId, &'a BigDecimal);
    type IntoIter = btree_map::Iter<'a, MemberId, BigDecimal>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Suggested payment from a debtor to a creditor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SettlementTransfer {
    pub from: MemberId,
    pub to: MemberId,
    pub amount: BigDecimal,
}

/// Display information of a member
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberProfile {
    pub name: String,
    pub email: String,
}

impl MemberProfile {
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
        }
    }
}

/// Lookup from member identity to display information
pub type MemberDirectory = BTreeMap<MemberId, MemberProfile>;

/// A household and its roster
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Household {
    pub id: HouseholdId,
    pub name: String,
    pub owner: MemberId,
    pub members: Vec<MemberId>,
}

impl Household {
    pub fn is_member(&self, member: &MemberId) -> bool {
        self.members.contains(member)
    }
}

/// Why a bill record was left out of an aggregation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, thiserror::Error)]
pub enum InvalidBillReason {
    #[error("bill is not split between anyone")]
    EmptySplit,
    #[error("bill amount must be positive, got {0}")]
    NonPositiveAmount(BigDecimal),
    #[error("member {0} appears more than once in the split")]
    DuplicateParticipant(MemberId),
}

/// A bill record rejected during aggregation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RejectedBill {
    /// Position of the record in the input sequence
    pub index: usize,
    pub bill_id: BillId,
    pub reason: InvalidBillReason,
}

/// Balances left over after the settlement loop ran out of counterparties
///
/// Only possible when the input balances did not sum to zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnbalancedLedger {
    /// Sum of the balances the plan was computed from
    pub net_total: BigDecimal,
    /// Members whose remaining balance could not be matched
    pub unmatched: Vec<(MemberId, BigDecimal)>,
}

/// Balance line ready for display
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemberBalanceView {
    pub member: MemberId,
    pub name: String,
    pub email: String,
    pub balance: BigDecimal,
}

/// Transfer line ready for display
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransferView {
    pub from: MemberId,
    pub to: MemberId,
    pub from_name: String,
    pub to_name: String,
    pub amount: BigDecimal,
}

/// Errors that can occur in the household ledger service
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("Storage error: {0}")]
    Storage(String),
    #[error("Invalid bill: {0}")]
    InvalidBill(#[from] InvalidBillReason),
    #[error("Bill not found: {0}")]
    BillNotFound(BillId),
    #[error("Member is not in a household: {0}")]
    NotInHousehold(MemberId),
    #[error("Member {member} is not part of household {household}")]
    NotHouseholdMember {
        member: MemberId,
        household: HouseholdId,
    },
    #[error("Validation error: {0}")]
    Validation(String),
}

/// Result type for ledger operations
pub type LedgerResult<T> = Result<T, LedgerError>;
