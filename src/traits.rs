//! Traits for storage abstraction and extensibility

use async_trait::async_trait;

use crate::types::*;
use crate::utils::validation::{check_bill_invariants, validate_roster};

/// Storage abstraction for bill records
///
/// The household ledger only reads snapshots and flips the settled flag; any
/// backend (MongoDB, PostgreSQL, in-memory, ...) can sit behind this trait.
#[async_trait]
pub trait BillStorage: Send + Sync {
    /// Save a new bill
    async fn save_bill(&mut self, bill: &BillRecord) -> LedgerResult<()>;

    /// Get a bill by ID
    async fn get_bill(&self, bill_id: &BillId) -> LedgerResult<Option<BillRecord>>;

    /// List bills of a household, optionally filtered by settled status
    async fn list_bills(
        &self,
        household_id: &HouseholdId,
        settled: Option<bool>,
    ) -> LedgerResult<Vec<BillRecord>>;

    /// Mark a bill as settled
    async fn mark_settled(&mut self, bill_id: &BillId) -> LedgerResult<()>;
}

/// Household membership lookups
#[async_trait]
pub trait MembershipDirectory: Send + Sync {
    /// Household the member belongs to, if any
    async fn household_of(&self, member: &MemberId) -> LedgerResult<Option<Household>>;

    /// Display information for the given members; unknown members are omitted
    async fn profiles(&self, members: &[MemberId]) -> LedgerResult<MemberDirectory>;
}

/// Trait for implementing custom bill validation rules
pub trait BillValidator: Send + Sync {
    /// Validate a bill before saving
    fn validate_bill(&self, bill: &BillRecord) -> LedgerResult<()>;

    /// Validate that the payer and participants belong to the household
    fn validate_participants(&self, bill: &BillRecord, household: &Household) -> LedgerResult<()>;
}

/// Default bill validator with the basic bill invariants
pub struct DefaultBillValidator;

impl BillValidator for DefaultBillValidator {
    fn validate_bill(&self, bill: &BillRecord) -> LedgerResult<()> {
        Ok(check_bill_invariants(bill)?)
    }

    fn validate_participants(&self, bill: &BillRecord, household: &Household) -> LedgerResult<()> {
        validate_roster(bill, household)
    }
}
