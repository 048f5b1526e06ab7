//! Validation utilities

use bigdecimal::BigDecimal;
use std::collections::HashSet;

use crate::traits::*;
use crate::types::*;

/// Check the invariants every bill must satisfy before it can be aggregated
pub fn check_bill_invariants(bill: &BillRecord) -> Result<(), InvalidBillReason> {
    if bill.amount <= BigDecimal::from(0) {
        return Err(InvalidBillReason::NonPositiveAmount(bill.amount.clone()));
    }

    if bill.split_between.is_empty() {
        return Err(InvalidBillReason::EmptySplit);
    }

    let mut seen = HashSet::with_capacity(bill.split_between.len());
    for member in &bill.split_between {
        if !seen.insert(member) {
            return Err(InvalidBillReason::DuplicateParticipant(member.clone()));
        }
    }

    Ok(())
}

/// Validate that a bill title is usable for display
pub fn validate_bill_title(title: &str) -> LedgerResult<()> {
    if title.trim().is_empty() {
        return Err(LedgerError::Validation(
            "Bill title cannot be empty".to_string(),
        ));
    }

    if title.len() > 200 {
        return Err(LedgerError::Validation(
            "Bill title cannot exceed 200 characters".to_string(),
        ));
    }

    Ok(())
}

/// Validate that the payer and every participant are on the household roster
pub fn validate_roster(bill: &BillRecord, household: &Household) -> LedgerResult<()> {
    std::iter::once(&bill.paid_by)
        .chain(&bill.split_between)
        .find(|member| !household.is_member(member))
        .map_or(Ok(()), |outsider| {
            Err(LedgerError::NotHouseholdMember {
                member: outsider.clone(),
                household: household.id.clone(),
            })
        })
}

/// Bill validator that also enforces a display-friendly title
pub struct StrictBillValidator;

impl BillValidator for StrictBillValidator {
    fn validate_bill(&self, bill: &BillRecord) -> LedgerResult<()> {
        check_bill_invariants(bill)?;
        validate_bill_title(&bill.title)
    }

    fn validate_participants(&self, bill: &BillRecord, household: &Household) -> LedgerResult<()> {
        validate_roster(bill, household)
    }
}
