//! In-memory storage implementation for testing

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use crate::traits::*;
use crate::types::*;

/// In-memory bill storage and membership directory for testing and development
#[derive(Debug, Clone)]
pub struct MemoryStorage {
    bills: Arc<RwLock<HashMap<BillId, BillRecord>>>,
    households: Arc<RwLock<HashMap<HouseholdId, Household>>>,
    profiles: Arc<RwLock<HashMap<MemberId, MemberProfile>>>,
}

fn poisoned<T>(_: PoisonError<T>) -> LedgerError {
    LedgerError::Storage("memory storage lock poisoned".to_string())
}

impl MemoryStorage {
    /// Create a new memory storage instance
    pub fn new() -> Self {
        Self {
            bills: Arc::new(RwLock::new(HashMap::new())),
            households: Arc::new(RwLock::new(HashMap::new())),
            profiles: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Register a member's display information
    pub fn add_member(&self, member: MemberId, profile: MemberProfile) -> LedgerResult<()> {
        self.profiles
            .write()
            .map_err(poisoned)?
            .insert(member, profile);
        Ok(())
    }

    /// Create a household owned by `owner`; the owner is always on the roster
    ///
    /// A member can belong to one household only.
    pub fn create_household(
        &self,
        id: HouseholdId,
        name: String,
        owner: MemberId,
        members: Vec<MemberId>,
    ) -> LedgerResult<Household> {
        let mut roster = vec![owner.clone()];
        for member in members {
            if !roster.contains(&member) {
                roster.push(member);
            }
        }

        let mut households = self.households.write().map_err(poisoned)?;
        if households.contains_key(&id) {
            return Err(LedgerError::Validation(format!(
                "Household already exists: {id}"
            )));
        }
        if let Some(taken) = households
            .values()
            .flat_map(|h| h.members.iter())
            .find(|m| roster.contains(m))
        {
            return Err(LedgerError::Validation(format!(
                "Member {taken} already belongs to a household"
            )));
        }

        let household = Household {
            id: id.clone(),
            name,
            owner,
            members: roster,
        };
        households.insert(id, household.clone());
        Ok(household)
    }

    /// Clear all data (useful for testing)
    pub fn clear(&self) -> LedgerResult<()> {
        self.bills.write().map_err(poisoned)?.clear();
        self.households.write().map_err(poisoned)?.clear();
        self.profiles.write().map_err(poisoned)?.clear();
        Ok(())
    }
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BillStorage for MemoryStorage {
    async fn save_bill(&mut self, bill: &BillRecord) -> LedgerResult<()> {
        self.bills
            .write()
            .map_err(poisoned)?
            .insert(bill.id.clone(), bill.clone());
        Ok(())
    }

    async fn get_bill(&self, bill_id: &BillId) -> LedgerResult<Option<BillRecord>> {
        Ok(self.bills.read().map_err(poisoned)?.get(bill_id).cloned())
    }

    async fn list_bills(
        &self,
        household_id: &HouseholdId,
        settled: Option<bool>,
    ) -> LedgerResult<Vec<BillRecord>> {
        let bills = self.bills.read().map_err(poisoned)?;
        let mut filtered: Vec<BillRecord> = bills
            .values()
            .filter(|bill| &bill.household_id == household_id)
            .filter(|bill| settled.is_none_or(|s| bill.settled == s))
            .cloned()
            .collect();
        filtered.sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.id.cmp(&b.id)));
        Ok(filtered)
    }

    async fn mark_settled(&mut self, bill_id: &BillId) -> LedgerResult<()> {
        match self.bills.write().map_err(poisoned)?.get_mut(bill_id) {
            Some(bill) => {
                bill.settled = true;
                Ok(())
            }
            None => Err(LedgerError::BillNotFound(bill_id.clone())),
        }
    }
}

#[async_trait]
impl MembershipDirectory for MemoryStorage {
    async fn household_of(&self, member: &MemberId) -> LedgerResult<Option<Household>> {
        Ok(self
            .households
            .read()
            .map_err(poisoned)?
            .values()
            .find(|household| household.is_member(member))
            .cloned())
    }

    async fn profiles(&self, members: &[MemberId]) -> LedgerResult<MemberDirectory> {
        let profiles = self.profiles.read().map_err(poisoned)?;
        Ok(members
            .iter()
            .filter_map(|member| {
                profiles
                    .get(member)
                    .map(|profile| (member.clone(), profile.clone()))
            })
            .collect())
    }
}
