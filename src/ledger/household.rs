//! Household ledger service over bill storage and membership collaborators

use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;
use crate::ledger::{SettlementEngine, SettlementSummary};
use crate::traits::*;
use crate::types::*;

/// Named balances of a household
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HouseholdBalances {
    pub household_id: HouseholdId,
    pub balances: Vec<MemberBalanceView>,
    pub rejected: Vec<RejectedBill>,
}

/// Records bills for a household and answers balance and settlement queries
///
/// Every operation is performed on behalf of an already authenticated member
/// (`actor`); the actor's household scopes all reads and writes.
pub struct HouseholdLedger<S: BillStorage, M: MembershipDirectory> {
    storage: S,
    membership: M,
    engine: SettlementEngine,
    validator: Box<dyn BillValidator>,
}

impl<S: BillStorage, M: MembershipDirectory> HouseholdLedger<S, M> {
    /// Create a new household ledger with the default configuration
    pub fn new(storage: S, membership: M) -> Self {
        Self {
            storage,
            membership,
            engine: SettlementEngine::new(),
            validator: Box::new(DefaultBillValidator),
        }
    }

    /// Create a household ledger with a custom configuration
    pub fn with_config(storage: S, membership: M, config: EngineConfig) -> LedgerResult<Self> {
        Ok(Self {
            storage,
            membership,
            engine: SettlementEngine::with_config(config)?,
            validator: Box::new(DefaultBillValidator),
        })
    }

    /// Replace the bill validator
    pub fn with_validator(mut self, validator: Box<dyn BillValidator>) -> Self {
        self.validator = validator;
        self
    }

    pub fn engine(&self) -> &SettlementEngine {
        &self.engine
    }

    /// Record a bill in the actor's household
    pub async fn record_bill(&mut self, actor: &MemberId, draft: NewBill) -> LedgerResult<BillRecord> {
        let household = self.household_of(actor).await?;

        let bill = BillRecord::new(
            BillId::generate(),
            household.id.clone(),
            draft.title,
            draft.amount,
            draft.paid_by,
            draft.split_between,
            draft
                .date
                .unwrap_or_else(|| chrono::Utc::now().date_naive()),
        );

        self.validator.validate_bill(&bill)?;
        self.validator.validate_participants(&bill, &household)?;

        self.storage.save_bill(&bill).await?;
        tracing::info!(
            bill_id = %bill.id,
            household = %household.id,
            amount = %bill.amount,
            "recorded bill"
        );

        Ok(bill)
    }

    /// Current balances of the actor's household
    pub async fn balances(&self, actor: &MemberId) -> LedgerResult<HouseholdBalances> {
        let household = self.household_of(actor).await?;
        let bills = self.storage.list_bills(&household.id, Some(false)).await?;
        let aggregation = self.engine.aggregator().aggregate(&bills);

        let members: Vec<MemberId> = aggregation.balances.members().cloned().collect();
        let directory = self.membership.profiles(&members).await?;

        Ok(HouseholdBalances {
            household_id: household.id,
            balances: self.engine.balance_views(&aggregation.balances, &directory),
            rejected: aggregation.rejected,
        })
    }

    /// Suggested transfers that would settle the actor's household
    pub async fn settlements(&self, actor: &MemberId) -> LedgerResult<SettlementSummary> {
        let household = self.household_of(actor).await?;
        let bills = self.storage.list_bills(&household.id, Some(false)).await?;
        let aggregation = self.engine.aggregator().aggregate(&bills);

        let plan = self.engine.planner().plan(&aggregation.balances);
        let directory = self.membership.profiles(&household.members).await?;

        Ok(self.engine.describe(plan, &directory))
    }

    /// Mark a single bill of the actor's household as settled
    pub async fn settle_bill(&mut self, actor: &MemberId, bill_id: &BillId) -> LedgerResult<()> {
        let household = self.household_of(actor).await?;
        let bill = self
            .storage
            .get_bill(bill_id)
            .await?
            .ok_or_else(|| LedgerError::BillNotFound(bill_id.clone()))?;

        // bills of other households are invisible to the actor
        if bill.household_id != household.id {
            return Err(LedgerError::BillNotFound(bill_id.clone()));
        }

        if bill.settled {
            return Ok(());
        }

        self.storage.mark_settled(bill_id).await?;
        tracing::info!(%bill_id, household = %household.id, "settled bill");
        Ok(())
    }

    /// Mark every unsettled bill of the actor's household as settled
    ///
    /// Returns the number of bills flipped. Bills are flipped one at a time in
    /// date order and nothing is rolled back: if storage fails part-way, the
    /// bills before the failing one stay settled, the error is returned and
    /// the partial count is logged. Calling again settles the rest.
    pub async fn settle_all(&mut self, actor: &MemberId) -> LedgerResult<usize> {
        let household = self.household_of(actor).await?;
        let bills = self.storage.list_bills(&household.id, Some(false)).await?;

        for (settled, bill) in bills.iter().enumerate() {
            if let Err(err) = self.storage.mark_settled(&bill.id).await {
                tracing::warn!(
                    household = %household.id,
                    settled,
                    remaining = bills.len() - settled,
                    error = %err,
                    "settling household stopped part-way"
                );
                return Err(err);
            }
        }

        tracing::info!(household = %household.id, count = bills.len(), "settled household");
        Ok(bills.len())
    }

    async fn household_of(&self, member: &MemberId) -> LedgerResult<Household> {
        self.membership
            .household_of(member)
            .await?
            .ok_or_else(|| LedgerError::NotInHousehold(member.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::memory_storage::MemoryStorage;
    use async_trait::async_trait;
    use bigdecimal::BigDecimal;
    use std::str::FromStr;

    fn dec(s: &str) -> BigDecimal {
        BigDecimal::from_str(s).unwrap()
    }

    fn member(id: &str) -> MemberId {
        MemberId::from(id)
    }

    fn household_storage() -> MemoryStorage {
        let storage = MemoryStorage::new();
        storage
            .add_member(member("a"), MemberProfile::new("Asha", "asha@example.com"))
            .unwrap();
        storage
            .add_member(member("b"), MemberProfile::new("Bilal", "bilal@example.com"))
            .unwrap();
        storage
            .add_member(member("c"), MemberProfile::new("Chen", "chen@example.com"))
            .unwrap();
        storage
            .create_household(
                HouseholdId::from("flat"),
                "Flat 4B".to_string(),
                member("a"),
                vec![member("b"), member("c")],
            )
            .unwrap();
        storage
    }

    fn setup() -> HouseholdLedger<MemoryStorage, MemoryStorage> {
        let storage = household_storage();
        HouseholdLedger::new(storage.clone(), storage)
    }

    /// Storage that refuses to settle more than `budget` bills
    struct FlakyStorage {
        inner: MemoryStorage,
        budget: usize,
    }

    #[async_trait]
    impl BillStorage for FlakyStorage {
        async fn save_bill(&mut self, bill: &BillRecord) -> LedgerResult<()> {
            self.inner.save_bill(bill).await
        }

        async fn get_bill(&self, bill_id: &BillId) -> LedgerResult<Option<BillRecord>> {
            self.inner.get_bill(bill_id).await
        }

        async fn list_bills(
            &self,
            household_id: &HouseholdId,
            settled: Option<bool>,
        ) -> LedgerResult<Vec<BillRecord>> {
            self.inner.list_bills(household_id, settled).await
        }

        async fn mark_settled(&mut self, bill_id: &BillId) -> LedgerResult<()> {
            if self.budget == 0 {
                return Err(LedgerError::Storage("disk full".to_string()));
            }
            self.budget -= 1;
            self.inner.mark_settled(bill_id).await
        }
    }

    #[tokio::test]
    async fn test_household_ledger_basic_flow() {
        let mut ledger = setup();

        let bill = ledger
            .record_bill(
                &member("b"),
                NewBill::new(
                    "Groceries",
                    BigDecimal::from(90),
                    member("a"),
                    vec![member("a"), member("b"), member("c")],
                ),
            )
            .await
            .unwrap();
        assert_eq!(bill.household_id, HouseholdId::from("flat"));
        assert!(!bill.settled);

        let balances = ledger.balances(&member("c")).await.unwrap();
        assert_eq!(balances.balances.len(), 3);
        assert_eq!(balances.balances[0].name, "Asha");
        assert_eq!(balances.balances[0].balance, dec("60.00"));
        assert_eq!(balances.balances[1].balance, dec("-30.00"));

        let summary = ledger.settlements(&member("a")).await.unwrap();
        assert!(summary.is_balanced());
        assert_eq!(summary.transfers.len(), 2);
        assert_eq!(summary.transfers[0].from_name, "Bilal");
        assert_eq!(summary.transfers[0].to_name, "Asha");
    }

    #[tokio::test]
    async fn test_record_bill_rejects_outsider() {
        let mut ledger = setup();

        let err = ledger
            .record_bill(
                &member("a"),
                NewBill::new(
                    "Taxi",
                    BigDecimal::from(30),
                    member("a"),
                    vec![member("a"), member("stranger")],
                ),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::NotHouseholdMember { .. }));
    }

    #[tokio::test]
    async fn test_record_bill_rejects_invalid_bill() {
        let mut ledger = setup();

        let err = ledger
            .record_bill(
                &member("a"),
                NewBill::new("Nothing", BigDecimal::from(30), member("a"), vec![]),
            )
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            LedgerError::InvalidBill(InvalidBillReason::EmptySplit)
        ));
    }

    #[tokio::test]
    async fn test_actor_without_household() {
        let mut ledger = setup();
        let err = ledger.balances(&member("nobody")).await.unwrap_err();
        assert!(matches!(err, LedgerError::NotInHousehold(_)));

        let err = ledger.settle_all(&member("nobody")).await.unwrap_err();
        assert!(matches!(err, LedgerError::NotInHousehold(_)));
    }

    #[tokio::test]
    async fn test_settle_all_clears_balances() {
        let mut ledger = setup();
        ledger
            .record_bill(
                &member("a"),
                NewBill::new("Rent", BigDecimal::from(1200), member("c"), vec![member("a"), member("b"), member("c")]),
            )
            .await
            .unwrap();

        assert_eq!(ledger.settle_all(&member("a")).await.unwrap(), 1);
        assert_eq!(ledger.settle_all(&member("a")).await.unwrap(), 0);

        let balances = ledger.balances(&member("a")).await.unwrap();
        assert!(balances.balances.is_empty());
        let summary = ledger.settlements(&member("a")).await.unwrap();
        assert!(summary.transfers.is_empty());
    }

    #[tokio::test]
    async fn test_settle_single_bill() {
        let mut ledger = setup();
        let first = ledger
            .record_bill(
                &member("a"),
                NewBill::new("Internet", BigDecimal::from(40), member("a"), vec![member("a"), member("b")]),
            )
            .await
            .unwrap();
        ledger
            .record_bill(
                &member("a"),
                NewBill::new("Water", BigDecimal::from(20), member("b"), vec![member("a"), member("b")]),
            )
            .await
            .unwrap();

        ledger.settle_bill(&member("b"), &first.id).await.unwrap();
        // settling twice is a no-op
        ledger.settle_bill(&member("b"), &first.id).await.unwrap();

        let summary = ledger.settlements(&member("a")).await.unwrap();
        assert_eq!(summary.transfers.len(), 1);
        assert_eq!(summary.transfers[0].from, member("a"));
        assert_eq!(summary.transfers[0].amount, dec("10.00"));

        let err = ledger
            .settle_bill(&member("a"), &BillId::from("missing"))
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::BillNotFound(_)));
    }

    #[tokio::test]
    async fn test_settle_bill_hides_other_households() {
        let storage = household_storage();
        storage
            .create_household(HouseholdId::from("next-door"), "Flat 4C".to_string(), member("d"), vec![])
            .unwrap();
        let mut ledger = HouseholdLedger::new(storage.clone(), storage);

        let bill = ledger
            .record_bill(
                &member("a"),
                NewBill::new("Heating", BigDecimal::from(60), member("a"), vec![member("a"), member("b")]),
            )
            .await
            .unwrap();

        let err = ledger.settle_bill(&member("d"), &bill.id).await.unwrap_err();
        assert!(matches!(&err, LedgerError::BillNotFound(id) if *id == bill.id));
        assert!(!err.to_string().contains("flat"));

        let summary = ledger.settlements(&member("a")).await.unwrap();
        assert_eq!(summary.transfers.len(), 1);
    }

    #[tokio::test]
    async fn test_settle_all_stops_on_storage_failure() {
        let storage = household_storage();
        let flaky = FlakyStorage {
            inner: storage.clone(),
            budget: 1,
        };
        let mut ledger = HouseholdLedger::new(flaky, storage.clone());

        for (day, title) in [(1, "Gas"), (2, "Milk"), (3, "Bread")] {
            ledger
                .record_bill(
                    &member("a"),
                    NewBill::new(title, BigDecimal::from(12), member("a"), vec![member("a"), member("b")])
                        .on(chrono::NaiveDate::from_ymd_opt(2024, 5, day).unwrap()),
                )
                .await
                .unwrap();
        }

        let err = ledger.settle_all(&member("a")).await.unwrap_err();
        assert!(matches!(err, LedgerError::Storage(_)));

        // the first bill stays settled, the others are still open
        let open = storage
            .list_bills(&HouseholdId::from("flat"), Some(false))
            .await
            .unwrap();
        let titles: Vec<&str> = open.iter().map(|b| b.title.as_str()).collect();
        assert_eq!(titles, vec!["Milk", "Bread"]);

        storage.clear().unwrap();
        let err = ledger.balances(&member("a")).await.unwrap_err();
        assert!(matches!(err, LedgerError::NotInHousehold(_)));
    }
}
