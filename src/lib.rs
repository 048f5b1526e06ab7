//! # Household Ledger
//!
//! Shared household expense tracking: members record bills paid on behalf of
//! their household, and the ledger computes each member's net balance and a
//! short list of transfers that would settle everyone up.
//!
//! ## Features
//!
//! - **Balance aggregation**: bills fold into signed net balances at full decimal precision
//! - **Settlement planning**: deterministic greedy matching of debtors to creditors
//! - **Fault tolerance**: malformed bills and unbalanced ledgers are reported, never fatal
//! - **Storage abstraction**: bill storage and household membership sit behind async traits
//!
//! ## Quick Start
//!
//! ```rust
//! use household_ledger::{BillId, BillRecord, HouseholdId, MemberDirectory, MemberId, SettlementEngine};
//! use bigdecimal::BigDecimal;
//! use chrono::NaiveDate;
//!
//! let household = HouseholdId::new("flat-4b");
//! let bill = BillRecord::new(
//!     BillId::new("b1"),
//!     household.clone(),
//!     "Groceries".to_string(),
//!     BigDecimal::from(90),
//!     MemberId::new("asha"),
//!     vec![MemberId::new("asha"), MemberId::new("bilal"), MemberId::new("chen")],
//!     NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
//! );
//!
//! let engine = SettlementEngine::new();
//! let report = engine.compute_balances(&household, &[bill]);
//! // plan on the full-precision balances; `report.balances` is for display
//! let summary = engine.compute_settlements(&report.exact, &MemberDirectory::new());
//! assert_eq!(summary.transfers.len(), 2);
//! ```

pub mod config;
pub mod ledger;
pub mod traits;
pub mod types;
pub mod utils;

// Re-export commonly used types
pub use config::*;
pub use ledger::*;
pub use traits::*;
pub use types::*;
