//! Ledger module containing bill aggregation, settlement planning and the
//! household service built on top of them

pub mod aggregator;
pub mod engine;
pub mod household;
pub mod settlement;

pub use aggregator::*;
pub use engine::*;
pub use household::*;
pub use settlement::*;
