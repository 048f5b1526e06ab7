//! Engine configuration

use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};

use crate::types::{LedgerError, LedgerResult};
use crate::utils::money::{cent, unit};

/// Tunables shared by the aggregator and the settlement planner
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Smallest balance magnitude that still needs settling
    pub tolerance: BigDecimal,
    /// Decimal places used when balances and transfers are reported
    pub display_scale: i64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            tolerance: cent(),
            display_scale: 2,
        }
    }
}

impl EngineConfig {
    pub fn with_tolerance(mut self, tolerance: BigDecimal) -> Self {
        self.tolerance = tolerance;
        self
    }

    pub fn with_display_scale(mut self, display_scale: i64) -> Self {
        self.display_scale = display_scale;
        self
    }

    /// Check the configuration can drive a settlement loop
    pub fn validate(&self) -> LedgerResult<()> {
        if self.tolerance <= BigDecimal::from(0) {
            return Err(LedgerError::Validation(format!(
                "Tolerance must be positive, got {}",
                self.tolerance
            )));
        }

        if self.display_scale < 0 {
            return Err(LedgerError::Validation(format!(
                "Display scale cannot be negative, got {}",
                self.display_scale
            )));
        }

        let step = unit(self.display_scale);
        if self.tolerance < step {
            return Err(LedgerError::Validation(format!(
                "Tolerance {} is finer than the display scale allows ({step})",
                self.tolerance
            )));
        }

        Ok(())
    }
}
