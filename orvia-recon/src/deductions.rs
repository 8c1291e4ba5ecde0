use crate::models::{AgentDeduction, DeductionStatus};
use orvia_core::clock::Clock;
use orvia_core::{ReconError, ReconResult};
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

/// Ledger of deductions taken from delivery-agent payable balances.
/// Entries are never deleted; a reversal marks the entry and keeps it.
pub struct DeductionLedger {
    deductions: HashMap<Uuid, AgentDeduction>,
    clock: Arc<dyn Clock>,
}

impl DeductionLedger {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            deductions: HashMap::new(),
            clock,
        }
    }

    /// Create a PROCESSED entry. Amount must be a positive finite number.
    pub fn process(&mut self, driver_id: &str, amount: f64) -> ReconResult<AgentDeduction> {
        if driver_id.is_empty() {
            return Err(ReconError::ValidationError(
                "driver id must not be empty".to_string(),
            ));
        }
        if !amount.is_finite() || amount <= 0.0 {
            return Err(ReconError::ValidationError(format!(
                "deduction amount must be positive, got {}",
                amount
            )));
        }

        let deduction = AgentDeduction::new(driver_id.to_string(), amount, self.clock.now());
        self.deductions.insert(deduction.id, deduction.clone());
        Ok(deduction)
    }

    /// Reverse an entry. One-way and single-use: PROCESSED → REVERSED.
    pub fn reverse(&mut self, id: &Uuid, reason: &str) -> ReconResult<AgentDeduction> {
        let now = self.clock.now();
        let deduction = self
            .deductions
            .get_mut(id)
            .ok_or_else(|| ReconError::NotFoundError(format!("deduction {}", id)))?;

        if deduction.status == DeductionStatus::Reversed {
            return Err(ReconError::InvalidStateError(format!(
                "deduction {} already reversed",
                id
            )));
        }

        deduction.reverse(reason.to_string(), now);
        Ok(deduction.clone())
    }

    pub fn get(&self, id: &Uuid) -> Option<&AgentDeduction> {
        self.deductions.get(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &AgentDeduction> {
        self.deductions.values()
    }
}
