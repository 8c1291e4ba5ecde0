use serde::{Deserialize, Serialize};

/// Running counters summarizing the reconciliation ledgers
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Analytics {
    /// Cases ever created (monotonically non-decreasing)
    pub total_discrepancies: u64,
    /// Cases currently awaiting a customer response
    pub pending_verifications: u64,
    /// Cumulative escalations, including cases later resolved
    pub escalated_cases: u64,
    /// Signed sum of every recorded discrepancy amount
    pub total_amount: f64,
    /// Cases currently resolved
    pub resolved: u64,
}

/// One command's worth of counter changes. `pending` is the only signed
/// field: resolving or escalating a pending case moves it back down.
#[derive(Debug, Clone, Copy, Default)]
pub struct AnalyticsDelta {
    pub discrepancies: u64,
    pub amount: f64,
    pub pending: i64,
    pub escalations: u64,
    pub resolved: u64,
}

/// Holds the aggregate record. Trusting by design: the workflow is the
/// sole caller of apply and is responsible for supplying exactly one
/// delta per state change.
#[derive(Default)]
pub struct AnalyticsAggregator {
    current: Analytics,
}

impl AnalyticsAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn apply(&mut self, delta: &AnalyticsDelta) {
        self.current.total_discrepancies += delta.discrepancies;
        self.current.total_amount += delta.amount;
        self.current.escalated_cases += delta.escalations;
        self.current.resolved += delta.resolved;

        // Saturating: bulk operations must never drive this below zero
        if delta.pending >= 0 {
            self.current.pending_verifications += delta.pending as u64;
        } else {
            self.current.pending_verifications = self
                .current
                .pending_verifications
                .saturating_sub(delta.pending.unsigned_abs());
        }
    }

    pub fn snapshot(&self) -> Analytics {
        self.current.clone()
    }
}
