use crate::analytics::{Analytics, AnalyticsAggregator, AnalyticsDelta};
use crate::cases::CaseStore;
use crate::deductions::DeductionLedger;
use crate::models::{
    AgentDeduction, CustomerVerification, Discrepancy, DiscrepancyStatus, VerificationOutcome,
};
use crate::verification::VerificationLedger;
use orvia_core::clock::Clock;
use orvia_core::ReconResult;
use orvia_shared::models::events::{DiscrepancyRecordedEvent, VerificationRespondedEvent};
use orvia_shared::Redacted;
use std::sync::Arc;
use uuid::Uuid;

/// Result of reporting a discrepancy: the new case, the outreach record
/// when a verification was requested in the same step, and the event the
/// caller hands to its notification/audit pipeline.
#[derive(Debug, Clone)]
pub struct DiscrepancyReport {
    pub discrepancy: Discrepancy,
    pub verification: Option<CustomerVerification>,
    pub event: DiscrepancyRecordedEvent,
}

/// Result of applying a customer response: the updated verification, the
/// case it moved (if any), whether the customer disputed the amount, and
/// the event for the caller's pipeline (response text redacted for logs).
#[derive(Debug, Clone)]
pub struct VerificationUpdate {
    pub verification: CustomerVerification,
    pub discrepancy: Option<Discrepancy>,
    pub disputed: bool,
    pub event: VerificationRespondedEvent,
}

/// The reconciliation command surface. Owns the case store, both ledgers
/// and the aggregate counters; every command is a synchronous
/// read-modify-write over that state, so commands take &mut self and a
/// multi-threaded host wraps the workflow in a single Mutex. The
/// aggregator is written here and nowhere else.
pub struct ReconciliationWorkflow {
    cases: CaseStore,
    verifications: VerificationLedger,
    deductions: DeductionLedger,
    aggregator: AnalyticsAggregator,
}

impl ReconciliationWorkflow {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            cases: CaseStore::new(clock.clone()),
            verifications: VerificationLedger::new(clock.clone()),
            deductions: DeductionLedger::new(clock),
            aggregator: AnalyticsAggregator::new(),
        }
    }

    /// Record a detected mismatch. When `send_verification` is set, the
    /// outreach record is created and the case moves to
    /// PENDING_VERIFICATION in the same atomic step.
    pub fn report_discrepancy(
        &mut self,
        order_id: &str,
        amount: f64,
        send_verification: bool,
    ) -> ReconResult<DiscrepancyReport> {
        let mut discrepancy = self.cases.record(order_id, amount)?;

        let verification = if send_verification {
            let verification = self.verifications.send(order_id)?;
            discrepancy = self.cases.mark_pending_verification(&discrepancy.id)?;
            Some(verification)
        } else {
            None
        };

        self.aggregator.apply(&AnalyticsDelta {
            discrepancies: 1,
            amount,
            pending: if send_verification { 1 } else { 0 },
            ..Default::default()
        });

        tracing::info!(
            order_id,
            amount,
            verification_sent = send_verification,
            discrepancy_id = %discrepancy.id,
            "payment discrepancy recorded"
        );

        let event = DiscrepancyRecordedEvent {
            discrepancy_id: discrepancy.id,
            order_id: discrepancy.order_id.clone(),
            amount,
            verification_requested: send_verification,
            timestamp: discrepancy.detected_at.timestamp(),
        };

        Ok(DiscrepancyReport {
            discrepancy,
            verification,
            event,
        })
    }

    /// Record a customer response and move the linked case accordingly:
    /// CONFIRMED/RESOLVED resolves the order's pending case, DISPUTED
    /// leaves it pending and flags the dispute for manual handling,
    /// EXPIRED leaves it untouched.
    pub fn apply_verification_response(
        &mut self,
        verification_id: &Uuid,
        outcome: VerificationOutcome,
        response: Option<&str>,
    ) -> ReconResult<VerificationUpdate> {
        let verification = self.verifications.record_response(
            verification_id,
            outcome,
            response.map(str::to_string),
        )?;

        let pending_case = self
            .cases
            .find_pending_by_order(&verification.order_id)
            .map(|c| c.id);

        let event = VerificationRespondedEvent {
            verification_id: verification.id,
            order_id: verification.order_id.clone(),
            outcome: outcome.as_str().to_string(),
            customer_response: response.map(|r| Redacted::new(r.to_string())),
            timestamp: verification
                .responded_at
                .map(|t| t.timestamp())
                .unwrap_or_default(),
        };

        let mut update = VerificationUpdate {
            verification,
            discrepancy: None,
            disputed: false,
            event,
        };

        match outcome {
            VerificationOutcome::Confirmed | VerificationOutcome::Resolved => {
                if let Some(case_id) = pending_case {
                    let resolved = self.resolve_case(&case_id, "customer_confirmed", response)?;
                    update.discrepancy = Some(resolved);
                }
            }
            VerificationOutcome::Disputed => {
                update.disputed = true;
                update.discrepancy = pending_case.and_then(|id| self.cases.get(&id).cloned());
                tracing::warn!(
                    order_id = %update.verification.order_id,
                    verification_id = %verification_id,
                    "customer disputed the collected amount"
                );
            }
            VerificationOutcome::Expired => {
                // Left pending for manual escalation
            }
        }

        Ok(update)
    }

    /// Resolve a case. Re-resolving an already-resolved case is a no-op
    /// with no aggregate change.
    pub fn resolve_case(
        &mut self,
        id: &Uuid,
        resolution: &str,
        notes: Option<&str>,
    ) -> ReconResult<Discrepancy> {
        let transition = self.cases.update_status(
            id,
            DiscrepancyStatus::Resolved,
            Some(resolution.to_string()),
            notes.map(str::to_string),
        )?;

        if transition.changed {
            self.aggregator.apply(&Self::resolve_delta(transition.previous));
            tracing::info!(
                discrepancy_id = %id,
                resolution,
                "discrepancy case resolved"
            );
        }

        Ok(transition.record)
    }

    /// Escalate a case for management-level handling.
    pub fn escalate_case(&mut self, id: &Uuid, reason: &str) -> ReconResult<Discrepancy> {
        let transition = self.cases.update_status(
            id,
            DiscrepancyStatus::Escalated,
            None,
            Some(reason.to_string()),
        )?;

        if transition.changed {
            self.aggregator.apply(&Self::escalate_delta(transition.previous));
            tracing::info!(discrepancy_id = %id, reason, "discrepancy case escalated");
        }

        Ok(transition.record)
    }

    /// Resolve every eligible case in the list; already-resolved and
    /// unknown ids are skipped. Returns the count actually changed.
    pub fn bulk_resolve(&mut self, ids: &[Uuid], resolution: &str, notes: Option<&str>) -> usize {
        let transitions = self.cases.bulk_update(
            ids,
            DiscrepancyStatus::Resolved,
            Some(resolution.to_string()),
            notes.map(str::to_string),
        );
        for transition in &transitions {
            self.aggregator.apply(&Self::resolve_delta(transition.previous));
        }
        tracing::info!(requested = ids.len(), changed = transitions.len(), "bulk resolve applied");
        transitions.len()
    }

    /// Escalate every eligible case in the list; already-escalated,
    /// resolved and unknown ids are skipped. Returns the count changed.
    pub fn bulk_escalate(&mut self, ids: &[Uuid], reason: &str) -> usize {
        let transitions = self.cases.bulk_update(
            ids,
            DiscrepancyStatus::Escalated,
            None,
            Some(reason.to_string()),
        );
        for transition in &transitions {
            self.aggregator.apply(&Self::escalate_delta(transition.previous));
        }
        tracing::info!(requested = ids.len(), changed = transitions.len(), "bulk escalate applied");
        transitions.len()
    }

    /// Deduct a shortfall from an agent's payable balance. The agent
    /// ledger is independent of the case-resolution counters; this does
    /// not touch Analytics.
    pub fn deduct_from_agent(&mut self, driver_id: &str, amount: f64) -> ReconResult<AgentDeduction> {
        let deduction = self.deductions.process(driver_id, amount)?;
        tracing::info!(driver_id, amount, deduction_id = %deduction.id, "agent deduction processed");
        Ok(deduction)
    }

    /// Reverse a previously processed deduction. No Analytics side effect,
    /// mirroring the forward operation.
    pub fn reverse_agent_deduction(&mut self, id: &Uuid, reason: &str) -> ReconResult<AgentDeduction> {
        let deduction = self.deductions.reverse(id, reason)?;
        tracing::info!(deduction_id = %id, reason, "agent deduction reversed");
        Ok(deduction)
    }

    pub fn analytics(&self) -> Analytics {
        self.aggregator.snapshot()
    }

    pub fn discrepancy(&self, id: &Uuid) -> Option<&Discrepancy> {
        self.cases.get(id)
    }

    pub fn verification(&self, id: &Uuid) -> Option<&CustomerVerification> {
        self.verifications.get(id)
    }

    pub fn deduction(&self, id: &Uuid) -> Option<&AgentDeduction> {
        self.deductions.get(id)
    }

    pub fn discrepancies(&self) -> impl Iterator<Item = &Discrepancy> {
        self.cases.iter()
    }

    fn resolve_delta(previous: DiscrepancyStatus) -> AnalyticsDelta {
        AnalyticsDelta {
            resolved: 1,
            pending: if previous == DiscrepancyStatus::PendingVerification {
                -1
            } else {
                0
            },
            ..Default::default()
        }
    }

    fn escalate_delta(previous: DiscrepancyStatus) -> AnalyticsDelta {
        AnalyticsDelta {
            escalations: 1,
            pending: if previous == DiscrepancyStatus::PendingVerification {
                -1
            } else {
                0
            },
            ..Default::default()
        }
    }
}

impl Default for ReconciliationWorkflow {
    fn default() -> Self {
        Self::new(Arc::new(orvia_core::clock::SystemClock))
    }
}
