use crate::models::{Discrepancy, DiscrepancyStatus};
use crate::workflow::{DiscrepancyReport, ReconciliationWorkflow};
use orvia_core::notify::NotificationAdapter;
use orvia_core::ReconResult;
use orvia_shared::models::events::{CaseEscalatedEvent, VerificationRequestedEvent};
use std::sync::Arc;
use uuid::Uuid;

/// Couples the synchronous workflow to the outbound messaging seam.
/// Every method mutates state first and dispatches afterwards, so a
/// gateway failure can never leave a command half-applied; delivery
/// errors are surfaced alongside the already-committed result.
pub struct ReconOrchestrator {
    workflow: ReconciliationWorkflow,
    notifier: Arc<dyn NotificationAdapter>,
}

/// A committed command result plus the delivery error, if dispatch failed.
#[derive(Debug)]
pub struct Notified<T> {
    pub result: T,
    pub delivery_error: Option<String>,
}

impl ReconOrchestrator {
    pub fn new(workflow: ReconciliationWorkflow, notifier: Arc<dyn NotificationAdapter>) -> Self {
        Self { workflow, notifier }
    }

    /// Report a discrepancy; when a verification was created, ask the
    /// customer to confirm via the notification adapter.
    pub async fn report_discrepancy(
        &mut self,
        order_id: &str,
        amount: f64,
        send_verification: bool,
    ) -> ReconResult<Notified<DiscrepancyReport>> {
        let report = self
            .workflow
            .report_discrepancy(order_id, amount, send_verification)?;

        let mut delivery_error = None;
        if let Some(verification) = &report.verification {
            let event = VerificationRequestedEvent {
                verification_id: verification.id,
                order_id: verification.order_id.clone(),
                timestamp: verification.sent_at.timestamp(),
            };
            if let Err(err) = self.notifier.send_verification_request(&event).await {
                tracing::warn!(order_id, error = %err, "verification request delivery failed");
                delivery_error = Some(err.to_string());
            }
        }

        Ok(Notified {
            result: report,
            delivery_error,
        })
    }

    /// Escalate a case and alert the ops channel. A same-status no-op
    /// (the case was already escalated) sends nothing.
    pub async fn escalate_case(
        &mut self,
        id: &Uuid,
        reason: &str,
    ) -> ReconResult<Notified<Discrepancy>> {
        let already_escalated = self
            .workflow
            .discrepancy(id)
            .map(|c| c.status == DiscrepancyStatus::Escalated)
            .unwrap_or(false);

        let case = self.workflow.escalate_case(id, reason)?;

        if already_escalated {
            return Ok(Notified {
                result: case,
                delivery_error: None,
            });
        }

        let event = CaseEscalatedEvent {
            discrepancy_id: case.id,
            order_id: case.order_id.clone(),
            reason: reason.to_string(),
            timestamp: case.escalated_at.map(|t| t.timestamp()).unwrap_or_default(),
        };
        let mut delivery_error = None;
        if let Err(err) = self.notifier.send_escalation_alert(&event).await {
            tracing::warn!(discrepancy_id = %id, error = %err, "escalation alert delivery failed");
            delivery_error = Some(err.to_string());
        }

        Ok(Notified {
            result: case,
            delivery_error,
        })
    }

    /// Commands with no outbound message pass straight through.
    pub fn workflow(&mut self) -> &mut ReconciliationWorkflow {
        &mut self.workflow
    }
}
