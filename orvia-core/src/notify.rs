use async_trait::async_trait;
use orvia_shared::models::events::{CaseEscalatedEvent, VerificationRequestedEvent};
use std::sync::Mutex;

/// Outbound customer/ops messaging seam. The reconciliation core never
/// awaits delivery inside a command; the orchestrator dispatches through
/// this adapter after state mutation has already returned.
#[async_trait]
pub trait NotificationAdapter: Send + Sync {
    /// Ask the customer to confirm the collected amount for an order.
    async fn send_verification_request(
        &self,
        event: &VerificationRequestedEvent,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;

    /// Alert the ops channel that a case needs management-level handling.
    async fn send_escalation_alert(
        &self,
        event: &CaseEscalatedEvent,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
}

/// In-memory adapter used in tests and local runs; records every dispatch
/// so assertions can inspect what would have been sent.
#[derive(Default)]
pub struct MockSmsAdapter {
    verification_requests: Mutex<Vec<VerificationRequestedEvent>>,
    escalation_alerts: Mutex<Vec<CaseEscalatedEvent>>,
}

impl MockSmsAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn verification_requests(&self) -> Vec<VerificationRequestedEvent> {
        self.verification_requests.lock().unwrap().clone()
    }

    pub fn escalation_alerts(&self) -> Vec<CaseEscalatedEvent> {
        self.escalation_alerts.lock().unwrap().clone()
    }
}

#[async_trait]
impl NotificationAdapter for MockSmsAdapter {
    async fn send_verification_request(
        &self,
        event: &VerificationRequestedEvent,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        // Trigger for testing delivery-failure handling
        if event.order_id == "fail-delivery" {
            return Err("Simulated SMS gateway failure".into());
        }
        self.verification_requests.lock().unwrap().push(event.clone());
        Ok(())
    }

    async fn send_escalation_alert(
        &self,
        event: &CaseEscalatedEvent,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.escalation_alerts.lock().unwrap().push(event.clone());
        Ok(())
    }
}
