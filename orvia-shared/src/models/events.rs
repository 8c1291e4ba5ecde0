use crate::pii::Redacted;
use uuid::Uuid;

/// Events emitted by reconciliation commands after state mutation
/// completes. The caller (notification pipeline, audit log) consumes
/// these; the core never sends anything itself.

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone)]
pub struct DiscrepancyRecordedEvent {
    pub discrepancy_id: Uuid,
    pub order_id: String,
    pub amount: f64,
    pub verification_requested: bool,
    pub timestamp: i64,
}

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone)]
pub struct VerificationRequestedEvent {
    pub verification_id: Uuid,
    pub order_id: String,
    pub timestamp: i64,
}

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone)]
pub struct VerificationRespondedEvent {
    pub verification_id: Uuid,
    pub order_id: String,
    pub outcome: String,
    pub customer_response: Option<Redacted<String>>,
    pub timestamp: i64,
}

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone)]
pub struct CaseEscalatedEvent {
    pub discrepancy_id: Uuid,
    pub order_id: String,
    pub reason: String,
    pub timestamp: i64,
}
