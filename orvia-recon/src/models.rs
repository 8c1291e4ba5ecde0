use chrono::{DateTime, Utc};
use orvia_core::{ReconError, ReconResult};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Discrepancy case status in the reconciliation lifecycle
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DiscrepancyStatus {
    Detected,
    PendingVerification,
    Escalated,
    Resolved,
}

impl DiscrepancyStatus {
    /// Resolved is the only terminal state; an escalated case can still
    /// be resolved later.
    pub fn is_terminal(&self) -> bool {
        matches!(self, DiscrepancyStatus::Resolved)
    }
}

/// One detected mismatch between the amount an agent collected and the
/// amount an order actually owed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Discrepancy {
    pub id: Uuid,
    pub order_id: String,
    /// Signed: collected minus expected. Negative means a shortfall.
    pub amount: f64,
    pub detected_at: DateTime<Utc>,
    pub status: DiscrepancyStatus,
    pub customer_verification_sent: bool,
    pub resolution: Option<String>,
    pub resolution_notes: Option<String>,
    pub resolved_at: Option<DateTime<Utc>>,
    pub escalation_reason: Option<String>,
    pub escalated_at: Option<DateTime<Utc>>,
}

impl Discrepancy {
    pub fn new(order_id: String, amount: f64, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            order_id,
            amount,
            detected_at: now,
            status: DiscrepancyStatus::Detected,
            customer_verification_sent: false,
            resolution: None,
            resolution_notes: None,
            resolved_at: None,
            escalation_reason: None,
            escalated_at: None,
        }
    }

    /// Close the case. resolved_at is set iff the case is resolved.
    pub fn resolve(&mut self, resolution: String, notes: Option<String>, now: DateTime<Utc>) {
        self.status = DiscrepancyStatus::Resolved;
        self.resolution = Some(resolution);
        self.resolution_notes = notes;
        self.resolved_at = Some(now);
    }

    /// Hand the case to management. escalated_at records the first
    /// escalation and is retained if the case is resolved afterwards.
    pub fn escalate(&mut self, reason: String, now: DateTime<Utc>) {
        self.status = DiscrepancyStatus::Escalated;
        self.escalation_reason = Some(reason);
        if self.escalated_at.is_none() {
            self.escalated_at = Some(now);
        }
    }
}

/// Customer verification outreach status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VerificationStatus {
    Sent,
    Confirmed,
    Disputed,
    Expired,
    Resolved,
}

impl VerificationStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, VerificationStatus::Sent)
    }
}

/// The closed set of terminal responses a verification may receive.
/// Separate from VerificationStatus so "respond with SENT" is
/// unrepresentable rather than validated at runtime.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VerificationOutcome {
    Confirmed,
    Disputed,
    Expired,
    Resolved,
}

impl VerificationOutcome {
    /// Parse an external status literal; callers bridging string input
    /// (webhooks, admin tools) get a ValidationError for anything outside
    /// the terminal set.
    pub fn parse(value: &str) -> ReconResult<Self> {
        match value {
            "confirmed" => Ok(VerificationOutcome::Confirmed),
            "disputed" => Ok(VerificationOutcome::Disputed),
            "expired" => Ok(VerificationOutcome::Expired),
            "resolved" => Ok(VerificationOutcome::Resolved),
            other => Err(ReconError::ValidationError(format!(
                "unrecognized verification outcome: {}",
                other
            ))),
        }
    }

    pub fn as_status(&self) -> VerificationStatus {
        match self {
            VerificationOutcome::Confirmed => VerificationStatus::Confirmed,
            VerificationOutcome::Disputed => VerificationStatus::Disputed,
            VerificationOutcome::Expired => VerificationStatus::Expired,
            VerificationOutcome::Resolved => VerificationStatus::Resolved,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            VerificationOutcome::Confirmed => "confirmed",
            VerificationOutcome::Disputed => "disputed",
            VerificationOutcome::Expired => "expired",
            VerificationOutcome::Resolved => "resolved",
        }
    }
}

/// One outreach attempt asking the customer to confirm a collected amount
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomerVerification {
    pub id: Uuid,
    pub order_id: String,
    pub sent_at: DateTime<Utc>,
    pub status: VerificationStatus,
    pub customer_response: Option<String>,
    pub responded_at: Option<DateTime<Utc>>,
}

impl CustomerVerification {
    pub fn new(order_id: String, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            order_id,
            sent_at: now,
            status: VerificationStatus::Sent,
            customer_response: None,
            responded_at: None,
        }
    }

    /// Apply the customer's terminal response. At most one per record.
    pub fn record_outcome(
        &mut self,
        outcome: VerificationOutcome,
        customer_response: Option<String>,
        now: DateTime<Utc>,
    ) {
        self.status = outcome.as_status();
        self.customer_response = customer_response;
        self.responded_at = Some(now);
    }
}

/// Agent deduction ledger entry status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DeductionStatus {
    Processed,
    Reversed,
}

/// A ledger entry removing funds from a delivery agent's payable balance
/// to cover a shortfall.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentDeduction {
    pub id: Uuid,
    pub driver_id: String,
    pub amount: f64,
    pub processed_at: DateTime<Utc>,
    pub status: DeductionStatus,
    pub reversal_reason: Option<String>,
    pub reversed_at: Option<DateTime<Utc>>,
}

impl AgentDeduction {
    pub fn new(driver_id: String, amount: f64, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            driver_id,
            amount,
            processed_at: now,
            status: DeductionStatus::Processed,
            reversal_reason: None,
            reversed_at: None,
        }
    }

    /// Mark as reversed (never delete the entry)
    pub fn reverse(&mut self, reason: String, now: DateTime<Utc>) {
        self.status = DeductionStatus::Reversed;
        self.reversal_reason = Some(reason);
        self.reversed_at = Some(now);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolved_is_the_only_terminal_case_status() {
        assert!(DiscrepancyStatus::Resolved.is_terminal());
        assert!(!DiscrepancyStatus::Escalated.is_terminal());
        assert!(!DiscrepancyStatus::Detected.is_terminal());
        assert!(!DiscrepancyStatus::PendingVerification.is_terminal());
    }

    #[test]
    fn escalated_at_is_retained_across_later_resolution() {
        let now = Utc::now();
        let mut case = Discrepancy::new("ORD-9".to_string(), -25.0, now);

        case.escalate("fraud suspected".to_string(), now);
        let first_escalation = case.escalated_at;
        assert!(first_escalation.is_some());

        case.resolve("manager_override".to_string(), None, now);
        assert_eq!(case.status, DiscrepancyStatus::Resolved);
        assert_eq!(case.escalated_at, first_escalation);
        assert!(case.resolved_at.is_some());
    }

    #[test]
    fn outcome_parse_rejects_non_terminal_literals() {
        assert!(VerificationOutcome::parse("confirmed").is_ok());
        assert!(VerificationOutcome::parse("sent").is_err());
        assert!(VerificationOutcome::parse("CONFIRMED").is_err());
    }

    #[test]
    fn discrepancy_serializes_as_a_flat_record() {
        let case = Discrepancy::new("ORD-1".to_string(), 150.0, Utc::now());

        let json = serde_json::to_value(&case).unwrap();
        assert_eq!(json["status"], "DETECTED");
        assert_eq!(json["order_id"], "ORD-1");
        assert_eq!(json["amount"], 150.0);
        assert_eq!(json["resolved_at"], serde_json::Value::Null);
    }
}
