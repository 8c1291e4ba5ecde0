use crate::models::{CustomerVerification, VerificationOutcome};
use orvia_core::clock::Clock;
use orvia_core::{ReconError, ReconResult};
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

/// Ledger of customer verification outreach records. Many records may
/// exist per order (retries); each accepts exactly one terminal response.
pub struct VerificationLedger {
    verifications: HashMap<Uuid, CustomerVerification>,
    clock: Arc<dyn Clock>,
}

impl VerificationLedger {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            verifications: HashMap::new(),
            clock,
        }
    }

    /// Create a new outreach record in SENT state. Analytics mutation is
    /// the workflow's job, not this ledger's.
    pub fn send(&mut self, order_id: &str) -> ReconResult<CustomerVerification> {
        if order_id.is_empty() {
            return Err(ReconError::ValidationError(
                "order id must not be empty".to_string(),
            ));
        }

        let verification = CustomerVerification::new(order_id.to_string(), self.clock.now());
        self.verifications
            .insert(verification.id, verification.clone());
        Ok(verification)
    }

    /// Record the customer's terminal response. Re-responding to an
    /// already-terminal record is rejected.
    pub fn record_response(
        &mut self,
        id: &Uuid,
        outcome: VerificationOutcome,
        customer_response: Option<String>,
    ) -> ReconResult<CustomerVerification> {
        let now = self.clock.now();
        let verification = self
            .verifications
            .get_mut(id)
            .ok_or_else(|| ReconError::NotFoundError(format!("verification {}", id)))?;

        if verification.status.is_terminal() {
            return Err(ReconError::InvalidStateError(format!(
                "verification {} already has a terminal response ({:?})",
                id, verification.status
            )));
        }

        verification.record_outcome(outcome, customer_response, now);
        Ok(verification.clone())
    }

    pub fn get(&self, id: &Uuid) -> Option<&CustomerVerification> {
        self.verifications.get(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &CustomerVerification> {
        self.verifications.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::VerificationStatus;
    use orvia_core::clock::SystemClock;

    fn ledger() -> VerificationLedger {
        VerificationLedger::new(Arc::new(SystemClock))
    }

    #[test]
    fn send_creates_record_in_sent_state() {
        let mut verifications = ledger();
        let verification = verifications.send("ORD-1").unwrap();

        assert_eq!(verification.status, VerificationStatus::Sent);
        assert!(verification.responded_at.is_none());
        assert!(verification.customer_response.is_none());
    }

    #[test]
    fn send_rejects_empty_order_id() {
        let mut verifications = ledger();
        assert!(matches!(
            verifications.send(""),
            Err(ReconError::ValidationError(_))
        ));
    }

    #[test]
    fn record_response_is_single_use() {
        let mut verifications = ledger();
        let verification = verifications.send("ORD-1").unwrap();

        let updated = verifications
            .record_response(
                &verification.id,
                VerificationOutcome::Disputed,
                Some("I only paid 100".to_string()),
            )
            .unwrap();
        assert_eq!(updated.status, VerificationStatus::Disputed);
        assert!(updated.responded_at.is_some());

        // Second response must be rejected, ledger unchanged
        let result = verifications.record_response(
            &verification.id,
            VerificationOutcome::Confirmed,
            None,
        );
        assert!(matches!(result, Err(ReconError::InvalidStateError(_))));
        assert_eq!(
            verifications.get(&verification.id).unwrap().status,
            VerificationStatus::Disputed
        );
    }

    #[test]
    fn unknown_verification_is_not_found() {
        let mut verifications = ledger();
        let result =
            verifications.record_response(&Uuid::new_v4(), VerificationOutcome::Confirmed, None);
        assert!(matches!(result, Err(ReconError::NotFoundError(_))));
    }

    #[test]
    fn retries_create_independent_records() {
        let mut verifications = ledger();
        let first = verifications.send("ORD-1").unwrap();
        let second = verifications.send("ORD-1").unwrap();

        assert_ne!(first.id, second.id);
        verifications
            .record_response(&first.id, VerificationOutcome::Expired, None)
            .unwrap();
        assert_eq!(
            verifications.get(&second.id).unwrap().status,
            VerificationStatus::Sent
        );
    }
}
