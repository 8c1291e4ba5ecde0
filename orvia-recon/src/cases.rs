use crate::models::{Discrepancy, DiscrepancyStatus};
use orvia_core::clock::Clock;
use orvia_core::{ReconError, ReconResult};
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

/// Outcome of a single case transition. `previous` and `changed` let the
/// workflow derive the aggregate delta without re-reading the store.
#[derive(Debug, Clone)]
pub struct CaseTransition {
    pub record: Discrepancy,
    pub previous: DiscrepancyStatus,
    pub changed: bool,
}

/// Owns discrepancy case records and their status transitions
pub struct CaseStore {
    cases: HashMap<Uuid, Discrepancy>,
    clock: Arc<dyn Clock>,
}

impl CaseStore {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            cases: HashMap::new(),
            clock,
        }
    }

    /// Create a new case in DETECTED state
    pub fn record(&mut self, order_id: &str, amount: f64) -> ReconResult<Discrepancy> {
        if order_id.is_empty() {
            return Err(ReconError::ValidationError(
                "order id must not be empty".to_string(),
            ));
        }
        if !amount.is_finite() {
            return Err(ReconError::ValidationError(format!(
                "discrepancy amount must be finite, got {}",
                amount
            )));
        }

        let case = Discrepancy::new(order_id.to_string(), amount, self.clock.now());
        self.cases.insert(case.id, case.clone());
        Ok(case)
    }

    /// Transition: Detected → PendingVerification, applied by the workflow
    /// in the same step that creates the customer verification.
    pub(crate) fn mark_pending_verification(&mut self, id: &Uuid) -> ReconResult<Discrepancy> {
        let case = self.get_case_mut(id)?;
        case.status = DiscrepancyStatus::PendingVerification;
        case.customer_verification_sent = true;
        Ok(case.clone())
    }

    /// Transition an existing case. The only reachable targets are
    /// RESOLVED and ESCALATED; a transition to the current status is a
    /// no-op returning the unchanged record. For ESCALATED the `notes`
    /// argument carries the escalation reason.
    pub fn update_status(
        &mut self,
        id: &Uuid,
        new_status: DiscrepancyStatus,
        resolution: Option<String>,
        notes: Option<String>,
    ) -> ReconResult<CaseTransition> {
        let now = self.clock.now();
        let case = self.get_case_mut(id)?;
        let previous = case.status;

        if previous == new_status {
            return Ok(CaseTransition {
                record: case.clone(),
                previous,
                changed: false,
            });
        }

        if previous.is_terminal() {
            return Err(ReconError::InvalidStateError(format!(
                "invalid transition from {:?} to {:?}",
                previous, new_status
            )));
        }

        match new_status {
            DiscrepancyStatus::Resolved => {
                let resolution = resolution.unwrap_or_else(|| "resolved".to_string());
                case.resolve(resolution, notes, now);
            }
            DiscrepancyStatus::Escalated => {
                let reason = notes
                    .or(resolution)
                    .unwrap_or_else(|| "escalated".to_string());
                case.escalate(reason, now);
            }
            other => {
                return Err(ReconError::InvalidStateError(format!(
                    "invalid transition from {:?} to {:?}",
                    previous, other
                )));
            }
        }

        Ok(CaseTransition {
            record: case.clone(),
            previous,
            changed: true,
        })
    }

    /// Apply the single-case transition to every id, skipping unknown ids,
    /// ids already in the target status, and ids the transition rules
    /// reject. Returns only the transitions that changed a case, so a
    /// duplicated id counts at most once.
    pub fn bulk_update(
        &mut self,
        ids: &[Uuid],
        new_status: DiscrepancyStatus,
        resolution: Option<String>,
        notes: Option<String>,
    ) -> Vec<CaseTransition> {
        let mut changed = Vec::new();
        for id in ids {
            match self.update_status(id, new_status, resolution.clone(), notes.clone()) {
                Ok(transition) if transition.changed => changed.push(transition),
                // Partial success is the designed behavior: ids already in
                // the target status, unknown ids and rejected transitions
                // are skipped, not errors.
                Ok(_) | Err(_) => {}
            }
        }
        changed
    }

    pub fn get(&self, id: &Uuid) -> Option<&Discrepancy> {
        self.cases.get(id)
    }

    /// The order's most recently detected case still awaiting the
    /// customer, if any.
    pub fn find_pending_by_order(&self, order_id: &str) -> Option<&Discrepancy> {
        self.cases
            .values()
            .filter(|c| c.order_id == order_id && c.status == DiscrepancyStatus::PendingVerification)
            .max_by_key(|c| c.detected_at)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Discrepancy> {
        self.cases.values()
    }

    pub fn len(&self) -> usize {
        self.cases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cases.is_empty()
    }

    fn get_case_mut(&mut self, id: &Uuid) -> ReconResult<&mut Discrepancy> {
        self.cases
            .get_mut(id)
            .ok_or_else(|| ReconError::NotFoundError(format!("discrepancy {}", id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use orvia_core::clock::SystemClock;

    fn store() -> CaseStore {
        CaseStore::new(Arc::new(SystemClock))
    }

    #[test]
    fn record_validates_input() {
        let mut cases = store();

        assert!(matches!(
            cases.record("", 10.0),
            Err(ReconError::ValidationError(_))
        ));
        assert!(matches!(
            cases.record("ORD-1", f64::NAN),
            Err(ReconError::ValidationError(_))
        ));
        assert!(matches!(
            cases.record("ORD-1", f64::INFINITY),
            Err(ReconError::ValidationError(_))
        ));

        let case = cases.record("ORD-1", -32.5).unwrap();
        assert_eq!(case.status, DiscrepancyStatus::Detected);
        assert!(!case.customer_verification_sent);
    }

    #[test]
    fn resolve_from_detected() {
        let mut cases = store();
        let case = cases.record("ORD-1", 10.0).unwrap();

        let transition = cases
            .update_status(
                &case.id,
                DiscrepancyStatus::Resolved,
                Some("agent_error".to_string()),
                Some("till miscount".to_string()),
            )
            .unwrap();

        assert!(transition.changed);
        assert_eq!(transition.previous, DiscrepancyStatus::Detected);
        assert_eq!(transition.record.status, DiscrepancyStatus::Resolved);
        assert_eq!(transition.record.resolution.as_deref(), Some("agent_error"));
        assert!(transition.record.resolved_at.is_some());
    }

    #[test]
    fn resolved_is_terminal() {
        let mut cases = store();
        let case = cases.record("ORD-1", 10.0).unwrap();
        cases
            .update_status(&case.id, DiscrepancyStatus::Resolved, None, None)
            .unwrap();

        let result = cases.update_status(
            &case.id,
            DiscrepancyStatus::Escalated,
            None,
            Some("too late".to_string()),
        );
        assert!(matches!(result, Err(ReconError::InvalidStateError(_))));
    }

    #[test]
    fn same_status_transition_is_a_noop() {
        let mut cases = store();
        let case = cases.record("ORD-1", 10.0).unwrap();
        cases
            .update_status(&case.id, DiscrepancyStatus::Escalated, None, Some("x".to_string()))
            .unwrap();

        let again = cases
            .update_status(&case.id, DiscrepancyStatus::Escalated, None, Some("y".to_string()))
            .unwrap();
        assert!(!again.changed);
        // Record unchanged, including the original reason
        assert_eq!(again.record.escalation_reason.as_deref(), Some("x"));
    }

    #[test]
    fn escalated_can_still_be_resolved() {
        let mut cases = store();
        let case = cases.record("ORD-1", 10.0).unwrap();
        cases
            .update_status(&case.id, DiscrepancyStatus::Escalated, None, Some("fraud".to_string()))
            .unwrap();

        let transition = cases
            .update_status(
                &case.id,
                DiscrepancyStatus::Resolved,
                Some("manager_override".to_string()),
                None,
            )
            .unwrap();
        assert!(transition.changed);
        assert!(transition.record.escalated_at.is_some());
        assert!(transition.record.resolved_at.is_some());
    }

    #[test]
    fn unknown_id_is_not_found() {
        let mut cases = store();
        let result = cases.update_status(&Uuid::new_v4(), DiscrepancyStatus::Resolved, None, None);
        assert!(matches!(result, Err(ReconError::NotFoundError(_))));
    }

    #[test]
    fn bulk_update_skips_ineligible_ids() {
        let mut cases = store();
        let escalated = cases.record("ORD-1", 10.0).unwrap();
        cases
            .update_status(&escalated.id, DiscrepancyStatus::Escalated, None, Some("a".to_string()))
            .unwrap();
        let fresh = cases.record("ORD-2", 20.0).unwrap();

        // escalated id (already in target), duplicate, and an unknown id
        let ids = vec![escalated.id, fresh.id, escalated.id, Uuid::new_v4()];
        let changed = cases.bulk_update(
            &ids,
            DiscrepancyStatus::Escalated,
            None,
            Some("fraud suspected".to_string()),
        );

        assert_eq!(changed.len(), 1);
        assert_eq!(changed[0].record.id, fresh.id);
    }
}
