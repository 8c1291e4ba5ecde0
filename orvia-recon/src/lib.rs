pub mod analytics;
pub mod cases;
pub mod deductions;
pub mod models;
pub mod orchestrator;
pub mod verification;
pub mod workflow;

pub use analytics::Analytics;
pub use cases::CaseStore;
pub use deductions::DeductionLedger;
pub use models::{
    AgentDeduction, CustomerVerification, DeductionStatus, Discrepancy, DiscrepancyStatus,
    VerificationOutcome, VerificationStatus,
};
pub use orchestrator::ReconOrchestrator;
pub use verification::VerificationLedger;
pub use workflow::ReconciliationWorkflow;
