pub mod clock;
pub mod notify;

/// Error taxonomy shared by every reconciliation store. All three are
/// synchronous, caller-correctable failures; nothing in the core retries.
#[derive(Debug, thiserror::Error)]
pub enum ReconError {
    #[error("Validation failed: {0}")]
    ValidationError(String),
    #[error("Not found: {0}")]
    NotFoundError(String),
    #[error("Invalid state: {0}")]
    InvalidStateError(String),
}

pub type ReconResult<T> = Result<T, ReconError>;
