//! Error types for the delegate subsystem.

/// Delegate subsystem error types.
#[derive(Debug, thiserror::Error)]
pub enum DelegateError {
    #[error("Block generation failed: {0}")]
    ForgeFailed(String),
}

/// Result type for delegate operations.
pub type DelegateResult<T> = Result<T, DelegateError>;
