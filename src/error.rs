//! Error types for the support agent core.

/// Top-level error type for update and supervision operations.
#[derive(Debug, thiserror::Error)]
pub enum AgentError {
    /// Transport failure, non-success HTTP status, or request timeout.
    #[error("network error: {0}")]
    Network(String),

    /// Malformed version text from the remote endpoint.
    #[error("version parse error: {0}")]
    Parse(String),

    /// Disk read/write failure, including permission denial.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// An executable expected on disk is absent.
    #[error("missing executable: {0}")]
    MissingExecutable(String),

    /// Cooperative cancellation observed at a suspension point.
    #[error("operation cancelled")]
    Cancelled,
}

/// Convenience result type.
pub type Result<T> = std::result::Result<T, AgentError>;
