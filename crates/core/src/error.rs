use thiserror::Error;

/// Errors raised while declaring resources, computing grants or building
/// metrics.
///
/// Every variant is raised synchronously at the call that broke the
/// contract; nothing is deferred to render time.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DynaformError {
    /// The operation requires a feature that is not enabled on the resource.
    #[error("precondition failed: {0}")]
    PreconditionFailed(String),

    /// Caller-supplied options break a required-field or mutual-exclusion rule.
    #[error("validation error: {0}")]
    Validation(String),

    /// A generated value breaks a downstream syntactic constraint.
    #[error("invariant violation: {0}")]
    InvariantViolation(String),

    /// Internal misuse that should be unreachable from the public API.
    #[error("logic fault: {0}")]
    LogicFault(String),

    /// A string could not be parsed as an ARN.
    #[error("invalid ARN: {0}")]
    InvalidArn(String),
}

/// Convenience alias used across the dynaform crates.
pub type Result<T> = std::result::Result<T, DynaformError>;
