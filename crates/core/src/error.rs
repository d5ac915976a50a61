use crate::types::DbId;

/// Domain error taxonomy for the Checkmate backend.
///
/// Every fallible operation in the domain layer surfaces one of these
/// variants; the API crate maps them onto HTTP statuses and stable error
/// codes. Admission gates (quota, credits) fail closed: when in doubt the
/// upload is denied, never admitted.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: DbId },

    #[error("Validation failed: {0}")]
    Validation(String),

    /// An order lifecycle action was attempted in the wrong state.
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// The global daily upload cap has been reached.
    #[error("Daily upload quota exceeded")]
    QuotaExceeded,

    /// The user has no upload slots left.
    #[error("Insufficient upload slots")]
    InsufficientCredits,

    /// The external mobile-money provider failed or returned garbage.
    #[error("Payment provider error: {0}")]
    PaymentProvider(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Internal error: {0}")]
    Internal(String),
}
