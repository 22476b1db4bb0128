//! Error types for authentication and authorization operations

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// Duplicate registration (email already taken by a live account).
    #[error("email is already registered")]
    Conflict,

    /// Bad credentials, invalid/expired/foreign-device token, inactive
    /// account, or refresh-token reuse. Deliberately carries no detail:
    /// unknown email, wrong password and inactive account must be
    /// indistinguishable to the caller.
    #[error("invalid credentials")]
    Unauthorized,

    /// Role mismatch or action attempted outside the authorized shift window.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// Referenced shift record does not exist.
    #[error("shift not found: {0}")]
    NotFound(String),

    /// Token failed signature, expiry or structural checks. Internal to the
    /// credential issuer; callers surface it as `Unauthorized`.
    #[error("invalid token: {0}")]
    InvalidToken(#[from] jsonwebtoken::errors::Error),

    #[error("configuration error: {0}")]
    Config(String),

    /// Store-level failure (connectivity, corruption). Not retried here.
    #[error("store error: {0}")]
    Store(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Collapse issuer-internal token errors into the external taxonomy.
    pub(crate) fn into_unauthorized(self) -> Error {
        match self {
            Error::InvalidToken(_) => Error::Unauthorized,
            other => other,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
