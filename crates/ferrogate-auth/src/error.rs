//! Authentication error types.

use ferrogate_core::error::FerrogateError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    /// Client-visible authentication failure. The optional cause is
    /// kept for logging and never exposed to the caller.
    #[error("authentication failed")]
    Unauthorized { cause: Option<String> },

    /// The claim bag did not decode into the expected shape. A wiring
    /// defect on the issuing side, not a client fault.
    #[error("claim shape mismatch: {0}")]
    ClaimShape(String),

    #[error("token has expired")]
    TokenExpired,

    #[error("invalid token: {0}")]
    TokenInvalid(String),

    #[error("MFA is not enrolled for this user")]
    MfaNotEnrolled,

    #[error("cryptography error: {0}")]
    Crypto(String),
}

impl AuthError {
    /// Unauthorized with no recorded cause.
    pub fn unauthorized() -> Self {
        AuthError::Unauthorized { cause: None }
    }

    /// Unauthorized wrapping an internal cause for logs.
    pub fn unauthorized_with(cause: impl Into<String>) -> Self {
        AuthError::Unauthorized {
            cause: Some(cause.into()),
        }
    }
}

impl From<AuthError> for FerrogateError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Unauthorized { cause } => FerrogateError::Unauthorized {
                reason: cause.unwrap_or_else(|| "authentication failed".into()),
            },
            AuthError::ClaimShape(msg) => FerrogateError::TypeAssertion(msg),
            AuthError::TokenExpired | AuthError::TokenInvalid(_) | AuthError::MfaNotEnrolled => {
                FerrogateError::Unauthorized {
                    reason: err.to_string(),
                }
            }
            AuthError::Crypto(msg) => FerrogateError::Crypto(msg),
        }
    }
}
