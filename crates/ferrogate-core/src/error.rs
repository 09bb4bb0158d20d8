//! Error types for the Ferrogate system.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum FerrogateError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },

    #[error("Entity already exists: {entity}")]
    AlreadyExists { entity: String },

    /// Client-visible authentication failure. The reason is safe to
    /// log but must not be echoed back to the caller verbatim.
    #[error("Unauthorized: {reason}")]
    Unauthorized { reason: String },

    /// A server-side wiring defect: a claim bag or context value did
    /// not have the shape the code was built against. Never a client
    /// fault and never retried.
    #[error("Type assertion failed: {0}")]
    TypeAssertion(String),

    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Database error: {0}")]
    Database(String),

    #[error("Cache error: {0}")]
    Cache(String),

    #[error("Cryptography error: {0}")]
    Crypto(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type FerrogateResult<T> = Result<T, FerrogateError>;
