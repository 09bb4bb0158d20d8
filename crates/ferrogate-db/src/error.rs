//! Database-specific error types and conversions.

use ferrogate_core::error::FerrogateError;

/// Database-layer error type.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("SurrealDB error: {0}")]
    Surreal(#[from] surrealdb::Error),

    #[error("Migration failed: {0}")]
    Migration(String),

    #[error("Malformed row: {0}")]
    Row(String),

    #[error("Record not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },
}

impl From<DbError> for FerrogateError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => FerrogateError::NotFound { entity, id },
            other => FerrogateError::Database(other.to_string()),
        }
    }
}
