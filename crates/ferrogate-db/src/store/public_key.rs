//! SurrealDB implementation of [`PublicKeyStore`].

use chrono::{DateTime, Utc};
use ferrogate_core::error::FerrogateResult;
use ferrogate_core::models::public_key::{NewPublicKey, PublicKey};
use ferrogate_core::store::PublicKeyStore;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use crate::error::DbError;

#[derive(Debug, SurrealValue)]
struct PublicKeyRow {
    tenant_id: String,
    name: String,
    data: String,
    created_at: DateTime<Utc>,
}

impl PublicKeyRow {
    fn into_public_key(self, fingerprint: String) -> Result<PublicKey, DbError> {
        let tenant_id = Uuid::parse_str(&self.tenant_id)
            .map_err(|e| DbError::Row(format!("invalid tenant UUID: {e}")))?;
        Ok(PublicKey {
            fingerprint,
            tenant_id,
            name: self.name,
            data: self.data,
            created_at: self.created_at,
        })
    }
}

/// SurrealDB implementation of the registered-key store. Records are
/// keyed by fingerprint.
#[derive(Clone)]
pub struct SurrealPublicKeyStore<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealPublicKeyStore<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> PublicKeyStore for SurrealPublicKeyStore<C> {
    async fn create(&self, input: NewPublicKey) -> FerrogateResult<PublicKey> {
        let fingerprint = input.fingerprint.clone();

        let result = self
            .db
            .query(
                "CREATE type::record('public_key', $fingerprint) SET \
                 tenant_id = $tenant_id, \
                 name = $name, \
                 data = $data",
            )
            .bind(("fingerprint", fingerprint.clone()))
            .bind(("tenant_id", input.tenant_id.to_string()))
            .bind(("name", input.name))
            .bind(("data", input.data))
            .await
            .map_err(DbError::from)?;

        let mut result = result.check().map_err(DbError::from)?;

        let rows: Vec<PublicKeyRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "public_key".into(),
            id: fingerprint.clone(),
        })?;

        Ok(row.into_public_key(fingerprint)?)
    }

    async fn get(&self, fingerprint: &str) -> FerrogateResult<PublicKey> {
        let mut result = self
            .db
            .query("SELECT * FROM type::record('public_key', $fingerprint)")
            .bind(("fingerprint", fingerprint.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<PublicKeyRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "public_key".into(),
            id: fingerprint.into(),
        })?;

        Ok(row.into_public_key(fingerprint.into())?)
    }
}
