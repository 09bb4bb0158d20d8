//! Registered SSH public keys used for public-key device login.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublicKey {
    /// Key fingerprint, the lookup handle for proof validation.
    pub fingerprint: String,
    pub tenant_id: Uuid,
    pub name: String,
    /// Key material in the authorized-keys wire format.
    pub data: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewPublicKey {
    pub fingerprint: String,
    pub tenant_id: Uuid,
    pub name: String,
    pub data: String,
}
