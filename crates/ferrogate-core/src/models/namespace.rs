//! Tenant namespace domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Membership entry: a user and the role it holds in the namespace.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Member {
    pub id: Uuid,
    pub role: String,
}

/// Isolation boundary grouping devices, sessions, and users. The
/// tenant ID doubles as the namespace identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Namespace {
    pub tenant_id: Uuid,
    pub name: String,
    pub owner: Uuid,
    pub members: Vec<Member>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewNamespace {
    pub tenant_id: Uuid,
    pub name: String,
    pub owner: Uuid,
    /// Additional members beyond the owner (who is always a member).
    pub members: Vec<Member>,
}
