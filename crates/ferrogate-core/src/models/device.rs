//! Device domain model.
//!
//! Device UIDs are 64-character hex strings derived from the device's
//! identity assertion, not server-generated UUIDs — the same device
//! always resolves to the same UID.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::position::Position;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum DeviceStatus {
    Accepted,
    Pending,
    Rejected,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Device {
    pub uid: String,
    pub name: String,
    pub tenant_id: Uuid,
    /// MAC address carried in the device's identity assertion.
    pub mac: String,
    pub public_key: String,
    pub status: DeviceStatus,
    /// Unordered, unique tag set. Owned by the tag registry.
    pub tags: Vec<String>,
    pub position: Option<Position>,
    pub created_at: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
}

/// Input for device creation. Creation is an upsert keyed by UID: a
/// device that already exists is returned unchanged.
#[derive(Debug, Clone)]
pub struct NewDevice {
    pub uid: String,
    pub name: String,
    pub tenant_id: Uuid,
    pub mac: String,
    pub public_key: String,
}
