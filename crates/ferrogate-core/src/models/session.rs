//! Remote-access session domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::device::Device;
use crate::models::position::Position;

/// Kind of remote-access session.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum SessionKind {
    /// Interactive shell with an allocated terminal.
    Shell,
    /// One-shot command execution.
    Exec,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    /// 64-character hex UID, unique across all tenants.
    pub uid: String,
    /// UID of the device the session runs on. Rewritten in place when
    /// a device is re-keyed.
    pub device_uid: String,
    /// Snapshot of the current device record, denormalized on reads.
    pub device: Option<Device>,
    pub tenant_id: Uuid,
    pub username: String,
    pub ip_address: String,
    pub started_at: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
    pub active: bool,
    pub closed: bool,
    pub authenticated: bool,
    /// True once at least one terminal frame has been archived for
    /// this session; reset when all of its frames are purged.
    pub recorded: bool,
    pub kind: SessionKind,
    /// Terminal name, empty for one-shot sessions.
    pub term: String,
    pub position: Position,
}

/// Input for session creation.
///
/// `started_at`, `last_seen` and the `active`/`closed`/`recorded`
/// flags are server-assigned. An empty `uid` is replaced with a
/// generated one.
#[derive(Debug, Clone)]
pub struct NewSession {
    pub uid: String,
    pub device_uid: String,
    pub tenant_id: Uuid,
    pub username: String,
    pub ip_address: String,
    pub authenticated: bool,
    pub kind: SessionKind,
    pub term: String,
    pub position: Position,
}
