//! Recorded terminal-output frames.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One chunk of captured terminal output. Frames belong to exactly
/// one session and are ordered by `time` ascending.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordedFrame {
    pub session_uid: String,
    pub tenant_id: Uuid,
    pub time: DateTime<Utc>,
    pub message: String,
    pub width: u32,
    pub height: u32,
}

/// Input for appending a frame. The session reference and tenant are
/// taken from the owning session at append time.
#[derive(Debug, Clone)]
pub struct NewFrame {
    pub time: DateTime<Utc>,
    pub message: String,
    pub width: u32,
    pub height: u32,
}
