//! Geographic position attached to devices and sessions.

use serde::{Deserialize, Serialize};

/// Network position resolved from a source IP by an external
/// geolocation collaborator. `(0, 0)` is the unresolved default.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub longitude: f64,
    pub latitude: f64,
}
