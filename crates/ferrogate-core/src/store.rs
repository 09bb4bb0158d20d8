//! Store trait definitions for data access abstraction.
//!
//! All store operations are async and resolve to a single
//! request/response round trip against the persistence collaborator.
//! Every single-document mutation is one atomic conditional update
//! (condition = existence/match predicate); multi-document sweeps are
//! sequences of independently idempotent row updates and may be
//! interrupted without corrupting any individual document.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::FerrogateResult;
use crate::models::{
    device::{Device, NewDevice},
    namespace::{Namespace, NewNamespace},
    position::Position,
    public_key::{NewPublicKey, PublicKey},
    recording::{NewFrame, RecordedFrame},
    session::{NewSession, Session},
    user::{NewUser, User},
};

/// Pagination window for list queries.
///
/// Both fields negative means "no pagination": the full result set is
/// returned in one page.
#[derive(Debug, Clone, Copy)]
pub struct Page {
    pub page: i64,
    pub per_page: i64,
}

impl Page {
    /// The unpaginated query: every matching record, one page.
    pub fn none() -> Self {
        Self {
            page: -1,
            per_page: -1,
        }
    }

    /// Offset/limit for this window, or `None` when unpaginated.
    /// A non-positive page number is clamped to the first page.
    pub fn window(&self) -> Option<(u64, u64)> {
        if self.page < 0 && self.per_page < 0 {
            return None;
        }
        let per_page = self.per_page.max(1) as u64;
        let page = self.page.max(1) as u64;
        Some(((page - 1) * per_page, per_page))
    }
}

impl Default for Page {
    fn default() -> Self {
        Self {
            page: 1,
            per_page: 10,
        }
    }
}

/// Outcome of a retention purge: two independently counted effects
/// driven by one cutoff.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PurgeOutcome {
    /// Frames deleted across all sessions.
    pub frames_deleted: u64,
    /// Sessions whose `recorded` flag was reset because no frames
    /// remained after the deletion.
    pub sessions_updated: u64,
}

// ---------------------------------------------------------------------------
// Session ledger
// ---------------------------------------------------------------------------

pub trait SessionStore: Send + Sync {
    /// Insert a new session. An empty UID is replaced with a
    /// generated one; fails only on storage conflict.
    fn create(&self, input: NewSession) -> impl Future<Output = FerrogateResult<Session>> + Send;

    /// Full session including a denormalized snapshot of its current
    /// device record.
    fn get(&self, uid: &str) -> impl Future<Output = FerrogateResult<Session>> + Send;

    /// All sessions in creation order plus the total count independent
    /// of the page window.
    fn list(&self, page: Page)
    -> impl Future<Output = FerrogateResult<(Vec<Session>, u64)>> + Send;

    fn set_authenticated(
        &self,
        uid: &str,
        authenticated: bool,
    ) -> impl Future<Output = FerrogateResult<()>> + Send;

    /// Advance the heartbeat timestamp. Last-write-wins.
    fn set_last_seen(&self, uid: &str) -> impl Future<Output = FerrogateResult<()>> + Send;

    fn set_recorded(
        &self,
        uid: &str,
        recorded: bool,
    ) -> impl Future<Output = FerrogateResult<()>> + Send;

    /// Rewrite the device reference on every session pointing at
    /// `old_uid`. NotFound when no session references it.
    fn update_device_uid(
        &self,
        old_uid: &str,
        new_uid: &str,
    ) -> impl Future<Output = FerrogateResult<()>> + Send;

    /// Administrative teardown: force one session's `active` flag
    /// false, independent of `closed`.
    fn delete_actives(&self, uid: &str) -> impl Future<Output = FerrogateResult<()>> + Send;
}

// ---------------------------------------------------------------------------
// Recording archive
// ---------------------------------------------------------------------------

pub trait RecordingStore: Send + Sync {
    /// Append a frame to a session's ordered sequence and mark the
    /// session as recorded. NotFound when the session does not exist.
    fn create_frame(
        &self,
        uid: &str,
        frame: NewFrame,
    ) -> impl Future<Output = FerrogateResult<()>> + Send;

    /// Full ordered sequence (time ascending) plus count. An empty
    /// sequence is not an error.
    fn frames(
        &self,
        uid: &str,
    ) -> impl Future<Output = FerrogateResult<(Vec<RecordedFrame>, u64)>> + Send;

    /// Delete all frames for one session. NotFound when none exist.
    fn delete_frames(&self, uid: &str) -> impl Future<Output = FerrogateResult<()>> + Send;

    /// Retention purge: delete every frame with time <= cutoff across
    /// all sessions, then reset `recorded` on every session left with
    /// zero frames. A cutoff matching nothing yields `(0, 0)`.
    fn purge_before(
        &self,
        cutoff: DateTime<Utc>,
    ) -> impl Future<Output = FerrogateResult<PurgeOutcome>> + Send;
}

// ---------------------------------------------------------------------------
// Devices & tag registry
// ---------------------------------------------------------------------------

pub trait DeviceStore: Send + Sync {
    /// Upsert keyed by UID: an existing device is returned unchanged.
    fn create(&self, input: NewDevice) -> impl Future<Output = FerrogateResult<Device>> + Send;

    fn get(&self, uid: &str) -> impl Future<Output = FerrogateResult<Device>> + Send;

    fn set_position(
        &self,
        uid: &str,
        position: Position,
    ) -> impl Future<Output = FerrogateResult<()>> + Send;

    fn set_last_seen(&self, uid: &str) -> impl Future<Output = FerrogateResult<()>> + Send;
}

/// Mutations of the set-valued tag attribute on device records.
pub trait DeviceTagStore: Send + Sync {
    /// Add a tag to a device's set. Adding a duplicate is a no-op
    /// success; NotFound when the device is absent.
    fn create_tag(&self, uid: &str, tag: &str)
    -> impl Future<Output = FerrogateResult<()>> + Send;

    /// Remove one tag. NotFound when the device is absent or the tag
    /// is not present on it.
    fn remove_tag(&self, uid: &str, tag: &str)
    -> impl Future<Output = FerrogateResult<()>> + Send;

    /// Replace the entire set (de-duplicated). NotFound when the
    /// device is absent.
    fn update_tags(
        &self,
        uid: &str,
        tags: &[String],
    ) -> impl Future<Output = FerrogateResult<()>> + Send;

    /// Rename a tag on every device in the tenant carrying it.
    /// NotFound when no device in the tenant carries it.
    fn rename_tag(
        &self,
        tenant_id: Uuid,
        old_tag: &str,
        new_tag: &str,
    ) -> impl Future<Output = FerrogateResult<()>> + Send;

    /// Remove a tag from every device in the tenant carrying it. Same
    /// NotFound conditions as rename.
    fn delete_tag(
        &self,
        tenant_id: Uuid,
        tag: &str,
    ) -> impl Future<Output = FerrogateResult<()>> + Send;
}

// ---------------------------------------------------------------------------
// Identity collaborators
// ---------------------------------------------------------------------------

pub trait NamespaceStore: Send + Sync {
    fn create(
        &self,
        input: NewNamespace,
    ) -> impl Future<Output = FerrogateResult<Namespace>> + Send;

    fn get(&self, tenant_id: Uuid) -> impl Future<Output = FerrogateResult<Namespace>> + Send;

    /// Role the user holds in the namespace. NotFound when the
    /// namespace is absent or the user is not a member.
    fn member_role(
        &self,
        tenant_id: Uuid,
        user_id: Uuid,
    ) -> impl Future<Output = FerrogateResult<String>> + Send;

    /// The namespace a bare login resolves to: the user's
    /// earliest-created membership, or `None` for a tenant-less token.
    fn default_for_user(
        &self,
        user_id: Uuid,
    ) -> impl Future<Output = FerrogateResult<Option<Namespace>>> + Send;
}

pub trait UserStore: Send + Sync {
    fn create(&self, input: NewUser) -> impl Future<Output = FerrogateResult<User>> + Send;

    fn get_by_id(&self, id: Uuid) -> impl Future<Output = FerrogateResult<User>> + Send;

    fn get_by_username(
        &self,
        username: &str,
    ) -> impl Future<Output = FerrogateResult<User>> + Send;

    /// Authoritative MFA-required state for the subject.
    fn mfa_status(&self, id: Uuid) -> impl Future<Output = FerrogateResult<bool>> + Send;

    /// Update MFA enrollment. `secret` is the encrypted TOTP secret,
    /// cleared on disable.
    fn set_mfa(
        &self,
        id: Uuid,
        enabled: bool,
        secret: Option<String>,
    ) -> impl Future<Output = FerrogateResult<()>> + Send;
}

pub trait PublicKeyStore: Send + Sync {
    fn create(
        &self,
        input: NewPublicKey,
    ) -> impl Future<Output = FerrogateResult<PublicKey>> + Send;

    fn get(&self, fingerprint: &str) -> impl Future<Output = FerrogateResult<PublicKey>> + Send;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unpaginated_page_has_no_window() {
        assert_eq!(Page::none().window(), None);
        assert_eq!(Page { page: -1, per_page: -1 }.window(), None);
    }

    #[test]
    fn window_is_zero_based() {
        assert_eq!(Page { page: 1, per_page: 10 }.window(), Some((0, 10)));
        assert_eq!(Page { page: 3, per_page: 25 }.window(), Some((50, 25)));
    }

    #[test]
    fn non_positive_page_clamps_to_first() {
        assert_eq!(Page { page: 0, per_page: 5 }.window(), Some((0, 5)));
        assert_eq!(Page { page: -1, per_page: 5 }.window(), Some((0, 5)));
    }
}
