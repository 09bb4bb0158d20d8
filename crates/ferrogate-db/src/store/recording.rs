//! SurrealDB implementation of [`RecordingStore`].
//!
//! Frames live in their own table keyed off the owning session's UID.
//! The archive coordinates the session's `recorded` flag: first append
//! sets it, and a retention purge that empties a session resets it.

use chrono::{DateTime, Utc};
use ferrogate_core::error::FerrogateResult;
use ferrogate_core::models::recording::{NewFrame, RecordedFrame};
use ferrogate_core::store::{PurgeOutcome, RecordingStore};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use crate::error::DbError;

#[derive(Debug, SurrealValue)]
struct FrameRow {
    session_uid: String,
    tenant_id: String,
    time: DateTime<Utc>,
    message: String,
    width: u32,
    height: u32,
}

impl FrameRow {
    fn into_frame(self) -> Result<RecordedFrame, DbError> {
        let tenant_id = Uuid::parse_str(&self.tenant_id)
            .map_err(|e| DbError::Row(format!("invalid tenant UUID: {e}")))?;
        Ok(RecordedFrame {
            session_uid: self.session_uid,
            tenant_id,
            time: self.time,
            message: self.message,
            width: self.width,
            height: self.height,
        })
    }
}

/// Projection of the owning session used when appending.
#[derive(Debug, SurrealValue)]
struct SessionRefRow {
    tenant_id: String,
}

/// Distinct session UIDs whose frames match a purge cutoff.
#[derive(Debug, SurrealValue)]
struct AffectedRow {
    session_uid: String,
}

/// Row struct for count queries.
#[derive(Debug, SurrealValue)]
struct CountRow {
    total: u64,
}

/// SurrealDB implementation of the recording archive.
#[derive(Clone)]
pub struct SurrealRecordingStore<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealRecordingStore<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }

    async fn frame_count(&self, uid: &str) -> Result<u64, DbError> {
        let mut result = self
            .db
            .query(
                "SELECT count() AS total FROM recorded_frame \
                 WHERE session_uid = $uid GROUP ALL",
            )
            .bind(("uid", uid.to_string()))
            .await?;
        let rows: Vec<CountRow> = result.take(0)?;
        Ok(rows.first().map(|r| r.total).unwrap_or(0))
    }
}

impl<C: Connection> RecordingStore for SurrealRecordingStore<C> {
    async fn create_frame(&self, uid: &str, frame: NewFrame) -> FerrogateResult<()> {
        // The owning session must exist; its tenant is copied onto the
        // frame document.
        let mut result = self
            .db
            .query("SELECT tenant_id FROM type::record('session', $uid)")
            .bind(("uid", uid.to_string()))
            .await
            .map_err(DbError::from)?;

        let sessions: Vec<SessionRefRow> = result.take(0).map_err(DbError::from)?;
        let session = sessions.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "session".into(),
            id: uid.into(),
        })?;

        self.db
            .query(
                "CREATE recorded_frame SET \
                 session_uid = $session_uid, \
                 tenant_id = $tenant_id, \
                 time = $time, \
                 message = $message, \
                 width = $width, \
                 height = $height",
            )
            .bind(("session_uid", uid.to_string()))
            .bind(("tenant_id", session.tenant_id))
            .bind(("time", frame.time))
            .bind(("message", frame.message))
            .bind(("width", frame.width))
            .bind(("height", frame.height))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(DbError::from)?;

        // First append flips the flag; later appends re-assert it.
        self.db
            .query("UPDATE type::record('session', $uid) SET recorded = true")
            .bind(("uid", uid.to_string()))
            .await
            .map_err(DbError::from)?;

        Ok(())
    }

    async fn frames(&self, uid: &str) -> FerrogateResult<(Vec<RecordedFrame>, u64)> {
        let total = self.frame_count(uid).await.map_err(DbError::from)?;

        let mut result = self
            .db
            .query(
                "SELECT * FROM recorded_frame \
                 WHERE session_uid = $uid ORDER BY time ASC",
            )
            .bind(("uid", uid.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<FrameRow> = result.take(0).map_err(DbError::from)?;
        let frames = rows
            .into_iter()
            .map(|row| row.into_frame())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok((frames, total))
    }

    async fn delete_frames(&self, uid: &str) -> FerrogateResult<()> {
        let total = self.frame_count(uid).await.map_err(DbError::from)?;
        if total == 0 {
            return Err(DbError::NotFound {
                entity: "recorded_frame".into(),
                id: uid.into(),
            }
            .into());
        }

        self.db
            .query("DELETE recorded_frame WHERE session_uid = $uid")
            .bind(("uid", uid.to_string()))
            .await
            .map_err(DbError::from)?;

        Ok(())
    }

    async fn purge_before(&self, cutoff: DateTime<Utc>) -> FerrogateResult<PurgeOutcome> {
        // Two independently counted effects off one cutoff: frames
        // deleted, then sessions left empty get their flag reset.
        let mut count_result = self
            .db
            .query(
                "SELECT count() AS total FROM recorded_frame \
                 WHERE time <= $cutoff GROUP ALL",
            )
            .bind(("cutoff", cutoff))
            .await
            .map_err(DbError::from)?;
        let count_rows: Vec<CountRow> = count_result.take(0).map_err(DbError::from)?;
        let frames_deleted = count_rows.first().map(|r| r.total).unwrap_or(0);

        if frames_deleted == 0 {
            return Ok(PurgeOutcome {
                frames_deleted: 0,
                sessions_updated: 0,
            });
        }

        let mut affected_result = self
            .db
            .query(
                "SELECT session_uid FROM recorded_frame \
                 WHERE time <= $cutoff GROUP BY session_uid",
            )
            .bind(("cutoff", cutoff))
            .await
            .map_err(DbError::from)?;
        let affected: Vec<AffectedRow> = affected_result.take(0).map_err(DbError::from)?;

        self.db
            .query("DELETE recorded_frame WHERE time <= $cutoff")
            .bind(("cutoff", cutoff))
            .await
            .map_err(DbError::from)?;

        // Sweep the touched sessions; each flag reset is an
        // independent conditional update, safe to re-run.
        let mut sessions_updated = 0;
        for row in affected {
            if self.frame_count(&row.session_uid).await.map_err(DbError::from)? > 0 {
                continue;
            }

            let mut update_result = self
                .db
                .query(
                    "UPDATE type::record('session', $uid) SET recorded = false \
                     WHERE recorded = true",
                )
                .bind(("uid", row.session_uid))
                .await
                .map_err(DbError::from)?;

            let updated: Vec<SessionRefRow> = update_result.take(0).map_err(DbError::from)?;
            if !updated.is_empty() {
                sessions_updated += 1;
            }
        }

        Ok(PurgeOutcome {
            frames_deleted,
            sessions_updated,
        })
    }
}
