//! SurrealDB implementation of [`SessionStore`].
//!
//! Session records are keyed by their 64-char hex UID. Every
//! single-field mutation is one conditional update; an empty update
//! result set means the UID matched nothing and maps to NotFound.

use chrono::{DateTime, Utc};
use ferrogate_core::error::FerrogateResult;
use ferrogate_core::models::position::Position;
use ferrogate_core::models::session::{NewSession, Session, SessionKind};
use ferrogate_core::store::{Page, SessionStore};
use sha2::{Digest, Sha256};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use crate::error::DbError;
use crate::store::device::fetch_device;

#[derive(Debug, SurrealValue)]
struct PositionRow {
    longitude: f64,
    latitude: f64,
}

#[derive(Debug, SurrealValue)]
struct SessionRow {
    device_uid: String,
    tenant_id: String,
    username: String,
    ip_address: String,
    started_at: DateTime<Utc>,
    last_seen: DateTime<Utc>,
    active: bool,
    closed: bool,
    authenticated: bool,
    recorded: bool,
    kind: String,
    term: String,
    position: PositionRow,
}

/// Row struct that includes the record ID via `meta::id(id)`.
#[derive(Debug, SurrealValue)]
struct SessionRowWithId {
    record_id: String,
    device_uid: String,
    tenant_id: String,
    username: String,
    ip_address: String,
    started_at: DateTime<Utc>,
    last_seen: DateTime<Utc>,
    active: bool,
    closed: bool,
    authenticated: bool,
    recorded: bool,
    kind: String,
    term: String,
    position: PositionRow,
}

/// Row struct for count queries.
#[derive(Debug, SurrealValue)]
struct CountRow {
    total: u64,
}

fn parse_kind(s: &str) -> Result<SessionKind, DbError> {
    match s {
        "Shell" => Ok(SessionKind::Shell),
        "Exec" => Ok(SessionKind::Exec),
        other => Err(DbError::Row(format!("unknown session kind: {other}"))),
    }
}

fn kind_to_string(kind: SessionKind) -> &'static str {
    match kind {
        SessionKind::Shell => "Shell",
        SessionKind::Exec => "Exec",
    }
}

fn row_to_session(row: SessionRow, uid: String) -> Result<Session, DbError> {
    let tenant_id = Uuid::parse_str(&row.tenant_id)
        .map_err(|e| DbError::Row(format!("invalid tenant UUID: {e}")))?;
    Ok(Session {
        uid,
        device_uid: row.device_uid,
        device: None,
        tenant_id,
        username: row.username,
        ip_address: row.ip_address,
        started_at: row.started_at,
        last_seen: row.last_seen,
        active: row.active,
        closed: row.closed,
        authenticated: row.authenticated,
        recorded: row.recorded,
        kind: parse_kind(&row.kind)?,
        term: row.term,
        position: Position {
            longitude: row.position.longitude,
            latitude: row.position.latitude,
        },
    })
}

impl SessionRowWithId {
    fn try_into_session(self) -> Result<Session, DbError> {
        let uid = self.record_id.clone();
        row_to_session(
            SessionRow {
                device_uid: self.device_uid,
                tenant_id: self.tenant_id,
                username: self.username,
                ip_address: self.ip_address,
                started_at: self.started_at,
                last_seen: self.last_seen,
                active: self.active,
                closed: self.closed,
                authenticated: self.authenticated,
                recorded: self.recorded,
                kind: self.kind,
                term: self.term,
                position: self.position,
            },
            uid,
        )
    }
}

/// Generate a fresh 64-char hex session UID.
fn generate_uid() -> String {
    let mut hasher = Sha256::new();
    hasher.update(Uuid::new_v4().as_bytes());
    hex::encode(hasher.finalize())
}

/// SurrealDB implementation of the session ledger.
#[derive(Clone)]
pub struct SurrealSessionStore<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealSessionStore<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }

    /// Single-field conditional update; empty result set means the
    /// UID matched nothing.
    async fn update_one(
        &self,
        uid: &str,
        query: &'static str,
    ) -> FerrogateResult<Vec<SessionRow>> {
        let mut result = self
            .db
            .query(query)
            .bind(("uid", uid.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<SessionRow> = result.take(0).map_err(DbError::from)?;
        if rows.is_empty() {
            return Err(DbError::NotFound {
                entity: "session".into(),
                id: uid.into(),
            }
            .into());
        }
        Ok(rows)
    }
}

impl<C: Connection> SessionStore for SurrealSessionStore<C> {
    async fn create(&self, input: NewSession) -> FerrogateResult<Session> {
        let uid = if input.uid.is_empty() {
            generate_uid()
        } else {
            input.uid
        };

        let result = self
            .db
            .query(
                "CREATE type::record('session', $uid) SET \
                 device_uid = $device_uid, \
                 tenant_id = $tenant_id, \
                 username = $username, \
                 ip_address = $ip_address, \
                 active = true, \
                 closed = false, \
                 authenticated = $authenticated, \
                 recorded = false, \
                 kind = $kind, \
                 term = $term, \
                 position = { longitude: $longitude, latitude: $latitude }",
            )
            .bind(("uid", uid.clone()))
            .bind(("device_uid", input.device_uid))
            .bind(("tenant_id", input.tenant_id.to_string()))
            .bind(("username", input.username))
            .bind(("ip_address", input.ip_address))
            .bind(("authenticated", input.authenticated))
            .bind(("kind", kind_to_string(input.kind).to_string()))
            .bind(("term", input.term))
            .bind(("longitude", input.position.longitude))
            .bind(("latitude", input.position.latitude))
            .await
            .map_err(DbError::from)?;

        let mut result = result.check().map_err(DbError::from)?;

        let rows: Vec<SessionRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "session".into(),
            id: uid.clone(),
        })?;

        Ok(row_to_session(row, uid)?)
    }

    async fn get(&self, uid: &str) -> FerrogateResult<Session> {
        let mut result = self
            .db
            .query("SELECT * FROM type::record('session', $uid)")
            .bind(("uid", uid.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<SessionRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "session".into(),
            id: uid.into(),
        })?;

        let mut session = row_to_session(row, uid.into())?;
        session.device = fetch_device(&self.db, &session.device_uid)
            .await
            .map_err(DbError::from)?;
        Ok(session)
    }

    async fn list(&self, page: Page) -> FerrogateResult<(Vec<Session>, u64)> {
        let mut count_result = self
            .db
            .query("SELECT count() AS total FROM session GROUP ALL")
            .await
            .map_err(DbError::from)?;
        let count_rows: Vec<CountRow> = count_result.take(0).map_err(DbError::from)?;
        let total = count_rows.first().map(|r| r.total).unwrap_or(0);

        let mut result = match page.window() {
            Some((offset, limit)) => self
                .db
                .query(
                    "SELECT meta::id(id) AS record_id, * FROM session \
                     ORDER BY started_at ASC \
                     LIMIT $limit START $offset",
                )
                .bind(("limit", limit))
                .bind(("offset", offset))
                .await
                .map_err(DbError::from)?,
            None => self
                .db
                .query(
                    "SELECT meta::id(id) AS record_id, * FROM session \
                     ORDER BY started_at ASC",
                )
                .await
                .map_err(DbError::from)?,
        };

        let rows: Vec<SessionRowWithId> = result.take(0).map_err(DbError::from)?;

        let mut sessions = Vec::with_capacity(rows.len());
        for row in rows {
            let mut session = row.try_into_session()?;
            session.device = fetch_device(&self.db, &session.device_uid)
                .await
                .map_err(DbError::from)?;
            sessions.push(session);
        }

        Ok((sessions, total))
    }

    async fn set_authenticated(&self, uid: &str, authenticated: bool) -> FerrogateResult<()> {
        let mut result = self
            .db
            .query("UPDATE type::record('session', $uid) SET authenticated = $authenticated")
            .bind(("uid", uid.to_string()))
            .bind(("authenticated", authenticated))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<SessionRow> = result.take(0).map_err(DbError::from)?;
        if rows.is_empty() {
            return Err(DbError::NotFound {
                entity: "session".into(),
                id: uid.into(),
            }
            .into());
        }
        Ok(())
    }

    async fn set_last_seen(&self, uid: &str) -> FerrogateResult<()> {
        self.update_one(
            uid,
            "UPDATE type::record('session', $uid) SET last_seen = time::now()",
        )
        .await?;
        Ok(())
    }

    async fn set_recorded(&self, uid: &str, recorded: bool) -> FerrogateResult<()> {
        let mut result = self
            .db
            .query("UPDATE type::record('session', $uid) SET recorded = $recorded")
            .bind(("uid", uid.to_string()))
            .bind(("recorded", recorded))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<SessionRow> = result.take(0).map_err(DbError::from)?;
        if rows.is_empty() {
            return Err(DbError::NotFound {
                entity: "session".into(),
                id: uid.into(),
            }
            .into());
        }
        Ok(())
    }

    async fn update_device_uid(&self, old_uid: &str, new_uid: &str) -> FerrogateResult<()> {
        // Multi-document sweep over every session referencing the old
        // device; each row update is idempotent.
        let mut result = self
            .db
            .query("UPDATE session SET device_uid = $new_uid WHERE device_uid = $old_uid")
            .bind(("old_uid", old_uid.to_string()))
            .bind(("new_uid", new_uid.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<SessionRow> = result.take(0).map_err(DbError::from)?;
        if rows.is_empty() {
            return Err(DbError::NotFound {
                entity: "session".into(),
                id: format!("device_uid={old_uid}"),
            }
            .into());
        }
        Ok(())
    }

    async fn delete_actives(&self, uid: &str) -> FerrogateResult<()> {
        self.update_one(
            uid,
            "UPDATE type::record('session', $uid) SET active = false",
        )
        .await?;
        Ok(())
    }
}
