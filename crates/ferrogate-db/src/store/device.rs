//! SurrealDB implementation of [`DeviceStore`] and [`DeviceTagStore`].
//!
//! Tag mutations are single conditional updates whose result set
//! doubles as the existence check: an empty update result means the
//! match predicate (device present, tag present, tenant carries the
//! tag) did not hold, which maps to NotFound.

use chrono::{DateTime, Utc};
use ferrogate_core::error::FerrogateResult;
use ferrogate_core::models::device::{Device, DeviceStatus, NewDevice};
use ferrogate_core::models::position::Position;
use ferrogate_core::store::{DeviceStore, DeviceTagStore};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use crate::error::DbError;

#[derive(Debug, SurrealValue)]
struct PositionRow {
    longitude: f64,
    latitude: f64,
}

#[derive(Debug, SurrealValue)]
pub(crate) struct DeviceRow {
    name: String,
    tenant_id: String,
    mac: String,
    public_key: String,
    status: String,
    tags: Vec<String>,
    position: Option<PositionRow>,
    created_at: DateTime<Utc>,
    last_seen: DateTime<Utc>,
}

fn parse_status(s: &str) -> Result<DeviceStatus, DbError> {
    match s {
        "Accepted" => Ok(DeviceStatus::Accepted),
        "Pending" => Ok(DeviceStatus::Pending),
        "Rejected" => Ok(DeviceStatus::Rejected),
        other => Err(DbError::Row(format!("unknown device status: {other}"))),
    }
}

impl DeviceRow {
    pub(crate) fn into_device(self, uid: String) -> Result<Device, DbError> {
        let tenant_id = Uuid::parse_str(&self.tenant_id)
            .map_err(|e| DbError::Row(format!("invalid tenant UUID: {e}")))?;
        Ok(Device {
            uid,
            name: self.name,
            tenant_id,
            mac: self.mac,
            public_key: self.public_key,
            status: parse_status(&self.status)?,
            tags: self.tags,
            position: self.position.map(|p| Position {
                longitude: p.longitude,
                latitude: p.latitude,
            }),
            created_at: self.created_at,
            last_seen: self.last_seen,
        })
    }
}

/// Fetch a device snapshot for denormalized session reads. A missing
/// device is not an error here.
pub(crate) async fn fetch_device<C: Connection>(
    db: &Surreal<C>,
    uid: &str,
) -> Result<Option<Device>, DbError> {
    let mut result = db
        .query("SELECT * FROM type::record('device', $uid)")
        .bind(("uid", uid.to_string()))
        .await?;

    let rows: Vec<DeviceRow> = result.take(0)?;
    rows.into_iter()
        .next()
        .map(|row| row.into_device(uid.to_string()))
        .transpose()
}

/// SurrealDB implementation of the device store and tag registry.
#[derive(Clone)]
pub struct SurrealDeviceStore<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealDeviceStore<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }

    async fn tag_update(
        &self,
        query: &'static str,
        bindings: Vec<(&'static str, String)>,
        entity: &str,
        id: String,
    ) -> FerrogateResult<()> {
        let mut builder = self.db.query(query);
        for (key, value) in bindings {
            builder = builder.bind((key, value));
        }
        let mut result = builder.await.map_err(DbError::from)?;

        let rows: Vec<DeviceRow> = result.take(0).map_err(DbError::from)?;
        if rows.is_empty() {
            return Err(DbError::NotFound {
                entity: entity.into(),
                id,
            }
            .into());
        }
        Ok(())
    }
}

impl<C: Connection> DeviceStore for SurrealDeviceStore<C> {
    async fn create(&self, input: NewDevice) -> FerrogateResult<Device> {
        // Upsert keyed by UID: the same identity assertion always
        // resolves to the same record.
        if let Some(existing) = fetch_device(&self.db, &input.uid).await.map_err(DbError::from)? {
            return Ok(existing);
        }

        let uid = input.uid.clone();
        let result = self
            .db
            .query(
                "CREATE type::record('device', $uid) SET \
                 name = $name, \
                 tenant_id = $tenant_id, \
                 mac = $mac, \
                 public_key = $public_key, \
                 status = $status, \
                 tags = []",
            )
            .bind(("uid", uid.clone()))
            .bind(("name", input.name))
            .bind(("tenant_id", input.tenant_id.to_string()))
            .bind(("mac", input.mac))
            .bind(("public_key", input.public_key))
            .bind(("status", "Pending".to_string()))
            .await
            .map_err(DbError::from)?;

        let mut result = result.check().map_err(DbError::from)?;

        let rows: Vec<DeviceRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "device".into(),
            id: uid.clone(),
        })?;

        Ok(row.into_device(uid)?)
    }

    async fn get(&self, uid: &str) -> FerrogateResult<Device> {
        fetch_device(&self.db, uid)
            .await
            .map_err(DbError::from)?
            .ok_or_else(|| {
                DbError::NotFound {
                    entity: "device".into(),
                    id: uid.into(),
                }
                .into()
            })
    }

    async fn set_position(&self, uid: &str, position: Position) -> FerrogateResult<()> {
        let mut result = self
            .db
            .query(
                "UPDATE type::record('device', $uid) SET \
                 position = { longitude: $longitude, latitude: $latitude }",
            )
            .bind(("uid", uid.to_string()))
            .bind(("longitude", position.longitude))
            .bind(("latitude", position.latitude))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<DeviceRow> = result.take(0).map_err(DbError::from)?;
        if rows.is_empty() {
            return Err(DbError::NotFound {
                entity: "device".into(),
                id: uid.into(),
            }
            .into());
        }
        Ok(())
    }

    async fn set_last_seen(&self, uid: &str) -> FerrogateResult<()> {
        let mut result = self
            .db
            .query("UPDATE type::record('device', $uid) SET last_seen = time::now()")
            .bind(("uid", uid.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<DeviceRow> = result.take(0).map_err(DbError::from)?;
        if rows.is_empty() {
            return Err(DbError::NotFound {
                entity: "device".into(),
                id: uid.into(),
            }
            .into());
        }
        Ok(())
    }
}

impl<C: Connection> DeviceTagStore for SurrealDeviceStore<C> {
    async fn create_tag(&self, uid: &str, tag: &str) -> FerrogateResult<()> {
        // Set union: adding a tag the device already carries is a
        // no-op success.
        self.tag_update(
            "UPDATE type::record('device', $uid) SET \
             tags = array::union(tags, [$tag])",
            vec![("uid", uid.to_string()), ("tag", tag.to_string())],
            "device",
            uid.into(),
        )
        .await
    }

    async fn remove_tag(&self, uid: &str, tag: &str) -> FerrogateResult<()> {
        // The CONTAINS predicate makes a missing tag indistinguishable
        // from a missing device: both are NotFound.
        self.tag_update(
            "UPDATE type::record('device', $uid) SET \
             tags = array::difference(tags, [$tag]) \
             WHERE tags CONTAINS $tag",
            vec![("uid", uid.to_string()), ("tag", tag.to_string())],
            "device",
            format!("{uid} tag={tag}"),
        )
        .await
    }

    async fn update_tags(&self, uid: &str, tags: &[String]) -> FerrogateResult<()> {
        let mut result = self
            .db
            .query(
                "UPDATE type::record('device', $uid) SET \
                 tags = array::distinct($tags)",
            )
            .bind(("uid", uid.to_string()))
            .bind(("tags", tags.to_vec()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<DeviceRow> = result.take(0).map_err(DbError::from)?;
        if rows.is_empty() {
            return Err(DbError::NotFound {
                entity: "device".into(),
                id: uid.into(),
            }
            .into());
        }
        Ok(())
    }

    async fn rename_tag(
        &self,
        tenant_id: Uuid,
        old_tag: &str,
        new_tag: &str,
    ) -> FerrogateResult<()> {
        // Multi-document sweep; each row update is idempotent.
        self.tag_update(
            "UPDATE device SET \
             tags = array::union(array::difference(tags, [$old_tag]), [$new_tag]) \
             WHERE tenant_id = $tenant_id AND tags CONTAINS $old_tag",
            vec![
                ("tenant_id", tenant_id.to_string()),
                ("old_tag", old_tag.to_string()),
                ("new_tag", new_tag.to_string()),
            ],
            "device",
            format!("tenant={tenant_id} tag={old_tag}"),
        )
        .await
    }

    async fn delete_tag(&self, tenant_id: Uuid, tag: &str) -> FerrogateResult<()> {
        self.tag_update(
            "UPDATE device SET \
             tags = array::difference(tags, [$tag]) \
             WHERE tenant_id = $tenant_id AND tags CONTAINS $tag",
            vec![
                ("tenant_id", tenant_id.to_string()),
                ("tag", tag.to_string()),
            ],
            "device",
            format!("tenant={tenant_id} tag={tag}"),
        )
        .await
    }
}
