//! SurrealDB implementation of [`NamespaceStore`].

use chrono::{DateTime, Utc};
use ferrogate_core::error::FerrogateResult;
use ferrogate_core::models::namespace::{Member, Namespace, NewNamespace};
use ferrogate_core::store::NamespaceStore;
use serde_json::json;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use crate::error::DbError;

#[derive(Debug, SurrealValue)]
struct MemberRow {
    id: String,
    role: String,
}

impl MemberRow {
    fn into_member(self) -> Result<Member, DbError> {
        let id = Uuid::parse_str(&self.id)
            .map_err(|e| DbError::Row(format!("invalid member UUID: {e}")))?;
        Ok(Member {
            id,
            role: self.role,
        })
    }
}

#[derive(Debug, SurrealValue)]
struct NamespaceRow {
    name: String,
    owner: String,
    members: Vec<MemberRow>,
    created_at: DateTime<Utc>,
}

/// Row struct that includes the record ID via `meta::id(id)`.
#[derive(Debug, SurrealValue)]
struct NamespaceRowWithId {
    record_id: String,
    name: String,
    owner: String,
    members: Vec<MemberRow>,
    created_at: DateTime<Utc>,
}

fn row_to_namespace(
    name: String,
    owner: String,
    members: Vec<MemberRow>,
    created_at: DateTime<Utc>,
    tenant_id: Uuid,
) -> Result<Namespace, DbError> {
    let owner = Uuid::parse_str(&owner)
        .map_err(|e| DbError::Row(format!("invalid owner UUID: {e}")))?;
    let members = members
        .into_iter()
        .map(MemberRow::into_member)
        .collect::<Result<Vec<_>, DbError>>()?;
    Ok(Namespace {
        tenant_id,
        name,
        owner,
        members,
        created_at,
    })
}

/// SurrealDB implementation of the namespace store. Records are keyed
/// by the tenant UUID.
#[derive(Clone)]
pub struct SurrealNamespaceStore<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealNamespaceStore<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> NamespaceStore for SurrealNamespaceStore<C> {
    async fn create(&self, input: NewNamespace) -> FerrogateResult<Namespace> {
        let tenant_id = input.tenant_id;

        // The owner is always a member; fold it in with any extra
        // members the caller provided.
        let mut members = vec![Member {
            id: input.owner,
            role: "owner".into(),
        }];
        members.extend(input.members);

        let members_value = json!(
            members
                .iter()
                .map(|m| json!({ "id": m.id.to_string(), "role": m.role }))
                .collect::<Vec<_>>()
        );

        let result = self
            .db
            .query(
                "CREATE type::record('namespace', $tenant_id) SET \
                 name = $name, \
                 owner = $owner, \
                 members = $members",
            )
            .bind(("tenant_id", tenant_id.to_string()))
            .bind(("name", input.name))
            .bind(("owner", input.owner.to_string()))
            .bind(("members", members_value))
            .await
            .map_err(DbError::from)?;

        let mut result = result.check().map_err(DbError::from)?;

        let rows: Vec<NamespaceRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "namespace".into(),
            id: tenant_id.to_string(),
        })?;

        Ok(row_to_namespace(
            row.name,
            row.owner,
            row.members,
            row.created_at,
            tenant_id,
        )?)
    }

    async fn get(&self, tenant_id: Uuid) -> FerrogateResult<Namespace> {
        let mut result = self
            .db
            .query("SELECT * FROM type::record('namespace', $tenant_id)")
            .bind(("tenant_id", tenant_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<NamespaceRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "namespace".into(),
            id: tenant_id.to_string(),
        })?;

        Ok(row_to_namespace(
            row.name,
            row.owner,
            row.members,
            row.created_at,
            tenant_id,
        )?)
    }

    async fn member_role(&self, tenant_id: Uuid, user_id: Uuid) -> FerrogateResult<String> {
        let namespace = self.get(tenant_id).await?;

        namespace
            .members
            .into_iter()
            .find(|m| m.id == user_id)
            .map(|m| m.role)
            .ok_or_else(|| {
                DbError::NotFound {
                    entity: "namespace member".into(),
                    id: format!("tenant={tenant_id} user={user_id}"),
                }
                .into()
            })
    }

    async fn default_for_user(&self, user_id: Uuid) -> FerrogateResult<Option<Namespace>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM namespace \
                 WHERE array::len(members[WHERE id = $user_id]) > 0 \
                 ORDER BY created_at ASC LIMIT 1",
            )
            .bind(("user_id", user_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<NamespaceRowWithId> = result.take(0).map_err(DbError::from)?;
        let Some(row) = rows.into_iter().next() else {
            return Ok(None);
        };

        let tenant_id = Uuid::parse_str(&row.record_id)
            .map_err(|e| DbError::Row(format!("invalid tenant UUID: {e}")))?;

        Ok(Some(row_to_namespace(
            row.name,
            row.owner,
            row.members,
            row.created_at,
            tenant_id,
        )?))
    }
}
