//! Schema definitions and migration runner for SurrealDB.
//!
//! All table definitions use SCHEMAFULL mode for data integrity.
//! UUIDs and hex UIDs are stored as strings (hex UIDs double as record
//! IDs). Enums are stored as strings with ASSERT constraints.

use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tracing::info;

use crate::error::DbError;

// -----------------------------------------------------------------------
// Migration tracking
// -----------------------------------------------------------------------

const MIGRATION_TABLE_DDL: &str = "\
DEFINE TABLE IF NOT EXISTS _migration SCHEMAFULL;
DEFINE FIELD IF NOT EXISTS version ON TABLE _migration TYPE int;
DEFINE FIELD IF NOT EXISTS name ON TABLE _migration TYPE string;
DEFINE FIELD IF NOT EXISTS applied_at ON TABLE _migration TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX IF NOT EXISTS idx_migration_version ON TABLE _migration \
    COLUMNS version UNIQUE;
";

#[derive(Debug, SurrealValue)]
struct MigrationRecord {
    version: u32,
    #[allow(dead_code)]
    name: String,
}

struct Migration {
    version: u32,
    name: &'static str,
    sql: &'static str,
}

static MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    name: "initial_schema",
    sql: SCHEMA_V1,
}];

// -----------------------------------------------------------------------
// Schema v1 — initial table definitions
// -----------------------------------------------------------------------

const SCHEMA_V1: &str = "\
-- =======================================================================
-- Namespaces (tenant boundaries; record id = tenant UUID)
-- =======================================================================
DEFINE TABLE namespace SCHEMAFULL;
DEFINE FIELD name ON TABLE namespace TYPE string;
DEFINE FIELD owner ON TABLE namespace TYPE string;
DEFINE FIELD members ON TABLE namespace TYPE array;
DEFINE FIELD members.* ON TABLE namespace TYPE object;
DEFINE FIELD members.*.id ON TABLE namespace TYPE string;
DEFINE FIELD members.*.role ON TABLE namespace TYPE string;
DEFINE FIELD created_at ON TABLE namespace TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_namespace_name ON TABLE namespace COLUMNS name UNIQUE;

-- =======================================================================
-- Users (global scope; record id = user UUID)
-- =======================================================================
DEFINE TABLE user SCHEMAFULL;
DEFINE FIELD username ON TABLE user TYPE string;
DEFINE FIELD email ON TABLE user TYPE string;
DEFINE FIELD password_hash ON TABLE user TYPE string;
DEFINE FIELD mfa_enabled ON TABLE user TYPE bool DEFAULT false;
DEFINE FIELD mfa_secret ON TABLE user TYPE option<string>;
DEFINE FIELD created_at ON TABLE user TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE user TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_user_username ON TABLE user COLUMNS username UNIQUE;
DEFINE INDEX idx_user_email ON TABLE user COLUMNS email UNIQUE;

-- =======================================================================
-- Devices (record id = 64-char hex UID)
-- =======================================================================
DEFINE TABLE device SCHEMAFULL;
DEFINE FIELD name ON TABLE device TYPE string;
DEFINE FIELD tenant_id ON TABLE device TYPE string;
DEFINE FIELD mac ON TABLE device TYPE string;
DEFINE FIELD public_key ON TABLE device TYPE string;
DEFINE FIELD status ON TABLE device TYPE string \
    ASSERT $value IN ['Accepted', 'Pending', 'Rejected'];
DEFINE FIELD tags ON TABLE device TYPE array DEFAULT [];
DEFINE FIELD tags.* ON TABLE device TYPE string;
DEFINE FIELD position ON TABLE device TYPE option<object> FLEXIBLE;
DEFINE FIELD created_at ON TABLE device TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD last_seen ON TABLE device TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_device_tenant ON TABLE device COLUMNS tenant_id;

-- =======================================================================
-- Sessions (record id = 64-char hex UID)
-- =======================================================================
DEFINE TABLE session SCHEMAFULL;
DEFINE FIELD device_uid ON TABLE session TYPE string;
DEFINE FIELD tenant_id ON TABLE session TYPE string;
DEFINE FIELD username ON TABLE session TYPE string;
DEFINE FIELD ip_address ON TABLE session TYPE string;
DEFINE FIELD started_at ON TABLE session TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD last_seen ON TABLE session TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD active ON TABLE session TYPE bool DEFAULT true;
DEFINE FIELD closed ON TABLE session TYPE bool DEFAULT false;
DEFINE FIELD authenticated ON TABLE session TYPE bool DEFAULT false;
DEFINE FIELD recorded ON TABLE session TYPE bool DEFAULT false;
DEFINE FIELD kind ON TABLE session TYPE string \
    ASSERT $value IN ['Shell', 'Exec'];
DEFINE FIELD term ON TABLE session TYPE string;
DEFINE FIELD position ON TABLE session TYPE object;
DEFINE FIELD position.longitude ON TABLE session TYPE float;
DEFINE FIELD position.latitude ON TABLE session TYPE float;
DEFINE INDEX idx_session_device ON TABLE session COLUMNS device_uid;
DEFINE INDEX idx_session_tenant ON TABLE session COLUMNS tenant_id;

-- =======================================================================
-- Recorded terminal frames (append-only per session, except purge)
-- =======================================================================
DEFINE TABLE recorded_frame SCHEMAFULL;
DEFINE FIELD session_uid ON TABLE recorded_frame TYPE string;
DEFINE FIELD tenant_id ON TABLE recorded_frame TYPE string;
DEFINE FIELD time ON TABLE recorded_frame TYPE datetime;
DEFINE FIELD message ON TABLE recorded_frame TYPE string;
DEFINE FIELD width ON TABLE recorded_frame TYPE int;
DEFINE FIELD height ON TABLE recorded_frame TYPE int;
DEFINE INDEX idx_frame_session_time ON TABLE recorded_frame \
    COLUMNS session_uid, time;

-- =======================================================================
-- Registered SSH public keys (record id = fingerprint)
-- =======================================================================
DEFINE TABLE public_key SCHEMAFULL;
DEFINE FIELD tenant_id ON TABLE public_key TYPE string;
DEFINE FIELD name ON TABLE public_key TYPE string;
DEFINE FIELD data ON TABLE public_key TYPE string;
DEFINE FIELD created_at ON TABLE public_key TYPE datetime \
    DEFAULT time::now();
";

// -----------------------------------------------------------------------
// Public API
// -----------------------------------------------------------------------

/// Run all pending migrations against the given SurrealDB client.
///
/// Creates a `_migration` tracking table on first run, then applies
/// each migration whose version exceeds the current maximum.
/// All DEFINE statements are idempotent so re-running is safe.
pub async fn run_migrations<C: Connection>(db: &Surreal<C>) -> Result<(), DbError> {
    // Ensure migration tracking table exists (idempotent).
    db.query(MIGRATION_TABLE_DDL)
        .await?
        .check()
        .map_err(|e| DbError::Migration(e.to_string()))?;

    // Determine current schema version.
    let mut result = db
        .query("SELECT * FROM _migration ORDER BY version DESC LIMIT 1")
        .await?;
    let records: Vec<MigrationRecord> = result.take(0)?;
    let current_version = records.first().map(|m| m.version).unwrap_or(0);

    for migration in MIGRATIONS {
        if migration.version > current_version {
            info!(
                version = migration.version,
                name = migration.name,
                "Applying migration"
            );
            db.query(migration.sql).await?.check().map_err(|e| {
                DbError::Migration(format!(
                    "Migration v{} '{}' failed: {}",
                    migration.version, migration.name, e,
                ))
            })?;

            // Record the applied migration.
            db.query(
                "CREATE _migration SET version = $version, \
                 name = $name",
            )
            .bind(("version", migration.version))
            .bind(("name", migration.name))
            .await?
            .check()
            .map_err(|e| {
                DbError::Migration(format!(
                    "Failed to record migration v{}: {}",
                    migration.version, e,
                ))
            })?;
        }
    }

    Ok(())
}

/// Returns the raw schema DDL for version 1.
///
/// Exposed for testing with in-memory SurrealDB instances that
/// bypass the migration runner.
pub fn schema_v1() -> &'static str {
    SCHEMA_V1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_v1_is_nonempty() {
        assert!(!SCHEMA_V1.is_empty());
    }

    #[test]
    fn migrations_are_ordered() {
        for window in MIGRATIONS.windows(2) {
            assert!(
                window[0].version < window[1].version,
                "Migrations must be in ascending version order"
            );
        }
    }
}
