//! Database migrations using a versioned migration pattern.
//!
//! Each migration runs exactly once and is tracked in the
//! `schema_migrations` table. Migrations are applied in order by version
//! number.

use rusqlite::{params, Connection};

/// A database migration with a version number, name, and SQL to execute.
pub struct Migration {
    /// Unique version number (migrations run in order)
    pub version: i64,
    /// Human-readable name for the migration
    pub name: &'static str,
    /// SQL to execute (can be multiple statements)
    pub sql: &'static str,
}

/// All migrations in order. New migrations should be added at the end.
pub const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        name: "create_workspace_snapshots_table",
        sql: r#"
            CREATE TABLE IF NOT EXISTS workspace_snapshots (
                key TEXT PRIMARY KEY,
                payload TEXT NOT NULL
            );
        "#,
    },
    Migration {
        version: 2,
        name: "create_audit_queue_table",
        sql: r#"
            CREATE TABLE IF NOT EXISTS audit_queue (
                key TEXT PRIMARY KEY,
                payload TEXT NOT NULL
            );
        "#,
    },
];

/// Run all pending migrations against the given connection.
pub fn run_migrations(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            applied_at TEXT NOT NULL
        );",
    )?;

    for migration in MIGRATIONS {
        let applied: bool = conn
            .query_row(
                "SELECT 1 FROM schema_migrations WHERE version = ?1",
                params![migration.version],
                |_| Ok(true),
            )
            .unwrap_or(false);
        if applied {
            continue;
        }

        conn.execute_batch(migration.sql)?;
        conn.execute(
            "INSERT INTO schema_migrations (version, name, applied_at) VALUES (?1, ?2, ?3)",
            params![
                migration.version,
                migration.name,
                chrono::Utc::now().to_rfc3339()
            ],
        )?;
        tracing::debug!(version = migration.version, name = migration.name, "Applied migration");
    }

    Ok(())
}
