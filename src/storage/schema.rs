//! Database schema and migrations.

use anyhow::Result;
use rusqlite::Connection;

/// Run all pending migrations.
pub fn migrate(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS metric_records (
            id INTEGER PRIMARY KEY,
            supplier TEXT NOT NULL,
            record_date TEXT NOT NULL,
            login_count INTEGER NOT NULL DEFAULT 0,
            learn_count INTEGER NOT NULL DEFAULT 0,
            cheat_count INTEGER NOT NULL DEFAULT 0,
            face_success_count INTEGER NOT NULL DEFAULT 0,
            face_fail_count INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS problems (
            id INTEGER PRIMARY KEY,
            title TEXT NOT NULL,
            responsible TEXT NOT NULL,
            status TEXT NOT NULL DEFAULT '待整改',
            discovered_at TEXT NOT NULL,
            deadline TEXT NOT NULL,
            created_at TEXT NOT NULL DEFAULT (datetime('now')),
            updated_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX IF NOT EXISTS idx_metric_records_date ON metric_records(record_date);
        CREATE INDEX IF NOT EXISTS idx_metric_records_supplier ON metric_records(supplier);
        CREATE INDEX IF NOT EXISTS idx_problems_status ON problems(status);
        CREATE INDEX IF NOT EXISTS idx_problems_deadline ON problems(deadline);",
    )?;

    Ok(())
}
