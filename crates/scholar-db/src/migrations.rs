//! Schema creation and in-place column patching.
//!
//! There is no version table. Base tables are created when missing, then
//! every column in [`COLUMN_PATCHES`] is added to databases that predate it.

use crate::error::{DbError, DbResult};
use chrono::Utc;
use rusqlite::{params, Connection};
use tracing::{debug, info};

/// A column that may be missing from an older database.
#[derive(Debug, Clone, Copy)]
pub struct ColumnPatch {
    pub table: &'static str,
    pub column: &'static str,
    /// Column type and default as used in `ALTER TABLE ... ADD COLUMN`.
    pub definition: &'static str,
}

/// Columns added after the first release, in the order they are applied.
///
/// SQLite rejects non-constant defaults in `ADD COLUMN`, so `created_at`
/// is added nullable and backfilled.
pub const COLUMN_PATCHES: &[ColumnPatch] = &[
    ColumnPatch {
        table: "users",
        column: "name",
        definition: "TEXT DEFAULT NULL",
    },
    ColumnPatch {
        table: "users",
        column: "student_id",
        definition: "TEXT DEFAULT NULL",
    },
    ColumnPatch {
        table: "users",
        column: "major",
        definition: "TEXT DEFAULT 'Computer Science'",
    },
    ColumnPatch {
        table: "users",
        column: "profile_picture",
        definition: "TEXT DEFAULT '/user_icon.jpg'",
    },
    ColumnPatch {
        table: "users",
        column: "morgan_connected",
        definition: "INTEGER NOT NULL DEFAULT 0",
    },
    ColumnPatch {
        table: "users",
        column: "created_at",
        definition: "TEXT DEFAULT NULL",
    },
    ColumnPatch {
        table: "chat_history",
        column: "session_id",
        definition: "TEXT NOT NULL DEFAULT 'default'",
    },
];

/// Create missing tables, add missing columns and (re)create indexes.
pub fn initialize_schema(conn: &Connection) -> DbResult<Vec<String>> {
    create_base_schema(conn)?;

    let mut added = Vec::new();
    for patch in COLUMN_PATCHES {
        if apply_patch(conn, patch)? {
            added.push(format!("{}.{}", patch.table, patch.column));
        }
    }

    backfill_created_at(conn)?;
    create_indexes(conn)?;

    if added.is_empty() {
        debug!("Database schema is up to date");
    } else {
        info!("Database schema patched: {}", added.join(", "));
    }

    Ok(added)
}

/// Check whether `table` has a column named `column`.
pub fn column_exists(conn: &Connection, table: &str, column: &str) -> DbResult<bool> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({})", table))?;
    let names = stmt
        .query_map([], |row| row.get::<_, String>(1))?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(names.iter().any(|name| name.eq_ignore_ascii_case(column)))
}

fn apply_patch(conn: &Connection, patch: &ColumnPatch) -> DbResult<bool> {
    if column_exists(conn, patch.table, patch.column)? {
        debug!("Column '{}.{}' already exists", patch.table, patch.column);
        return Ok(false);
    }

    let sql = format!(
        "ALTER TABLE {} ADD COLUMN {} {}",
        patch.table, patch.column, patch.definition
    );
    conn.execute(&sql, []).map_err(|e| {
        DbError::Migration(format!(
            "failed to add column {}.{}: {}",
            patch.table, patch.column, e
        ))
    })?;

    info!("Added column: {}.{}", patch.table, patch.column);
    Ok(true)
}

fn create_base_schema(conn: &Connection) -> DbResult<()> {
    conn.execute_batch(
        r#"
        -- Accounts. Profile columns are added by the patcher.
        CREATE TABLE IF NOT EXISTS users (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            email TEXT NOT NULL UNIQUE,
            password_hash TEXT NOT NULL,
            role TEXT NOT NULL DEFAULT 'student'
        );

        -- Question/answer exchanges
        CREATE TABLE IF NOT EXISTS chat_history (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            query TEXT NOT NULL,
            response TEXT NOT NULL,
            timestamp TEXT NOT NULL
        );

        -- Documents uploaded for file-grounded chat
        CREATE TABLE IF NOT EXISTS uploaded_files (
            id TEXT PRIMARY KEY,
            user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            filename TEXT NOT NULL,
            stored_path TEXT NOT NULL,
            content_type TEXT,
            content_hash TEXT NOT NULL,
            content_text TEXT NOT NULL,
            created_at TEXT NOT NULL
        );
        "#,
    )?;
    Ok(())
}

fn backfill_created_at(conn: &Connection) -> DbResult<()> {
    let rows = conn.execute(
        "UPDATE users SET created_at = ?1 WHERE created_at IS NULL",
        params![Utc::now().to_rfc3339()],
    )?;
    if rows > 0 {
        debug!("Backfilled created_at for {} users", rows);
    }
    Ok(())
}

fn create_indexes(conn: &Connection) -> DbResult<()> {
    conn.execute_batch(
        r#"
        CREATE INDEX IF NOT EXISTS idx_chat_history_user_session
            ON chat_history(user_id, session_id);
        CREATE INDEX IF NOT EXISTS idx_uploaded_files_user
            ON uploaded_files(user_id);
        "#,
    )?;
    Ok(())
}
