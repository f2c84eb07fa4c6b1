//! User CRUD operations.

use crate::database::Database;
use crate::error::{is_constraint_violation, DbError, DbResult};
use crate::operations::parse_timestamp;
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use scholar_core::{NewUser, ProfileUpdate, Role, User, UserId, DEFAULT_MAJOR, DEFAULT_PROFILE_PICTURE};

const USER_COLUMNS: &str = "id, email, password_hash, role, name, student_id, major, \
                            profile_picture, morgan_connected, created_at";

impl Database {
    /// Create a new user. Fails with [`DbError::Duplicate`] when the email is taken.
    pub fn create_user(&self, user: &NewUser) -> DbResult<User> {
        let conn = self.conn()?;
        conn.execute(
            r#"
            INSERT INTO users (email, password_hash, role, major, profile_picture, morgan_connected, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, 0, ?6)
            "#,
            params![
                user.email,
                user.password_hash,
                user.role.as_str(),
                DEFAULT_MAJOR,
                DEFAULT_PROFILE_PICTURE,
                Utc::now().to_rfc3339(),
            ],
        )
        .map_err(|e| {
            if is_constraint_violation(&e) {
                DbError::Duplicate(format!("Email already registered: {}", user.email))
            } else {
                DbError::from(e)
            }
        })?;

        let id = conn.last_insert_rowid();
        fetch_user(&conn, id)
    }

    /// Get a user by ID.
    pub fn get_user(&self, id: UserId) -> DbResult<User> {
        let conn = self.conn()?;
        fetch_user(&conn, id)
    }

    /// Find a user by email.
    pub fn find_user_by_email(&self, email: &str) -> DbResult<Option<User>> {
        let conn = self.conn()?;
        let user = conn
            .query_row(
                &format!("SELECT {} FROM users WHERE email = ?1", USER_COLUMNS),
                params![email],
                row_to_user,
            )
            .optional()?;
        Ok(user)
    }

    /// Apply a partial profile update and return the updated user.
    pub fn update_profile(&self, id: UserId, update: &ProfileUpdate) -> DbResult<User> {
        let conn = self.conn()?;
        let rows = conn.execute(
            r#"
            UPDATE users
            SET name = COALESCE(?2, name),
                student_id = COALESCE(?3, student_id),
                major = COALESCE(?4, major)
            WHERE id = ?1
            "#,
            params![id, update.name, update.student_id, update.major],
        )?;

        if rows == 0 {
            return Err(DbError::NotFound(format!("User not found: {}", id)));
        }

        fetch_user(&conn, id)
    }

    /// Replace a user's password hash.
    pub fn update_password(&self, id: UserId, password_hash: &str) -> DbResult<()> {
        self.update_user_column(id, "password_hash", password_hash)
    }

    /// Point the profile picture at a new URL.
    pub fn set_profile_picture(&self, id: UserId, url: &str) -> DbResult<()> {
        self.update_user_column(id, "profile_picture", url)
    }

    /// Change a user's role.
    pub fn set_role(&self, id: UserId, role: Role) -> DbResult<()> {
        self.update_user_column(id, "role", role.as_str())
    }

    /// Mark the user's institution account as linked (or unlinked).
    pub fn set_morgan_connected(&self, id: UserId, connected: bool) -> DbResult<()> {
        let conn = self.conn()?;
        let rows = conn.execute(
            "UPDATE users SET morgan_connected = ?2 WHERE id = ?1",
            params![id, connected],
        )?;
        if rows == 0 {
            return Err(DbError::NotFound(format!("User not found: {}", id)));
        }
        Ok(())
    }

    /// Delete a user; chat history and uploads cascade.
    pub fn delete_user(&self, id: UserId) -> DbResult<()> {
        let conn = self.conn()?;
        let rows = conn.execute("DELETE FROM users WHERE id = ?1", params![id])?;
        if rows == 0 {
            return Err(DbError::NotFound(format!("User not found: {}", id)));
        }
        Ok(())
    }

    /// Count registered users.
    pub fn count_users(&self) -> DbResult<i64> {
        let conn = self.conn()?;
        let count = conn.query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))?;
        Ok(count)
    }

    fn update_user_column(&self, id: UserId, column: &'static str, value: &str) -> DbResult<()> {
        let conn = self.conn()?;
        let rows = conn.execute(
            &format!("UPDATE users SET {} = ?2 WHERE id = ?1", column),
            params![id, value],
        )?;
        if rows == 0 {
            return Err(DbError::NotFound(format!("User not found: {}", id)));
        }
        Ok(())
    }
}

fn fetch_user(conn: &Connection, id: UserId) -> DbResult<User> {
    conn.query_row(
        &format!("SELECT {} FROM users WHERE id = ?1", USER_COLUMNS),
        params![id],
        row_to_user,
    )
    .map_err(|e| match e {
        rusqlite::Error::QueryReturnedNoRows => DbError::NotFound(format!("User not found: {}", id)),
        _ => DbError::from(e),
    })
}

fn row_to_user(row: &rusqlite::Row) -> rusqlite::Result<User> {
    let role_str: String = row.get(3)?;
    let created_at: Option<String> = row.get(9)?;

    Ok(User {
        id: row.get(0)?,
        email: row.get(1)?,
        password_hash: row.get(2)?,
        role: role_str.parse().unwrap_or_default(),
        name: row.get(4)?,
        student_id: row.get(5)?,
        major: row.get(6)?,
        profile_picture: row.get(7)?,
        morgan_connected: row.get::<_, Option<bool>>(8)?.unwrap_or(false),
        created_at: parse_timestamp(created_at),
    })
}
