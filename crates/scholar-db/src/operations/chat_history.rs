//! Chat history operations.

use crate::database::Database;
use crate::error::{DbError, DbResult};
use crate::operations::parse_timestamp;
use chrono::Utc;
use rusqlite::params;
use scholar_core::{session_title, ChatHistory, ChatSession, UserId};

impl Database {
    /// Store one exchange and return the stored row.
    pub fn add_chat_entry(
        &self,
        user_id: UserId,
        session_id: &str,
        query: &str,
        response: &str,
    ) -> DbResult<ChatHistory> {
        let conn = self.conn()?;
        let timestamp = Utc::now();
        conn.execute(
            r#"
            INSERT INTO chat_history (user_id, session_id, query, response, timestamp)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
            params![user_id, session_id, query, response, timestamp.to_rfc3339()],
        )?;

        Ok(ChatHistory {
            id: conn.last_insert_rowid(),
            user_id,
            session_id: session_id.to_string(),
            query: query.to_string(),
            response: response.to_string(),
            timestamp,
        })
    }

    /// A user's history, oldest first, optionally limited to one session.
    pub fn chat_history(
        &self,
        user_id: UserId,
        session_id: Option<&str>,
        limit: Option<i64>,
    ) -> DbResult<Vec<ChatHistory>> {
        let conn = self.conn()?;
        // Negative LIMIT means no limit in SQLite
        let limit = limit.unwrap_or(-1);

        let sql = match session_id {
            Some(_) => {
                "SELECT id, user_id, session_id, query, response, timestamp
                 FROM chat_history WHERE user_id = ?1 AND session_id = ?2
                 ORDER BY id ASC LIMIT ?3"
            }
            None => {
                "SELECT id, user_id, session_id, query, response, timestamp
                 FROM chat_history WHERE user_id = ?1
                 ORDER BY id ASC LIMIT ?2"
            }
        };

        let mut stmt = conn.prepare(sql)?;
        let rows = if let Some(session) = session_id {
            stmt.query_map(params![user_id, session, limit], row_to_history)?
        } else {
            stmt.query_map(params![user_id, limit], row_to_history)?
        };

        rows.collect::<Result<Vec<_>, _>>().map_err(DbError::from)
    }

    /// Sessions of a user, most recently active first.
    pub fn chat_sessions(&self, user_id: UserId) -> DbResult<Vec<ChatSession>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT h.session_id,
                   COUNT(*),
                   MAX(h.timestamp),
                   (SELECT f.query FROM chat_history f
                     WHERE f.user_id = h.user_id AND f.session_id = h.session_id
                     ORDER BY f.id ASC LIMIT 1)
            FROM chat_history h
            WHERE h.user_id = ?1
            GROUP BY h.session_id
            ORDER BY MAX(h.id) DESC
            "#,
        )?;

        let sessions = stmt.query_map(params![user_id], |row| {
            let first_query: Option<String> = row.get(3)?;
            Ok(ChatSession {
                session_id: row.get(0)?,
                message_count: row.get(1)?,
                last_activity: parse_timestamp(row.get(2)?),
                title: session_title(first_query.as_deref().unwrap_or_default()),
            })
        })?;

        sessions.collect::<Result<Vec<_>, _>>().map_err(DbError::from)
    }

    /// Delete a user's history (one session or all). Returns the number of rows removed.
    pub fn clear_chat_history(&self, user_id: UserId, session_id: Option<&str>) -> DbResult<usize> {
        let conn = self.conn()?;
        let rows = match session_id {
            Some(session) => conn.execute(
                "DELETE FROM chat_history WHERE user_id = ?1 AND session_id = ?2",
                params![user_id, session],
            )?,
            None => conn.execute(
                "DELETE FROM chat_history WHERE user_id = ?1",
                params![user_id],
            )?,
        };
        Ok(rows)
    }
}

fn row_to_history(row: &rusqlite::Row) -> rusqlite::Result<ChatHistory> {
    Ok(ChatHistory {
        id: row.get(0)?,
        user_id: row.get(1)?,
        session_id: row.get(2)?,
        query: row.get(3)?,
        response: row.get(4)?,
        timestamp: parse_timestamp(row.get(5)?),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use scholar_core::NewUser;

    fn setup() -> (Database, UserId, UserId) {
        let db = Database::open_in_memory().unwrap();
        let a = db.create_user(&NewUser::student("a@school.edu", "h")).unwrap();
        let b = db.create_user(&NewUser::student("b@school.edu", "h")).unwrap();
        (db, a.id, b.id)
    }

    #[test]
    fn test_history_is_per_user_and_ordered() {
        let (db, a, b) = setup();

        db.add_chat_entry(a, "s1", "first", "one").unwrap();
        db.add_chat_entry(b, "s1", "other user", "x").unwrap();
        db.add_chat_entry(a, "s1", "second", "two").unwrap();

        let history = db.chat_history(a, None, None).unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].query, "first");
        assert_eq!(history[1].query, "second");
        assert!(history.iter().all(|h| h.user_id == a));
    }

    #[test]
    fn test_history_filtered_by_session() {
        let (db, a, _) = setup();

        db.add_chat_entry(a, "s1", "q1", "r1").unwrap();
        db.add_chat_entry(a, "s2", "q2", "r2").unwrap();

        let s2 = db.chat_history(a, Some("s2"), None).unwrap();
        assert_eq!(s2.len(), 1);
        assert_eq!(s2[0].response, "r2");

        let limited = db.chat_history(a, None, Some(1)).unwrap();
        assert_eq!(limited.len(), 1);
    }

    #[test]
    fn test_sessions_summary() {
        let (db, a, _) = setup();

        db.add_chat_entry(a, "s1", "What is COSC 111?", "r").unwrap();
        db.add_chat_entry(a, "s1", "And prerequisites?", "r").unwrap();
        db.add_chat_entry(a, "s2", "Library hours", "r").unwrap();

        let sessions = db.chat_sessions(a).unwrap();
        assert_eq!(sessions.len(), 2);
        // Most recent activity first
        assert_eq!(sessions[0].session_id, "s2");
        assert_eq!(sessions[1].title, "What is COSC 111?");
        assert_eq!(sessions[1].message_count, 2);
    }

    #[test]
    fn test_clear_history() {
        let (db, a, b) = setup();

        db.add_chat_entry(a, "s1", "q", "r").unwrap();
        db.add_chat_entry(a, "s2", "q", "r").unwrap();
        db.add_chat_entry(b, "s1", "q", "r").unwrap();

        assert_eq!(db.clear_chat_history(a, Some("s1")).unwrap(), 1);
        assert_eq!(db.chat_history(a, None, None).unwrap().len(), 1);

        assert_eq!(db.clear_chat_history(a, None).unwrap(), 1);
        assert!(db.chat_history(a, None, None).unwrap().is_empty());

        // Other users untouched
        assert_eq!(db.chat_history(b, None, None).unwrap().len(), 1);
    }

    #[test]
    fn test_history_cascades_with_user() {
        let (db, a, _) = setup();
        db.add_chat_entry(a, "s1", "q", "r").unwrap();
        db.delete_user(a).unwrap();
        assert!(db.chat_history(a, None, None).unwrap().is_empty());
    }
}
