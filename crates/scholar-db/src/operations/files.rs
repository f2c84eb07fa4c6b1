//! Uploaded file records.

use crate::database::Database;
use crate::error::{DbError, DbResult};
use crate::operations::parse_timestamp;
use rusqlite::params;
use scholar_core::{UploadedFile, UserId};

const FILE_COLUMNS: &str =
    "id, user_id, filename, stored_path, content_type, content_hash, content_text, created_at";

impl Database {
    /// Record an uploaded file.
    pub fn create_uploaded_file(&self, file: &UploadedFile) -> DbResult<()> {
        let conn = self.conn()?;
        conn.execute(
            r#"
            INSERT INTO uploaded_files (id, user_id, filename, stored_path, content_type, content_hash, content_text, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
            params![
                file.id,
                file.user_id,
                file.filename,
                file.stored_path,
                file.content_type,
                file.content_hash,
                file.content_text,
                file.created_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// Get a file owned by `user_id`. Other users' files are reported as not found.
    pub fn get_uploaded_file(&self, user_id: UserId, id: &str) -> DbResult<UploadedFile> {
        let conn = self.conn()?;
        conn.query_row(
            &format!(
                "SELECT {} FROM uploaded_files WHERE id = ?1 AND user_id = ?2",
                FILE_COLUMNS
            ),
            params![id, user_id],
            row_to_file,
        )
        .map_err(|e| match e {
            rusqlite::Error::QueryReturnedNoRows => DbError::NotFound(format!("File not found: {}", id)),
            _ => DbError::from(e),
        })
    }

    /// A user's uploads, newest first.
    pub fn list_uploaded_files(&self, user_id: UserId) -> DbResult<Vec<UploadedFile>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM uploaded_files WHERE user_id = ?1 ORDER BY created_at DESC, rowid DESC",
            FILE_COLUMNS
        ))?;
        let files = stmt.query_map(params![user_id], row_to_file)?;
        files.collect::<Result<Vec<_>, _>>().map_err(DbError::from)
    }

    /// Delete a file record and return it so the caller can remove the bytes.
    pub fn delete_uploaded_file(&self, user_id: UserId, id: &str) -> DbResult<UploadedFile> {
        let file = self.get_uploaded_file(user_id, id)?;
        let conn = self.conn()?;
        conn.execute(
            "DELETE FROM uploaded_files WHERE id = ?1 AND user_id = ?2",
            params![id, user_id],
        )?;
        Ok(file)
    }
}

fn row_to_file(row: &rusqlite::Row) -> rusqlite::Result<UploadedFile> {
    Ok(UploadedFile {
        id: row.get(0)?,
        user_id: row.get(1)?,
        filename: row.get(2)?,
        stored_path: row.get(3)?,
        content_type: row.get(4)?,
        content_hash: row.get(5)?,
        content_text: row.get(6)?,
        created_at: parse_timestamp(row.get(7)?),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use scholar_core::NewUser;

    #[test]
    fn test_file_crud() {
        let db = Database::open_in_memory().unwrap();
        let user = db.create_user(&NewUser::student("u@school.edu", "h")).unwrap();

        let file = UploadedFile::new(user.id, "notes.txt", "documents/abc_notes.txt", "hash", "hello")
            .with_content_type("text/plain");
        db.create_uploaded_file(&file).unwrap();

        let fetched = db.get_uploaded_file(user.id, &file.id).unwrap();
        assert_eq!(fetched.filename, "notes.txt");
        assert_eq!(fetched.content_text, "hello");
        assert_eq!(fetched.content_type.as_deref(), Some("text/plain"));

        assert_eq!(db.list_uploaded_files(user.id).unwrap().len(), 1);

        let deleted = db.delete_uploaded_file(user.id, &file.id).unwrap();
        assert_eq!(deleted.stored_path, "documents/abc_notes.txt");
        assert!(db.list_uploaded_files(user.id).unwrap().is_empty());
    }

    #[test]
    fn test_files_are_private() {
        let db = Database::open_in_memory().unwrap();
        let owner = db.create_user(&NewUser::student("o@school.edu", "h")).unwrap();
        let other = db.create_user(&NewUser::student("x@school.edu", "h")).unwrap();

        let file = UploadedFile::new(owner.id, "a.pdf", "documents/a.pdf", "hash", "text");
        db.create_uploaded_file(&file).unwrap();

        assert!(matches!(
            db.get_uploaded_file(other.id, &file.id),
            Err(DbError::NotFound(_))
        ));
        assert!(matches!(
            db.delete_uploaded_file(other.id, &file.id),
            Err(DbError::NotFound(_))
        ));
        assert!(db.get_uploaded_file(owner.id, &file.id).is_ok());
    }
}
