//! Comment board.
//!
//! Text is stored exactly as submitted. Whether it is escaped is decided
//! when it is rendered, so both route families show the same rows.

use chrono::{SecondsFormat, Utc};
use rusqlite::params;
use securescape_types::wire::Comment;

use crate::{DemoStore, StoreError};

pub(crate) fn timestamp_now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

impl DemoStore {
    /// All comments, newest first.
    pub fn comments(&self) -> Result<Vec<Comment>, StoreError> {
        let conn = self.conn();
        let mut stmt = conn.prepare("SELECT id, text, created_at FROM comments ORDER BY id DESC")?;
        let comments = stmt
            .query_map([], |row| {
                Ok(Comment {
                    id: row.get(0)?,
                    text: row.get(1)?,
                    created_at: row.get(2)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(comments)
    }

    pub fn add_comment(&self, text: &str) -> Result<Comment, StoreError> {
        let created_at = timestamp_now();
        let conn = self.conn();
        conn.execute(
            "INSERT INTO comments (text, created_at) VALUES (?1, ?2)",
            params![text, created_at],
        )?;
        let id = conn.last_insert_rowid();
        tracing::debug!(id, len = text.len(), "Stored comment");
        Ok(Comment {
            id,
            text: text.to_string(),
            created_at,
        })
    }
}
