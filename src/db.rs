//! Local SQLite store for review comments and drafts.
//!
//! Rows mirror Gerrit's `CommentInfo`; a draft is a row with `is_draft = 1`.
//! [`CommentDb::load_comment_set`] splits a change's comments into the
//! old-side and new-side collections the anchorer expects.

use anyhow::{Context, Result};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;

use crate::comment::{AccountInfo, CommentInfo, CommentRange, CommentSide, CommentSet};

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS comments (
    comment_id      TEXT PRIMARY KEY,
    change_id       TEXT NOT NULL,
    patch_set       INTEGER NOT NULL,
    file_path       TEXT NOT NULL,
    side            TEXT NOT NULL DEFAULT 'REVISION',
    line            INTEGER,
    range_start_line INTEGER,
    range_start_char INTEGER,
    range_end_line  INTEGER,
    range_end_char  INTEGER,
    in_reply_to     TEXT,
    author_id       INTEGER,
    author_name     TEXT,
    message         TEXT NOT NULL,
    updated         TEXT,
    unresolved      INTEGER,
    is_draft        INTEGER NOT NULL DEFAULT 0
);
CREATE INDEX IF NOT EXISTS idx_comments_file
    ON comments (change_id, file_path, patch_set, is_draft);
";

const COLUMNS: &str = "comment_id, patch_set, file_path, side, line,
    range_start_line, range_start_char, range_end_line, range_end_char,
    in_reply_to, author_id, author_name, message, updated, unresolved";

/// Database handle for comments and drafts.
pub struct CommentDb {
    conn: Connection,
}

impl CommentDb {
    /// Open (or create) a comment database.
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open database: {}", path.display()))?;
        Self::from_connection(conn)
    }

    /// Open a throwaway database in memory.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("Failed to open in-memory database")?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        let db = Self { conn };
        db.init_schema()?;
        Ok(db)
    }

    fn init_schema(&self) -> Result<()> {
        self.conn
            .execute_batch(SCHEMA)
            .context("Failed to create comment schema")
    }

    /// Store a comment or draft for `change_id`, replacing any row with the same id.
    ///
    /// Comments without an id get a fresh `local-N` id that no stored row uses.
    pub fn insert_comment(
        &self,
        change_id: &str,
        comment: &CommentInfo,
        is_draft: bool,
    ) -> Result<String> {
        let (id, insert) = match &comment.id {
            Some(id) => (id.clone(), "INSERT OR REPLACE"),
            None => (self.next_local_id()?, "INSERT"),
        };
        let path = comment
            .path
            .as_deref()
            .context("Comment has no file path")?;
        let side = match comment.side {
            CommentSide::Parent => "PARENT",
            CommentSide::Revision => "REVISION",
        };
        let range = comment.range;
        let author = comment.author.as_ref();

        self.conn
            .execute(
                &format!(
                    "{insert} INTO comments (
                        comment_id, change_id, patch_set, file_path, side, line,
                        range_start_line, range_start_char, range_end_line, range_end_char,
                        in_reply_to, author_id, author_name, message, updated, unresolved, is_draft
                     ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17)"
                ),
                params![
                    id,
                    change_id,
                    comment.patch_set.unwrap_or(0),
                    path,
                    side,
                    comment.line,
                    range.map(|r| r.start_line),
                    range.map(|r| r.start_character),
                    range.map(|r| r.end_line),
                    range.map(|r| r.end_character),
                    comment.in_reply_to,
                    author.and_then(|a| a.account_id).and_then(|id| i64::try_from(id).ok()),
                    author.map(AccountInfo::display_name),
                    comment.message,
                    comment.updated,
                    comment.unresolved,
                    is_draft,
                ],
            )
            .with_context(|| format!("Failed to store comment {id}"))?;

        Ok(id)
    }

    fn next_local_id(&self) -> Result<String> {
        let mut next: i64 = self
            .conn
            .query_row("SELECT COALESCE(MAX(rowid), 0) + 1 FROM comments", [], |row| {
                row.get(0)
            })
            .context("Failed to allocate comment id")?;
        loop {
            let id = format!("local-{next}");
            let taken = self
                .conn
                .query_row("SELECT 1 FROM comments WHERE comment_id = ?1", [&id], |_| Ok(()))
                .optional()?
                .is_some();
            if !taken {
                return Ok(id);
            }
            next += 1;
        }
    }

    /// Comments (or drafts) on `file_path` at `patch_set`, optionally filtered by side.
    pub fn list_comments(
        &self,
        change_id: &str,
        patch_set: u32,
        file_path: &str,
        side: Option<CommentSide>,
        drafts: bool,
    ) -> Result<Vec<CommentInfo>> {
        let mut sql = format!(
            "SELECT {COLUMNS} FROM comments
             WHERE change_id = ?1 AND patch_set = ?2 AND file_path = ?3 AND is_draft = ?4"
        );
        if side.is_some() {
            sql.push_str(" AND side = ?5");
        }
        sql.push_str(" ORDER BY line IS NOT NULL, line, updated, comment_id");

        let mut stmt = self.conn.prepare(&sql)?;
        let rows = match side {
            Some(side) => {
                let side = match side {
                    CommentSide::Parent => "PARENT",
                    CommentSide::Revision => "REVISION",
                };
                stmt.query_map(
                    params![change_id, patch_set, file_path, drafts, side],
                    Self::map_comment,
                )?
                .collect::<Result<Vec<_>, _>>()
            }
            None => stmt
                .query_map(
                    params![change_id, patch_set, file_path, drafts],
                    Self::map_comment,
                )?
                .collect::<Result<Vec<_>, _>>(),
        };

        rows.with_context(|| format!("Failed to list comments for {file_path}"))
    }

    /// Old-side and new-side collections for viewing `file_path` at
    /// `patch_set` against `base` (the parent commit when `None`).
    pub fn load_comment_set(
        &self,
        change_id: &str,
        patch_set: u32,
        base: Option<u32>,
        file_path: &str,
        drafts: bool,
    ) -> Result<CommentSet> {
        let new = self.list_comments(
            change_id,
            patch_set,
            file_path,
            Some(CommentSide::Revision),
            drafts,
        )?;
        let old = match base {
            Some(base) => self.list_comments(
                change_id,
                base,
                file_path,
                Some(CommentSide::Revision),
                drafts,
            )?,
            None => self.list_comments(
                change_id,
                patch_set,
                file_path,
                Some(CommentSide::Parent),
                drafts,
            )?,
        };
        log::debug!(
            "loaded {} old / {} new {} for {file_path}",
            old.len(),
            new.len(),
            if drafts { "drafts" } else { "comments" }
        );
        Ok(CommentSet::new(old, new))
    }

    /// Get a single comment or draft by id.
    pub fn get_comment(&self, comment_id: &str) -> Result<Option<CommentInfo>> {
        let sql = format!("SELECT {COLUMNS} FROM comments WHERE comment_id = ?1");
        let mut stmt = self.conn.prepare(&sql)?;
        let result = stmt
            .query_row(params![comment_id], Self::map_comment)
            .optional()?;
        Ok(result)
    }

    /// Delete a draft; published comments are left alone.
    pub fn delete_draft(&self, comment_id: &str) -> Result<bool> {
        let changed = self.conn.execute(
            "DELETE FROM comments WHERE comment_id = ?1 AND is_draft = 1",
            params![comment_id],
        )?;
        Ok(changed > 0)
    }

    fn map_comment(row: &rusqlite::Row<'_>) -> rusqlite::Result<CommentInfo> {
        let side: String = row.get(3)?;
        let range = match (
            row.get::<_, Option<u32>>(5)?,
            row.get::<_, Option<u32>>(6)?,
            row.get::<_, Option<u32>>(7)?,
            row.get::<_, Option<u32>>(8)?,
        ) {
            (Some(start_line), Some(start_character), Some(end_line), Some(end_character)) => {
                Some(CommentRange {
                    start_line,
                    start_character,
                    end_line,
                    end_character,
                })
            }
            _ => None,
        };
        let author_id: Option<i64> = row.get(10)?;
        let author_name: Option<String> = row.get(11)?;
        let author = (author_id.is_some() || author_name.is_some()).then(|| AccountInfo {
            account_id: author_id.and_then(|id| u64::try_from(id).ok()),
            name: author_name,
            ..AccountInfo::default()
        });

        Ok(CommentInfo {
            id: Some(row.get(0)?),
            patch_set: Some(row.get(1)?),
            path: Some(row.get(2)?),
            side: if side == "PARENT" {
                CommentSide::Parent
            } else {
                CommentSide::Revision
            },
            line: row.get(4)?,
            range,
            in_reply_to: row.get(9)?,
            author,
            message: row.get(12)?,
            updated: row.get(13)?,
            unresolved: row.get(14)?,
        })
    }
}
