use crate::{post::Post, Error};
use rusqlite::{self, params, Connection, OptionalExtension, Row};
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::path::Path;

pub const TABLE: &str = "generated_content";

/// Schema of the destination table, used by `--create-table`.
///
/// `post_id` is the natural key: an upsert replaces any row with the same `post_id`.
pub const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS generated_content (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        platform TEXT NOT NULL,
        content TEXT NOT NULL,
        topic TEXT,
        post_id TEXT UNIQUE,
        generated_at TEXT,
        posted BOOLEAN DEFAULT 0
    )
";

/// Somewhere canonical posts can be written.
pub trait PostStore {
    /// number of posts currently stored
    fn count(&self) -> Result<u64, Error>;

    /// insert `post`, or replace every field of the post with the same `post_id`
    fn upsert(&self, post: &Post) -> Result<(), Error>;
}

/// open the metrics database, failing if the destination table is absent
///
/// When `create_table` is set, the database file, its parent directories, and the table
/// are created as needed instead.
pub fn open(path: &Path, create_table: bool) -> Result<Connection, Error> {
    if create_table {
        if let Some(parent) = path.parent() {
            contextualize!(std::fs::create_dir_all(parent); "cannot create {}", parent.display())?;
        }
    }
    let conn = contextualize!(Connection::open(path); "cannot open store at {}", path.display())?;
    if create_table {
        conn.execute_batch(SCHEMA)?;
    }
    let exists: bool = conn.query_row(
        "SELECT EXISTS (SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1)",
        params![TABLE],
        |row| row.get(0),
    )?;
    if !exists {
        log::error!("{} has no table named {}", path.display(), TABLE);
        return Err(Error::MissingTable(TABLE));
    }
    Ok(conn)
}

impl PostStore for Connection {
    fn count(&self) -> Result<u64, Error> {
        let count: i64 =
            self.query_row("SELECT COUNT(*) FROM generated_content", params![], |row| {
                row.get(0)
            })?;
        Ok(count as u64)
    }

    /// Replaces by deleting any rows with the same `post_id` first, so the key holds
    /// whether or not the table carries a unique index on `post_id`.
    fn upsert(&self, post: &Post) -> Result<(), Error> {
        self.execute(
            "DELETE FROM generated_content WHERE post_id = ?1",
            params![post.post_id],
        )?;
        self.execute(
            "
            INSERT INTO generated_content
            (platform, content, topic, post_id, generated_at, posted)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ",
            params![
                post.platform,
                post.content,
                post.topic,
                post.post_id,
                post.generated_at,
                post.posted
            ],
        )?;
        Ok(())
    }
}

/// Posts held in memory, keyed by `post_id`.
///
/// Stands in for the database when only the migration rules are of interest,
/// e.g. when previewing a file.
#[derive(Debug, Default)]
pub struct MemoryStore {
    posts: RefCell<BTreeMap<String, Post>>,
}

impl MemoryStore {
    pub fn get(&self, post_id: &str) -> Option<Post> {
        self.posts.borrow().get(post_id).cloned()
    }
}

impl PostStore for MemoryStore {
    fn count(&self) -> Result<u64, Error> {
        Ok(self.posts.borrow().len() as u64)
    }

    fn upsert(&self, post: &Post) -> Result<(), Error> {
        self.posts
            .borrow_mut()
            .insert(post.post_id.clone(), post.clone());
        Ok(())
    }
}

impl Post {
    fn from_row(row: &Row<'_>) -> Result<Post, rusqlite::Error> {
        Ok(Post {
            platform: row.get(0)?,
            content: row.get(1)?,
            // rows written by other tools may leave these null
            topic: row.get::<_, Option<String>>(2)?.unwrap_or_default(),
            post_id: row.get::<_, Option<String>>(3)?.unwrap_or_default(),
            generated_at: row.get::<_, Option<String>>(4)?.unwrap_or_default(),
            posted: row.get::<_, Option<bool>>(5)?.unwrap_or_default(),
        })
    }

    /// all stored posts, oldest row first
    pub fn query(conn: &Connection) -> Result<Vec<Post>, Error> {
        let mut stmt = conn.prepare(
            "
            SELECT platform, content, topic, post_id, generated_at, posted
            FROM generated_content
            ORDER BY id
            ",
        )?;
        let posts = stmt
            .query_map(params![], Post::from_row)?
            .collect::<Result<Vec<Post>, rusqlite::Error>>()?;
        Ok(posts)
    }

    pub fn find(conn: &Connection, post_id: &str) -> Result<Option<Post>, Error> {
        let post = conn
            .query_row(
                "
                SELECT platform, content, topic, post_id, generated_at, posted
                FROM generated_content
                WHERE post_id = ?1
                ",
                params![post_id],
                Post::from_row,
            )
            .optional()?;
        Ok(post)
    }
}
