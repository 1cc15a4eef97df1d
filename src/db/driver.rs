use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use rusqlite::Connection;

pub const DEFAULT_PATH: &str = "./todos.db";

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS todos (
        id TEXT PRIMARY KEY,
        title TEXT,
        completed INTEGER DEFAULT 0
    );
    CREATE INDEX IF NOT EXISTS ix_todos_title ON todos (title);
";

/// Storage context for the todo table.
///
/// Holds no open connection: every call to [`Db::with_connection`] opens the
/// database file, runs the closure and closes it again.
pub struct Db {
    path: PathBuf,
}
impl Db {
    pub fn new_with_path(path: impl AsRef<Path>) -> Result<Self> {
        let db = Self {
            path: path.as_ref().to_path_buf(),
        };
        db.with_connection(|conn| conn.execute_batch(SCHEMA))
            .context("creating todos schema")?;
        Ok(db)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn connect(&self) -> Result<Connection> {
        let conn = Connection::open(&self.path)
            .with_context(|| format!("opening {}", self.path.display()))?;
        Ok(conn)
    }

    // one connection per call, dropped (and closed) on return
    pub fn with_connection<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> rusqlite::Result<T>,
    {
        let conn = self.connect()?;
        let value = f(&conn)?;
        Ok(value)
    }
}

// Required Debug implementation for `Db`
impl std::fmt::Debug for Db {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Db").field("path", &self.path).finish()
    }
}
