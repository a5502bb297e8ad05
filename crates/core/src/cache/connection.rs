//! Database connection management with pragma configuration.
//!
//! This module handles opening the SQLite database under the cache root,
//! applying pragmas for durability and concurrency (WAL mode), and running
//! migrations.

use super::migrations;
use crate::Error;
use std::path::{Path, PathBuf};
use tokio_rusqlite::Connection;

/// File name of the page database inside a cache root.
pub const DB_FILE_NAME: &str = "docs.sqlite";

const PRAGMAS: &str = "PRAGMA journal_mode=WAL;
                       PRAGMA synchronous=NORMAL;
                       PRAGMA temp_store=MEMORY;
                       PRAGMA foreign_keys=ON;";

/// Page store handle.
///
/// Wraps a tokio-rusqlite Connection that runs database operations
/// on a background thread. Clones share the same connection.
#[derive(Clone, Debug)]
pub struct PageStore {
    pub(crate) conn: Connection,
    root: Option<PathBuf>,
}

impl PageStore {
    /// Open the store rooted at `cache_dir`.
    ///
    /// Creates the directory and database file if they don't exist, applies
    /// pragmas, and runs any pending migrations.
    pub async fn open(cache_dir: impl AsRef<Path>) -> Result<Self, Error> {
        let root = cache_dir.as_ref().to_path_buf();
        tokio::fs::create_dir_all(&root).await?;

        let conn = Connection::open(root.join(DB_FILE_NAME))
            .await
            .map_err(|e| Error::Storage(e.into()))?;

        Self::init(conn, Some(root)).await
    }

    /// Open an in-memory store for testing.
    ///
    /// Same schema and pragmas as the file-backed store.
    pub async fn open_in_memory() -> Result<Self, Error> {
        let conn = Connection::open_in_memory()
            .await
            .map_err(|e| Error::Storage(e.into()))?;

        Self::init(conn, None).await
    }

    async fn init(conn: Connection, root: Option<PathBuf>) -> Result<Self, Error> {
        conn.call(|conn| {
            conn.execute_batch(PRAGMAS)?;
            Ok(())
        })
        .await
        .map_err(Error::Storage)?;

        migrations::run(&conn).await?;

        Ok(Self { conn, root })
    }

    /// Cache root directory, `None` for in-memory stores.
    pub fn root(&self) -> Option<&Path> {
        self.root.as_deref()
    }
}
