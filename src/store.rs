use std::path::Path;

use rusqlite::{params, Connection, OptionalExtension};
use thiserror::Error;
use tracing::{debug, info};

use crate::torrents::TorrentRecord;

const TABLE: &str = "torrents";

#[derive(Error, Debug)]
pub enum PersistenceError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("document error: {0}")]
    Document(#[from] serde_json::Error),

    #[error("no torrent named {0:?}")]
    NotFound(String),
}

/// Append-only storage of torrent documents.
pub trait DocumentStore {
    fn insert(&mut self, record: TorrentRecord) -> Result<(), PersistenceError>;
    fn query_by_name(&self, name: &str) -> Result<TorrentRecord, PersistenceError>;
}

/// SQLite file holding one JSON document per row.
///
/// There is no uniqueness on `infohash`: inserting a torrent seen before adds
/// another row. Lookups by name scan the documents, there is no index.
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Opens or creates the database file and makes sure the table exists.
    pub fn open<P: AsRef<Path>>(path: P, wal: bool) -> Result<Self, PersistenceError> {
        let conn = Connection::open(&path)?;
        if wal {
            conn.execute_batch(
                "PRAGMA journal_mode=WAL;
                 PRAGMA synchronous=NORMAL;",
            )?;
        }

        let store = Self { conn };
        store.initialize_schema()?;
        info!("torrent store opened at {:?}", path.as_ref());
        Ok(store)
    }

    fn initialize_schema(&self) -> Result<(), PersistenceError> {
        let existing: Option<String> = self
            .conn
            .query_row(
                "SELECT name FROM sqlite_master WHERE type='table' AND name=?1",
                params![TABLE],
                |row| row.get(0),
            )
            .optional()?;

        if existing.is_none() {
            self.conn
                .execute(&format!("CREATE TABLE {} (torrent JSON)", TABLE), [])?;
            info!("created table {}", TABLE);
        }
        Ok(())
    }

    /// Number of stored documents, duplicates included.
    pub fn count(&self) -> Result<u64, PersistenceError> {
        let count: i64 = self.conn.query_row(
            &format!("SELECT COUNT(*) FROM {}", TABLE),
            [],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    pub fn close(self) -> Result<(), PersistenceError> {
        self.conn.close().map_err(|(_, e)| PersistenceError::from(e))?;
        info!("torrent store closed");
        Ok(())
    }
}

impl DocumentStore for SqliteStore {
    fn insert(&mut self, record: TorrentRecord) -> Result<(), PersistenceError> {
        let document = serde_json::to_string(&record)?;
        debug!("{}", &document);

        self.conn.execute(
            &format!("INSERT INTO {} (torrent) VALUES (?1)", TABLE),
            params![document],
        )?;
        Ok(())
    }

    fn query_by_name(&self, name: &str) -> Result<TorrentRecord, PersistenceError> {
        let document: Option<String> = self
            .conn
            .query_row(
                &format!(
                    "SELECT torrent FROM {} WHERE json_extract(torrent, '$.name') = ?1 ORDER BY rowid LIMIT 1",
                    TABLE
                ),
                params![name],
                |row| row.get(0),
            )
            .optional()?;

        match document {
            Some(document) => Ok(serde_json::from_str(&document)?),
            None => Err(PersistenceError::NotFound(name.to_string())),
        }
    }
}
