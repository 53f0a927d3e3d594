#![forbid(unsafe_code)]

use super::{KvOp, KvStore};
use crate::config::StoreConfig;
use crate::error::StorageFailure;
use rusqlite::{Connection, OptionalExtension, params};
use std::path::{Path, PathBuf};
use std::time::Duration;

const SCHEMA_VERSION: &str = "v1";

/// Single-table SQLite medium. Every write is committed before the call returns.
#[derive(Debug)]
pub struct SqliteKv {
    conn: Connection,
    path: Option<PathBuf>,
}

impl SqliteKv {
    pub fn open(config: &StoreConfig) -> Result<Self, StorageFailure> {
        std::fs::create_dir_all(&config.storage_dir)?;
        let path = config.db_path();
        let conn = Connection::open(&path)?;
        conn.busy_timeout(Duration::from_secs(5))?;
        install_schema(&conn)?;
        tracing::debug!(path = %path.display(), "opened sqlite kv");
        Ok(Self {
            conn,
            path: Some(path),
        })
    }

    pub fn open_in_memory() -> Result<Self, StorageFailure> {
        let conn = Connection::open_in_memory()?;
        install_schema(&conn)?;
        Ok(Self { conn, path: None })
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}

fn install_schema(conn: &Connection) -> Result<(), StorageFailure> {
    conn.execute_batch(
        r#"
        PRAGMA journal_mode=WAL;
        PRAGMA synchronous=FULL;

        CREATE TABLE IF NOT EXISTS meta (
          key TEXT PRIMARY KEY,
          value TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS kv (
          key TEXT PRIMARY KEY,
          value TEXT NOT NULL
        );
        "#,
    )?;
    conn.execute(
        "INSERT OR IGNORE INTO meta(key, value) VALUES (?1, ?2)",
        params!["schema_version", SCHEMA_VERSION],
    )?;
    Ok(())
}

impl KvStore for SqliteKv {
    fn get(&self, key: &str) -> Result<Option<String>, StorageFailure> {
        Ok(self
            .conn
            .query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| {
                row.get::<_, String>(0)
            })
            .optional()?)
    }

    fn put(&mut self, key: &str, value: &str) -> Result<(), StorageFailure> {
        self.conn.execute(
            r#"
            INSERT INTO kv(key, value) VALUES (?1, ?2)
            ON CONFLICT(key) DO UPDATE SET value=excluded.value
            "#,
            params![key, value],
        )?;
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<bool, StorageFailure> {
        let deleted = self
            .conn
            .execute("DELETE FROM kv WHERE key = ?1", params![key])?;
        Ok(deleted > 0)
    }

    fn write_batch(&mut self, ops: Vec<KvOp>) -> Result<(), StorageFailure> {
        let tx = self.conn.transaction()?;
        for op in &ops {
            match op {
                KvOp::Put { key, value } => {
                    tx.execute(
                        r#"
                        INSERT INTO kv(key, value) VALUES (?1, ?2)
                        ON CONFLICT(key) DO UPDATE SET value=excluded.value
                        "#,
                        params![key, value],
                    )?;
                }
                KvOp::Remove { key } => {
                    tx.execute("DELETE FROM kv WHERE key = ?1", params![key])?;
                }
            }
        }
        tx.commit()?;
        Ok(())
    }

    fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>, StorageFailure> {
        let mut stmt = self.conn.prepare(
            "SELECT key FROM kv WHERE substr(key, 1, length(?1)) = ?1 ORDER BY key ASC",
        )?;
        let rows = stmt.query_map(params![prefix], |row| row.get::<_, String>(0))?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }
}
