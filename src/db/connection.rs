use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Result};
use directories::BaseDirs;
use rusqlite::{Connection, OptionalExtension};
use tracing::info;

use crate::error::StoreResult;

/// Folder name used beneath the user's home directory for application data.
const DATA_DIR_NAME: &str = ".rockbands";
/// SQLite file name stored inside the application data directory.
const DB_FILE_NAME: &str = "rockbands.sqlite";
/// Log file name stored next to the database.
const LOG_FILE_NAME: &str = "rockbands.log";

/// Table definitions, applied in order on every open. Memberships and albums
/// restrict deletion of their band; contributor credits follow their album or
/// band away.
const SCHEMA: &[(&str, &str)] = &[
    (
        "bands",
        "CREATE TABLE IF NOT EXISTS bands (
            band_id INTEGER PRIMARY KEY AUTOINCREMENT,
            band_name TEXT NOT NULL CHECK (length(trim(band_name)) > 0),
            formed_year INTEGER,
            home_location TEXT
        )",
    ),
    (
        "members",
        "CREATE TABLE IF NOT EXISTS members (
            member_id INTEGER PRIMARY KEY AUTOINCREMENT,
            member_name TEXT NOT NULL CHECK (length(trim(member_name)) > 0),
            main_position TEXT
        )",
    ),
    (
        "memberships",
        "CREATE TABLE IF NOT EXISTS memberships (
            membership_id INTEGER PRIMARY KEY AUTOINCREMENT,
            band_id INTEGER NOT NULL,
            member_id INTEGER NOT NULL,
            start_year INTEGER,
            end_year INTEGER,
            role TEXT,
            FOREIGN KEY(band_id) REFERENCES bands(band_id) ON DELETE RESTRICT,
            FOREIGN KEY(member_id) REFERENCES members(member_id) ON DELETE RESTRICT
        )",
    ),
    (
        "albums",
        "CREATE TABLE IF NOT EXISTS albums (
            album_id INTEGER PRIMARY KEY AUTOINCREMENT,
            band_id INTEGER NOT NULL,
            album_title TEXT NOT NULL CHECK (length(trim(album_title)) > 0),
            release_year INTEGER,
            FOREIGN KEY(band_id) REFERENCES bands(band_id) ON DELETE RESTRICT
        )",
    ),
    (
        "album_contributors",
        "CREATE TABLE IF NOT EXISTS album_contributors (
            album_id INTEGER NOT NULL,
            band_id INTEGER NOT NULL,
            PRIMARY KEY (album_id, band_id),
            FOREIGN KEY(album_id) REFERENCES albums(album_id) ON DELETE CASCADE,
            FOREIGN KEY(band_id) REFERENCES bands(band_id) ON DELETE CASCADE
        )",
    ),
];

/// Handle to the band database. Construct one at startup, pass it by reference
/// to whatever needs it, and [`Store::close`] it on the way out.
pub struct Store {
    pub(crate) conn: Connection,
}

impl Store {
    /// Open (creating if needed) the database at `path` and bring the schema
    /// up to date.
    pub fn open(path: &Path) -> StoreResult<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        info!(path = %path.display(), "opened band database");
        Self::init(conn)
    }

    /// A private database that disappears with the handle.
    pub fn open_in_memory() -> StoreResult<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> StoreResult<Self> {
        conn.execute("PRAGMA foreign_keys = ON", [])?;
        for (_table, ddl) in SCHEMA {
            conn.execute(*ddl, [])?;
        }
        Ok(Self { conn })
    }

    /// Flush and close the underlying connection.
    pub fn close(self) -> StoreResult<()> {
        self.conn.close().map_err(|(_, err)| err.into())
    }

    pub(crate) fn row_exists(&self, table: &str, key: &str, id: i64) -> StoreResult<bool> {
        let sql = format!("SELECT 1 FROM {table} WHERE {key} = ?1");
        let found = self
            .conn
            .query_row(&sql, [id], |_| Ok(()))
            .optional()?
            .is_some();
        Ok(found)
    }
}

/// Directory holding the database and log file inside the user's home.
pub fn data_dir() -> Result<PathBuf> {
    let base_dirs = BaseDirs::new().ok_or_else(|| anyhow!("could not locate home directory"))?;
    Ok(base_dirs.home_dir().join(DATA_DIR_NAME))
}

/// Resolve the default absolute path to the SQLite database.
pub fn default_db_path() -> Result<PathBuf> {
    Ok(data_dir()?.join(DB_FILE_NAME))
}

/// Resolve the default absolute path to the log file.
pub fn default_log_path() -> Result<PathBuf> {
    Ok(data_dir()?.join(LOG_FILE_NAME))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_creates_every_table() {
        let store = Store::open_in_memory().unwrap();
        for (table, _) in SCHEMA {
            let count: i64 = store
                .conn
                .query_row(
                    "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1",
                    [*table],
                    |row| row.get(0),
                )
                .unwrap();
            assert_eq!(count, 1, "missing table {table}");
        }
    }

    #[test]
    fn foreign_keys_are_enforced() {
        let store = Store::open_in_memory().unwrap();
        let enabled: i64 = store
            .conn
            .query_row("PRAGMA foreign_keys", [], |row| row.get(0))
            .unwrap();
        assert_eq!(enabled, 1);

        let err = store.conn.execute(
            "INSERT INTO memberships (band_id, member_id) VALUES (41, 42)",
            [],
        );
        assert!(err.is_err());
    }
}
