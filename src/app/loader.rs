// CarScope - app/loader.rs
//
// Listings store access. Reads the whole `cars` relation into a
// `ListingTable` with a fixed column projection.
//
// Each load opens its own read-only connection and drops it before
// returning, on success and on every error path. There is no pool and no
// long-lived handle; repeated loads are served by `app::cache` instead.

use crate::core::model::{Column, Listing, ListingTable};
use crate::util::constants;
use crate::util::error::LoadError;
use rusqlite::types::ValueRef;
use rusqlite::{Connection, OpenFlags, Row};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// Identifies one version of a store: its path plus the file's size and
/// modification time, so a mutated store file is a different identity.
///
/// A database in WAL mode takes commits in its `-wal` sidecar and leaves the
/// main file alone until a checkpoint, so the sidecar's size and mtime are
/// part of the identity too. Both are zero/`None` when there is no sidecar.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct StoreIdentity {
    pub path: PathBuf,
    pub modified: Option<SystemTime>,
    pub len: u64,
    pub wal_modified: Option<SystemTime>,
    pub wal_len: u64,
}

/// A source of listings.
pub trait Store {
    /// Identity of the data `load` would currently return.
    fn identity(&self) -> StoreIdentity;

    /// Full, unfiltered read of every listing.
    fn load(&self) -> Result<ListingTable, LoadError>;
}

/// SQLite file holding the `cars` relation.
#[derive(Debug, Clone)]
pub struct SqliteStore {
    path: PathBuf,
}

impl SqliteStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Path of the write-ahead log SQLite keeps next to the database.
    fn wal_path(&self) -> PathBuf {
        let mut wal = self.path.clone().into_os_string();
        wal.push("-wal");
        PathBuf::from(wal)
    }

    fn unavailable(&self, reason: impl Into<String>, source: Option<rusqlite::Error>) -> LoadError {
        LoadError::StoreUnavailable {
            path: self.path.clone(),
            reason: reason.into(),
            source,
        }
    }

    fn open(&self) -> Result<Connection, LoadError> {
        // SQLite would happily create an empty database at a wrong path.
        if !self.path.is_file() {
            return Err(self.unavailable("file does not exist", None));
        }
        Connection::open_with_flags(
            &self.path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .map_err(|e| self.unavailable("cannot open database", Some(e)))
    }

    /// Verify the relation exists and carries every projected column.
    fn check_schema(&self, conn: &Connection) -> Result<(), LoadError> {
        let present = column_names(conn, constants::LISTINGS_TABLE)
            .map_err(|e| self.unavailable("cannot read schema", Some(e)))?;

        if present.is_empty() {
            return Err(self.unavailable(
                format!("relation '{}' does not exist", constants::LISTINGS_TABLE),
                None,
            ));
        }

        let missing: Vec<String> = Column::all_stored()
            .iter()
            .map(|c| c.name())
            .filter(|name| !present.contains(*name))
            .map(str::to_string)
            .collect();

        if !missing.is_empty() {
            return Err(LoadError::SchemaMismatch {
                path: self.path.clone(),
                table: constants::LISTINGS_TABLE,
                missing,
            });
        }
        Ok(())
    }

    fn read_rows(&self, conn: &Connection) -> Result<Vec<Listing>, LoadError> {
        let projection: Vec<&str> = Column::all_stored().iter().map(|c| c.name()).collect();
        let sql = format!(
            "SELECT {} FROM {}",
            projection.join(", "),
            constants::LISTINGS_TABLE
        );
        let query_error = |e| LoadError::Query {
            path: self.path.clone(),
            source: e,
        };

        let mut stmt = conn.prepare(&sql).map_err(query_error)?;
        let rows = stmt
            .query_map([], listing_from_row)
            .map_err(query_error)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(query_error)?;
        Ok(rows)
    }
}

impl Store for SqliteStore {
    fn identity(&self) -> StoreIdentity {
        let meta = std::fs::metadata(&self.path).ok();
        let wal = std::fs::metadata(self.wal_path()).ok();
        StoreIdentity {
            path: self.path.clone(),
            modified: meta.as_ref().and_then(|m| m.modified().ok()),
            len: meta.map_or(0, |m| m.len()),
            wal_modified: wal.as_ref().and_then(|m| m.modified().ok()),
            wal_len: wal.map_or(0, |m| m.len()),
        }
    }

    fn load(&self) -> Result<ListingTable, LoadError> {
        let conn = self.open()?;
        self.check_schema(&conn)?;
        let rows = self.read_rows(&conn)?;
        drop(conn);

        tracing::info!(
            store = %self.path.display(),
            rows = rows.len(),
            "Listings loaded"
        );
        Ok(ListingTable::with_stored_columns(rows))
    }
}

/// Lower-cased column names of `table`; empty when the table does not exist.
fn column_names(conn: &Connection, table: &str) -> rusqlite::Result<HashSet<String>> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table})"))?;
    let names = stmt
        .query_map([], |row| row.get::<_, String>(1))?
        .map(|name| name.map(|n| n.to_ascii_lowercase()))
        .collect::<rusqlite::Result<HashSet<String>>>()?;
    Ok(names)
}

/// Map one result row, in projection order, to a `Listing`.
fn listing_from_row(row: &Row<'_>) -> rusqlite::Result<Listing> {
    Ok(Listing {
        link: text(row, 0)?,
        title: text(row, 1)?,
        price: integer(row, 2)?,
        engine: text(row, 3)?,
        fuel: text(row, 4)?,
        mileage: integer(row, 5)?,
        color: text(row, 6)?,
        gearbox: text(row, 7)?,
        paper: text(row, 8)?,
        brand: text(row, 9)?,
        year: integer(row, 10)?.and_then(|y| i32::try_from(y).ok()),
        model: text(row, 11)?,
        finition: text(row, 12)?,
        location: text(row, 13)?,
        wilaya: text(row, 14)?,
        date: text(row, 15)?,
        posted_on: None,
        date_int: None,
    })
}

fn text(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<String>> {
    Ok(value_as_text(row.get_ref(idx)?))
}

fn integer(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<i64>> {
    Ok(value_as_integer(row.get_ref(idx)?))
}

/// SQLite columns are dynamically typed; numbers in text columns become
/// their decimal form.
fn value_as_text(value: ValueRef<'_>) -> Option<String> {
    match value {
        ValueRef::Null | ValueRef::Blob(_) => None,
        ValueRef::Integer(i) => Some(i.to_string()),
        ValueRef::Real(f) => Some(f.to_string()),
        ValueRef::Text(bytes) => Some(String::from_utf8_lossy(bytes).into_owned()),
    }
}

/// Lenient numeric read: reals are truncated, text is parsed after trimming,
/// anything unusable is `None`.
fn value_as_integer(value: ValueRef<'_>) -> Option<i64> {
    match value {
        ValueRef::Integer(i) => Some(i),
        ValueRef::Real(f) => real_to_integer(f),
        ValueRef::Text(bytes) => {
            let s = std::str::from_utf8(bytes).ok()?.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().and_then(real_to_integer))
        }
        ValueRef::Null | ValueRef::Blob(_) => None,
    }
}

fn real_to_integer(f: f64) -> Option<i64> {
    (f.is_finite() && f.abs() < i64::MAX as f64).then(|| f.trunc() as i64)
}
