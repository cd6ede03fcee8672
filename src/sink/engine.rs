//! DuckDB-backed row sink
//!
//! The keyspace maps to a DuckDB schema and rows are upserted by primary key
//! with `INSERT OR REPLACE`.

use crate::error::{Error, Result};
use crate::record::{NormalizedUserRecord, PersistedUserRow};
use async_trait::async_trait;
use duckdb::Connection;
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, info};
use uuid::Uuid;

/// In-memory storage location
pub const MEMORY_LOCATION: &str = ":memory:";

/// Destination for persisted rows
#[async_trait]
pub trait RowSink: Send + Sync {
    /// Create the keyspace and table if absent; safe to call on every start
    async fn ensure_schema(&self) -> Result<()>;

    /// Insert a row, replacing any existing row with the same id
    async fn write_row(&self, row: &PersistedUserRow) -> Result<()>;
}

/// Row sink over a DuckDB database file
pub struct DuckDbSink {
    /// DuckDB connection
    conn: Mutex<Connection>,
    /// Schema name
    keyspace: String,
    /// Table name
    table: String,
    /// File path or `:memory:` (for logging)
    location: String,
}

impl DuckDbSink {
    /// Open (or create) the database at `location`
    pub fn open(location: &str, keyspace: &str, table: &str) -> Result<Self> {
        validate_identifier("keyspace", keyspace)?;
        validate_identifier("table", table)?;

        let conn = if location == MEMORY_LOCATION {
            Connection::open_in_memory()
        } else {
            Connection::open(location)
        }
        .map_err(|e| Error::storage(format!("Failed to open DuckDB at {location}: {e}")))?;

        info!(location, keyspace, table, "Storage connection opened");

        Ok(Self {
            conn: Mutex::new(conn),
            keyspace: keyspace.to_string(),
            table: table.to_string(),
            location: location.to_string(),
        })
    }

    /// Open an in-memory database
    pub fn in_memory(keyspace: &str, table: &str) -> Result<Self> {
        Self::open(MEMORY_LOCATION, keyspace, table)
    }

    /// Fully qualified table name
    pub fn qualified_table(&self) -> String {
        format!("\"{}\".\"{}\"", self.keyspace, self.table)
    }

    /// Storage location
    pub fn location(&self) -> &str {
        &self.location
    }

    /// `CREATE` statements for the keyspace and table
    pub fn schema_sql(&self) -> String {
        let columns: Vec<String> = NormalizedUserRecord::FIELDS
            .iter()
            .map(|field| format!("    {field} TEXT NOT NULL"))
            .collect();

        format!(
            "CREATE SCHEMA IF NOT EXISTS \"{keyspace}\";\n\
             CREATE TABLE IF NOT EXISTS {table} (\n    id UUID PRIMARY KEY,\n{columns}\n);",
            keyspace = self.keyspace,
            table = self.qualified_table(),
            columns = columns.join(",\n"),
        )
    }

    /// Number of stored rows
    pub fn row_count(&self) -> Result<usize> {
        let conn = self.lock()?;
        let count: i64 = conn
            .query_row(
                &format!("SELECT COUNT(*) FROM {}", self.qualified_table()),
                [],
                |row| row.get(0),
            )
            .map_err(|e| Error::storage(format!("Failed to count rows: {e}")))?;
        Ok(count as usize)
    }

    /// Look up a row by id
    pub fn get_row(&self, id: Uuid) -> Result<Option<PersistedUserRow>> {
        let sql = format!(
            "{} WHERE id = CAST(? AS UUID)",
            self.select_sql()
        );
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare(&sql)
            .map_err(|e| Error::storage(format!("Failed to prepare query: {e}")))?;
        let mut rows = stmt
            .query_map([id.to_string()], read_row)
            .map_err(|e| Error::storage(format!("Failed to query row {id}: {e}")))?;

        rows.next()
            .transpose()
            .map_err(|e| Error::storage(format!("Failed to read row {id}: {e}")))?
            .transpose()
    }

    /// Up to `limit` rows, ordered by username
    pub fn list_rows(&self, limit: usize) -> Result<Vec<PersistedUserRow>> {
        let sql = format!("{} ORDER BY username, id LIMIT {limit}", self.select_sql());
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare(&sql)
            .map_err(|e| Error::storage(format!("Failed to prepare query: {e}")))?;

        let rows = stmt
            .query_map([], read_row)
            .map_err(|e| Error::storage(format!("Failed to query rows: {e}")))?;

        let mut out = Vec::new();
        for row in rows {
            let row = row.map_err(|e| Error::storage(format!("Failed to read row: {e}")))?;
            out.push(row?);
        }
        Ok(out)
    }

    fn select_sql(&self) -> String {
        format!(
            "SELECT CAST(id AS VARCHAR), {} FROM {}",
            NormalizedUserRecord::FIELDS.join(", "),
            self.qualified_table()
        )
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| Error::storage("storage connection lock poisoned"))
    }
}

#[async_trait]
impl RowSink for DuckDbSink {
    async fn ensure_schema(&self) -> Result<()> {
        let sql = self.schema_sql();
        self.lock()?
            .execute_batch(&sql)
            .map_err(|e| Error::storage(format!("Failed to create schema: {e}")))?;
        info!(table = %self.qualified_table(), "Keyspace and table ready");
        Ok(())
    }

    async fn write_row(&self, row: &PersistedUserRow) -> Result<()> {
        let placeholders = vec!["?"; NormalizedUserRecord::FIELDS.len()].join(", ");
        let sql = format!(
            "INSERT OR REPLACE INTO {} (id, {}) VALUES (CAST(? AS UUID), {placeholders})",
            self.qualified_table(),
            NormalizedUserRecord::FIELDS.join(", "),
        );

        let id = row.id.to_string();
        let params = std::iter::once(id.as_str()).chain(row.record.values());

        self.lock()?
            .execute(&sql, duckdb::params_from_iter(params))
            .map_err(|e| Error::storage(format!("Failed to write row {}: {e}", row.id)))?;

        debug!(id = %row.id, username = %row.record.username, "Row upserted");
        Ok(())
    }
}

impl std::fmt::Debug for DuckDbSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DuckDbSink")
            .field("location", &self.location)
            .field("keyspace", &self.keyspace)
            .field("table", &self.table)
            .finish_non_exhaustive()
    }
}

/// Map a `select_sql` row back into a `PersistedUserRow`
///
/// The outer result is the driver's; the inner one flags a stored id that
/// does not parse.
fn read_row(row: &duckdb::Row<'_>) -> duckdb::Result<Result<PersistedUserRow>> {
    let id: String = row.get(0)?;
    let record = NormalizedUserRecord {
        first_name: row.get(1)?,
        last_name: row.get(2)?,
        gender: row.get(3)?,
        address: row.get(4)?,
        postcode: row.get(5)?,
        email: row.get(6)?,
        username: row.get(7)?,
        dob: row.get(8)?,
        registered_date: row.get(9)?,
        phone: row.get(10)?,
        picture: row.get(11)?,
    };

    Ok(Uuid::parse_str(&id)
        .map(|id| PersistedUserRow::new(id, record))
        .map_err(|e| Error::storage(format!("Stored id '{id}' is not a UUID: {e}"))))
}

/// Accept plain SQL identifiers only (letters, digits, underscore)
pub fn validate_identifier(field: &str, name: &str) -> Result<()> {
    let mut chars = name.chars();
    let valid = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_');

    if valid {
        Ok(())
    } else {
        Err(Error::invalid_config(
            field,
            format!("'{name}' is not a valid identifier"),
        ))
    }
}
