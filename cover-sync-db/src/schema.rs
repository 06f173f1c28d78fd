//! Opening the store and checking the shape of the cover table.

use std::path::Path;

use rusqlite::{Connection, OpenFlags};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("Database not found: {0}")]
    NotFound(String),
    #[error("Invalid SQL identifier '{0}': use letters, digits and '_' only")]
    InvalidIdentifier(String),
    #[error("Table '{0}' does not exist")]
    MissingTable(String),
    #[error("Table '{table}' has no column '{column}'")]
    MissingColumn { table: String, column: String },
}

pub const DEFAULT_TABLE: &str = "text_novel";
pub const DEFAULT_ID_COLUMN: &str = "id";
pub const DEFAULT_COVER_COLUMN: &str = "cover_url";

/// Names of the table and columns the sync reads and writes.
///
/// Identifiers can't be bound as statement parameters, so every name is
/// checked with [`is_identifier`] before it is ever formatted into SQL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoverTable {
    table: String,
    id_column: String,
    cover_column: String,
}

impl CoverTable {
    pub fn new(
        table: impl Into<String>,
        id_column: impl Into<String>,
        cover_column: impl Into<String>,
    ) -> Result<Self, SchemaError> {
        let table = checked_identifier(table.into())?;
        let id_column = checked_identifier(id_column.into())?;
        let cover_column = checked_identifier(cover_column.into())?;
        Ok(Self {
            table,
            id_column,
            cover_column,
        })
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn id_column(&self) -> &str {
        &self.id_column
    }

    pub fn cover_column(&self) -> &str {
        &self.cover_column
    }

    pub(crate) fn update_sql(&self) -> String {
        format!(
            "UPDATE {} SET {} = ?1 WHERE {} = ?2",
            self.table, self.cover_column, self.id_column
        )
    }

    pub(crate) fn select_cover_sql(&self) -> String {
        format!(
            "SELECT {} FROM {} WHERE {} = ?1",
            self.cover_column, self.table, self.id_column
        )
    }
}

impl Default for CoverTable {
    fn default() -> Self {
        Self {
            table: DEFAULT_TABLE.to_string(),
            id_column: DEFAULT_ID_COLUMN.to_string(),
            cover_column: DEFAULT_COVER_COLUMN.to_string(),
        }
    }
}

/// True for a plain SQL identifier: `[A-Za-z_][A-Za-z0-9_]*`.
pub fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn checked_identifier(name: String) -> Result<String, SchemaError> {
    if is_identifier(&name) {
        Ok(name)
    } else {
        Err(SchemaError::InvalidIdentifier(name))
    }
}

/// Open an existing database for reading and writing.
///
/// The sync only updates rows that already exist, so a missing file is an
/// error rather than a fresh empty database.
pub fn open_database(path: &Path) -> Result<Connection, SchemaError> {
    if !path.is_file() {
        return Err(SchemaError::NotFound(path.display().to_string()));
    }
    let conn = Connection::open_with_flags(
        path,
        OpenFlags::SQLITE_OPEN_READ_WRITE
            | OpenFlags::SQLITE_OPEN_URI
            | OpenFlags::SQLITE_OPEN_NO_MUTEX,
    )?;
    conn.execute_batch("PRAGMA foreign_keys=ON;")?;
    Ok(conn)
}

/// Open an in-memory database containing an empty cover table. Useful for testing.
pub fn open_memory(table: &CoverTable) -> Result<Connection, SchemaError> {
    let conn = Connection::open_in_memory()?;
    conn.execute_batch("PRAGMA foreign_keys=ON;")?;
    create_cover_table(&conn, table)?;
    Ok(conn)
}

/// Create a minimal record table with the configured names if it doesn't exist.
///
/// Records are owned by whatever application shares the database; this is
/// only here to build fixtures.
pub fn create_cover_table(conn: &Connection, table: &CoverTable) -> Result<(), SchemaError> {
    conn.execute_batch(&format!(
        "CREATE TABLE IF NOT EXISTS {} (
            {} INTEGER PRIMARY KEY,
            title TEXT NOT NULL DEFAULT '',
            {} TEXT NOT NULL DEFAULT ''
        );",
        table.table, table.id_column, table.cover_column
    ))?;
    Ok(())
}

/// Column names of `table`, in declaration order. Empty if the table doesn't exist.
pub fn table_columns(conn: &Connection, table: &str) -> Result<Vec<String>, SchemaError> {
    if !is_identifier(table) {
        return Err(SchemaError::InvalidIdentifier(table.to_string()));
    }
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({});", table))?;
    let columns = stmt
        .query_map([], |row| row.get::<_, String>(1))?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(columns)
}

/// Check that the table exists and has both the id and the cover column.
///
/// Names are matched case-insensitively, as SQLite resolves them.
pub fn verify_cover_table(conn: &Connection, table: &CoverTable) -> Result<(), SchemaError> {
    let exists: bool = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM sqlite_master
                       WHERE type = 'table' AND name = ?1 COLLATE NOCASE)",
        [table.table()],
        |row| row.get(0),
    )?;
    if !exists {
        return Err(SchemaError::MissingTable(table.table.clone()));
    }

    let columns = table_columns(conn, table.table())?;
    for column in [table.id_column(), table.cover_column()] {
        if !columns.iter().any(|c| c.eq_ignore_ascii_case(column)) {
            return Err(SchemaError::MissingColumn {
                table: table.table.clone(),
                column: column.to_string(),
            });
        }
    }
    Ok(())
}
