//! Cover column reads and writes.

use rusqlite::{Connection, OptionalExtension, params};
use thiserror::Error;

use crate::schema::CoverTable;

#[derive(Debug, Error)]
pub enum OperationError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Set the cover column of record `id` and commit right away.
///
/// Returns the number of rows changed. An id with no matching row changes
/// nothing and still succeeds.
pub fn update_cover(
    conn: &Connection,
    table: &CoverTable,
    id: i64,
    cover: &str,
) -> Result<usize, OperationError> {
    let tx = conn.unchecked_transaction()?;
    let changed = tx.execute(&table.update_sql(), params![cover, id])?;
    tx.commit()?;
    Ok(changed)
}

/// Current cover of record `id`, or `None` if there is no such row.
///
/// A NULL column reads as an empty string.
pub fn cover_for(
    conn: &Connection,
    table: &CoverTable,
    id: i64,
) -> Result<Option<String>, OperationError> {
    let cover = conn
        .query_row(&table.select_cover_sql(), params![id], |row| {
            row.get::<_, Option<String>>(0)
        })
        .optional()?;
    Ok(cover.map(Option::unwrap_or_default))
}
