//! SQLite access for the record table whose cover column gets synced.
//!
//! Opens an existing store, checks that the configured table has the
//! columns the sync writes to, and performs the per-record cover update
//! (via rusqlite with bundled feature).

pub mod operations;
pub mod schema;

pub use operations::{OperationError, cover_for, update_cover};
pub use schema::{
    CoverTable, SchemaError, create_cover_table, is_identifier, open_database, open_memory,
    table_columns, verify_cover_table,
};
