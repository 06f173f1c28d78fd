//! The sync run: enumerate record folders, locate covers, write them.

use std::path::Path;

use cover_sync_db::{CoverTable, OperationError};
use rusqlite::Connection;

use crate::cover::{CoverPath, locate_cover};
use crate::error::SyncError;
use crate::scanner::{ListingOrder, RecordFolder, record_folders};
use crate::settings::{ErrorPolicy, Settings};

/// Writes a record's cover. Implemented over SQLite; tests substitute their own.
pub trait CoverUpdater {
    /// Set the cover of record `id`, committed before returning.
    /// Returns the number of rows changed.
    fn set_cover(&mut self, id: i64, cover: &CoverPath) -> Result<usize, OperationError>;
}

/// [`CoverUpdater`] over an open SQLite connection.
pub struct SqliteCoverUpdater<'a> {
    conn: &'a Connection,
    table: &'a CoverTable,
}

impl<'a> SqliteCoverUpdater<'a> {
    /// Check that the table has the configured columns, then wrap the connection.
    pub fn new(conn: &'a Connection, table: &'a CoverTable) -> Result<Self, SyncError> {
        cover_sync_db::verify_cover_table(conn, table)?;
        Ok(Self { conn, table })
    }
}

impl CoverUpdater for SqliteCoverUpdater<'_> {
    fn set_cover(&mut self, id: i64, cover: &CoverPath) -> Result<usize, OperationError> {
        cover_sync_db::update_cover(self.conn, self.table, id, cover.as_str())
    }
}

/// Options for a sync run.
#[derive(Debug, Clone)]
pub struct SyncOptions {
    pub url_prefix: String,
    pub order: ListingOrder,
    pub on_error: ErrorPolicy,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            url_prefix: crate::settings::DEFAULT_URL_PREFIX.to_string(),
            order: ListingOrder::default(),
            on_error: ErrorPolicy::default(),
        }
    }
}

impl From<&Settings> for SyncOptions {
    fn from(settings: &Settings) -> Self {
        Self {
            url_prefix: settings.url_prefix.clone(),
            order: settings.order,
            on_error: settings.on_error,
        }
    }
}

/// Statistics from a sync run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SyncStats {
    /// Root entries that aren't record folders.
    pub ignored: u64,
    /// Record folders visited.
    pub candidates: u64,
    /// Covers written (one `[OK]` each).
    pub updated: u64,
    /// Covers found during a dry run.
    pub planned: u64,
    /// Record folders without an image.
    pub no_cover: u64,
    /// Record folders that failed under [`ErrorPolicy::Continue`].
    pub failed: u64,
    /// Updates that matched no row. Also counted in `updated`.
    pub missing_rows: u64,
}

/// Progress callbacks for a sync run.
pub trait SyncProgress {
    fn on_updated(&self, folder: &RecordFolder, cover: &CoverPath);
    fn on_planned(&self, folder: &RecordFolder, cover: &CoverPath);
    fn on_no_cover(&self, folder: &RecordFolder);
    fn on_missing_row(&self, folder: &RecordFolder);
    fn on_failed(&self, folder: &RecordFolder, error: &SyncError);
    fn on_complete(&self, stats: &SyncStats);
}

/// Progress reporter that prints nothing.
pub struct SilentSyncProgress;

impl SyncProgress for SilentSyncProgress {
    fn on_updated(&self, _: &RecordFolder, _: &CoverPath) {}
    fn on_planned(&self, _: &RecordFolder, _: &CoverPath) {}
    fn on_no_cover(&self, _: &RecordFolder) {}
    fn on_missing_row(&self, _: &RecordFolder) {}
    fn on_failed(&self, _: &RecordFolder, _: &SyncError) {}
    fn on_complete(&self, _: &SyncStats) {}
}

enum Outcome {
    Updated { cover: CoverPath, rows: usize },
    Planned(CoverPath),
    NoCover,
}

fn process_folder<'u>(
    folder: &RecordFolder,
    options: &SyncOptions,
    updater: Option<&mut (dyn CoverUpdater + 'u)>,
) -> Result<Outcome, SyncError> {
    let cover = locate_cover(&folder.path, &folder.name, &options.url_prefix, options.order)
        .map_err(|e| SyncError::io(&folder.path, e))?;
    let Some(cover) = cover else {
        return Ok(Outcome::NoCover);
    };
    match updater {
        Some(updater) => {
            let rows = updater.set_cover(folder.id, &cover)?;
            Ok(Outcome::Updated { cover, rows })
        }
        None => Ok(Outcome::Planned(cover)),
    }
}

/// Sync the covers of every record folder under `root`.
///
/// With `updater` set to `None` this is a dry run: covers are located and
/// reported through [`SyncProgress::on_planned`] but nothing is written.
///
/// Failing to list `root` always ends the run. A failure inside a single
/// record folder ends it only under [`ErrorPolicy::Abort`]; updates made
/// before the failure stay committed and `on_complete` is not called.
pub fn sync_covers(
    root: &Path,
    options: &SyncOptions,
    mut updater: Option<&mut dyn CoverUpdater>,
    progress: Option<&dyn SyncProgress>,
) -> Result<SyncStats, SyncError> {
    let mut folders = record_folders(root, options.order).map_err(|e| SyncError::io(root, e))?;
    let mut stats = SyncStats::default();

    for folder in folders.by_ref() {
        let folder = folder.map_err(|e| SyncError::io(root, e))?;
        stats.candidates += 1;

        match process_folder(&folder, options, updater.as_deref_mut()) {
            Ok(Outcome::Updated { cover, rows }) => {
                stats.updated += 1;
                if let Some(p) = progress {
                    p.on_updated(&folder, &cover);
                }
                if rows == 0 {
                    stats.missing_rows += 1;
                    if let Some(p) = progress {
                        p.on_missing_row(&folder);
                    }
                }
            }
            Ok(Outcome::Planned(cover)) => {
                stats.planned += 1;
                if let Some(p) = progress {
                    p.on_planned(&folder, &cover);
                }
            }
            Ok(Outcome::NoCover) => {
                stats.no_cover += 1;
                if let Some(p) = progress {
                    p.on_no_cover(&folder);
                }
            }
            Err(e) => match options.on_error {
                ErrorPolicy::Abort => return Err(SyncError::record(folder.name, e)),
                ErrorPolicy::Continue => {
                    stats.failed += 1;
                    if let Some(p) = progress {
                        p.on_failed(&folder, &e);
                    }
                }
            },
        }
    }
    stats.ignored = folders.ignored();

    if let Some(p) = progress {
        p.on_complete(&stats);
    }

    Ok(stats)
}
