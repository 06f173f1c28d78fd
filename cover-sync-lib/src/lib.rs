//! Filesystem-to-database cover synchronization.
//!
//! Walks a root of per-record asset folders (`<root>/<id>/`), picks the
//! first image in each as the record's cover, and writes
//! `<url_prefix>/<id>/<file>` into the record's cover column.

pub mod cover;
pub mod error;
pub mod scanner;
pub mod settings;
pub mod sync;

pub use cover::{CoverPath, IMAGE_EXTENSIONS, has_image_extension, locate_cover};
pub use error::{SettingsError, SyncError};
pub use scanner::{ListingOrder, RecordFolder, RecordFolders, parse_record_id, record_folders};
pub use settings::{ErrorPolicy, SettingSource, SettingSources, Settings, SettingsOverrides};
pub use sync::{
    CoverUpdater, SilentSyncProgress, SqliteCoverUpdater, SyncOptions, SyncProgress, SyncStats,
    sync_covers,
};
