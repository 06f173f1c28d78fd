//! Record folder enumeration.
//!
//! A record folder is an immediate subdirectory of the root whose name is a
//! non-empty run of ASCII digits that fits an `i64`. Everything else in the
//! root is ignored without being reported.

use std::fmt;
use std::fs::{self, DirEntry, ReadDir};
use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::vec;

use serde::{Deserialize, Serialize};

/// Order in which folders and files are visited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListingOrder {
    /// Whatever order the filesystem lists entries in.
    #[default]
    Listing,
    /// Sorted by file name, so the first match is the same on every platform.
    Name,
}

impl FromStr for ListingOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "listing" => Ok(Self::Listing),
            "name" => Ok(Self::Name),
            other => Err(format!("unknown order '{}' (expected listing or name)", other)),
        }
    }
}

impl fmt::Display for ListingOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Listing => write!(f, "listing"),
            Self::Name => write!(f, "name"),
        }
    }
}

/// A subdirectory of the root that names a record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordFolder {
    /// Record id parsed from the folder name (leading zeros dropped).
    pub id: i64,
    /// Folder name exactly as listed.
    pub name: String,
    pub path: PathBuf,
}

/// Parse a folder name into a record id.
///
/// Only ASCII digits are accepted; signs, whitespace and non-ASCII digits
/// are rejected, as are values that overflow an `i64`.
pub fn parse_record_id(name: &str) -> Option<i64> {
    if name.is_empty() || !name.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    name.parse().ok()
}

/// Read a directory, optionally sorting its entries by file name.
pub(crate) fn list_dir(path: &Path, order: ListingOrder) -> io::Result<DirListing> {
    let read_dir = fs::read_dir(path)?;
    match order {
        ListingOrder::Listing => Ok(DirListing::Listing(read_dir)),
        ListingOrder::Name => {
            let mut entries = read_dir.collect::<io::Result<Vec<_>>>()?;
            entries.sort_by_key(|e| e.file_name());
            Ok(DirListing::Sorted(entries.into_iter()))
        }
    }
}

pub(crate) enum DirListing {
    Listing(ReadDir),
    Sorted(vec::IntoIter<DirEntry>),
}

impl Iterator for DirListing {
    type Item = io::Result<DirEntry>;

    fn next(&mut self) -> Option<Self::Item> {
        match self {
            DirListing::Listing(read_dir) => read_dir.next(),
            DirListing::Sorted(entries) => entries.next().map(Ok),
        }
    }
}

/// Lazy iterator over the record folders of a root.
///
/// Yields an error when an entry of the root listing can't be read; the
/// caller decides whether that ends the walk.
pub struct RecordFolders {
    entries: DirListing,
    ignored: u64,
}

impl RecordFolders {
    /// Number of root entries skipped so far because they aren't record folders.
    pub fn ignored(&self) -> u64 {
        self.ignored
    }
}

impl Iterator for RecordFolders {
    type Item = io::Result<RecordFolder>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let entry = match self.entries.next()? {
                Ok(entry) => entry,
                Err(e) => return Some(Err(e)),
            };
            match classify(&entry) {
                Some(folder) => return Some(Ok(folder)),
                None => self.ignored += 1,
            }
        }
    }
}

fn classify(entry: &DirEntry) -> Option<RecordFolder> {
    let file_name = entry.file_name();
    let Some(name) = file_name.to_str() else {
        log::debug!("Ignoring non UTF-8 entry {:?}", file_name);
        return None;
    };
    let Some(id) = parse_record_id(name) else {
        log::debug!("Ignoring {}: not a record id", name);
        return None;
    };
    let path = entry.path();
    // Follows symlinks, so a linked record folder still counts.
    if !path.is_dir() {
        log::debug!("Ignoring {}: not a directory", name);
        return None;
    }
    Some(RecordFolder {
        id,
        name: name.to_string(),
        path,
    })
}

/// List the record folders directly under `root`.
///
/// Fails if the root itself can't be listed.
pub fn record_folders(root: &Path, order: ListingOrder) -> io::Result<RecordFolders> {
    Ok(RecordFolders {
        entries: list_dir(root, order)?,
        ignored: 0,
    })
}
