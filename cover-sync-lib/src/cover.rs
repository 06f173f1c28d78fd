//! Cover image lookup inside a record folder.

use std::fmt;
use std::io;
use std::path::Path;

use crate::scanner::{ListingOrder, list_dir};

/// File extensions accepted as cover images, compared case-insensitively.
pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp", "gif"];

/// Public path of a cover, as stored in the record: `{prefix}/{folder}/{file}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoverPath(String);

impl CoverPath {
    pub fn new(url_prefix: &str, folder_name: &str, file_name: &str) -> Self {
        Self(format!(
            "{}/{}/{}",
            url_prefix.trim_end_matches('/'),
            folder_name,
            file_name
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CoverPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// True if the text after the last `.` of `file_name` is an allowed image extension.
pub fn has_image_extension(file_name: &str) -> bool {
    file_name
        .rsplit_once('.')
        .map(|(_, ext)| IMAGE_EXTENSIONS.iter().any(|e| ext.eq_ignore_ascii_case(e)))
        .unwrap_or(false)
}

/// Find the cover of a record folder.
///
/// Returns the first regular file with an image extension, in `order`, or
/// `None` when the folder has no image. `folder_name` goes into the path
/// verbatim, so it keeps any leading zeros the folder has on disk.
pub fn locate_cover(
    folder: &Path,
    folder_name: &str,
    url_prefix: &str,
    order: ListingOrder,
) -> io::Result<Option<CoverPath>> {
    for entry in list_dir(folder, order)? {
        let entry = entry?;
        let file_name = entry.file_name();
        let Some(file_name) = file_name.to_str() else {
            continue;
        };
        if !has_image_extension(file_name) {
            continue;
        }
        if !entry.path().is_file() {
            continue;
        }
        return Ok(Some(CoverPath::new(url_prefix, folder_name, file_name)));
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const PREFIX: &str = "/upload/novel";

    #[test]
    fn test_has_image_extension() {
        assert!(has_image_extension("cover.jpg"));
        assert!(has_image_extension("cover.JPEG"));
        assert!(has_image_extension("a.b.Png"));
        assert!(has_image_extension("x.webp"));
        assert!(has_image_extension("x.gif"));
        assert!(!has_image_extension("readme.txt"));
        assert!(!has_image_extension("jpg"));
        assert!(!has_image_extension("cover.jpg.bak"));
        assert!(!has_image_extension("cover.bmp"));
        assert!(!has_image_extension("cover."));
    }

    #[test]
    fn test_cover_path_format() {
        let cover = CoverPath::new(PREFIX, "12", "cover.jpg");
        assert_eq!(cover.as_str(), "/upload/novel/12/cover.jpg");
        assert_eq!(cover.to_string(), "/upload/novel/12/cover.jpg");

        let trailing = CoverPath::new("/upload/comic/", "3", "c.png");
        assert_eq!(trailing.as_str(), "/upload/comic/3/c.png");
    }

    #[test]
    fn test_locates_single_image() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("readme.txt"), b"").unwrap();
        fs::write(dir.path().join("Cover.PNG"), b"").unwrap();

        let cover = locate_cover(dir.path(), "8", PREFIX, ListingOrder::Listing).unwrap();
        assert_eq!(cover, Some(CoverPath::new(PREFIX, "8", "Cover.PNG")));
    }

    #[test]
    fn test_no_image_gives_none() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("readme.txt"), b"").unwrap();
        fs::write(dir.path().join("chapter1.md"), b"").unwrap();

        let cover = locate_cover(dir.path(), "2", PREFIX, ListingOrder::Listing).unwrap();
        assert_eq!(cover, None);
    }

    #[test]
    fn test_empty_folder_gives_none() {
        let dir = tempfile::tempdir().unwrap();
        let cover = locate_cover(dir.path(), "2", PREFIX, ListingOrder::Name).unwrap();
        assert_eq!(cover, None);
    }

    #[test]
    fn test_directories_are_not_covers() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("gallery.jpg")).unwrap();

        let cover = locate_cover(dir.path(), "4", PREFIX, ListingOrder::Listing).unwrap();
        assert_eq!(cover, None);
    }

    #[test]
    fn test_name_order_picks_first_by_name() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("b.png"), b"").unwrap();
        fs::write(dir.path().join("a.webp"), b"").unwrap();
        fs::write(dir.path().join("c.gif"), b"").unwrap();

        let cover = locate_cover(dir.path(), "5", PREFIX, ListingOrder::Name).unwrap();
        assert_eq!(cover.unwrap().as_str(), "/upload/novel/5/a.webp");
    }

    #[test]
    fn test_listing_order_picks_one_of_the_images() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("b.png"), b"").unwrap();
        fs::write(dir.path().join("a.jpg"), b"").unwrap();

        let cover = locate_cover(dir.path(), "5", PREFIX, ListingOrder::Listing)
            .unwrap()
            .unwrap();
        assert!(
            cover.as_str() == "/upload/novel/5/a.jpg" || cover.as_str() == "/upload/novel/5/b.png"
        );
    }

    #[test]
    fn test_leading_zeros_kept_in_path() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("cover.jpg"), b"").unwrap();

        let cover = locate_cover(dir.path(), "007", PREFIX, ListingOrder::Listing).unwrap();
        assert_eq!(cover.unwrap().as_str(), "/upload/novel/007/cover.jpg");
    }

    #[test]
    fn test_unreadable_folder_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("9");
        assert!(locate_cover(&missing, "9", PREFIX, ListingOrder::Listing).is_err());
    }
}
