use std::path::PathBuf;

use owo_colors::OwoColorize;
use owo_colors::Stream::Stdout;

use cover_sync_lib::settings::{ENV_DATABASE, settings_path};
use cover_sync_lib::{
    CoverPath, ErrorPolicy, ListingOrder, RecordFolder, Settings, SettingsOverrides,
    SqliteCoverUpdater, SyncError, SyncOptions, SyncProgress, SyncStats, sync_covers,
};

use crate::cli_types::SyncArgs;
use crate::error::CliError;

pub(crate) fn ok_line(folder: &RecordFolder, cover: &CoverPath) -> String {
    format!(
        "{} id {} -> {}",
        "[OK]".if_supports_color(Stdout, |t| t.green()),
        folder.name,
        cover,
    )
}

pub(crate) fn dry_line(folder: &RecordFolder, cover: &CoverPath) -> String {
    format!(
        "{} id {} -> {}",
        "[DRY]".if_supports_color(Stdout, |t| t.cyan()),
        folder.name,
        cover,
    )
}

pub(crate) fn skip_line(folder: &RecordFolder) -> String {
    format!(
        "{} id {} no cover found",
        "[SKIP]".if_supports_color(Stdout, |t| t.yellow()),
        folder.name,
    )
}

pub(crate) fn missing_row_line(folder: &RecordFolder, table: &str) -> String {
    format!("id {} matched no row in {}", folder.name, table)
}

pub(crate) fn fail_line(folder: &RecordFolder, error: &SyncError) -> String {
    format!(
        "{} id {}: {}",
        "[FAIL]".if_supports_color(Stdout, |t| t.bright_red()),
        folder.name,
        error,
    )
}

/// Closing count: covers written, or covers that would be written in a dry run.
pub(crate) fn summary_line(dry_run: bool, stats: &SyncStats) -> String {
    if dry_run {
        format!(
            "{} {}",
            "Would update:".if_supports_color(Stdout, |t| t.bold()),
            stats.planned,
        )
    } else {
        format!(
            "{} {}",
            "Total updated:".if_supports_color(Stdout, |t| t.bold()),
            stats.updated,
        )
    }
}

/// Prints one line per record folder and the closing count.
struct CliSyncProgress {
    dry_run: bool,
    table: String,
}

impl SyncProgress for CliSyncProgress {
    fn on_updated(&self, folder: &RecordFolder, cover: &CoverPath) {
        log::info!("{}", ok_line(folder, cover));
    }

    fn on_planned(&self, folder: &RecordFolder, cover: &CoverPath) {
        log::info!("{}", dry_line(folder, cover));
    }

    fn on_no_cover(&self, folder: &RecordFolder) {
        log::info!("{}", skip_line(folder));
    }

    fn on_missing_row(&self, folder: &RecordFolder) {
        log::warn!("{}", missing_row_line(folder, &self.table));
    }

    fn on_failed(&self, folder: &RecordFolder, error: &SyncError) {
        log::error!("{}", fail_line(folder, error));
    }

    fn on_complete(&self, stats: &SyncStats) {
        log::debug!(
            "{} record folders, {} other entries ignored",
            stats.candidates,
            stats.ignored
        );
        log::info!("");
        log::info!("{}", summary_line(self.dry_run, stats));
        if stats.failed > 0 {
            log::info!(
                "{} {}",
                "Failed:".if_supports_color(Stdout, |t| t.bright_red()),
                stats.failed,
            );
        }
    }
}

/// Run the sync command.
pub(crate) fn run_sync(root: Option<PathBuf>, args: SyncArgs) -> Result<(), CliError> {
    let overrides = SettingsOverrides {
        root,
        database: args.database,
        order: args.sorted.then_some(ListingOrder::Name),
        on_error: args.continue_on_error.then_some(ErrorPolicy::Continue),
    };
    let (settings, _) =
        Settings::load(&overrides).map_err(|e| CliError::config(e.to_string()))?;
    let options = SyncOptions::from(&settings);

    log::debug!(
        "Syncing covers in {} (order: {}, on error: {})",
        settings.root.display(),
        options.order,
        options.on_error,
    );

    let progress = CliSyncProgress {
        dry_run: args.dry_run,
        table: settings.table.table().to_string(),
    };

    let stats = if args.dry_run {
        sync_covers(&settings.root, &options, None, Some(&progress))
    } else {
        let db_path = settings.database.as_deref().ok_or_else(|| {
            CliError::config(format!(
                "No database configured. Pass --database, set ${} or add [database] path to {}",
                ENV_DATABASE,
                settings_path().display()
            ))
        })?;
        let conn = cover_sync_db::open_database(db_path)
            .map_err(|e| CliError::database(e.to_string()))?;
        let mut updater = SqliteCoverUpdater::new(&conn, &settings.table)
            .map_err(|e| CliError::database(e.to_string()))?;
        sync_covers(&settings.root, &options, Some(&mut updater), Some(&progress))
    }
    .map_err(|e| CliError::sync(e.to_string()))?;

    if stats.failed > 0 {
        return Err(CliError::sync(format!(
            "{} record folder(s) could not be synced",
            stats.failed
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn folder(name: &str) -> RecordFolder {
        RecordFolder {
            id: name.parse().unwrap(),
            name: name.to_string(),
            path: PathBuf::from("novel").join(name),
        }
    }

    fn plain(line: String) -> String {
        strip_ansi_escapes::strip_str(line)
    }

    #[test]
    fn test_ok_line() {
        let cover = CoverPath::new("/upload/novel", "1", "cover.jpg");
        assert_eq!(
            plain(ok_line(&folder("1"), &cover)),
            "[OK] id 1 -> /upload/novel/1/cover.jpg"
        );
    }

    #[test]
    fn test_skip_line() {
        assert_eq!(plain(skip_line(&folder("2"))), "[SKIP] id 2 no cover found");
    }

    #[test]
    fn test_dry_line() {
        let cover = CoverPath::new("/upload/novel", "3", "a.png");
        assert_eq!(
            plain(dry_line(&folder("3"), &cover)),
            "[DRY] id 3 -> /upload/novel/3/a.png"
        );
    }

    #[test]
    fn test_lines_keep_leading_zeros() {
        let zeros = folder("007");
        let cover = CoverPath::new("/upload/novel", "007", "c.gif");
        assert_eq!(
            plain(ok_line(&zeros, &cover)),
            "[OK] id 007 -> /upload/novel/007/c.gif"
        );
        assert_eq!(
            missing_row_line(&zeros, "text_novel"),
            "id 007 matched no row in text_novel"
        );
    }

    #[test]
    fn test_summary_counts_updates() {
        let stats = SyncStats {
            candidates: 3,
            updated: 2,
            planned: 9,
            no_cover: 1,
            ..Default::default()
        };
        assert_eq!(plain(summary_line(false, &stats)), "Total updated: 2");
    }

    #[test]
    fn test_dry_run_summary_counts_planned() {
        let stats = SyncStats {
            updated: 9,
            planned: 4,
            ..Default::default()
        };
        assert_eq!(plain(summary_line(true, &stats)), "Would update: 4");
    }
}
