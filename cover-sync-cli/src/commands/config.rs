use owo_colors::OwoColorize;
use owo_colors::Stream::Stdout;

use cover_sync_lib::settings::{settings_path, write_default_settings};
use cover_sync_lib::{SettingSource, Settings, SettingsOverrides};

use crate::error::CliError;

/// Show effective settings and their sources.
pub(crate) fn run_config_show() -> Result<(), CliError> {
    let path = settings_path();

    log::info!(
        "{}",
        "cover-sync Configuration".if_supports_color(Stdout, |t| t.bold()),
    );
    log::info!("");

    if path.exists() {
        log::info!(
            "  Config file: {} {}",
            path.display().if_supports_color(Stdout, |t| t.cyan()),
            "(exists)".if_supports_color(Stdout, |t| t.green()),
        );
    } else {
        log::info!(
            "  Config file: {} {}",
            path.display().if_supports_color(Stdout, |t| t.cyan()),
            "(not found)".if_supports_color(Stdout, |t| t.dimmed()),
        );
    }
    log::info!("");

    let (settings, sources) = Settings::load(&SettingsOverrides::default())
        .map_err(|e| CliError::config(e.to_string()))?;

    let fields: [(&str, String, SettingSource); 8] = [
        ("root", settings.root.display().to_string(), sources.root),
        (
            "database",
            settings
                .database
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_default(),
            sources.database,
        ),
        ("table", settings.table.table().to_string(), sources.table),
        (
            "id_column",
            settings.table.id_column().to_string(),
            sources.id_column,
        ),
        (
            "cover_column",
            settings.table.cover_column().to_string(),
            sources.cover_column,
        ),
        ("url_prefix", settings.url_prefix.clone(), sources.url_prefix),
        ("order", settings.order.to_string(), sources.order),
        ("on_error", settings.on_error.to_string(), sources.on_error),
    ];

    for (name, value, source) in fields {
        if source == SettingSource::Missing {
            log::info!(
                "  {:<13} {}",
                format!("{}:", name),
                "not set".if_supports_color(Stdout, |t| t.red()),
            );
        } else {
            log::info!(
                "  {:<13} {} {}",
                format!("{}:", name),
                value,
                format!("({})", source).if_supports_color(Stdout, |t| t.dimmed()),
            );
        }
    }

    Ok(())
}

/// Print the settings file path.
pub(crate) fn run_config_path() -> Result<(), CliError> {
    log::info!("{}", settings_path().display());
    Ok(())
}

/// Write a default settings file.
pub(crate) fn run_config_init() -> Result<(), CliError> {
    let path = settings_path();
    let written = write_default_settings(&path).map_err(|e| CliError::config(e.to_string()))?;
    if written {
        log::info!(
            "{} {}",
            "Wrote default settings to".if_supports_color(Stdout, |t| t.green()),
            path.display(),
        );
    } else {
        log::warn!("Settings file already exists: {}", path.display());
    }
    Ok(())
}
