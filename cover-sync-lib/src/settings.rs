//! Run configuration: where the folders live, which database and columns to write.
//!
//! Each value is resolved with the priority chain
//!
//! 1. CLI override
//! 2. `COVER_SYNC_*` environment variable
//! 3. `~/.config/cover-sync/settings.toml` (or `$COVER_SYNC_CONFIG`)
//! 4. Built-in default
//!
//! and remembers which of those it came from, for `config show`.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use cover_sync_db::CoverTable;
use serde::{Deserialize, Serialize};

use crate::error::SettingsError;
use crate::scanner::ListingOrder;

pub const ENV_CONFIG: &str = "COVER_SYNC_CONFIG";
pub const ENV_ROOT: &str = "COVER_SYNC_ROOT";
pub const ENV_DATABASE: &str = "COVER_SYNC_DATABASE";
pub const ENV_TABLE: &str = "COVER_SYNC_TABLE";
pub const ENV_ID_COLUMN: &str = "COVER_SYNC_ID_COLUMN";
pub const ENV_COVER_COLUMN: &str = "COVER_SYNC_COVER_COLUMN";
pub const ENV_URL_PREFIX: &str = "COVER_SYNC_URL_PREFIX";
pub const ENV_ORDER: &str = "COVER_SYNC_ORDER";
pub const ENV_ON_ERROR: &str = "COVER_SYNC_ON_ERROR";

pub const DEFAULT_ROOT: &str = "public/upload/novel";
pub const DEFAULT_URL_PREFIX: &str = "/upload/novel";

/// What to do when one record folder fails (unreadable folder, rejected write).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorPolicy {
    /// Stop the run at the first failure. Updates already made stay committed.
    #[default]
    Abort,
    /// Report the failure and move on to the next folder.
    Continue,
}

impl FromStr for ErrorPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "abort" => Ok(Self::Abort),
            "continue" => Ok(Self::Continue),
            other => Err(format!(
                "unknown policy '{}' (expected abort or continue)",
                other
            )),
        }
    }
}

impl fmt::Display for ErrorPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Abort => write!(f, "abort"),
            Self::Continue => write!(f, "continue"),
        }
    }
}

/// Where a setting's value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingSource {
    /// Passed on the command line.
    Cli,
    /// Loaded from an environment variable.
    EnvVar(&'static str),
    /// Loaded from the settings file.
    ConfigFile,
    /// Built-in default.
    Default,
    /// Not set anywhere and no default exists.
    Missing,
}

impl fmt::Display for SettingSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cli => write!(f, "command line"),
            Self::EnvVar(var) => write!(f, "env ${}", var),
            Self::ConfigFile => write!(f, "config file"),
            Self::Default => write!(f, "default"),
            Self::Missing => write!(f, "not set"),
        }
    }
}

/// Provenance of each setting.
#[derive(Debug, Clone)]
pub struct SettingSources {
    pub root: SettingSource,
    pub database: SettingSource,
    pub table: SettingSource,
    pub id_column: SettingSource,
    pub cover_column: SettingSource,
    pub url_prefix: SettingSource,
    pub order: SettingSource,
    pub on_error: SettingSource,
}

/// Values given on the command line, which win over every other source.
#[derive(Debug, Clone, Default)]
pub struct SettingsOverrides {
    pub root: Option<PathBuf>,
    pub database: Option<PathBuf>,
    pub order: Option<ListingOrder>,
    pub on_error: Option<ErrorPolicy>,
}

/// Fully resolved settings for one run.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Directory holding one subfolder per record.
    pub root: PathBuf,
    /// SQLite database file. Only needed when writing.
    pub database: Option<PathBuf>,
    pub table: CoverTable,
    /// Public path prefix the cover paths are built from.
    pub url_prefix: String,
    pub order: ListingOrder,
    pub on_error: ErrorPolicy,
}

/// TOML settings file format.
#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
struct SettingsFile {
    library: Option<LibrarySection>,
    database: Option<DatabaseSection>,
    sync: Option<SyncSection>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
struct LibrarySection {
    root: Option<PathBuf>,
    url_prefix: Option<String>,
    order: Option<ListingOrder>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
struct DatabaseSection {
    path: Option<PathBuf>,
    table: Option<String>,
    id_column: Option<String>,
    cover_column: Option<String>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
struct SyncSection {
    on_error: Option<ErrorPolicy>,
}

/// Canonical path to the settings file: `~/.config/cover-sync/settings.toml`,
/// unless `$COVER_SYNC_CONFIG` points elsewhere.
pub fn settings_path() -> PathBuf {
    if let Some(path) = std::env::var_os(ENV_CONFIG).filter(|p| !p.is_empty()) {
        return PathBuf::from(path);
    }
    let config = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
    config.join("cover-sync").join("settings.toml")
}

fn load_settings_file(path: &Path) -> Result<Option<SettingsFile>, SettingsError> {
    if !path.exists() {
        return Ok(None);
    }
    let contents = std::fs::read_to_string(path).map_err(|source| SettingsError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let file = toml::from_str(&contents).map_err(|e| SettingsError::Parse {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    Ok(Some(file))
}

/// Pick the first value set in the chain CLI > env > file > default.
fn layer<T>(
    cli: Option<T>,
    var: &'static str,
    env: &dyn Fn(&str) -> Option<String>,
    file: Option<T>,
    default: Option<T>,
) -> Result<(Option<T>, SettingSource), SettingsError>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    if let Some(value) = cli {
        return Ok((Some(value), SettingSource::Cli));
    }
    if let Some(raw) = env(var).filter(|v| !v.trim().is_empty()) {
        let value = raw
            .parse::<T>()
            .map_err(|e| SettingsError::invalid_value(var, e.to_string()))?;
        return Ok((Some(value), SettingSource::EnvVar(var)));
    }
    if let Some(value) = file {
        return Ok((Some(value), SettingSource::ConfigFile));
    }
    match default {
        Some(value) => Ok((Some(value), SettingSource::Default)),
        None => Ok((None, SettingSource::Missing)),
    }
}

/// Like [`layer`], for settings that always have a default.
fn layer_or<T>(
    cli: Option<T>,
    var: &'static str,
    env: &dyn Fn(&str) -> Option<String>,
    file: Option<T>,
    default: T,
) -> Result<(T, SettingSource), SettingsError>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    let (value, source) = layer(cli, var, env, file, Some(default))?;
    match value {
        Some(value) => Ok((value, source)),
        None => Err(SettingsError::invalid_value(var, "no value")),
    }
}

impl Settings {
    /// Resolve settings from the CLI overrides, the process environment and
    /// the settings file at [`settings_path`].
    pub fn load(overrides: &SettingsOverrides) -> Result<(Self, SettingSources), SettingsError> {
        Self::load_from(&settings_path(), &|var: &str| std::env::var(var).ok(), overrides)
    }

    /// Resolve settings from an explicit settings file and environment lookup.
    pub fn load_from(
        path: &Path,
        env: &dyn Fn(&str) -> Option<String>,
        overrides: &SettingsOverrides,
    ) -> Result<(Self, SettingSources), SettingsError> {
        let file = load_settings_file(path)?.unwrap_or_default();
        Self::resolve(file, env, overrides)
    }

    fn resolve(
        file: SettingsFile,
        env: &dyn Fn(&str) -> Option<String>,
        overrides: &SettingsOverrides,
    ) -> Result<(Self, SettingSources), SettingsError> {
        let library = file.library.unwrap_or_default();
        let database = file.database.unwrap_or_default();
        let sync = file.sync.unwrap_or_default();
        let defaults = CoverTable::default();

        let (root, root_src) = layer_or(
            overrides.root.clone(),
            ENV_ROOT,
            env,
            library.root,
            PathBuf::from(DEFAULT_ROOT),
        )?;
        let (db_path, db_src) =
            layer(overrides.database.clone(), ENV_DATABASE, env, database.path, None)?;
        let (table, table_src) = layer_or(
            None,
            ENV_TABLE,
            env,
            database.table,
            defaults.table().to_string(),
        )?;
        let (id_column, id_src) = layer_or(
            None,
            ENV_ID_COLUMN,
            env,
            database.id_column,
            defaults.id_column().to_string(),
        )?;
        let (cover_column, cover_src) = layer_or(
            None,
            ENV_COVER_COLUMN,
            env,
            database.cover_column,
            defaults.cover_column().to_string(),
        )?;
        let (url_prefix, prefix_src) = layer_or(
            None,
            ENV_URL_PREFIX,
            env,
            library.url_prefix,
            DEFAULT_URL_PREFIX.to_string(),
        )?;
        let (order, order_src) = layer_or(
            overrides.order,
            ENV_ORDER,
            env,
            library.order,
            ListingOrder::default(),
        )?;
        let (on_error, on_error_src) = layer_or(
            overrides.on_error,
            ENV_ON_ERROR,
            env,
            sync.on_error,
            ErrorPolicy::default(),
        )?;

        let table = CoverTable::new(table, id_column, cover_column)
            .map_err(|e| SettingsError::invalid_value("database table", e.to_string()))?;

        let settings = Settings {
            root,
            database: db_path,
            table,
            url_prefix,
            order,
            on_error,
        };
        let sources = SettingSources {
            root: root_src,
            database: db_src,
            table: table_src,
            id_column: id_src,
            cover_column: cover_src,
            url_prefix: prefix_src,
            order: order_src,
            on_error: on_error_src,
        };
        Ok((settings, sources))
    }
}

const SETTINGS_TEMPLATE: &str = r#"# cover-sync settings
#
# Every value can also be set with a COVER_SYNC_* environment variable,
# which takes priority over this file.

[library]
# Directory containing one folder per record, named by the record id.
root = "public/upload/novel"
# Prefix of the cover path written to the database.
url_prefix = "/upload/novel"
# "listing" keeps filesystem order, "name" sorts folders and files by name.
order = "listing"

[database]
# path = "/var/lib/app/app.db"
table = "text_novel"
id_column = "id"
cover_column = "cover_url"

[sync]
# "abort" stops at the first failing folder, "continue" reports it and moves on.
on_error = "abort"
"#;

/// Write a commented default settings file if none exists yet.
///
/// Returns `false` without touching anything when the file is already there.
pub fn write_default_settings(path: &Path) -> Result<bool, SettingsError> {
    if path.exists() {
        return Ok(false);
    }
    let io_err = |source| SettingsError::Io {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(io_err)?;
    }
    // Write atomically
    let tmp = path.with_extension("toml.tmp");
    std::fs::write(&tmp, SETTINGS_TEMPLATE).map_err(io_err)?;
    std::fs::rename(&tmp, path).map_err(io_err)?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |var| map.get(var).cloned()
    }

    fn no_env() -> impl Fn(&str) -> Option<String> {
        |_| None
    }

    #[test]
    fn test_defaults_without_file_or_env() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.toml");
        let (settings, sources) =
            Settings::load_from(&path, &no_env(), &SettingsOverrides::default()).unwrap();

        assert_eq!(settings.root, PathBuf::from(DEFAULT_ROOT));
        assert_eq!(settings.database, None);
        assert_eq!(settings.table, CoverTable::default());
        assert_eq!(settings.url_prefix, "/upload/novel");
        assert_eq!(settings.order, ListingOrder::Listing);
        assert_eq!(settings.on_error, ErrorPolicy::Abort);

        assert_eq!(sources.root, SettingSource::Default);
        assert_eq!(sources.database, SettingSource::Missing);
    }

    #[test]
    fn test_file_values_are_used() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.toml");
        std::fs::write(
            &path,
            r#"
[library]
root = "/srv/comics"
url_prefix = "/upload/comic"
order = "name"

[database]
path = "/srv/app.db"
table = "comic_manga"
cover_column = "cover"

[sync]
on_error = "continue"
"#,
        )
        .unwrap();

        let (settings, sources) =
            Settings::load_from(&path, &no_env(), &SettingsOverrides::default()).unwrap();
        assert_eq!(settings.root, PathBuf::from("/srv/comics"));
        assert_eq!(settings.database, Some(PathBuf::from("/srv/app.db")));
        assert_eq!(settings.table.table(), "comic_manga");
        assert_eq!(settings.table.id_column(), "id");
        assert_eq!(settings.table.cover_column(), "cover");
        assert_eq!(settings.url_prefix, "/upload/comic");
        assert_eq!(settings.order, ListingOrder::Name);
        assert_eq!(settings.on_error, ErrorPolicy::Continue);

        assert_eq!(sources.root, SettingSource::ConfigFile);
        assert_eq!(sources.id_column, SettingSource::Default);
    }

    #[test]
    fn test_env_beats_file_and_cli_beats_env() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.toml");
        std::fs::write(&path, "[library]\nroot = \"/from/file\"\n").unwrap();
        let env = env_from(&[
            (ENV_ROOT, "/from/env"),
            (ENV_DATABASE, "/env.db"),
            (ENV_ON_ERROR, "continue"),
        ]);

        let (settings, sources) =
            Settings::load_from(&path, &env, &SettingsOverrides::default()).unwrap();
        assert_eq!(settings.root, PathBuf::from("/from/env"));
        assert_eq!(sources.root, SettingSource::EnvVar(ENV_ROOT));
        assert_eq!(settings.on_error, ErrorPolicy::Continue);

        let overrides = SettingsOverrides {
            root: Some(PathBuf::from("/from/cli")),
            on_error: Some(ErrorPolicy::Abort),
            ..Default::default()
        };
        let (settings, sources) = Settings::load_from(&path, &env, &overrides).unwrap();
        assert_eq!(settings.root, PathBuf::from("/from/cli"));
        assert_eq!(sources.root, SettingSource::Cli);
        assert_eq!(settings.database, Some(PathBuf::from("/env.db")));
        assert_eq!(settings.on_error, ErrorPolicy::Abort);
    }

    #[test]
    fn test_empty_env_var_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.toml");
        let env = env_from(&[(ENV_ROOT, "")]);

        let (settings, sources) =
            Settings::load_from(&path, &env, &SettingsOverrides::default()).unwrap();
        assert_eq!(settings.root, PathBuf::from(DEFAULT_ROOT));
        assert_eq!(sources.root, SettingSource::Default);
    }

    #[test]
    fn test_invalid_env_value_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.toml");
        let env = env_from(&[(ENV_ORDER, "random")]);

        let err = Settings::load_from(&path, &env, &SettingsOverrides::default()).unwrap_err();
        assert!(matches!(err, SettingsError::InvalidValue { key, .. } if key == ENV_ORDER));
    }

    #[test]
    fn test_invalid_identifier_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.toml");
        let env = env_from(&[(ENV_TABLE, "novel; DROP TABLE novel")]);

        let err = Settings::load_from(&path, &env, &SettingsOverrides::default()).unwrap_err();
        assert!(matches!(err, SettingsError::InvalidValue { .. }));
    }

    #[test]
    fn test_unknown_field_is_a_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.toml");
        std::fs::write(&path, "[library]\nroot_dir = \"/x\"\n").unwrap();

        let err = Settings::load_from(&path, &no_env(), &SettingsOverrides::default()).unwrap_err();
        assert!(matches!(err, SettingsError::Parse { .. }));
    }

    #[test]
    fn test_written_template_loads_as_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("settings.toml");

        assert!(write_default_settings(&path).unwrap());
        assert!(!write_default_settings(&path).unwrap());

        let (settings, sources) =
            Settings::load_from(&path, &no_env(), &SettingsOverrides::default()).unwrap();
        assert_eq!(settings.root, PathBuf::from(DEFAULT_ROOT));
        assert_eq!(settings.table, CoverTable::default());
        assert_eq!(settings.database, None);
        assert_eq!(sources.root, SettingSource::ConfigFile);
    }

    #[test]
    fn test_policy_from_str() {
        assert_eq!("ABORT".parse::<ErrorPolicy>(), Ok(ErrorPolicy::Abort));
        assert_eq!("continue".parse::<ErrorPolicy>(), Ok(ErrorPolicy::Continue));
        assert!("retry".parse::<ErrorPolicy>().is_err());
    }
}
