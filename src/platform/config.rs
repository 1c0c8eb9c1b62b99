// BirthWindow - platform/config.rs
//
// Platform-specific configuration directory resolution, and config.toml
// loading with startup validation.
//
// Uses the `directories` crate for XDG (Linux), AppData (Windows),
// Library (macOS) compliance.

use crate::util::constants;
use crate::util::error::ConfigError;
use directories::ProjectDirs;
use std::path::{Path, PathBuf};

/// Resolved platform paths for BirthWindow configuration.
#[derive(Debug, Clone)]
pub struct PlatformPaths {
    /// Configuration directory (e.g. ~/.config/birthwindow/ or %APPDATA%\BirthWindow\config\)
    pub config_dir: PathBuf,
}

impl PlatformPaths {
    /// Resolve platform-appropriate paths.
    ///
    /// Falls back to current directory if platform dirs cannot be determined.
    pub fn resolve() -> Self {
        if let Some(proj_dirs) = ProjectDirs::from("", "", constants::APP_ID) {
            let config_dir = proj_dirs.config_dir().to_path_buf();
            tracing::debug!(config = %config_dir.display(), "Platform paths resolved");
            Self { config_dir }
        } else {
            tracing::warn!("Could not determine platform directories, using current directory");
            Self {
                config_dir: PathBuf::from("."),
            }
        }
    }

    /// Reference file used when neither the CLI nor config.toml names one.
    pub fn default_reference_file(&self) -> PathBuf {
        self.config_dir.join(constants::REFERENCE_FILE_NAME)
    }
}

// =============================================================================
// config.toml loading and validation
// =============================================================================

/// Raw deserialisable shape of config.toml.
///
/// Unknown keys are silently ignored for forward compatibility.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct RawConfig {
    /// `[reference]` section.
    pub reference: ReferenceSection,
    /// `[export]` section.
    pub export: ExportSection,
    /// `[logging]` section.
    pub logging: LoggingSection,
}

/// `[reference]` config section.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct ReferenceSection {
    /// Path to the question reference TOML.
    pub file: Option<String>,
}

/// `[export]` config section.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct ExportSection {
    /// Directory the CSV export is written to when `run` is not given `--export`.
    pub directory: Option<String>,
    /// File name of that export.
    pub file_name: Option<String>,
}

/// `[logging]` config section.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// Log level: "error", "warn", "info", "debug", "trace".
    pub level: Option<String>,
    /// Log file path (empty = stderr only).
    pub file: Option<String>,
}

/// Validated application configuration derived from `config.toml`.
///
/// Invalid values produce warnings and fall back to defaults.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Reference file named in config.toml.
    pub reference_file: Option<PathBuf>,

    /// Default CSV export directory. `None` means no export unless asked for.
    pub export_dir: Option<PathBuf>,
    /// Default CSV export file name.
    pub export_file_name: String,

    /// Logging level string (for init before tracing is available).
    pub log_level: Option<String>,
    /// Log file path.
    pub log_file: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            reference_file: None,
            export_dir: None,
            export_file_name: constants::DEFAULT_EXPORT_FILE_NAME.to_string(),
            log_level: None,
            log_file: None,
        }
    }
}

impl AppConfig {
    /// Configured CSV export path, if an export directory is set.
    pub fn export_path(&self) -> Option<PathBuf> {
        self.export_dir
            .as_ref()
            .map(|dir| dir.join(&self.export_file_name))
    }
}

/// Load and validate `config.toml` from the given config directory.
///
/// Returns `AppConfig` with validated values and a list of non-fatal problems.
/// If the file does not exist, returns defaults with no warnings (first run).
/// If the file is unreadable or unparseable, returns defaults with the error
/// as a warning; the application still starts but the user is informed.
pub fn load_config(config_dir: &Path) -> (AppConfig, Vec<ConfigError>) {
    let config_path = config_dir.join(constants::CONFIG_FILE_NAME);
    let mut warnings: Vec<ConfigError> = Vec::new();

    if !config_path.exists() {
        tracing::debug!(path = %config_path.display(), "No config.toml found; using defaults");
        return (AppConfig::default(), warnings);
    }

    let content = match std::fs::read_to_string(&config_path) {
        Ok(c) => c,
        Err(e) => {
            warnings.push(ConfigError::Io {
                path: config_path,
                source: e,
            });
            return (AppConfig::default(), warnings);
        }
    };

    let raw: RawConfig = match toml::from_str(&content) {
        Ok(r) => r,
        Err(e) => {
            warnings.push(ConfigError::TomlParse {
                path: config_path,
                source: e,
            });
            return (AppConfig::default(), warnings);
        }
    };

    tracing::info!(path = %config_path.display(), "Loaded config.toml");

    // Validate each field, accumulating all problems.
    let mut config = AppConfig::default();

    // -- Reference: file --
    if let Some(file) = raw.reference.file.filter(|f| !f.is_empty()) {
        config.reference_file = Some(PathBuf::from(file));
    }

    // -- Export: directory --
    if let Some(dir) = raw.export.directory.filter(|d| !d.is_empty()) {
        config.export_dir = Some(PathBuf::from(dir));
    }

    // -- Export: file_name --
    if let Some(name) = raw.export.file_name {
        let bare = Path::new(&name).file_name().is_some_and(|f| f == name.as_str());
        if bare && name.to_lowercase().ends_with(".csv") {
            config.export_file_name = name;
        } else {
            warnings.push(ConfigError::ValueOutOfRange {
                field: "export.file_name".to_string(),
                value: name,
                expected: format!(
                    "a bare file name ending in .csv (default {})",
                    constants::DEFAULT_EXPORT_FILE_NAME
                ),
            });
        }
    }

    // -- Logging: level --
    if let Some(level) = raw.logging.level {
        let valid = ["error", "warn", "info", "debug", "trace"];
        if valid.contains(&level.to_lowercase().as_str()) {
            config.log_level = Some(level);
        } else {
            warnings.push(ConfigError::ValueOutOfRange {
                field: "logging.level".to_string(),
                value: level,
                expected: format!(
                    "one of error, warn, info, debug, trace (default {})",
                    constants::DEFAULT_LOG_LEVEL
                ),
            });
        }
    }

    // -- Logging: file --
    if let Some(file) = raw.logging.file.filter(|f| !f.is_empty()) {
        config.log_file = Some(PathBuf::from(file));
    }

    if !warnings.is_empty() {
        tracing::warn!(
            count = warnings.len(),
            "Config validation produced warnings"
        );
    }

    (config, warnings)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_config(dir: &Path, content: &str) {
        std::fs::write(dir.join(constants::CONFIG_FILE_NAME), content).unwrap();
    }

    #[test]
    fn test_missing_config_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let (config, warnings) = load_config(dir.path());
        assert!(warnings.is_empty());
        assert!(config.reference_file.is_none());
        assert!(config.export_path().is_none());
        assert_eq!(config.export_file_name, constants::DEFAULT_EXPORT_FILE_NAME);
    }

    #[test]
    fn test_valid_config_is_applied() {
        let dir = tempfile::tempdir().unwrap();
        write_config(
            dir.path(),
            r#"
[reference]
file = "/srv/birthwindow/questions.toml"

[export]
directory = "/tmp/exports"
file_name = "window.csv"

[logging]
level = "debug"
file = "/tmp/birthwindow.log"
"#,
        );
        let (config, warnings) = load_config(dir.path());
        assert!(warnings.is_empty(), "unexpected warnings: {warnings:?}");
        assert_eq!(
            config.reference_file,
            Some(PathBuf::from("/srv/birthwindow/questions.toml"))
        );
        assert_eq!(
            config.export_path(),
            Some(PathBuf::from("/tmp/exports").join("window.csv"))
        );
        assert_eq!(config.log_level.as_deref(), Some("debug"));
        assert_eq!(config.log_file, Some(PathBuf::from("/tmp/birthwindow.log")));
    }

    #[test]
    fn test_invalid_values_warn_and_fall_back() {
        let dir = tempfile::tempdir().unwrap();
        write_config(
            dir.path(),
            "[export]\nfile_name = \"nested/out.txt\"\n\n[logging]\nlevel = \"loud\"\n",
        );
        let (config, warnings) = load_config(dir.path());
        assert_eq!(warnings.len(), 2);
        assert!(warnings
            .iter()
            .all(|w| matches!(w, ConfigError::ValueOutOfRange { .. })));
        assert_eq!(config.export_file_name, constants::DEFAULT_EXPORT_FILE_NAME);
        assert!(config.log_level.is_none());
    }

    #[test]
    fn test_unparseable_config_warns() {
        let dir = tempfile::tempdir().unwrap();
        write_config(dir.path(), "[logging\nlevel = ");
        let (config, warnings) = load_config(dir.path());
        assert!(matches!(warnings.as_slice(), [ConfigError::TomlParse { .. }]));
        assert!(config.log_level.is_none());
    }

    #[test]
    fn test_default_reference_file_lives_in_config_dir() {
        let paths = PlatformPaths {
            config_dir: PathBuf::from("/etc/birthwindow"),
        };
        assert_eq!(
            paths.default_reference_file(),
            PathBuf::from("/etc/birthwindow").join(constants::REFERENCE_FILE_NAME)
        );
    }
}
