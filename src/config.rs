use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::fields::DEFAULT_TEXTAREA_ROWS;

/// Environment variable overriding `logging.level`.
pub const LOG_ENV: &str = "TICKBOX_LOG";

/// Environment variable overriding the config file location.
pub const CONFIG_ENV: &str = "TICKBOX_CONFIG";

/// Status of config file loading
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigLoadStatus {
    /// Config loaded successfully from existing file
    Loaded,
    /// Created default config file (first run)
    Created,
    /// Error occurred during loading, using defaults
    Error(String),
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Dialog appearance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModalConfig {
    /// Visible rows of multi-line inputs such as the todo description.
    pub textarea_rows: u16,
}

impl Default for ModalConfig {
    fn default() -> Self {
        Self {
            textarea_rows: DEFAULT_TEXTAREA_ROWS,
        }
    }
}

/// Todo list behavior
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TodosConfig {
    /// Ask before deleting a todo.
    pub confirm_delete: bool,
    /// Start with a few example todos and categories.
    pub seed_demo: bool,
}

impl Default for TodosConfig {
    fn default() -> Self {
        Self {
            confirm_delete: true,
            seed_demo: true,
        }
    }
}

/// Main application configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub modal: ModalConfig,
    #[serde(default)]
    pub todos: TodosConfig,
}

impl Config {
    /// Clamp values that would make the UI unusable.
    pub fn normalize(&mut self) {
        if self.modal.textarea_rows == 0 {
            debug!("textarea_rows_clamped");
            self.modal.textarea_rows = 1;
        }
    }

    /// Expand `~` to home directory in a path string
    pub fn expand_tilde(path: &str) -> PathBuf {
        if let Some(stripped) = path.strip_prefix("~/")
            && let Some(home) = dirs::home_dir()
        {
            return home.join(stripped);
        }
        PathBuf::from(path)
    }
}

/// Loaded configuration with metadata
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config: Config,
    pub config_path: PathBuf,
    pub status: ConfigLoadStatus,
}

/// Get the platform-appropriate config directory
fn get_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("dev", "tickbox", "tickbox").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the full path to the config file.
///
/// An explicit path (from `--config`) wins, then `TICKBOX_CONFIG`, then the
/// platform config directory.
pub fn get_config_path(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }
    if let Ok(path) = env::var(CONFIG_ENV)
        && !path.trim().is_empty()
    {
        debug!(var = CONFIG_ENV, "config_path_from_env");
        return Some(Config::expand_tilde(&path));
    }
    get_config_dir().map(|dir| dir.join("config.toml"))
}

/// Load configuration from file, environment, and defaults
pub fn load_config(explicit_path: Option<&Path>) -> LoadedConfig {
    let config_path = match get_config_path(explicit_path) {
        Some(path) => path,
        None => {
            warn!("config_dir_unavailable");
            return LoadedConfig {
                config: apply_env_overrides(Config::default()),
                config_path: PathBuf::from("config.toml"),
                status: ConfigLoadStatus::Error("Could not determine config directory".to_string()),
            };
        }
    };

    debug!(path = ?config_path, "config_path_resolved");

    let (config, status) = load_or_create_config(&config_path);
    let config = apply_env_overrides(config);

    LoadedConfig {
        config,
        config_path,
        status,
    }
}

/// Parse config file contents.
pub fn parse_config(contents: &str) -> Result<Config, toml::de::Error> {
    let mut config: Config = toml::from_str(contents)?;
    config.normalize();
    Ok(config)
}

/// Save a config to the given file path.
/// Returns Ok(()) on success, or Err(String) with error message on failure.
pub fn save_config(config: &Config, config_path: &Path) -> Result<(), String> {
    let toml_content = toml::to_string_pretty(config).map_err(|e| {
        warn!(error = %e, "config_save_serialize_failed");
        format!("Failed to serialize config: {}", e)
    })?;

    fs::write(config_path, &toml_content).map_err(|e| {
        warn!(path = ?config_path, error = %e, "config_save_write_failed");
        format!("Failed to write config: {}", e)
    })?;

    info!(path = ?config_path, "config_saved");
    Ok(())
}

/// Read the config at `config_path`, writing the defaults there if it is missing.
/// Never fails: any problem yields the defaults plus an `Error` status.
fn load_or_create_config(config_path: &Path) -> (Config, ConfigLoadStatus) {
    let contents = match fs::read_to_string(config_path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return create_default_config(config_path);
        }
        Err(e) => {
            warn!(path = ?config_path, error = %e, "config_read_failed");
            let reason = if e.kind() == io::ErrorKind::PermissionDenied {
                "Permission denied reading config".to_string()
            } else {
                format!("Read error: {}", e)
            };
            return (Config::default(), ConfigLoadStatus::Error(reason));
        }
    };

    match parse_config(&contents) {
        Ok(config) => {
            info!(path = ?config_path, "config_file_loaded");
            (config, ConfigLoadStatus::Loaded)
        }
        Err(e) => {
            warn!(path = ?config_path, error = %e, "config_parse_failed");
            (
                Config::default(),
                ConfigLoadStatus::Error(format!("Malformed TOML: {}", e)),
            )
        }
    }
}

/// Write a default config file, creating its directory first.
fn create_default_config(config_path: &Path) -> (Config, ConfigLoadStatus) {
    let config = Config::default();

    let created = config_path
        .parent()
        .map_or(Ok(()), fs::create_dir_all)
        .map_err(|e| {
            warn!(path = ?config_path, error = %e, "config_dir_create_failed");
            format!("Could not create config directory: {}", e)
        })
        .and_then(|()| save_config(&config, config_path));

    match created {
        Ok(()) => {
            info!(path = ?config_path, "config_created");
            (config, ConfigLoadStatus::Created)
        }
        Err(e) => (config, ConfigLoadStatus::Error(e)),
    }
}

/// Apply environment variable overrides to config
fn apply_env_overrides(config: Config) -> Config {
    apply_overrides(config, env::var(LOG_ENV).ok())
}

fn apply_overrides(mut config: Config, log_level: Option<String>) -> Config {
    if let Some(level) = log_level.filter(|l| !l.trim().is_empty()) {
        debug!(var = LOG_ENV, level = %level, "log_level_overridden");
        config.logging.level = level;
    }
    config
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.modal.textarea_rows, DEFAULT_TEXTAREA_ROWS);
        assert!(config.todos.confirm_delete);
        assert!(config.todos.seed_demo);
    }

    #[test]
    fn test_expand_tilde() {
        let expanded = Config::expand_tilde("~/.config/test");
        assert!(!expanded.to_string_lossy().starts_with('~'));

        let no_tilde = Config::expand_tilde("/absolute/path");
        assert_eq!(no_tilde, PathBuf::from("/absolute/path"));

        let relative = Config::expand_tilde("./relative/path");
        assert_eq!(relative, PathBuf::from("./relative/path"));
    }

    #[test]
    fn test_config_deserialization() {
        let toml_str = r#"
[logging]
level = "debug"

[modal]
textarea_rows = 6

[todos]
confirm_delete = false
seed_demo = false
"#;

        let config = parse_config(toml_str).unwrap();
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.modal.textarea_rows, 6);
        assert!(!config.todos.confirm_delete);
        assert!(!config.todos.seed_demo);
    }

    #[test]
    fn test_config_partial_deserialization() {
        // Only the todos section is present; the rest fall back to defaults
        let toml_str = r#"
[todos]
confirm_delete = false
"#;

        let config = parse_config(toml_str).unwrap();
        assert!(!config.todos.confirm_delete);
        assert!(config.todos.seed_demo);
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.modal.textarea_rows, DEFAULT_TEXTAREA_ROWS);
    }

    #[test]
    fn test_unknown_keys_ignored() {
        let toml_str = r#"
[logging]
level = "warn"
unknown_key = "should be ignored"

[unknown_section]
foo = "bar"
"#;

        let config = parse_config(toml_str).unwrap();
        assert_eq!(config.logging.level, "warn");
    }

    #[test]
    fn test_zero_textarea_rows_clamped() {
        let config = parse_config("[modal]\ntextarea_rows = 0\n").unwrap();
        assert_eq!(config.modal.textarea_rows, 1);
    }

    #[test]
    fn test_wrong_type_is_error() {
        assert!(parse_config("[todos]\nconfirm_delete = \"yes\"\n").is_err());
    }

    #[test]
    fn test_log_level_override() {
        let config = apply_overrides(Config::default(), Some("trace".to_string()));
        assert_eq!(config.logging.level, "trace");

        let config = apply_overrides(Config::default(), Some("  ".to_string()));
        assert_eq!(config.logging.level, "info");

        let config = apply_overrides(Config::default(), None);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_explicit_config_path_wins() {
        let path = PathBuf::from("/tmp/custom.toml");
        assert_eq!(get_config_path(Some(path.as_path())), Some(path.clone()));
    }

    #[test]
    fn test_load_or_create_creates_default_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let (config, status) = load_or_create_config(&path);
        assert_eq!(status, ConfigLoadStatus::Created);
        assert_eq!(config, Config::default());
        assert!(path.exists());

        // Second load reads the file it just wrote
        let (config, status) = load_or_create_config(&path);
        assert_eq!(status, ConfigLoadStatus::Loaded);
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_load_malformed_falls_back_to_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[logging\nlevel = ").unwrap();

        let (config, status) = load_or_create_config(&path);
        assert_eq!(config, Config::default());
        assert!(matches!(status, ConfigLoadStatus::Error(msg) if msg.starts_with("Malformed TOML")));
    }

    #[test]
    fn test_save_then_load_roundtrip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        let mut config = Config::default();
        config.todos.confirm_delete = false;
        config.modal.textarea_rows = 8;

        save_config(&config, &path).unwrap();
        let (loaded, status) = load_or_create_config(&path);
        assert_eq!(status, ConfigLoadStatus::Loaded);
        assert_eq!(loaded, config);
    }
}
