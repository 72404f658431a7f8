//! TOML-based configuration for fkscout.
//!
//! Supports a config file (fkscout.toml) with environment variable expansion.
//!
//! Example configuration:
//! ```toml
//! [warehouse]
//! backend = "worker"
//! dialect = "bigquery"
//! dataset = "my-project.sales"
//! driver = "bigquery"
//! connection_string = "${BQ_CONNECTION_STRING}"
//!
//! [warehouse.worker]
//! path = "/usr/local/bin/fkscout-worker"
//! timeout_secs = 120
//!
//! [oracle]
//! kind = "llm"
//! model = "gpt-4"
//! api_key_env = "OPENAI_API_KEY"
//!
//! [validation]
//! max_in_flight = 8
//! query_timeout_secs = 60
//! exclude_foreign_columns = ["id"]
//!
//! [acceptance]
//! threshold = 0.1
//!
//! [checkpoint]
//! dir = "files"
//! ```

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use crate::sql::{validate_dataset_name, Dialect};

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV_VAR: &str = "FKSCOUT_CONFIG";

/// Error type for settings.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("Config file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Root configuration structure.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    pub warehouse: WarehouseSettings,
    pub oracle: OracleSettings,
    pub validation: ValidationSettings,
    pub acceptance: AcceptanceSettings,
    pub checkpoint: CheckpointSettings,
}

/// Which engine runs the probe queries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WarehouseBackend {
    /// A local SQLite database file.
    #[default]
    Sqlite,
    /// An external connector process speaking NDJSON.
    Worker,
}

/// Warehouse connection.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct WarehouseSettings {
    pub backend: WarehouseBackend,

    /// SQLite database file (sqlite backend).
    pub path: Option<String>,

    /// Dataset (schema) to analyse. For SQLite this is the attached schema name.
    pub dataset: String,

    /// SQL dialect; defaults to the backend's natural one.
    pub dialect: Option<Dialect>,

    /// Connector driver name (worker backend).
    pub driver: Option<String>,

    /// Connection string (worker backend, supports ${ENV_VAR} expansion).
    pub connection_string: Option<String>,

    pub worker: WorkerSettings,
}

impl Default for WarehouseSettings {
    fn default() -> Self {
        Self {
            backend: WarehouseBackend::Sqlite,
            path: None,
            dataset: "main".to_string(),
            dialect: None,
            driver: None,
            connection_string: None,
            worker: WorkerSettings::default(),
        }
    }
}

impl WarehouseSettings {
    pub fn resolved_dialect(&self) -> Dialect {
        self.dialect.unwrap_or(match self.backend {
            WarehouseBackend::Sqlite => Dialect::Sqlite,
            WarehouseBackend::Worker => Dialect::BigQuery,
        })
    }

    /// Get the connection string with environment variables expanded.
    pub fn resolved_connection_string(&self) -> Result<String, SettingsError> {
        let raw = self.connection_string.as_deref().ok_or_else(|| {
            SettingsError::InvalidConfig("warehouse.connection_string is required".into())
        })?;
        expand_env_vars(raw)
    }

    /// Get the SQLite path with environment variables expanded.
    pub fn resolved_path(&self) -> Result<PathBuf, SettingsError> {
        let raw = self
            .path
            .as_deref()
            .ok_or_else(|| SettingsError::InvalidConfig("warehouse.path is required".into()))?;
        Ok(PathBuf::from(expand_env_vars(raw)?))
    }
}

/// Connector process configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct WorkerSettings {
    /// Path to the connector binary.
    pub path: Option<String>,

    /// Extra command-line arguments.
    pub args: Vec<String>,

    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for WorkerSettings {
    fn default() -> Self {
        Self {
            path: None,
            args: Vec::new(),
            timeout_secs: 60,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OracleKind {
    /// Hosted language model.
    #[default]
    Llm,
    /// Offline naming heuristics.
    Naming,
}

/// Candidate oracle configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct OracleSettings {
    pub kind: OracleKind,
    pub model: String,
    pub base_url: String,

    /// Variable holding the API key.
    pub api_key_env: String,

    /// Inline API key (supports ${ENV_VAR} expansion); overrides `api_key_env`.
    pub api_key: Option<String>,

    pub max_tokens: u32,
    pub timeout_secs: u64,
}

impl Default for OracleSettings {
    fn default() -> Self {
        Self {
            kind: OracleKind::Llm,
            model: "gpt-4".to_string(),
            base_url: "https://api.openai.com/v1".to_string(),
            api_key_env: "OPENAI_API_KEY".to_string(),
            api_key: None,
            max_tokens: 2048,
            timeout_secs: 120,
        }
    }
}

/// Key validator configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ValidationSettings {
    /// Candidates checked concurrently (clamped to 1..=64).
    pub max_in_flight: usize,

    pub query_timeout_secs: u64,

    /// Child column names never treated as foreign keys.
    pub exclude_foreign_columns: Vec<String>,
}

impl Default for ValidationSettings {
    fn default() -> Self {
        Self {
            max_in_flight: 8,
            query_timeout_secs: 60,
            exclude_foreign_columns: Vec::new(),
        }
    }
}

/// Acceptance filter configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AcceptanceSettings {
    /// Match ratio a relationship must exceed (0.0 to 1.0).
    pub threshold: f64,

    pub require_unique_parent: bool,
}

impl Default for AcceptanceSettings {
    fn default() -> Self {
        Self {
            threshold: 0.1,
            require_unique_parent: false,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CheckpointSettings {
    pub dir: PathBuf,
}

impl Default for CheckpointSettings {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("files"),
        }
    }
}

impl Settings {
    /// Load settings from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(SettingsError::FileNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        let settings: Settings = toml::from_str(&content)?;
        Ok(settings)
    }

    /// Load settings from the default config file locations.
    ///
    /// Searches in order:
    /// 1. Environment variable `FKSCOUT_CONFIG`
    /// 2. `./fkscout.toml`
    /// 3. `~/.config/fkscout/config.toml`
    pub fn load() -> Result<Self, SettingsError> {
        if let Ok(path) = env::var(CONFIG_ENV_VAR) {
            return Self::from_file(&path);
        }

        let local_config = PathBuf::from("fkscout.toml");
        if local_config.exists() {
            return Self::from_file(&local_config);
        }

        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("fkscout").join("config.toml");
            if user_config.exists() {
                return Self::from_file(&user_config);
            }
        }

        Ok(Settings::default())
    }

    /// Check values that serde cannot.
    pub fn validate(&self) -> Result<(), SettingsError> {
        let threshold = self.acceptance.threshold;
        if !(0.0..=1.0).contains(&threshold) {
            return Err(SettingsError::InvalidConfig(format!(
                "acceptance.threshold must lie in [0, 1], got {threshold}"
            )));
        }
        if self.validation.max_in_flight == 0 {
            return Err(SettingsError::InvalidConfig(
                "validation.max_in_flight must be at least 1".into(),
            ));
        }
        if self.validation.query_timeout_secs == 0 {
            return Err(SettingsError::InvalidConfig(
                "validation.query_timeout_secs must be at least 1".into(),
            ));
        }
        validate_dataset_name(&self.warehouse.dataset)
            .map_err(|e| SettingsError::InvalidConfig(e.to_string()))?;

        match self.warehouse.backend {
            WarehouseBackend::Sqlite => {
                if self.warehouse.path.is_none() {
                    return Err(SettingsError::InvalidConfig(
                        "warehouse.path is required for the sqlite backend".into(),
                    ));
                }
            }
            WarehouseBackend::Worker => {
                for (name, value) in [
                    ("warehouse.worker.path", &self.warehouse.worker.path),
                    ("warehouse.driver", &self.warehouse.driver),
                    ("warehouse.connection_string", &self.warehouse.connection_string),
                ] {
                    if value.is_none() {
                        return Err(SettingsError::InvalidConfig(format!(
                            "{name} is required for the worker backend"
                        )));
                    }
                }
            }
        }
        Ok(())
    }
}

/// Expand environment variables in a string.
///
/// Supports `${VAR}` and `$VAR` syntax. A `$` not followed by a name is kept.
pub fn expand_env_vars(s: &str) -> Result<String, SettingsError> {
    let mut result = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '$' {
            result.push(c);
            continue;
        }

        let var_name: String = if chars.next_if_eq(&'{').is_some() {
            chars.by_ref().take_while(|&ch| ch != '}').collect()
        } else {
            std::iter::from_fn(|| chars.next_if(|ch| ch.is_alphanumeric() || *ch == '_')).collect()
        };

        if var_name.is_empty() {
            result.push('$');
            continue;
        }
        let value = env::var(&var_name).map_err(|_| SettingsError::MissingEnvVar(var_name))?;
        result.push_str(&value);
    }

    Ok(result)
}
