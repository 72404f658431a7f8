//! Configuration for fkscout.
//!
//! Handles the TOML settings file and environment variable expansion.

mod settings;

pub use settings::{
    expand_env_vars, AcceptanceSettings, CheckpointSettings, OracleKind, OracleSettings, Settings,
    SettingsError, ValidationSettings, WarehouseBackend, WarehouseSettings, WorkerSettings,
    CONFIG_ENV_VAR,
};
