use std::path::PathBuf;

use thiserror::Error;

/// Application-level constants
pub const APP_NAME: &str = "PharmaGuard";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Environment variables read at startup.
pub mod env_keys {
    pub const BACKEND: &str = "PHARMAGUARD_BACKEND";
    pub const MODEL: &str = "PHARMAGUARD_MODEL";
    pub const BASE_URL: &str = "PHARMAGUARD_BASE_URL";
    pub const TIMEOUT_SECS: &str = "PHARMAGUARD_TIMEOUT_SECS";
    pub const GEMINI_API_KEY: &str = "GEMINI_API_KEY";
    pub const REPORTS_DIR: &str = "PHARMAGUARD_REPORTS_DIR";
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("API key missing: set {0}")]
    MissingApiKey(&'static str),

    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },

    #[error("Cannot determine home directory")]
    NoHomeDir,

    #[error("Could not read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Could not parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("HTTP client could not be created: {0}")]
    HttpClient(String),
}

/// Log filter used when `RUST_LOG` is unset.
pub fn default_log_filter() -> &'static str {
    if cfg!(debug_assertions) {
        "pharmaguard_lib=debug,pharmaguard=debug,info"
    } else {
        "pharmaguard_lib=info,pharmaguard=info,warn"
    }
}

/// Get the application data directory (~/PharmaGuard/)
pub fn app_data_dir() -> Result<PathBuf, ConfigError> {
    let home = dirs::home_dir().ok_or(ConfigError::NoHomeDir)?;
    Ok(home.join(APP_NAME))
}

/// Directory report exports land in unless overridden.
pub fn reports_dir() -> Result<PathBuf, ConfigError> {
    if let Ok(dir) = std::env::var(env_keys::REPORTS_DIR) {
        return Ok(PathBuf::from(dir));
    }
    Ok(app_data_dir()?.join("reports"))
}
