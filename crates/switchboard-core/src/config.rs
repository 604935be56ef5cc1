//! Configuration file loading.
//!
//! Credentials arrive as an ordered list of (provider, secret) pairs in a
//! JSON file, loaded once at process start. There is no dynamic reload.

use std::fs;
use std::path::Path;

use switchboard_types::{ConfigError, OrchestratorConfig};

/// Load and validate orchestrator configuration from a JSON file.
pub fn load_config(path: &Path) -> Result<OrchestratorConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(|e| ConfigError::Io {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;

    let config: OrchestratorConfig =
        serde_json::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;

    config.validate()?;
    Ok(config)
}

/// Save configuration atomically (write to a temp file, then rename).
pub fn save_config(path: &Path, config: &OrchestratorConfig) -> Result<(), ConfigError> {
    let content = serde_json::to_string_pretty(config).map_err(|e| ConfigError::Parse {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;

    let temp_path = path.with_extension("json.tmp");
    let io_err = |e: std::io::Error| ConfigError::Io {
        path: path.display().to_string(),
        message: e.to_string(),
    };

    fs::write(&temp_path, content).map_err(io_err)?;
    fs::rename(&temp_path, path).map_err(io_err)
}
