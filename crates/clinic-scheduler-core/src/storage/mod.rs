mod config;
pub mod database;

pub use config::{BookingSettings, ClinicConfig, Config};
pub use database::SessionStore;

use std::path::PathBuf;

use crate::error::{ConfigError, Result};

/// Returns the directory holding `config.toml` and `sessions.db`.
///
/// `CLINIC_SCHEDULER_DATA_DIR` wins when set. Otherwise
/// `~/.config/clinic-scheduler[-dev]/`, with `CLINIC_SCHEDULER_ENV=dev`
/// selecting the development directory.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf> {
    let dir = match std::env::var_os("CLINIC_SCHEDULER_DATA_DIR") {
        Some(dir) if !dir.is_empty() => PathBuf::from(dir),
        _ => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");

            let env = std::env::var("CLINIC_SCHEDULER_ENV")
                .unwrap_or_else(|_| "production".to_string());

            if env == "dev" {
                base_dir.join("clinic-scheduler-dev")
            } else {
                base_dir.join("clinic-scheduler")
            }
        }
    };

    std::fs::create_dir_all(&dir)
        .map_err(|e| ConfigError::DataDir(format!("{}: {e}", dir.display())))?;
    Ok(dir)
}
