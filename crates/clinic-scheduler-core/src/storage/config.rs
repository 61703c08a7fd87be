//! TOML-based application configuration.
//!
//! Stores clinic settings including:
//! - Opening hours and slot length (the time-slot table)
//! - Booking limits (cell capacity, recurrence cap)
//! - Double-click window for the grid UI
//! - Log filter
//!
//! Configuration is stored at `<data_dir>/config.toml`.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::data_dir;
use crate::click::{ClickDisambiguator, DOUBLE_CLICK_WINDOW_MS};
use crate::error::{ConfigError, Result, ValidationError};
use crate::grid::MAX_CAPACITY;
use crate::recurrence::DEFAULT_HARD_CAP;
use crate::scheduler::BookingConfig;
use crate::slot::{SlotTable, TimeSlot};

/// Opening hours.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClinicConfig {
    #[serde(default = "default_opening_time")]
    pub opening_time: TimeSlot,
    /// First instant after the last slot.
    #[serde(default = "default_closing_time")]
    pub closing_time: TimeSlot,
    #[serde(default = "default_slot_minutes")]
    pub slot_minutes: u32,
}

/// Booking limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingSettings {
    #[serde(default = "default_capacity")]
    pub capacity: usize,
    #[serde(default = "default_duration_minutes")]
    pub default_duration_minutes: u32,
    #[serde(default = "default_recurrence_hard_cap")]
    pub recurrence_hard_cap: usize,
    #[serde(default = "default_double_click_window_ms")]
    pub double_click_window_ms: u64,
}

/// Application configuration.
///
/// Serialized to/from TOML at `<data_dir>/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub clinic: ClinicConfig,
    #[serde(default)]
    pub booking: BookingSettings,
    /// Fallback tracing filter when `RUST_LOG` is unset.
    #[serde(default = "default_log_filter")]
    pub log_filter: String,
}

// Default functions
fn default_opening_time() -> TimeSlot {
    TimeSlot::from_hm(8, 0).unwrap_or(TimeSlot::MIDNIGHT)
}
fn default_closing_time() -> TimeSlot {
    TimeSlot::from_hm(20, 0).unwrap_or(TimeSlot::MIDNIGHT)
}
fn default_slot_minutes() -> u32 {
    30
}
fn default_capacity() -> usize {
    MAX_CAPACITY
}
fn default_duration_minutes() -> u32 {
    30
}
fn default_recurrence_hard_cap() -> usize {
    DEFAULT_HARD_CAP
}
fn default_double_click_window_ms() -> u64 {
    DOUBLE_CLICK_WINDOW_MS
}
fn default_log_filter() -> String {
    "warn".into()
}

impl Default for ClinicConfig {
    fn default() -> Self {
        Self {
            opening_time: default_opening_time(),
            closing_time: default_closing_time(),
            slot_minutes: default_slot_minutes(),
        }
    }
}

impl Default for BookingSettings {
    fn default() -> Self {
        Self {
            capacity: default_capacity(),
            default_duration_minutes: default_duration_minutes(),
            recurrence_hard_cap: default_recurrence_hard_cap(),
            double_click_window_ms: default_double_click_window_ms(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            clinic: ClinicConfig::default(),
            booking: BookingSettings::default(),
            log_filter: default_log_filter(),
        }
    }
}

impl Config {
    fn get_json_value_by_path<'a>(
        root: &'a serde_json::Value,
        key: &str,
    ) -> Option<&'a serde_json::Value> {
        if key.is_empty() {
            return None;
        }

        let mut current = root;
        for part in key.split('.') {
            current = current.get(part)?;
        }
        Some(current)
    }

    fn set_json_value_by_path(
        root: &mut serde_json::Value,
        key: &str,
        value: &str,
    ) -> Result<(), ConfigError> {
        let unknown = || ConfigError::UnknownKey(key.to_string());
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };

        let mut parts = key.split('.').peekable();
        if parts.peek().is_none() || key.is_empty() {
            return Err(unknown());
        }

        let mut current = root;
        while let Some(part) = parts.next() {
            if parts.peek().is_some() {
                current = current.get_mut(part).ok_or_else(unknown)?;
                continue;
            }

            let obj = current.as_object_mut().ok_or_else(unknown)?;
            let existing = obj.get(part).ok_or_else(unknown)?;
            let new_value = match existing {
                serde_json::Value::Bool(_) => value
                    .parse::<bool>()
                    .map(serde_json::Value::Bool)
                    .map_err(|e| invalid(e.to_string()))?,
                serde_json::Value::Number(_) => value
                    .parse::<u64>()
                    .map(|n| serde_json::Value::Number(n.into()))
                    .map_err(|_| invalid(format!("cannot parse '{value}' as number")))?,
                serde_json::Value::Object(_) | serde_json::Value::Array(_) => {
                    serde_json::from_str(value).map_err(|e| invalid(e.to_string()))?
                }
                _ => serde_json::Value::String(value.into()),
            };
            obj.insert(part.to_string(), new_value);
            return Ok(());
        }

        Err(unknown())
    }

    fn path() -> Result<PathBuf> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from disk or write and return the default.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::path()?)
    }

    /// Load from an explicit path, writing defaults when it does not exist.
    pub fn load_from(path: &Path) -> Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(content) => {
                let cfg: Self = toml::from_str(&content).map_err(|e| ConfigError::LoadFailed {
                    path: path.to_path_buf(),
                    message: e.to_string(),
                })?;
                cfg.validate()?;
                Ok(cfg)
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                let cfg = Self::default();
                cfg.save_to(path)?;
                Ok(cfg)
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Persist to disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be serialized or written to disk.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        let save_failed = |message: String| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message,
        };
        let content = toml::to_string_pretty(self).map_err(|e| save_failed(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| save_failed(e.to_string()))?;
        Ok(())
    }

    /// Load from disk, returning default on error.
    /// This is a convenience method that never fails.
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_default()
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = Self::get_json_value_by_path(&json, key)?;
        match val {
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Update a value in memory by dot-separated key.
    ///
    /// The result must still deserialize and pass [`Config::validate`];
    /// otherwise `self` is left untouched.
    pub fn apply(&mut self, key: &str, value: &str) -> Result<()> {
        let mut json = serde_json::to_value(&*self)?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        let updated: Config = serde_json::from_value(json).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        updated.validate()?;
        *self = updated;
        Ok(())
    }

    /// Set a config value by key and save. Returns error if key is unknown.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown, the value cannot be parsed,
    /// or the config cannot be saved.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.apply(key, value)?;
        self.save()
    }

    /// The clinic's time-slot table.
    pub fn slot_table(&self) -> Result<SlotTable, ValidationError> {
        SlotTable::new(
            self.clinic.opening_time,
            self.clinic.closing_time,
            self.clinic.slot_minutes,
        )
    }

    pub fn booking_config(&self) -> BookingConfig {
        BookingConfig {
            capacity: self.booking.capacity,
            recurrence_hard_cap: self.booking.recurrence_hard_cap,
        }
    }

    /// Click disambiguator using the configured double-click window.
    pub fn click_disambiguator(&self) -> ClickDisambiguator {
        ClickDisambiguator::new(self.booking.double_click_window_ms)
    }

    /// Check every value the scheduler depends on.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.slot_table()?;
        let positive = |field: &str, value: u64| {
            if value == 0 {
                Err(ValidationError::InvalidValue {
                    field: field.into(),
                    message: "must be at least 1".into(),
                })
            } else {
                Ok(())
            }
        };
        if !(1..=MAX_CAPACITY).contains(&self.booking.capacity) {
            return Err(ValidationError::InvalidValue {
                field: "booking.capacity".into(),
                message: format!("must be between 1 and {MAX_CAPACITY}"),
            });
        }
        positive(
            "booking.default_duration_minutes",
            self.booking.default_duration_minutes as u64,
        )?;
        positive(
            "booking.recurrence_hard_cap",
            self.booking.recurrence_hard_cap as u64,
        )?;
        positive(
            "booking.double_click_window_ms",
            self.booking.double_click_window_ms,
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_roundtrip() {
        let cfg = Config::default();
        let toml_str = toml::to_string_pretty(&cfg).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.clinic.opening_time.to_string(), "08:00");
        assert_eq!(parsed.booking.capacity, 3);
    }

    #[test]
    fn partial_file_fills_defaults() {
        let parsed: Config = toml::from_str("[clinic]\nopening_time = \"07:00\"\n").unwrap();
        assert_eq!(parsed.clinic.opening_time.to_string(), "07:00");
        assert_eq!(parsed.clinic.closing_time.to_string(), "20:00");
        assert_eq!(parsed.booking.recurrence_hard_cap, 100);
        assert_eq!(parsed.log_filter, "warn");
    }

    #[test]
    fn get_supports_dot_path_keys() {
        let cfg = Config::default();
        assert_eq!(cfg.get("booking.capacity").as_deref(), Some("3"));
        assert_eq!(cfg.get("clinic.closing_time").as_deref(), Some("20:00"));
        assert!(cfg.get("clinic.missing_key").is_none());
        assert!(cfg.get("").is_none());
    }

    #[test]
    fn apply_updates_nested_number() {
        let mut cfg = Config::default();
        cfg.apply("booking.double_click_window_ms", "450").unwrap();
        assert_eq!(cfg.booking.double_click_window_ms, 450);
    }

    #[test]
    fn apply_updates_time_slot() {
        let mut cfg = Config::default();
        cfg.apply("clinic.opening_time", "07:00").unwrap();
        assert_eq!(cfg.slot_table().unwrap().len(), 26);
    }

    #[test]
    fn apply_rejects_unknown_key() {
        let mut cfg = Config::default();
        let err = cfg.apply("booking.rooms", "4").unwrap_err();
        assert!(matches!(
            err,
            crate::error::CoreError::Config(ConfigError::UnknownKey(_))
        ));
    }

    #[test]
    fn apply_rejects_invalid_values_without_mutating() {
        let mut cfg = Config::default();
        assert!(cfg.apply("booking.capacity", "lots").is_err());
        assert!(cfg.apply("booking.capacity", "0").is_err());
        assert!(cfg.apply("clinic.opening_time", "8am").is_err());
        assert!(cfg.apply("clinic.slot_minutes", "7").is_err());
        assert_eq!(cfg.booking.capacity, 3);
        assert_eq!(cfg.clinic.slot_minutes, 30);
    }

    #[test]
    fn load_from_writes_defaults_then_reads_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let first = Config::load_from(&path).unwrap();
        assert!(path.exists());
        assert_eq!(first.booking.capacity, 3);

        let mut changed = first.clone();
        changed.apply("booking.capacity", "2").unwrap();
        changed.save_to(&path).unwrap();

        let reloaded = Config::load_from(&path).unwrap();
        assert_eq!(reloaded.booking.capacity, 2);
        assert_eq!(reloaded.booking_config().capacity, 2);
    }

    #[test]
    fn apply_rejects_capacity_above_max() {
        let mut cfg = Config::default();
        for value in ["4", "5"] {
            let err = cfg.apply("booking.capacity", value).unwrap_err();
            assert!(matches!(
                err,
                crate::error::CoreError::Validation(ValidationError::InvalidValue { .. })
            ));
        }
        assert_eq!(cfg.booking.capacity, MAX_CAPACITY);
        cfg.apply("booking.capacity", "1").unwrap();
        assert_eq!(cfg.booking.capacity, 1);
    }

    #[test]
    fn click_disambiguator_uses_configured_window() {
        use crate::click::ClickIntent;
        use crate::slot::Cell;

        let cell = Cell::new(
            chrono::NaiveDate::from_ymd_opt(2024, 6, 10).unwrap(),
            "09:00".parse().unwrap(),
        );

        let mut cfg = Config::default();
        cfg.apply("booking.double_click_window_ms", "450").unwrap();
        let mut clicks = cfg.click_disambiguator();
        assert_eq!(clicks.window_ms(), 450);
        assert_eq!(clicks.on_pointer_down(cell, 1_000, true), ClickIntent::Create);
        assert_eq!(clicks.on_pointer_down(cell, 1_400, true), ClickIntent::Inspect);

        let mut clicks = Config::default().click_disambiguator();
        assert_eq!(clicks.on_pointer_down(cell, 1_000, true), ClickIntent::Create);
        assert_eq!(clicks.on_pointer_down(cell, 1_400, true), ClickIntent::Create);
    }

    #[test]
    fn load_from_rejects_invalid_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        for content in ["[booking]\ncapacity = 0\n", "[booking]\ncapacity = 7\n"] {
            std::fs::write(&path, content).unwrap();
            let err = Config::load_from(&path).unwrap_err();
            assert!(matches!(err, crate::error::CoreError::Validation(_)));
        }
    }

    #[test]
    fn load_from_reports_parse_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "booking = 12").unwrap();
        let err = Config::load_from(&path).unwrap_err();
        assert!(matches!(
            err,
            crate::error::CoreError::Config(ConfigError::LoadFailed { .. })
        ));
    }
}
