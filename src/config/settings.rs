//! Configuration settings for the scheduling engine.

use crate::error::{ConfigError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleConfig {
    pub grid: GridConfig,
    pub travel: TravelConfig,
    /// Duration assumed for jobs with a missing or non-positive duration.
    pub default_duration_minutes: i64,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            grid: GridConfig::default(),
            travel: TravelConfig::default(),
            default_duration_minutes: 60,
        }
    }
}

impl ScheduleConfig {
    /// Load configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(ConfigError::ReadFile)?;
        Self::from_toml(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: ScheduleConfig = toml::from_str(content).map_err(ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from default locations or use defaults.
    pub fn load() -> Result<Self> {
        let config_paths = [
            PathBuf::from("shutterplan.toml"),
            dirs::config_dir()
                .map(|p| p.join("shutterplan/config.toml"))
                .unwrap_or_default(),
        ];

        for path in &config_paths {
            if path.exists() {
                tracing::info!("Loading config from: {}", path.display());
                return Self::from_file(path);
            }
        }

        tracing::info!("No config file found, using defaults");
        Ok(ScheduleConfig::default())
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.grid.slot_minutes == 0 || 60 % self.grid.slot_minutes != 0 {
            return Err(
                ConfigError::Invalid("grid.slot_minutes must divide 60".to_string()).into(),
            );
        }
        if self.grid.day_start_hour >= self.grid.day_end_hour || self.grid.day_end_hour > 24 {
            return Err(ConfigError::Invalid(
                "grid.day_start_hour must be before grid.day_end_hour (max 24)".to_string(),
            )
            .into());
        }
        if self.grid.month_overflow_limit == 0 {
            return Err(
                ConfigError::Invalid("grid.month_overflow_limit must be > 0".to_string()).into(),
            );
        }
        if self.travel.minutes_per_km <= 0.0 {
            return Err(
                ConfigError::Invalid("travel.minutes_per_km must be > 0".to_string()).into(),
            );
        }
        if self.default_duration_minutes <= 0 {
            return Err(
                ConfigError::Invalid("default_duration_minutes must be > 0".to_string()).into(),
            );
        }
        Ok(())
    }
}

/// Time-grid layout configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    /// Slot granularity for week/day views, in minutes.
    pub slot_minutes: u32,
    /// First hour shown in week/day views (inclusive).
    pub day_start_hour: u32,
    /// Last hour shown in week/day views (exclusive).
    pub day_end_hour: u32,
    /// Maximum events rendered per month-view day cell before collapsing
    /// the remainder into a "+N more" indicator.
    pub month_overflow_limit: usize,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            slot_minutes: 30,
            day_start_hour: 7,
            day_end_hour: 20,
            month_overflow_limit: 3,
        }
    }
}

/// Travel-time heuristic configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TravelConfig {
    /// Minutes of driving per straight-line kilometre. A placeholder
    /// heuristic, not real routing.
    pub minutes_per_km: f64,
}

impl Default for TravelConfig {
    fn default() -> Self {
        Self {
            minutes_per_km: 2.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = ScheduleConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.grid.slot_minutes, 30);
        assert_eq!(config.default_duration_minutes, 60);
    }

    #[test]
    fn test_parse_partial_toml() {
        let config = ScheduleConfig::from_toml(
            r#"
            [grid]
            slot_minutes = 15
            month_overflow_limit = 5
            "#,
        )
        .unwrap();
        assert_eq!(config.grid.slot_minutes, 15);
        assert_eq!(config.grid.month_overflow_limit, 5);
        // Untouched sections keep their defaults.
        assert_eq!(config.grid.day_start_hour, 7);
        assert!((config.travel.minutes_per_km - 2.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_rejects_bad_slot_size() {
        let result = ScheduleConfig::from_toml("[grid]\nslot_minutes = 25\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_rejects_inverted_day_window() {
        let result = ScheduleConfig::from_toml("[grid]\nday_start_hour = 20\nday_end_hour = 8\n");
        assert!(result.is_err());
    }
}
