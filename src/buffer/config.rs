//! Buffer configuration: tunables, validation and TOML loading
//!
//! The valid ranges mirror the agent's internal options: `warn_level`
//! within 1..=100 percent, `normal_level` strictly below it,
//! `tolerance_secs` up to ten minutes and `events_per_sec` up to 1000.

use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

/// Configuration errors for buffer tunables
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("configuration value out of range: {field} = {value} (allowed {min}..={max})")]
    OutOfRange {
        field: &'static str,
        value: u64,
        min: u64,
        max: u64,
    },

    #[error("normal_level ({normal_level}) must be lower than warn_level ({warn_level})")]
    LevelOrder { warn_level: u32, normal_level: u32 },

    #[error("min_capacity ({min_capacity}) must not exceed max_capacity ({max_capacity})")]
    CapacityOrder {
        min_capacity: usize,
        max_capacity: usize,
    },

    #[error("buffer capacity {capacity} exceeds max_capacity {max_capacity}")]
    CapacityExceedsMax {
        capacity: usize,
        max_capacity: usize,
    },

    #[error("failed to read configuration file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Tunables for one agent buffer instance
///
/// All fields have defaults, so a partial TOML document (or an empty one)
/// is a valid configuration source.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BufferConfig {
    /// Usable event slots; the allocated capacity is one larger because
    /// one slot stays empty to distinguish full from empty
    pub buffer_length: usize,
    /// Occupancy percentage (of usable slots) that raises the warning state
    pub warn_level: u32,
    /// Occupancy percentage at or below which usage counts as normal again
    pub normal_level: u32,
    /// Seconds a buffer may stay full before it counts as flooded
    pub tolerance_secs: u64,
    /// Maximum events forwarded to the manager per second
    pub events_per_sec: u32,
    /// Lower bound for dynamic capacity growth
    pub min_capacity: usize,
    /// Upper bound for dynamic capacity growth
    pub max_capacity: usize,
}

impl Default for BufferConfig {
    fn default() -> Self {
        Self {
            buffer_length: 5000,
            warn_level: 90,
            normal_level: 70,
            tolerance_secs: 15,
            events_per_sec: 500,
            min_capacity: 2,
            max_capacity: 65536,
        }
    }
}

impl BufferConfig {
    /// Allocated slot-array capacity (usable slots plus the reserved one)
    pub fn capacity(&self) -> usize {
        self.buffer_length + 1
    }

    /// Tolerance window before a full buffer escalates to flooded
    pub fn tolerance(&self) -> Duration {
        Duration::from_secs(self.tolerance_secs)
    }

    /// Target interval between forwarded events
    pub fn pacing_interval(&self) -> Duration {
        Duration::from_secs(1) / self.events_per_sec.max(1)
    }

    /// Check every tunable against its allowed range
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min_capacity < 2 {
            return Err(ConfigError::OutOfRange {
                field: "min_capacity",
                value: self.min_capacity as u64,
                min: 2,
                max: u64::MAX,
            });
        }
        if self.min_capacity > self.max_capacity {
            return Err(ConfigError::CapacityOrder {
                min_capacity: self.min_capacity,
                max_capacity: self.max_capacity,
            });
        }
        if self.buffer_length < 1 {
            return Err(ConfigError::OutOfRange {
                field: "buffer_length",
                value: self.buffer_length as u64,
                min: 1,
                max: (self.max_capacity - 1) as u64,
            });
        }
        if self.capacity() > self.max_capacity {
            return Err(ConfigError::CapacityExceedsMax {
                capacity: self.capacity(),
                max_capacity: self.max_capacity,
            });
        }
        if self.warn_level < 1 || self.warn_level > 100 {
            return Err(ConfigError::OutOfRange {
                field: "warn_level",
                value: self.warn_level as u64,
                min: 1,
                max: 100,
            });
        }
        if self.normal_level >= self.warn_level {
            return Err(ConfigError::LevelOrder {
                warn_level: self.warn_level,
                normal_level: self.normal_level,
            });
        }
        if self.tolerance_secs > 600 {
            return Err(ConfigError::OutOfRange {
                field: "tolerance_secs",
                value: self.tolerance_secs,
                min: 0,
                max: 600,
            });
        }
        if self.events_per_sec < 1 || self.events_per_sec > 1000 {
            return Err(ConfigError::OutOfRange {
                field: "events_per_sec",
                value: self.events_per_sec as u64,
                min: 1,
                max: 1000,
            });
        }
        Ok(())
    }

    /// Parse and validate a TOML document
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a TOML configuration file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        Self::from_toml_str(&std::fs::read_to_string(path)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config_is_valid() {
        assert!(BufferConfig::default().validate().is_ok());
    }

    #[test]
    fn test_capacity_is_one_above_usable_length() {
        let config = BufferConfig {
            buffer_length: 10,
            ..Default::default()
        };
        assert_eq!(config.capacity(), 11);
    }

    #[test]
    fn test_normal_level_must_stay_below_warn_level() {
        let config = BufferConfig {
            warn_level: 70,
            normal_level: 70,
            ..Default::default()
        };
        match config.validate() {
            Err(ConfigError::LevelOrder {
                warn_level,
                normal_level,
            }) => {
                assert_eq!(warn_level, 70);
                assert_eq!(normal_level, 70);
            }
            other => panic!("Expected LevelOrder error, got {:?}", other),
        }
    }

    #[test]
    fn test_warn_level_range() {
        for warn_level in [0u32, 101] {
            let config = BufferConfig {
                warn_level,
                normal_level: 0,
                ..Default::default()
            };
            assert!(config.validate().is_err(), "warn_level {}", warn_level);
        }
    }

    #[test]
    fn test_events_per_sec_range() {
        for events_per_sec in [0u32, 1001] {
            let config = BufferConfig {
                events_per_sec,
                ..Default::default()
            };
            assert!(
                config.validate().is_err(),
                "events_per_sec {}",
                events_per_sec
            );
        }
    }

    #[test]
    fn test_tolerance_capped_at_ten_minutes() {
        let config = BufferConfig {
            tolerance_secs: 601,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = BufferConfig {
            tolerance_secs: 600,
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_length_buffer_rejected() {
        let config = BufferConfig {
            buffer_length: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_capacity_must_fit_under_max() {
        let config = BufferConfig {
            buffer_length: 100,
            max_capacity: 50,
            ..Default::default()
        };
        match config.validate() {
            Err(ConfigError::CapacityExceedsMax { capacity, .. }) => assert_eq!(capacity, 101),
            other => panic!("Expected CapacityExceedsMax, got {:?}", other),
        }
    }

    #[test]
    fn test_min_capacity_must_not_exceed_max() {
        let config = BufferConfig {
            min_capacity: 100,
            max_capacity: 50,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::CapacityOrder { .. })
        ));
    }

    #[test]
    fn test_pacing_interval_from_rate() {
        let config = BufferConfig {
            events_per_sec: 500,
            ..Default::default()
        };
        assert_eq!(config.pacing_interval(), Duration::from_millis(2));
    }

    #[test]
    fn test_from_toml_str_with_partial_document() {
        let config = BufferConfig::from_toml_str(
            r#"
            buffer_length = 100
            warn_level = 80
            normal_level = 20
            "#,
        )
        .unwrap();

        assert_eq!(config.buffer_length, 100);
        assert_eq!(config.warn_level, 80);
        assert_eq!(config.normal_level, 20);
        // Untouched fields keep their defaults
        assert_eq!(config.events_per_sec, 500);
        assert_eq!(config.tolerance_secs, 15);
    }

    #[test]
    fn test_from_toml_str_rejects_unknown_fields() {
        let result = BufferConfig::from_toml_str("bufer_length = 100");
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_from_toml_str_rejects_invalid_values() {
        let result = BufferConfig::from_toml_str("warn_level = 101");
        assert!(matches!(result, Err(ConfigError::OutOfRange { .. })));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "buffer_length = 42").unwrap();
        writeln!(file, "events_per_sec = 10").unwrap();

        let config = BufferConfig::load(file.path()).unwrap();
        assert_eq!(config.buffer_length, 42);
        assert_eq!(config.events_per_sec, 10);
    }

    #[test]
    fn test_load_missing_file() {
        let result = BufferConfig::load(Path::new("/nonexistent/antiflood.toml"));
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }
}
