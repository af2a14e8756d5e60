//! Tick rate, history length and reconciliation thresholds.

use std::{env, str::FromStr};

use crate::{
    constants::{
        DEFAULT_BUFFER_CAPACITY, DEFAULT_POSITION_THRESHOLD, DEFAULT_RESOURCE_THRESHOLD,
        DEFAULT_ROTATION_THRESHOLD_DEGREES, DEFAULT_TICK_RATE,
    },
    time,
};

/// How far a prediction may drift from the authority before it is corrected.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Thresholds {
    pub rotation_degrees: f32,
    pub position: f32,
    pub resource: f32,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            rotation_degrees: DEFAULT_ROTATION_THRESHOLD_DEGREES,
            position: DEFAULT_POSITION_THRESHOLD,
            resource: DEFAULT_RESOURCE_THRESHOLD,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NetcodeConfig {
    /// Ticks per second, shared by client and authority.
    pub tick_rate: f64,
    /// Ticks of input and state history kept per entity.
    pub buffer_capacity: usize,
    pub thresholds: Thresholds,
    pub log_level: String,
}

impl Default for NetcodeConfig {
    fn default() -> Self {
        Self {
            tick_rate: DEFAULT_TICK_RATE,
            buffer_capacity: DEFAULT_BUFFER_CAPACITY,
            thresholds: Thresholds::default(),
            log_level: "info".to_string(),
        }
    }
}

impl NetcodeConfig {
    /// Reads the process environment, after loading a `.env` file if present.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let config = Self {
            tick_rate: parse_var(&lookup, "TICK_RATE", defaults.tick_rate)?,
            buffer_capacity: parse_var(&lookup, "BUFFER_CAPACITY", defaults.buffer_capacity)?,
            thresholds: Thresholds {
                rotation_degrees: parse_var(
                    &lookup,
                    "ROTATION_THRESHOLD_DEGREES",
                    defaults.thresholds.rotation_degrees,
                )?,
                position: parse_var(&lookup, "POSITION_THRESHOLD", defaults.thresholds.position)?,
                resource: parse_var(&lookup, "RESOURCE_THRESHOLD", defaults.thresholds.resource)?,
            },
            log_level: lookup("LOG_LEVEL").unwrap_or(defaults.log_level),
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        // A tick must last at least one nanosecond and fit in a `Duration`.
        if !self.tick_rate.is_finite()
            || self.tick_rate <= 0.0
            || time::tick_duration_for(self.tick_rate).is_none()
        {
            return Err(ConfigError::OutOfRange("TICK_RATE"));
        }

        // Reconciliation looks one slot behind the authoritative tick.
        if self.buffer_capacity < 2 {
            return Err(ConfigError::OutOfRange("BUFFER_CAPACITY"));
        }

        let thresholds = [
            ("ROTATION_THRESHOLD_DEGREES", self.thresholds.rotation_degrees),
            ("POSITION_THRESHOLD", self.thresholds.position),
            ("RESOURCE_THRESHOLD", self.thresholds.resource),
        ];
        for (name, value) in thresholds {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::OutOfRange(name));
            }
        }

        Ok(())
    }

    /// Fixed simulation step in seconds.
    pub fn fixed_delta(&self) -> f32 {
        (1.0 / self.tick_rate) as f32
    }
}

fn parse_var<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match lookup(name) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { name, value: raw }),
        None => Ok(default),
    }
}

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ConfigError {
    #[error("environment variable {name} has unparseable value '{value}'")]
    Invalid { name: &'static str, value: String },

    #[error("environment variable {0} is out of range")]
    OutOfRange(&'static str),
}
