use chrono::NaiveTime;
use chrono_tz::Tz;
use serde::Deserialize;

use crate::engine::BusinessHoursPolicy;
use crate::limits::{DEFAULT_LOOKAHEAD_MINUTES, MAX_LOOKAHEAD_MINUTES};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    Invalid { key: &'static str, value: String },
    Parse(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Invalid { key, value } => write!(f, "invalid value for {key}: {value:?}"),
            ConfigError::Parse(msg) => write!(f, "config parse error: {msg}"),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Organisation-level settings, loaded once at startup.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    pub business_zone: Tz,
    pub business_start: NaiveTime,
    pub business_end: NaiveTime,
    pub lookahead_minutes: i64,
    /// Reject submitted windows outside business hours. When off, business
    /// hours only shape the selectable time values.
    pub enforce_business_hours: bool,
    pub metrics_port: Option<u16>,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            business_zone: chrono_tz::America::New_York,
            business_start: NaiveTime::from_hms_opt(8, 0, 0).unwrap_or_default(),
            business_end: NaiveTime::from_hms_opt(17, 0, 0).unwrap_or_default(),
            lookahead_minutes: DEFAULT_LOOKAHEAD_MINUTES,
            enforce_business_hours: true,
            metrics_port: None,
        }
    }
}

impl SchedulerConfig {
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(text).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.check()
    }

    /// Defaults overridden by `RENDEZVOUS_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        if let Some(v) = lookup("RENDEZVOUS_BUSINESS_ZONE") {
            config.business_zone = v.parse().map_err(|_| ConfigError::Invalid {
                key: "RENDEZVOUS_BUSINESS_ZONE",
                value: v.clone(),
            })?;
        }
        if let Some(v) = lookup("RENDEZVOUS_BUSINESS_START") {
            config.business_start = parse_time("RENDEZVOUS_BUSINESS_START", &v)?;
        }
        if let Some(v) = lookup("RENDEZVOUS_BUSINESS_END") {
            config.business_end = parse_time("RENDEZVOUS_BUSINESS_END", &v)?;
        }
        if let Some(v) = lookup("RENDEZVOUS_LOOKAHEAD_MINUTES") {
            config.lookahead_minutes = v.parse().map_err(|_| ConfigError::Invalid {
                key: "RENDEZVOUS_LOOKAHEAD_MINUTES",
                value: v.clone(),
            })?;
        }
        if let Some(v) = lookup("RENDEZVOUS_ENFORCE_BUSINESS_HOURS") {
            config.enforce_business_hours = v.parse().map_err(|_| ConfigError::Invalid {
                key: "RENDEZVOUS_ENFORCE_BUSINESS_HOURS",
                value: v.clone(),
            })?;
        }
        config.metrics_port = lookup("RENDEZVOUS_METRICS_PORT").and_then(|s| s.parse().ok());
        config.check()
    }

    fn check(self) -> Result<Self, ConfigError> {
        if self.business_start >= self.business_end {
            return Err(ConfigError::Invalid {
                key: "business_end",
                value: self.business_end.to_string(),
            });
        }
        if !(0..=MAX_LOOKAHEAD_MINUTES).contains(&self.lookahead_minutes) {
            return Err(ConfigError::Invalid {
                key: "lookahead_minutes",
                value: self.lookahead_minutes.to_string(),
            });
        }
        Ok(self)
    }

    pub fn policy(&self) -> BusinessHoursPolicy {
        BusinessHoursPolicy::new(self.business_zone, self.business_start, self.business_end)
    }
}

fn parse_time(key: &'static str, value: &str) -> Result<NaiveTime, ConfigError> {
    NaiveTime::parse_from_str(value, "%H:%M").map_err(|_| ConfigError::Invalid {
        key,
        value: value.to_string(),
    })
}
