//! Display defaults for rendering timestamps and localized responses.
//!
//! Values are carried explicitly into the rendering layer. Nothing here touches
//! the process-wide `TZ`.

use crate::{env_or_default, ConfigError, FromEnv};
use chrono_tz::Tz;

pub const DEFAULT_TIME_ZONE: Tz = chrono_tz::Europe::Madrid;
pub const DEFAULT_LOCALE: &str = "es-ES";

/// Time zone and locale used when a caller does not ask for anything else.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DisplayConfig {
    pub time_zone: Tz,
    pub locale: String,
}

impl DisplayConfig {
    pub fn new(time_zone: Tz, locale: impl Into<String>) -> Self {
        Self {
            time_zone,
            locale: locale.into(),
        }
    }

    /// Resolve the zone for a single response.
    ///
    /// `requested` is an IANA name such as `America/New_York`; `None` keeps the default.
    pub fn resolve_zone(&self, requested: Option<&str>) -> Result<Tz, String> {
        match requested.map(str::trim).filter(|s| !s.is_empty()) {
            Some(name) => name
                .parse::<Tz>()
                .map_err(|_| format!("Unknown time zone: {}", name)),
            None => Ok(self.time_zone),
        }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self::new(DEFAULT_TIME_ZONE, DEFAULT_LOCALE)
    }
}

impl FromEnv for DisplayConfig {
    /// Reads from environment variables:
    /// - DEFAULT_TIME_ZONE: IANA zone name, defaults to Europe/Madrid
    /// - DEFAULT_LOCALE: BCP 47 tag, defaults to es-ES
    fn from_env() -> Result<Self, ConfigError> {
        let zone_name = env_or_default("DEFAULT_TIME_ZONE", DEFAULT_TIME_ZONE.name());
        let time_zone = zone_name
            .parse::<Tz>()
            .map_err(|e| ConfigError::ParseError {
                key: "DEFAULT_TIME_ZONE".to_string(),
                details: e.to_string(),
            })?;

        let locale = env_or_default("DEFAULT_LOCALE", DEFAULT_LOCALE);
        if locale.trim().is_empty() || !locale.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
            return Err(ConfigError::ParseError {
                key: "DEFAULT_LOCALE".to_string(),
                details: format!("'{}' is not a language tag", locale),
            });
        }

        Ok(Self { time_zone, locale })
    }
}
