//! Explicit configuration objects for the enrichment engine.
//!
//! # Responsibility
//! - Carry user settings (location, birth date) and provider credentials.
//! - Build both from environment-like key lookups at the application edge.
//!
//! # Invariants
//! - Core logic never reads process environment; it receives these structs.
//! - Configured coordinates are always within valid degree ranges.

use crate::model::validation::{check_latitude, check_longitude, parse_date};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://api.openweathermap.org";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Required configuration is absent or unusable.
///
/// Fatal to the calculation that needed it, never to the process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigurationError {
    MissingBirthDate,
    MissingCoordinates,
    MissingApiKey,
    InvalidValue { key: String, value: String },
}

impl Display for ConfigurationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingBirthDate => write!(f, "birth date is not configured"),
            Self::MissingCoordinates => write!(f, "latitude/longitude are not configured"),
            Self::MissingApiKey => write!(f, "weather provider API key is not configured"),
            Self::InvalidValue { key, value } => {
                write!(f, "invalid configuration value for {key}: `{value}`")
            }
        }
    }
}

impl Error for ConfigurationError {}

/// Where coordinates come from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LocationMode {
    /// Coordinates are detected by the client and pushed into settings.
    #[default]
    Auto,
    /// Coordinates are typed in by the user.
    Manual,
}

impl LocationMode {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "auto" => Some(Self::Auto),
            "manual" => Some(Self::Manual),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

/// User settings consumed by calculators and the data source.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub birth_date: Option<NaiveDate>,
    pub location_mode: LocationMode,
}

impl Settings {
    pub fn coordinates(&self) -> Result<Coordinates, ConfigurationError> {
        match (self.latitude, self.longitude) {
            (Some(latitude), Some(longitude)) => Ok(Coordinates {
                latitude,
                longitude,
            }),
            _ => Err(ConfigurationError::MissingCoordinates),
        }
    }

    pub fn birth_date(&self) -> Result<NaiveDate, ConfigurationError> {
        self.birth_date.ok_or(ConfigurationError::MissingBirthDate)
    }

    pub fn from_env() -> Result<Self, ConfigurationError> {
        Self::from_env_with(|key| std::env::var(key).ok())
    }

    /// Reads settings through `get` so tests never touch the real environment.
    ///
    /// Absent keys leave the field unset; present but malformed keys fail.
    pub fn from_env_with<F>(mut get: F) -> Result<Self, ConfigurationError>
    where
        F: FnMut(&str) -> Option<String>,
    {
        let latitude = read_parsed(&mut get, "LATITUDE", |raw| {
            raw.parse::<f64>().ok().and_then(|v| check_latitude(v).ok())
        })?;
        let longitude = read_parsed(&mut get, "LONGITUDE", |raw| {
            raw.parse::<f64>().ok().and_then(|v| check_longitude(v).ok())
        })?;
        let birth_date = read_parsed(&mut get, "BIRTH_DATE", |raw| parse_date(raw).ok())?;
        let location_mode =
            read_parsed(&mut get, "LOCATION_MODE", LocationMode::parse)?.unwrap_or_default();

        Ok(Self {
            latitude,
            longitude,
            birth_date,
            location_mode,
        })
    }
}

/// What to do when a historical lookup for yesterday fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HistoricalFallback {
    /// Report the provider failure.
    #[default]
    Disabled,
    /// Approximate yesterday with current conditions.
    CurrentForYesterday,
}

impl HistoricalFallback {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "disabled" | "off" | "none" => Some(Self::Disabled),
            "current_for_yesterday" | "current" => Some(Self::CurrentForYesterday),
            _ => None,
        }
    }
}

/// Weather provider connection settings.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderConfig {
    pub api_key: String,
    pub base_url: String,
    /// Upper bound for every provider request.
    pub timeout: Duration,
    pub historical_fallback: HistoricalFallback,
}

impl ProviderConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
            historical_fallback: HistoricalFallback::Disabled,
        }
    }

    pub fn from_env() -> Result<Self, ConfigurationError> {
        Self::from_env_with(|key| std::env::var(key).ok())
    }

    pub fn from_env_with<F>(mut get: F) -> Result<Self, ConfigurationError>
    where
        F: FnMut(&str) -> Option<String>,
    {
        let api_key = get("OPENWEATHER_API_KEY")
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .ok_or(ConfigurationError::MissingApiKey)?;
        let base_url = get("OPENWEATHER_BASE_URL")
            .map(|value| value.trim().trim_end_matches('/').to_string())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let timeout = read_parsed(&mut get, "PROVIDER_TIMEOUT_SECS", |raw| {
            raw.parse::<u64>()
                .ok()
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs)
        })?
        .unwrap_or(DEFAULT_TIMEOUT);
        let historical_fallback =
            read_parsed(&mut get, "HISTORICAL_FALLBACK", HistoricalFallback::parse)?
                .unwrap_or_default();

        Ok(Self {
            api_key,
            base_url,
            timeout,
            historical_fallback,
        })
    }
}

fn read_parsed<F, T, P>(get: &mut F, key: &str, parse: P) -> Result<Option<T>, ConfigurationError>
where
    F: FnMut(&str) -> Option<String>,
    P: FnOnce(&str) -> Option<T>,
{
    match get(key) {
        None => Ok(None),
        Some(raw) if raw.trim().is_empty() => Ok(None),
        Some(raw) => parse(raw.trim())
            .map(Some)
            .ok_or_else(|| ConfigurationError::InvalidValue {
                key: key.to_string(),
                value: raw,
            }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lookup<'a>(pairs: &'a [(&'a str, &'a str)]) -> impl FnMut(&str) -> Option<String> + 'a {
        move |key| {
            pairs
                .iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| v.to_string())
        }
    }

    #[test]
    fn settings_read_all_keys() {
        let settings = Settings::from_env_with(lookup(&[
            ("LATITUDE", "52.4064"),
            ("LONGITUDE", "16.9252"),
            ("BIRTH_DATE", "1990-05-17"),
            ("LOCATION_MODE", "MANUAL"),
        ]))
        .expect("settings");
        assert_eq!(settings.location_mode, LocationMode::Manual);
        assert_eq!(settings.coordinates().unwrap().latitude, 52.4064);
        assert_eq!(
            settings.birth_date().unwrap(),
            NaiveDate::from_ymd_opt(1990, 5, 17).unwrap()
        );
    }

    #[test]
    fn settings_missing_keys_surface_as_configuration_errors() {
        let settings = Settings::from_env_with(lookup(&[])).expect("empty settings are valid");
        assert_eq!(settings.location_mode, LocationMode::Auto);
        assert_eq!(
            settings.birth_date().unwrap_err(),
            ConfigurationError::MissingBirthDate
        );
        assert_eq!(
            settings.coordinates().unwrap_err(),
            ConfigurationError::MissingCoordinates
        );
    }

    #[test]
    fn settings_reject_out_of_range_latitude() {
        let err = Settings::from_env_with(lookup(&[("LATITUDE", "123")])).unwrap_err();
        assert!(matches!(err, ConfigurationError::InvalidValue { key, .. } if key == "LATITUDE"));
    }

    #[test]
    fn provider_config_requires_api_key() {
        let err = ProviderConfig::from_env_with(lookup(&[("OPENWEATHER_API_KEY", "  ")]))
            .unwrap_err();
        assert_eq!(err, ConfigurationError::MissingApiKey);
    }

    #[test]
    fn provider_config_defaults_and_overrides() {
        let config = ProviderConfig::from_env_with(lookup(&[
            ("OPENWEATHER_API_KEY", "sekrit"),
            ("OPENWEATHER_BASE_URL", "http://localhost:8080/"),
            ("HISTORICAL_FALLBACK", "current_for_yesterday"),
        ]))
        .expect("config");
        assert_eq!(config.base_url, "http://localhost:8080");
        assert_eq!(config.timeout, DEFAULT_TIMEOUT);
        assert_eq!(
            config.historical_fallback,
            HistoricalFallback::CurrentForYesterday
        );
    }
}
