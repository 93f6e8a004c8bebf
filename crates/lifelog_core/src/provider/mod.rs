//! Environmental data sourcing.
//!
//! # Responsibility
//! - Route a target date to the current/forecast/historical strategy.
//! - Normalize provider payloads into one `EnvironmentalRecord` shape.
//! - Keep provider transport behind the `WeatherApi` seam.
//!
//! # Invariants
//! - Air-quality failures never fail a weather fetch.
//! - Dates more than `FORECAST_HORIZON_DAYS` ahead are rejected before any I/O.

pub mod openweather;
pub mod payload;
pub mod source;

use crate::config::{ConfigurationError, Coordinates};
use crate::model::environment::EnvironmentalRecord;
use crate::model::validation::ValidationError;
use chrono::{DateTime, NaiveDate, Utc};
use payload::{AirQualityPayload, ConditionsPoint, ForecastPayload, HistoricalPayload};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub use openweather::OpenWeatherClient;
pub use source::{route, EnvironmentalDataSource, Route, FORECAST_HORIZON_DAYS};

/// Failure talking to, or understanding, the weather provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderError {
    /// Connection, DNS, TLS or timeout failure.
    Transport(String),
    /// Non-2xx response.
    Status { code: u16, body: String },
    /// Response body did not match the expected schema or lacked data.
    Payload(String),
}

impl ProviderError {
    /// Whether the provider refused access (bad key or insufficient plan).
    pub fn is_access_denied(&self) -> bool {
        matches!(self, Self::Status { code: 401 | 403, .. })
    }
}

impl Display for ProviderError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Transport(message) => write!(f, "provider transport error: {message}"),
            Self::Status { code, body } => write!(f, "provider returned HTTP {code}: {body}"),
            Self::Payload(message) => write!(f, "malformed provider payload: {message}"),
        }
    }
}

impl Error for ProviderError {}

/// Why an environmental record could not be produced for a date.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchError {
    Configuration(ConfigurationError),
    Validation(ValidationError),
    Provider(ProviderError),
    /// Target date lies beyond the forecast horizon.
    OutOfRange { days_diff: i64 },
}

impl Display for FetchError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Configuration(err) => write!(f, "{err}"),
            Self::Validation(err) => write!(f, "{err}"),
            Self::Provider(err) => write!(f, "{err}"),
            Self::OutOfRange { days_diff } => write!(
                f,
                "date is {days_diff} days ahead; forecast horizon is {FORECAST_HORIZON_DAYS} days"
            ),
        }
    }
}

impl Error for FetchError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Configuration(err) => Some(err),
            Self::Validation(err) => Some(err),
            Self::Provider(err) => Some(err),
            Self::OutOfRange { .. } => None,
        }
    }
}

impl From<ConfigurationError> for FetchError {
    fn from(value: ConfigurationError) -> Self {
        Self::Configuration(value)
    }
}

impl From<ValidationError> for FetchError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<ProviderError> for FetchError {
    fn from(value: ProviderError) -> Self {
        Self::Provider(value)
    }
}

/// Raw endpoint families of a weather/air-quality provider.
pub trait WeatherApi {
    fn current(&self, at: Coordinates) -> Result<ConditionsPoint, ProviderError>;
    /// Multi-point forecast covering the next few days.
    fn forecast(&self, at: Coordinates) -> Result<ForecastPayload, ProviderError>;
    /// Conditions at one past instant.
    fn historical(
        &self,
        at: Coordinates,
        instant: DateTime<Utc>,
    ) -> Result<HistoricalPayload, ProviderError>;
    fn air_quality_current(&self, at: Coordinates) -> Result<AirQualityPayload, ProviderError>;
    fn air_quality_forecast(&self, at: Coordinates) -> Result<AirQualityPayload, ProviderError>;
    fn air_quality_history(
        &self,
        at: Coordinates,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<AirQualityPayload, ProviderError>;
}

impl<A: WeatherApi + ?Sized> WeatherApi for &A {
    fn current(&self, at: Coordinates) -> Result<ConditionsPoint, ProviderError> {
        (**self).current(at)
    }

    fn forecast(&self, at: Coordinates) -> Result<ForecastPayload, ProviderError> {
        (**self).forecast(at)
    }

    fn historical(
        &self,
        at: Coordinates,
        instant: DateTime<Utc>,
    ) -> Result<HistoricalPayload, ProviderError> {
        (**self).historical(at, instant)
    }

    fn air_quality_current(&self, at: Coordinates) -> Result<AirQualityPayload, ProviderError> {
        (**self).air_quality_current(at)
    }

    fn air_quality_forecast(&self, at: Coordinates) -> Result<AirQualityPayload, ProviderError> {
        (**self).air_quality_forecast(at)
    }

    fn air_quality_history(
        &self,
        at: Coordinates,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<AirQualityPayload, ProviderError> {
        (**self).air_quality_history(at, start, end)
    }
}

/// Produces one normalized environmental record for a date.
///
/// This is the seam the environmental cache fills through.
pub trait EnvironmentSource {
    fn fetch(
        &self,
        date: NaiveDate,
        at: Coordinates,
    ) -> Result<EnvironmentalRecord, FetchError>;
}
