//! Date routing over the weather provider strategies.

use crate::calc::astronomy::daylight_hours;
use crate::clock::Clock;
use crate::config::{Coordinates, HistoricalFallback};
use crate::model::environment::{AirQuality, EnvironmentalRecord};
use crate::model::validation::{check_latitude, check_longitude, ValidationError};
use crate::provider::payload::{
    forecast_utc_offset, normalize_air_quality, normalize_current, normalize_forecast,
    normalize_historical,
};
use crate::provider::{EnvironmentSource, FetchError, ProviderError, WeatherApi};
use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use log::{info, warn};
use std::time::Instant;

/// Furthest day ahead the forecast endpoint covers.
pub const FORECAST_HORIZON_DAYS: i64 = 5;

/// Provider strategy for a target date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Current,
    Forecast,
    Historical,
}

impl Route {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Current => "current",
            Self::Forecast => "forecast",
            Self::Historical => "historical",
        }
    }
}

/// Classifies `date` relative to `today`.
///
/// # Errors
/// - `OutOfRange` when `date` is more than `FORECAST_HORIZON_DAYS` ahead.
pub fn route(date: NaiveDate, today: NaiveDate) -> Result<Route, FetchError> {
    let days_diff = date.signed_duration_since(today).num_days();
    match days_diff {
        0 => Ok(Route::Current),
        1..=FORECAST_HORIZON_DAYS => Ok(Route::Forecast),
        diff if diff > FORECAST_HORIZON_DAYS => Err(FetchError::OutOfRange { days_diff }),
        _ => Ok(Route::Historical),
    }
}

/// Solar noon at `longitude` on `date`, approximated as 12:00 UTC shifted by
/// four minutes per degree. `None` when the instant is not representable.
pub fn local_solar_noon(date: NaiveDate, longitude: f64) -> Option<DateTime<Utc>> {
    let noon = date
        .and_time(NaiveTime::from_hms_opt(12, 0, 0).unwrap_or(NaiveTime::MIN))
        .and_utc();
    noon.checked_sub_signed(Duration::seconds((longitude / 15.0 * 3600.0).round() as i64))
}

/// Solar noon plus the surrounding 24-hour air-quality window.
fn history_window(
    date: NaiveDate,
    longitude: f64,
) -> Result<(DateTime<Utc>, DateTime<Utc>, DateTime<Utc>), ValidationError> {
    let out_of_range = || ValidationError::DateOutOfRange(date);
    let noon = local_solar_noon(date, longitude).ok_or_else(out_of_range)?;
    let start = noon.checked_sub_signed(Duration::hours(12)).ok_or_else(out_of_range)?;
    let end = noon.checked_add_signed(Duration::hours(12)).ok_or_else(out_of_range)?;
    Ok((noon, start, end))
}

/// Routes fetches to current, forecast or historical provider strategies.
pub struct EnvironmentalDataSource<A, C> {
    api: A,
    clock: C,
    historical_fallback: HistoricalFallback,
}

impl<A: WeatherApi, C: Clock> EnvironmentalDataSource<A, C> {
    pub fn new(api: A, clock: C, historical_fallback: HistoricalFallback) -> Self {
        Self {
            api,
            clock,
            historical_fallback,
        }
    }

    fn fetch_current(
        &self,
        date: NaiveDate,
        at: Coordinates,
    ) -> Result<EnvironmentalRecord, ProviderError> {
        let point = self.api.current(at)?;
        let mut record = normalize_current(date, &point);
        self.merge_air_quality(&mut record, "current", || {
            self.api
                .air_quality_current(at)
                .map(|payload| normalize_air_quality(&payload, None, 0))
        });
        Ok(record)
    }

    fn fetch_forecast(
        &self,
        date: NaiveDate,
        at: Coordinates,
    ) -> Result<EnvironmentalRecord, ProviderError> {
        let payload = self.api.forecast(at)?;
        let mut record = normalize_forecast(date, &payload)?;
        let offset = forecast_utc_offset(&payload);
        self.merge_air_quality(&mut record, "forecast", || {
            self.api
                .air_quality_forecast(at)
                .map(|payload| normalize_air_quality(&payload, Some(date), offset))
        });
        Ok(record)
    }

    fn fetch_historical(
        &self,
        date: NaiveDate,
        at: Coordinates,
    ) -> Result<EnvironmentalRecord, FetchError> {
        let (noon, start, end) = history_window(date, at.longitude)?;
        let payload = self.api.historical(at, noon)?;
        let mut record = normalize_historical(date, &payload)?;
        self.merge_air_quality(&mut record, "history", || {
            self.api
                .air_quality_history(at, start, end)
                .map(|payload| normalize_air_quality(&payload, None, 0))
        });
        Ok(record)
    }

    fn fetch_routed(
        &self,
        route: Route,
        date: NaiveDate,
        days_diff: i64,
        at: Coordinates,
    ) -> Result<EnvironmentalRecord, FetchError> {
        match route {
            Route::Current => Ok(self.fetch_current(date, at)?),
            Route::Forecast => Ok(self.fetch_forecast(date, at)?),
            Route::Historical => match self.fetch_historical(date, at) {
                Err(FetchError::Provider(err))
                    if days_diff == -1
                        && self.historical_fallback == HistoricalFallback::CurrentForYesterday =>
                {
                    warn!(
                        "event=env_fetch module=provider status=fallback date={} route=historical error={}",
                        date, err
                    );
                    Ok(self.fetch_current(date, at)?)
                }
                other => other,
            },
        }
    }

    /// Best-effort air-quality merge; failures leave the fields as `None`.
    fn merge_air_quality<F>(&self, record: &mut EnvironmentalRecord, kind: &str, fetch: F)
    where
        F: FnOnce() -> Result<AirQuality, ProviderError>,
    {
        match fetch() {
            Ok(air) => record.apply_air_quality(air),
            Err(err) => {
                warn!(
                    "event=air_quality_fetch module=provider status=degraded date={} kind={} error={}",
                    record.date, kind, err
                );
                record.apply_air_quality(AirQuality::default());
            }
        }
    }
}

impl<A: WeatherApi, C: Clock> EnvironmentSource for EnvironmentalDataSource<A, C> {
    fn fetch(&self, date: NaiveDate, at: Coordinates) -> Result<EnvironmentalRecord, FetchError> {
        check_latitude(at.latitude)?;
        check_longitude(at.longitude)?;

        let today = self.clock.today();
        let days_diff = date.signed_duration_since(today).num_days();
        let route = route(date, today)?;

        let started_at = Instant::now();
        info!(
            "event=env_fetch module=provider status=start date={} route={} days_diff={}",
            date,
            route.as_str(),
            days_diff
        );

        let mut record = match self.fetch_routed(route, date, days_diff, at) {
            Ok(record) => record,
            Err(err) => {
                warn!(
                    "event=env_fetch module=provider status=error date={} route={} duration_ms={} error={}",
                    date,
                    route.as_str(),
                    started_at.elapsed().as_millis(),
                    err
                );
                return Err(err);
            }
        };
        record.daylight_hours = daylight_hours(date, at.latitude)?;

        info!(
            "event=env_fetch module=provider status=ok date={} route={} source_kind={} duration_ms={}",
            date,
            route.as_str(),
            record.source_kind.as_str(),
            started_at.elapsed().as_millis()
        );
        Ok(record)
    }
}
