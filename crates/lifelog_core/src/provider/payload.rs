//! Provider payload shapes and per-kind normalization adapters.
//!
//! Every provider field is optional on the wire. Normalization rules:
//! - temperatures, humidity, pressure, precipitation, wind and clouds: `0.0`
//!   when absent;
//! - condition labels: `None` when absent;
//! - air-quality fields: `None` when absent;
//! - `daylight_hours` is left at `0.0` here and filled in by the data source.

use crate::model::environment::{AirQuality, EnvironmentalRecord, SourceKind};
use crate::provider::ProviderError;
use chrono::{DateTime, NaiveDate};
use serde::Deserialize;

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct MainBlock {
    pub temp: Option<f64>,
    pub temp_min: Option<f64>,
    pub temp_max: Option<f64>,
    pub humidity: Option<f64>,
    pub pressure: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ConditionBlock {
    pub main: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct WindBlock {
    pub speed: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct CloudsBlock {
    pub all: Option<f64>,
}

/// Rain or snow volume over the last hour or three hours.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct PrecipitationBlock {
    #[serde(rename = "1h")]
    pub one_hour: Option<f64>,
    #[serde(rename = "3h")]
    pub three_hours: Option<f64>,
}

impl PrecipitationBlock {
    pub fn amount(&self) -> f64 {
        self.one_hour.or(self.three_hours).unwrap_or(0.0)
    }
}

/// Live conditions, also the shape of one forecast point.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ConditionsPoint {
    /// Unix seconds.
    pub dt: Option<i64>,
    pub main: Option<MainBlock>,
    #[serde(default)]
    pub weather: Vec<ConditionBlock>,
    pub wind: Option<WindBlock>,
    pub clouds: Option<CloudsBlock>,
    pub rain: Option<PrecipitationBlock>,
    pub snow: Option<PrecipitationBlock>,
}

impl ConditionsPoint {
    fn main_field(&self, pick: impl Fn(&MainBlock) -> Option<f64>) -> Option<f64> {
        self.main.as_ref().and_then(pick)
    }

    fn condition(&self) -> Option<&ConditionBlock> {
        self.weather.first()
    }

    fn precipitation(&self) -> f64 {
        total_precipitation(self.rain.as_ref(), self.snow.as_ref())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct CityBlock {
    /// Offset from UTC in seconds.
    pub timezone: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ForecastPayload {
    #[serde(default)]
    pub list: Vec<ConditionsPoint>,
    pub city: Option<CityBlock>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct HistoricalPoint {
    pub dt: Option<i64>,
    pub temp: Option<f64>,
    pub humidity: Option<f64>,
    pub pressure: Option<f64>,
    pub wind_speed: Option<f64>,
    pub clouds: Option<f64>,
    #[serde(default)]
    pub weather: Vec<ConditionBlock>,
    pub rain: Option<PrecipitationBlock>,
    pub snow: Option<PrecipitationBlock>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct HistoricalPayload {
    pub timezone_offset: Option<i64>,
    #[serde(default)]
    pub data: Vec<HistoricalPoint>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct AqiBlock {
    pub aqi: Option<u8>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Components {
    pub co: Option<f64>,
    pub no2: Option<f64>,
    pub o3: Option<f64>,
    pub pm2_5: Option<f64>,
    pub pm10: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct AirQualityPoint {
    pub dt: Option<i64>,
    pub main: Option<AqiBlock>,
    pub components: Option<Components>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct AirQualityPayload {
    #[serde(default)]
    pub list: Vec<AirQualityPoint>,
}

/// Adapter for the live-conditions endpoint.
pub fn normalize_current(date: NaiveDate, point: &ConditionsPoint) -> EnvironmentalRecord {
    let mut record = EnvironmentalRecord::empty(date, SourceKind::Current);
    record.temp_min = point.main_field(|m| m.temp_min).unwrap_or(0.0);
    record.temp_max = point.main_field(|m| m.temp_max).unwrap_or(0.0);
    record.temp_current = point.main_field(|m| m.temp).unwrap_or(0.0);
    record.humidity = point.main_field(|m| m.humidity).unwrap_or(0.0);
    record.pressure = point.main_field(|m| m.pressure).unwrap_or(0.0);
    record.precipitation = point.precipitation();
    record.wind_speed = point.wind.as_ref().and_then(|w| w.speed).unwrap_or(0.0);
    record.cloud_cover = point.clouds.as_ref().and_then(|c| c.all).unwrap_or(0.0);
    if let Some(condition) = point.condition() {
        record.condition_main = condition.main.clone();
        record.condition_description = condition.description.clone();
    }
    record
}

/// Offset of the forecast city from UTC in seconds; 0 when absent.
pub fn forecast_utc_offset(payload: &ForecastPayload) -> i64 {
    payload.city.as_ref().and_then(|c| c.timezone).unwrap_or(0)
}

/// Adapter for the multi-point forecast endpoint.
///
/// Aggregates the points falling on `date` in the provider's city timezone
/// (UTC when the payload carries none).
///
/// # Errors
/// - `ProviderError::Payload` when no point falls on `date`.
pub fn normalize_forecast(
    date: NaiveDate,
    payload: &ForecastPayload,
) -> Result<EnvironmentalRecord, ProviderError> {
    let offset = forecast_utc_offset(payload);
    let points: Vec<&ConditionsPoint> = payload
        .list
        .iter()
        .filter(|point| point.dt.and_then(|dt| local_date(dt, offset)) == Some(date))
        .collect();

    if points.is_empty() {
        return Err(ProviderError::Payload(format!(
            "forecast has no points for {date}"
        )));
    }

    let temps: Vec<f64> = points
        .iter()
        .filter_map(|p| p.main_field(|m| m.temp))
        .collect();

    let mut record = EnvironmentalRecord::empty(date, SourceKind::Forecast);
    record.temp_min = temps.iter().copied().reduce(f64::min).unwrap_or(0.0);
    record.temp_max = temps.iter().copied().reduce(f64::max).unwrap_or(0.0);
    record.temp_current = mean(temps.iter().copied()).unwrap_or(0.0);
    record.humidity = mean(points.iter().filter_map(|p| p.main_field(|m| m.humidity))).unwrap_or(0.0);
    record.pressure = mean(points.iter().filter_map(|p| p.main_field(|m| m.pressure))).unwrap_or(0.0);
    record.precipitation = points
        .iter()
        .map(|p| p.precipitation())
        .fold(0.0, f64::max);
    record.wind_speed =
        mean(points.iter().filter_map(|p| p.wind.as_ref().and_then(|w| w.speed))).unwrap_or(0.0);
    record.cloud_cover =
        mean(points.iter().filter_map(|p| p.clouds.as_ref().and_then(|c| c.all))).unwrap_or(0.0);

    if let Some(condition) = dominant_condition(points.iter().filter_map(|p| p.condition())) {
        record.condition_main = condition.main.clone();
        record.condition_description = condition.description.clone();
    }
    Ok(record)
}

/// Adapter for the point-in-time history endpoint.
///
/// A single observation gives no daily range, so min, max and current all
/// carry the observed temperature.
///
/// # Errors
/// - `ProviderError::Payload` when the payload holds no observation.
pub fn normalize_historical(
    date: NaiveDate,
    payload: &HistoricalPayload,
) -> Result<EnvironmentalRecord, ProviderError> {
    let point = payload.data.first().ok_or_else(|| {
        ProviderError::Payload(format!("history has no observation for {date}"))
    })?;

    let temp = point.temp.unwrap_or(0.0);
    let mut record = EnvironmentalRecord::empty(date, SourceKind::Historical);
    record.temp_min = temp;
    record.temp_max = temp;
    record.temp_current = temp;
    record.humidity = point.humidity.unwrap_or(0.0);
    record.pressure = point.pressure.unwrap_or(0.0);
    record.precipitation = total_precipitation(point.rain.as_ref(), point.snow.as_ref());
    record.wind_speed = point.wind_speed.unwrap_or(0.0);
    record.cloud_cover = point.clouds.unwrap_or(0.0);
    if let Some(condition) = point.weather.first() {
        record.condition_main = condition.main.clone();
        record.condition_description = condition.description.clone();
    }
    Ok(record)
}

/// Adapter for all air-quality endpoints.
///
/// With `day` set, only points whose local date (UTC shifted by
/// `utc_offset_seconds`) is `day` count. The index is the worst over the
/// counted points; concentrations are averaged.
pub fn normalize_air_quality(
    payload: &AirQualityPayload,
    day: Option<NaiveDate>,
    utc_offset_seconds: i64,
) -> AirQuality {
    let points: Vec<&AirQualityPoint> = payload
        .list
        .iter()
        .filter(|point| match day {
            None => true,
            Some(day) => point.dt.and_then(|dt| local_date(dt, utc_offset_seconds)) == Some(day),
        })
        .collect();

    let component = |pick: fn(&Components) -> Option<f64>| {
        mean(
            points
                .iter()
                .filter_map(|p| p.components.as_ref().and_then(pick)),
        )
    };

    AirQuality {
        index: points
            .iter()
            .filter_map(|p| p.main.as_ref().and_then(|m| m.aqi))
            .max(),
        pm2_5: component(|c| c.pm2_5),
        pm10: component(|c| c.pm10),
        no2: component(|c| c.no2),
        o3: component(|c| c.o3),
        co: component(|c| c.co),
    }
}

fn total_precipitation(
    rain: Option<&PrecipitationBlock>,
    snow: Option<&PrecipitationBlock>,
) -> f64 {
    rain.map_or(0.0, PrecipitationBlock::amount) + snow.map_or(0.0, PrecipitationBlock::amount)
}

/// Most frequent condition label; ties go to the earliest point.
fn dominant_condition<'a>(
    conditions: impl Iterator<Item = &'a ConditionBlock>,
) -> Option<&'a ConditionBlock> {
    let mut tally: Vec<(&'a ConditionBlock, usize)> = Vec::new();
    for condition in conditions {
        let Some(label) = condition.main.as_deref() else {
            continue;
        };
        match tally
            .iter_mut()
            .find(|(seen, _)| seen.main.as_deref() == Some(label))
        {
            Some((_, count)) => *count += 1,
            None => tally.push((condition, 1)),
        }
    }

    let mut best: Option<(&'a ConditionBlock, usize)> = None;
    for (condition, count) in tally {
        if best.map_or(true, |(_, best_count)| count > best_count) {
            best = Some((condition, count));
        }
    }
    best.map(|(condition, _)| condition)
}

fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, count) = values.fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    (count > 0).then(|| sum / count as f64)
}

fn local_date(unix_seconds: i64, offset_seconds: i64) -> Option<NaiveDate> {
    DateTime::from_timestamp(unix_seconds.checked_add(offset_seconds)?, 0)
        .map(|instant| instant.date_naive())
}
