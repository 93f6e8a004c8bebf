//! Canonical environmental record stored once per calendar date.
//!
//! # Invariants
//! - At most one record per date; a stored record is never mutated.
//! - Core weather fields are `0.0` when the provider omitted them.
//! - Condition and air-quality fields are `None` when unknown.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Which provider strategy produced a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    Current,
    Forecast,
    Historical,
}

impl SourceKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Current => "current",
            Self::Forecast => "forecast",
            Self::Historical => "historical",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "current" => Some(Self::Current),
            "forecast" => Some(Self::Forecast),
            "historical" => Some(Self::Historical),
            _ => None,
        }
    }
}

/// Air-quality readings merged into an environmental record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AirQuality {
    /// Ordinal index, 1 (good) to 5 (very poor).
    pub index: Option<u8>,
    pub pm2_5: Option<f64>,
    pub pm10: Option<f64>,
    pub no2: Option<f64>,
    pub o3: Option<f64>,
    pub co: Option<f64>,
}

/// Weather, air quality and daylight for one calendar date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnvironmentalRecord {
    pub date: NaiveDate,
    /// Degrees Celsius.
    pub temp_min: f64,
    pub temp_max: f64,
    pub temp_current: f64,
    /// Percent.
    pub humidity: f64,
    /// hPa.
    pub pressure: f64,
    /// Millimetres.
    pub precipitation: f64,
    pub condition_main: Option<String>,
    pub condition_description: Option<String>,
    /// Metres per second.
    pub wind_speed: f64,
    /// Percent.
    pub cloud_cover: f64,
    pub air_quality_index: Option<u8>,
    pub pm2_5: Option<f64>,
    pub pm10: Option<f64>,
    pub no2: Option<f64>,
    pub o3: Option<f64>,
    pub co: Option<f64>,
    pub daylight_hours: f64,
    pub source_kind: SourceKind,
}

impl EnvironmentalRecord {
    /// Creates a record with zeroed weather fields and no air-quality data.
    pub fn empty(date: NaiveDate, source_kind: SourceKind) -> Self {
        Self {
            date,
            temp_min: 0.0,
            temp_max: 0.0,
            temp_current: 0.0,
            humidity: 0.0,
            pressure: 0.0,
            precipitation: 0.0,
            condition_main: None,
            condition_description: None,
            wind_speed: 0.0,
            cloud_cover: 0.0,
            air_quality_index: None,
            pm2_5: None,
            pm10: None,
            no2: None,
            o3: None,
            co: None,
            daylight_hours: 0.0,
            source_kind,
        }
    }

    /// Overwrites all air-quality fields with `air`.
    pub fn apply_air_quality(&mut self, air: AirQuality) {
        self.air_quality_index = air.index;
        self.pm2_5 = air.pm2_5;
        self.pm10 = air.pm10;
        self.no2 = air.no2;
        self.o3 = air.o3;
        self.co = air.co;
    }

    pub fn has_air_quality(&self) -> bool {
        self.air_quality_index.is_some()
    }
}
