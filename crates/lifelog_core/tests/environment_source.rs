use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use lifelog_core::provider::payload::{
    AirQualityPayload, ConditionsPoint, ForecastPayload, HistoricalPayload,
};
use lifelog_core::provider::source::local_solar_noon;
use lifelog_core::{
    Coordinates, EnvironmentSource, EnvironmentalDataSource, FetchError, FixedClock,
    HistoricalFallback, ProviderError, SourceKind, ValidationError, WeatherApi,
};
use serde_json::json;
use std::cell::RefCell;

const POZNAN: Coordinates = Coordinates {
    latitude: 52.4,
    longitude: 15.0,
};

/// 2024-06-15T00:00:00Z
const JUNE_15: i64 = 1_718_409_600;

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, d).unwrap()
}

#[derive(Default)]
struct StubApi {
    forecast_timezone: i64,
    fail_history: bool,
    fail_air_quality: bool,
    calls: RefCell<Vec<String>>,
}

impl StubApi {
    fn record(&self, call: impl Into<String>) {
        self.calls.borrow_mut().push(call.into());
    }

    fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }

    fn air_quality(&self, kind: &str) -> Result<AirQualityPayload, ProviderError> {
        self.record(format!("air_quality_{kind}"));
        if self.fail_air_quality {
            return Err(ProviderError::Transport("connection reset".to_string()));
        }
        Ok(serde_json::from_value(json!({
            "list": [
                { "dt": JUNE_15 + 9 * 3600, "main": { "aqi": 2 }, "components": { "pm2_5": 8.0, "pm10": 12.0 } },
                { "dt": JUNE_15 + 15 * 3600, "main": { "aqi": 3 }, "components": { "pm2_5": 12.0, "pm10": 20.0 } },
                { "dt": JUNE_15 + 30 * 3600, "main": { "aqi": 5 }, "components": { "pm2_5": 90.0 } }
            ]
        }))
        .unwrap())
    }
}

impl WeatherApi for StubApi {
    fn current(&self, _at: Coordinates) -> Result<ConditionsPoint, ProviderError> {
        self.record("current");
        Ok(serde_json::from_value(json!({
            "dt": JUNE_15 - 5 * 86_400,
            "main": { "temp": 21.5, "temp_min": 18.0, "temp_max": 24.0, "humidity": 55, "pressure": 1015 },
            "weather": [{ "main": "Clear", "description": "clear sky" }],
            "wind": { "speed": 3.2 },
            "clouds": { "all": 5 }
        }))
        .unwrap())
    }

    fn forecast(&self, _at: Coordinates) -> Result<ForecastPayload, ProviderError> {
        self.record("forecast");
        Ok(serde_json::from_value(json!({
            "city": { "timezone": self.forecast_timezone },
            "list": [
                { "dt": JUNE_15 - 3 * 3600, "main": { "temp": 30.0 }, "weather": [{ "main": "Clear" }] },
                { "dt": JUNE_15 + 9 * 3600, "main": { "temp": 14.0, "humidity": 80 }, "weather": [{ "main": "Clouds", "description": "overcast clouds" }] },
                { "dt": JUNE_15 + 12 * 3600, "main": { "temp": 20.0, "humidity": 60 }, "weather": [{ "main": "Rain", "description": "light rain" }], "rain": { "3h": 1.5 } },
                { "dt": JUNE_15 + 15 * 3600, "main": { "temp": 17.0, "humidity": 70 }, "weather": [{ "main": "Rain", "description": "moderate rain" }], "rain": { "3h": 4.0 } }
            ]
        }))
        .unwrap())
    }

    fn historical(
        &self,
        _at: Coordinates,
        instant: DateTime<Utc>,
    ) -> Result<HistoricalPayload, ProviderError> {
        self.record(format!("historical@{}", instant.to_rfc3339()));
        if self.fail_history {
            return Err(ProviderError::Status {
                code: 401,
                body: "subscription required".to_string(),
            });
        }
        Ok(serde_json::from_value(json!({
            "timezone_offset": 7200,
            "data": [{
                "dt": instant.timestamp(),
                "temp": 19.0,
                "humidity": 65,
                "pressure": 1009,
                "wind_speed": 4.1,
                "clouds": 40,
                "weather": [{ "main": "Clouds", "description": "scattered clouds" }]
            }]
        }))
        .unwrap())
    }

    fn air_quality_current(&self, _at: Coordinates) -> Result<AirQualityPayload, ProviderError> {
        self.air_quality("current")
    }

    fn air_quality_forecast(&self, _at: Coordinates) -> Result<AirQualityPayload, ProviderError> {
        self.air_quality("forecast")
    }

    fn air_quality_history(
        &self,
        _at: Coordinates,
        _start: DateTime<Utc>,
        _end: DateTime<Utc>,
    ) -> Result<AirQualityPayload, ProviderError> {
        self.air_quality("history")
    }
}

fn source(
    api: StubApi,
    fallback: HistoricalFallback,
) -> EnvironmentalDataSource<StubApi, FixedClock> {
    EnvironmentalDataSource::new(api, FixedClock(day(10)), fallback)
}

#[test]
fn today_uses_current_conditions() {
    let source = source(StubApi::default(), HistoricalFallback::Disabled);

    let record = source.fetch(day(10), POZNAN).unwrap();
    assert_eq!(record.source_kind, SourceKind::Current);
    assert_eq!(record.date, day(10));
    assert_eq!(record.temp_current, 21.5);
    assert_eq!(record.temp_min, 18.0);
    assert_eq!(record.condition_main.as_deref(), Some("Clear"));
    assert!(record.has_air_quality());
    assert!(record.daylight_hours > 16.0 && record.daylight_hours < 17.5);
}

#[test]
fn dates_within_horizon_aggregate_forecast_points() {
    let source = source(StubApi::default(), HistoricalFallback::Disabled);

    let record = source.fetch(day(15), POZNAN).unwrap();
    assert_eq!(record.source_kind, SourceKind::Forecast);
    assert_eq!(record.temp_min, 14.0);
    assert_eq!(record.temp_max, 20.0);
    assert!((record.temp_current - 17.0).abs() < 1e-9);
    assert!((record.humidity - 70.0).abs() < 1e-9);
    assert_eq!(record.precipitation, 4.0);
    assert_eq!(record.condition_main.as_deref(), Some("Rain"));
    assert_eq!(record.condition_description.as_deref(), Some("light rain"));

    assert_eq!(record.air_quality_index, Some(3));
    assert!((record.pm2_5.unwrap() - 10.0).abs() < 1e-9);
    assert_eq!(record.co, None);
}

#[test]
fn forecast_air_quality_uses_the_city_day() {
    // At UTC-10 the 15:00Z and 06:00Z-next-day points both fall on June 15.
    let api = StubApi {
        forecast_timezone: -36_000,
        ..StubApi::default()
    };
    let source = source(api, HistoricalFallback::Disabled);

    let record = source.fetch(day(15), POZNAN).unwrap();
    assert_eq!(record.source_kind, SourceKind::Forecast);
    assert_eq!(record.air_quality_index, Some(5));
    assert!((record.pm2_5.unwrap() - 51.0).abs() < 1e-9);
}

#[test]
fn dates_beyond_horizon_fail_before_any_request() {
    let source = source(StubApi::default(), HistoricalFallback::Disabled);

    let err = source.fetch(day(16), POZNAN).unwrap_err();
    assert_eq!(err, FetchError::OutOfRange { days_diff: 6 });
}

#[test]
fn past_dates_query_history_at_local_solar_noon() {
    let api = StubApi::default();
    let source = EnvironmentalDataSource::new(&api, FixedClock(day(10)), HistoricalFallback::Disabled);

    let record = source.fetch(day(3), POZNAN).unwrap();
    assert_eq!(record.source_kind, SourceKind::Historical);
    assert_eq!(record.temp_min, 19.0);
    assert_eq!(record.temp_max, 19.0);
    assert_eq!(record.cloud_cover, 40.0);

    let noon = Utc.with_ymd_and_hms(2024, 6, 3, 11, 0, 0).unwrap();
    assert_eq!(local_solar_noon(day(3), POZNAN.longitude), Some(noon));
    assert_eq!(
        api.calls(),
        vec![
            format!("historical@{}", noon.to_rfc3339()),
            "air_quality_history".to_string()
        ]
    );
}

#[test]
fn history_window_past_calendar_start_is_rejected() {
    let api = StubApi::default();
    let source = EnvironmentalDataSource::new(&api, FixedClock(day(10)), HistoricalFallback::Disabled);

    let err = source.fetch(NaiveDate::MIN, POZNAN).unwrap_err();
    assert_eq!(
        err,
        FetchError::Validation(ValidationError::DateOutOfRange(NaiveDate::MIN))
    );
    assert!(api.calls().is_empty());
}

#[test]
fn solar_noon_is_none_past_calendar_end() {
    assert_eq!(
        local_solar_noon(NaiveDate::MAX, 15.0).map(|t| t.date_naive()),
        Some(NaiveDate::MAX)
    );
    assert_eq!(local_solar_noon(NaiveDate::MAX, -180.0), None);
}

#[test]
fn air_quality_failure_degrades_to_missing_fields() {
    let api = StubApi {
        fail_air_quality: true,
        ..StubApi::default()
    };
    let source = source(api, HistoricalFallback::Disabled);

    let record = source.fetch(day(10), POZNAN).unwrap();
    assert_eq!(record.temp_current, 21.5);
    assert_eq!(record.air_quality_index, None);
    assert_eq!(record.pm2_5, None);
    assert_eq!(record.pm10, None);
}

#[test]
fn history_failure_is_reported_without_fallback() {
    let api = StubApi {
        fail_history: true,
        ..StubApi::default()
    };
    let source = source(api, HistoricalFallback::Disabled);

    match source.fetch(day(9), POZNAN).unwrap_err() {
        FetchError::Provider(err) => assert!(err.is_access_denied()),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn yesterday_falls_back_to_current_conditions_when_enabled() {
    let api = StubApi {
        fail_history: true,
        ..StubApi::default()
    };
    let source = source(api, HistoricalFallback::CurrentForYesterday);

    let record = source.fetch(day(9), POZNAN).unwrap();
    assert_eq!(record.date, day(9));
    assert_eq!(record.source_kind, SourceKind::Current);

    // Only yesterday is approximated.
    assert!(matches!(
        source.fetch(day(8), POZNAN).unwrap_err(),
        FetchError::Provider(_)
    ));
}

#[test]
fn invalid_coordinates_are_rejected() {
    let source = source(StubApi::default(), HistoricalFallback::Disabled);

    let err = source
        .fetch(
            day(10),
            Coordinates {
                latitude: 91.0,
                longitude: 0.0,
            },
        )
        .unwrap_err();
    assert!(matches!(
        err,
        FetchError::Validation(ValidationError::LatitudeOutOfRange(_))
    ));
}
