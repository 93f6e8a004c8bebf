//! OpenWeatherMap HTTP client.
//!
//! Blocking `ureq` requests; every request is bounded by
//! `ProviderConfig::timeout`.

use crate::config::{ConfigurationError, Coordinates, ProviderConfig};
use crate::provider::payload::{
    AirQualityPayload, ConditionsPoint, ForecastPayload, HistoricalPayload,
};
use crate::provider::{ProviderError, WeatherApi};
use chrono::{DateTime, Utc};
use log::debug;
use serde::de::DeserializeOwned;
use std::time::Instant;

const MAX_ERROR_BODY_CHARS: usize = 200;

pub struct OpenWeatherClient {
    agent: ureq::Agent,
    api_key: String,
    base_url: String,
}

impl OpenWeatherClient {
    /// # Errors
    /// - `MissingApiKey` when the configured key is blank.
    pub fn new(config: &ProviderConfig) -> Result<Self, ConfigurationError> {
        let api_key = config.api_key.trim();
        if api_key.is_empty() {
            return Err(ConfigurationError::MissingApiKey);
        }

        let agent = ureq::AgentBuilder::new().timeout(config.timeout).build();
        Ok(Self {
            agent,
            api_key: api_key.to_string(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        at: Coordinates,
        extra: &[(&str, String)],
    ) -> Result<T, ProviderError> {
        let started_at = Instant::now();
        let url = format!("{}{}", self.base_url, path);
        let mut request = self
            .agent
            .get(&url)
            .query("lat", &at.latitude.to_string())
            .query("lon", &at.longitude.to_string())
            .query("units", "metric")
            .query("appid", &self.api_key);
        for (key, value) in extra {
            request = request.query(key, value);
        }

        let result = match request.call() {
            Ok(response) => response
                .into_json::<T>()
                .map_err(|err| ProviderError::Payload(err.to_string())),
            Err(ureq::Error::Status(code, response)) => {
                let body = response.into_string().unwrap_or_default();
                Err(ProviderError::Status {
                    code,
                    body: self.redact(&body).chars().take(MAX_ERROR_BODY_CHARS).collect(),
                })
            }
            Err(ureq::Error::Transport(transport)) => {
                Err(ProviderError::Transport(self.redact(&describe_transport(&transport))))
            }
        };

        // The API key travels in the query string; only the path is logged.
        debug!(
            "event=provider_request module=provider status={} path={} duration_ms={}",
            if result.is_ok() { "ok" } else { "error" },
            path,
            started_at.elapsed().as_millis()
        );
        result
    }

    fn redact(&self, text: &str) -> String {
        text.replace(&self.api_key, "<redacted>")
    }
}

/// Transport failure text without the request URL, which carries the key.
fn describe_transport(transport: &ureq::Transport) -> String {
    let mut text = transport.kind().to_string();
    if let Some(message) = transport.message() {
        text.push_str(": ");
        text.push_str(message);
    }
    if let Some(source) = std::error::Error::source(transport) {
        text.push_str(": ");
        text.push_str(&source.to_string());
    }
    text
}

impl WeatherApi for OpenWeatherClient {
    fn current(&self, at: Coordinates) -> Result<ConditionsPoint, ProviderError> {
        self.get_json("/data/2.5/weather", at, &[])
    }

    fn forecast(&self, at: Coordinates) -> Result<ForecastPayload, ProviderError> {
        self.get_json("/data/2.5/forecast", at, &[])
    }

    fn historical(
        &self,
        at: Coordinates,
        instant: DateTime<Utc>,
    ) -> Result<HistoricalPayload, ProviderError> {
        self.get_json(
            "/data/3.0/onecall/timemachine",
            at,
            &[("dt", instant.timestamp().to_string())],
        )
    }

    fn air_quality_current(&self, at: Coordinates) -> Result<AirQualityPayload, ProviderError> {
        self.get_json("/data/2.5/air_pollution", at, &[])
    }

    fn air_quality_forecast(&self, at: Coordinates) -> Result<AirQualityPayload, ProviderError> {
        self.get_json("/data/2.5/air_pollution/forecast", at, &[])
    }

    fn air_quality_history(
        &self,
        at: Coordinates,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<AirQualityPayload, ProviderError> {
        self.get_json(
            "/data/2.5/air_pollution/history",
            at,
            &[
                ("start", start.timestamp().to_string()),
                ("end", end.timestamp().to_string()),
            ],
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn coordinates() -> Coordinates {
        Coordinates {
            latitude: 52.4064,
            longitude: 16.9252,
        }
    }

    #[test]
    fn blank_api_key_is_rejected() {
        let err = OpenWeatherClient::new(&ProviderConfig::new("   ")).err();
        assert_eq!(err, Some(ConfigurationError::MissingApiKey));
    }

    #[test]
    fn unreachable_provider_is_a_transport_error() {
        let mut config = ProviderConfig::new("sekrit");
        // Port 9 (discard) is closed on test hosts; the connection is refused.
        config.base_url = "http://127.0.0.1:9/".to_string();
        config.timeout = Duration::from_secs(2);
        let client = OpenWeatherClient::new(&config).unwrap();

        let err = client.current(coordinates()).unwrap_err();
        assert!(matches!(err, ProviderError::Transport(_)), "{err}");
    }

    #[test]
    fn transport_error_text_omits_api_key() {
        let mut config = ProviderConfig::new("SEKRITKEY123");
        config.base_url = "http://127.0.0.1:9/".to_string();
        config.timeout = Duration::from_secs(2);
        let client = OpenWeatherClient::new(&config).unwrap();

        let err = client.forecast(coordinates()).unwrap_err();
        let text = err.to_string();
        assert!(matches!(err, ProviderError::Transport(_)), "{text}");
        assert!(!text.contains("SEKRITKEY123"), "{text}");
        assert!(!text.contains("appid"), "{text}");
        assert!(!format!("{err:?}").contains("SEKRITKEY123"));
    }

    #[test]
    fn redaction_scrubs_key_from_provider_text() {
        let client = OpenWeatherClient::new(&ProviderConfig::new("SEKRITKEY123")).unwrap();
        assert_eq!(
            client.redact("bad request for appid=SEKRITKEY123"),
            "bad request for appid=<redacted>"
        );
    }
}
