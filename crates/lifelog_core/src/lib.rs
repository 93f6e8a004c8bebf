//! Core enrichment and aggregation engine for the lifelog timeline.
//! This crate owns date routing, environmental caching, local astronomical
//! and biorhythm calculations, and per-day summaries.

pub mod calc;
pub mod clock;
pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod provider;
pub mod repo;
pub mod service;

pub use clock::{Clock, FixedClock, SystemClock};
pub use config::{
    ConfigurationError, Coordinates, HistoricalFallback, LocationMode, ProviderConfig, Settings,
};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::astro::{MoonPhase, MoonPhaseRecord};
pub use model::biorhythm::{BiorhythmSnapshot, Cycle, CycleReading, CycleStatus};
pub use model::entry::{EntryTypeDefinition, TimelineEntry, ValueKind};
pub use model::environment::{AirQuality, EnvironmentalRecord, SourceKind};
pub use model::summary::DailySummary;
pub use model::validation::{parse_date, ValidationError};
pub use provider::{
    EnvironmentSource, EnvironmentalDataSource, FetchError, OpenWeatherClient, ProviderError,
    Route, WeatherApi,
};
pub use repo::entry_type_repo::{EntryTypeRegistry, SqliteEntryTypeRegistry};
pub use repo::environment_repo::{EnvironmentRepository, SqliteEnvironmentRepository};
pub use repo::timeline_repo::{SqliteTimelineStore, TimelineStore};
pub use repo::{RepoError, RepoResult};
pub use service::aggregation::{AggregationEngine, AggregationError, TimelineView};
pub use service::environment_cache::{EnvironmentLookup, EnvironmentalCache};
pub use service::timeline_service::TimelineService;

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
