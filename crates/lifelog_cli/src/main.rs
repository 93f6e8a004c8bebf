//! CLI smoke entry point.
//!
//! # Responsibility
//! - Print the core version.
//! - With `<db_path> <date>`, print that day's summary as JSON.
//!
//! Settings and provider credentials come from the process environment
//! (`LATITUDE`, `LONGITUDE`, `BIRTH_DATE`, `OPENWEATHER_API_KEY`, ...).
//! File logging starts when `LIFELOG_LOG_DIR` names an absolute directory.

use chrono::NaiveDate;
use lifelog_core::{
    db, default_log_level, init_logging, AggregationEngine, ConfigurationError, Coordinates,
    EnvironmentSource, EnvironmentalCache, EnvironmentalDataSource, EnvironmentalRecord,
    FetchError, OpenWeatherClient, ProviderConfig, Settings, SqliteEnvironmentRepository,
    SqliteTimelineStore, SystemClock,
};
use std::error::Error;
use std::process::ExitCode;

/// Stand-in source when no provider key is configured; every fetch reports it.
struct Unconfigured;

impl EnvironmentSource for Unconfigured {
    fn fetch(&self, _date: NaiveDate, _at: Coordinates) -> Result<EnvironmentalRecord, FetchError> {
        Err(FetchError::Configuration(ConfigurationError::MissingApiKey))
    }
}

fn main() -> ExitCode {
    println!("lifelog_core version={}", lifelog_core::core_version());

    if let Ok(log_dir) = std::env::var("LIFELOG_LOG_DIR") {
        if let Err(err) = init_logging(default_log_level(), &log_dir) {
            eprintln!("warning: {err}");
        }
    }

    let args: Vec<String> = std::env::args().skip(1).collect();
    let [db_path, date] = args.as_slice() else {
        if !args.is_empty() {
            eprintln!("usage: lifelog_cli [<db_path> <YYYY-MM-DD>]");
            return ExitCode::FAILURE;
        }
        return ExitCode::SUCCESS;
    };

    match print_summary(db_path, date) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn print_summary(db_path: &str, date: &str) -> Result<(), Box<dyn Error>> {
    let conn = db::open_db(db_path)?;
    let settings = Settings::from_env()?;

    let summary = match ProviderConfig::from_env() {
        Ok(config) => {
            let source = EnvironmentalDataSource::new(
                OpenWeatherClient::new(&config)?,
                SystemClock,
                config.historical_fallback,
            );
            summarize(&conn, source, settings, date)?
        }
        Err(ConfigurationError::MissingApiKey) => summarize(&conn, Unconfigured, settings, date)?,
        Err(err) => return Err(err.into()),
    };

    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

fn summarize<S: EnvironmentSource>(
    conn: &rusqlite::Connection,
    source: S,
    settings: Settings,
    date: &str,
) -> Result<lifelog_core::DailySummary, Box<dyn Error>> {
    let cache = EnvironmentalCache::new(
        SqliteEnvironmentRepository::try_new(conn)?,
        source,
        &settings,
    );
    let engine = AggregationEngine::new(SqliteTimelineStore::try_new(conn)?, &cache, settings);
    Ok(engine.daily_summary_str(date)?)
}
