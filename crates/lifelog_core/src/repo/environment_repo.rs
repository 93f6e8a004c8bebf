//! Per-date environmental and lunar record storage.
//!
//! # Responsibility
//! - Persist one canonical environmental record and one moon phase per date.
//!
//! # Invariants
//! - Inserts are atomic insert-if-absent; an existing row is never replaced.
//! - Rows are returned verbatim; there is no expiry.

use crate::model::astro::{MoonPhase, MoonPhaseRecord};
use crate::model::environment::{EnvironmentalRecord, SourceKind};
use crate::repo::{ensure_schema_ready, RepoError, RepoResult, DATE_FORMAT};
use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension, Row};

const RECORD_SELECT_SQL: &str = "SELECT
    date,
    temp_min,
    temp_max,
    temp_current,
    humidity,
    pressure,
    precipitation,
    condition_main,
    condition_description,
    wind_speed,
    cloud_cover,
    air_quality_index,
    pm2_5,
    pm10,
    no2,
    o3,
    co,
    daylight_hours,
    source_kind
FROM environmental_records";

/// Storage contract behind the environmental cache.
pub trait EnvironmentRepository {
    fn get_record(&self, date: NaiveDate) -> RepoResult<Option<EnvironmentalRecord>>;
    /// Stores `record` unless its date already has one. Returns whether it was written.
    fn insert_record_if_absent(&self, record: &EnvironmentalRecord) -> RepoResult<bool>;
    fn get_moon_phase(&self, date: NaiveDate) -> RepoResult<Option<MoonPhaseRecord>>;
    fn insert_moon_phase_if_absent(&self, record: &MoonPhaseRecord) -> RepoResult<bool>;
}

impl<R: EnvironmentRepository + ?Sized> EnvironmentRepository for &R {
    fn get_record(&self, date: NaiveDate) -> RepoResult<Option<EnvironmentalRecord>> {
        (**self).get_record(date)
    }

    fn insert_record_if_absent(&self, record: &EnvironmentalRecord) -> RepoResult<bool> {
        (**self).insert_record_if_absent(record)
    }

    fn get_moon_phase(&self, date: NaiveDate) -> RepoResult<Option<MoonPhaseRecord>> {
        (**self).get_moon_phase(date)
    }

    fn insert_moon_phase_if_absent(&self, record: &MoonPhaseRecord) -> RepoResult<bool> {
        (**self).insert_moon_phase_if_absent(record)
    }
}

/// SQLite-backed environment repository.
pub struct SqliteEnvironmentRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteEnvironmentRepository<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_schema_ready(conn)?;
        Ok(Self { conn })
    }
}

impl EnvironmentRepository for SqliteEnvironmentRepository<'_> {
    fn get_record(&self, date: NaiveDate) -> RepoResult<Option<EnvironmentalRecord>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{RECORD_SELECT_SQL} WHERE date = ?1;"))?;
        let mut rows = stmt.query([date_key(date)])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_record_row(row)?));
        }
        Ok(None)
    }

    fn insert_record_if_absent(&self, record: &EnvironmentalRecord) -> RepoResult<bool> {
        let inserted = self.conn.execute(
            "INSERT OR IGNORE INTO environmental_records (
                date,
                temp_min,
                temp_max,
                temp_current,
                humidity,
                pressure,
                precipitation,
                condition_main,
                condition_description,
                wind_speed,
                cloud_cover,
                air_quality_index,
                pm2_5,
                pm10,
                no2,
                o3,
                co,
                daylight_hours,
                source_kind
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19);",
            params![
                date_key(record.date),
                record.temp_min,
                record.temp_max,
                record.temp_current,
                record.humidity,
                record.pressure,
                record.precipitation,
                record.condition_main.as_deref(),
                record.condition_description.as_deref(),
                record.wind_speed,
                record.cloud_cover,
                record.air_quality_index,
                record.pm2_5,
                record.pm10,
                record.no2,
                record.o3,
                record.co,
                record.daylight_hours,
                record.source_kind.as_str(),
            ],
        )?;
        Ok(inserted == 1)
    }

    fn get_moon_phase(&self, date: NaiveDate) -> RepoResult<Option<MoonPhaseRecord>> {
        let row = self
            .conn
            .query_row(
                "SELECT phase_name, illumination_percent FROM moon_phases WHERE date = ?1;",
                [date_key(date)],
                |row| Ok((row.get::<_, String>(0)?, row.get::<_, f64>(1)?)),
            )
            .optional()?;

        let Some((phase_text, illumination_percent)) = row else {
            return Ok(None);
        };
        let phase_name = MoonPhase::from_label(&phase_text).ok_or_else(|| {
            RepoError::InvalidData(format!(
                "invalid phase `{phase_text}` in moon_phases.phase_name"
            ))
        })?;
        Ok(Some(MoonPhaseRecord {
            date,
            phase_name,
            illumination_percent,
        }))
    }

    fn insert_moon_phase_if_absent(&self, record: &MoonPhaseRecord) -> RepoResult<bool> {
        let inserted = self.conn.execute(
            "INSERT OR IGNORE INTO moon_phases (date, phase_name, illumination_percent)
             VALUES (?1, ?2, ?3);",
            params![
                date_key(record.date),
                record.phase_name.label(),
                record.illumination_percent,
            ],
        )?;
        Ok(inserted == 1)
    }
}

fn date_key(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

fn parse_record_row(row: &Row<'_>) -> RepoResult<EnvironmentalRecord> {
    let date_text: String = row.get("date")?;
    let date = NaiveDate::parse_from_str(&date_text, DATE_FORMAT).map_err(|_| {
        RepoError::InvalidData(format!(
            "invalid date `{date_text}` in environmental_records.date"
        ))
    })?;

    let kind_text: String = row.get("source_kind")?;
    let source_kind = SourceKind::parse(&kind_text).ok_or_else(|| {
        RepoError::InvalidData(format!(
            "invalid source kind `{kind_text}` in environmental_records.source_kind"
        ))
    })?;

    Ok(EnvironmentalRecord {
        date,
        temp_min: row.get("temp_min")?,
        temp_max: row.get("temp_max")?,
        temp_current: row.get("temp_current")?,
        humidity: row.get("humidity")?,
        pressure: row.get("pressure")?,
        precipitation: row.get("precipitation")?,
        condition_main: row.get("condition_main")?,
        condition_description: row.get("condition_description")?,
        wind_speed: row.get("wind_speed")?,
        cloud_cover: row.get("cloud_cover")?,
        air_quality_index: row.get("air_quality_index")?,
        pm2_5: row.get("pm2_5")?,
        pm10: row.get("pm10")?,
        no2: row.get("no2")?,
        o3: row.get("o3")?,
        co: row.get("co")?,
        daylight_hours: row.get("daylight_hours")?,
        source_kind,
    })
}
