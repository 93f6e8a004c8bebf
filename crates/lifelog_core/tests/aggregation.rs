use chrono::{NaiveDate, NaiveDateTime};
use lifelog_core::calc::astronomy::moon_phase;
use lifelog_core::db::open_db_in_memory;
use lifelog_core::{
    AggregationEngine, AggregationError, EnvironmentLookup, EnvironmentalRecord,
    MoonPhaseRecord, Settings, SourceKind, SqliteTimelineStore, TimelineEntry, TimelineStore,
    ValidationError,
};
use rusqlite::Connection;

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, d).unwrap()
}

fn at(d: u32, hour: u32) -> NaiveDateTime {
    day(d).and_hms_opt(hour, 0, 0).unwrap()
}

/// Serves one stored record for `with_data`; every other date has no data.
struct StubEnvironment {
    with_data: Option<NaiveDate>,
}

impl EnvironmentLookup for StubEnvironment {
    fn environment(&self, date: NaiveDate) -> Option<EnvironmentalRecord> {
        (self.with_data == Some(date)).then(|| {
            let mut record = EnvironmentalRecord::empty(date, SourceKind::Historical);
            record.temp_current = 19.0;
            record
        })
    }

    fn moon_phase(&self, date: NaiveDate) -> MoonPhaseRecord {
        moon_phase(date)
    }
}

fn full_settings() -> Settings {
    Settings {
        latitude: Some(52.4),
        longitude: Some(16.9),
        birth_date: NaiveDate::from_ymd_opt(1990, 5, 17),
        ..Settings::default()
    }
}

fn seed(conn: &Connection, entries: &[TimelineEntry]) {
    let store = SqliteTimelineStore::try_new(conn).unwrap();
    for entry in entries {
        store.upsert(entry).unwrap();
    }
}

fn engine(
    conn: &Connection,
    settings: Settings,
) -> AggregationEngine<SqliteTimelineStore<'_>, StubEnvironment> {
    AggregationEngine::new(
        SqliteTimelineStore::try_new(conn).unwrap(),
        StubEnvironment {
            with_data: Some(day(10)),
        },
        settings,
    )
}

#[test]
fn daily_summary_averages_sums_and_picks_first_sleep() {
    let conn = open_db_in_memory().unwrap();
    seed(
        &conn,
        &[
            TimelineEntry::numeric(at(10, 7), "sleep_quality", 2.0),
            TimelineEntry::numeric(at(10, 8), "mood", 3.0),
            TimelineEntry::numeric(at(10, 8), "caffeine", 1.0),
            TimelineEntry::numeric(at(10, 13), "caffeine", 2.0),
            TimelineEntry::numeric(at(10, 20), "mood", 5.0).with_note("good evening"),
            TimelineEntry::numeric(at(10, 21), "sleep_quality", 5.0),
            TimelineEntry::text(at(10, 22), "note", "read a book"),
        ],
    );

    let summary = engine(&conn, full_settings()).daily_summary(day(10)).unwrap();

    assert_eq!(summary.avg_mood, Some(4.0));
    assert_eq!(summary.sleep_quality, Some(2.0));
    assert_eq!(summary.caffeine_total, Some(3.0));
    assert_eq!(summary.avg_energy, None);
    assert_eq!(summary.avg_stress, None);
    assert_eq!(summary.notes, vec!["good evening", "read a book"]);
    assert_eq!(summary.entries_by_category["mood"].len(), 2);
    assert_eq!(summary.entry_count(), 7);

    assert_eq!(summary.environment.unwrap().temp_current, 19.0);
    assert_eq!(summary.moon_phase, moon_phase(day(10)));
    assert!(summary.daylight_hours.unwrap() > 16.0);
    assert!(summary.biorhythm.is_some());
}

#[test]
fn range_summary_has_one_element_per_day_even_without_data() {
    let conn = open_db_in_memory().unwrap();
    seed(&conn, &[TimelineEntry::numeric(at(11, 9), "energy", 4.0)]);

    let summaries = engine(&conn, Settings::default())
        .range_summary(day(9), day(12))
        .unwrap();

    let dates: Vec<NaiveDate> = summaries.iter().map(|s| s.date).collect();
    assert_eq!(dates, vec![day(9), day(10), day(11), day(12)]);

    let empty = &summaries[0];
    assert!(!empty.has_metrics());
    assert!(empty.environment.is_none());
    assert!(empty.entries_by_category.is_empty());
    assert_eq!(empty.biorhythm, None);
    assert_eq!(empty.daylight_hours, None);

    assert!(summaries[1].environment.is_some());
    assert_eq!(summaries[2].avg_energy, Some(4.0));
}

#[test]
fn single_day_range_matches_daily_summary() {
    let conn = open_db_in_memory().unwrap();
    seed(&conn, &[TimelineEntry::numeric(at(10, 9), "stress", 2.0)]);
    let engine = engine(&conn, full_settings());

    let range = engine.range_summary(day(10), day(10)).unwrap();
    assert_eq!(range, vec![engine.daily_summary(day(10)).unwrap()]);
}

#[test]
fn reversed_range_is_rejected() {
    let conn = open_db_in_memory().unwrap();
    let engine = engine(&conn, Settings::default());

    assert!(matches!(
        engine.range_summary(day(12), day(10)),
        Err(AggregationError::InvalidRange { .. })
    ));
    assert!(matches!(
        engine.timeline_view(day(12), day(10)),
        Err(AggregationError::InvalidRange { .. })
    ));
}

#[test]
fn string_entry_points_validate_dates() {
    let conn = open_db_in_memory().unwrap();
    let engine = engine(&conn, Settings::default());

    assert_eq!(
        engine.daily_summary_str("2024-06-10").unwrap().date,
        day(10)
    );
    assert!(matches!(
        engine.daily_summary_str("2024-02-30"),
        Err(AggregationError::Validation(ValidationError::MalformedDate(_)))
    ));
    assert!(matches!(
        engine.range_summary_str("2024-06-10", "10/06/2024"),
        Err(AggregationError::Validation(_))
    ));
    assert_eq!(
        engine
            .range_summary_str("2024-06-10", "2024-06-11")
            .unwrap()
            .len(),
        2
    );
}

#[test]
fn timeline_view_buckets_by_date_and_hour() {
    let conn = open_db_in_memory().unwrap();
    seed(
        &conn,
        &[
            TimelineEntry::numeric(at(10, 8), "mood", 4.0),
            TimelineEntry::numeric(at(10, 8), "energy", 3.0),
            TimelineEntry::numeric(at(10, 17), "stress", 4.0),
            TimelineEntry::numeric(at(12, 6), "sleep_quality", 3.0),
        ],
    );

    let view = engine(&conn, Settings::default())
        .timeline_view(day(10), day(12))
        .unwrap();

    assert_eq!(view.keys().copied().collect::<Vec<_>>(), vec![day(10), day(12)]);
    assert_eq!(view[&day(10)][&8].len(), 2);
    assert_eq!(view[&day(10)][&17][0].category, "stress");
    assert_eq!(view[&day(12)].keys().copied().collect::<Vec<_>>(), vec![6]);
}
