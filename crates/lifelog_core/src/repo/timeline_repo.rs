//! Timeline store contract and SQLite implementation.
//!
//! # Responsibility
//! - Persist hourly (timestamp, category) entries with upsert semantics.
//! - Serve date-range reads ordered by timestamp.
//!
//! # Invariants
//! - At most one row per (hour slot, category); later writes replace earlier.
//! - `query` results are sorted ascending by timestamp, then category.

use crate::model::entry::{hour_slot, validate_category, TimelineEntry};
use crate::repo::{ensure_schema_ready, RepoError, RepoResult};
use chrono::{Days, NaiveDate, NaiveDateTime, NaiveTime};
use rusqlite::{params, Connection, Row};

const SLOT_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const ENTRY_SELECT_SQL: &str = "SELECT
    slot,
    category,
    numeric_value,
    text_value,
    note
FROM timeline_entries";

/// Storage contract for user-logged timeline entries.
pub trait TimelineStore {
    /// Inserts or replaces the entry at (`entry.timestamp` hour, `entry.category`).
    fn upsert(&self, entry: &TimelineEntry) -> RepoResult<()>;
    /// Entries whose calendar date lies in `start..=end`.
    fn query(&self, start: NaiveDate, end: NaiveDate) -> RepoResult<Vec<TimelineEntry>>;
    /// Removes one entry; `NotFound` when nothing matched.
    fn delete(&self, timestamp: NaiveDateTime, category: &str) -> RepoResult<()>;
}

/// SQLite-backed timeline store.
pub struct SqliteTimelineStore<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteTimelineStore<'conn> {
    /// Constructs a store from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_schema_ready(conn)?;
        Ok(Self { conn })
    }
}

impl TimelineStore for SqliteTimelineStore<'_> {
    fn upsert(&self, entry: &TimelineEntry) -> RepoResult<()> {
        entry.validate()?;

        self.conn.execute(
            "INSERT INTO timeline_entries (slot, category, numeric_value, text_value, note)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT (slot, category) DO UPDATE SET
                numeric_value = excluded.numeric_value,
                text_value = excluded.text_value,
                note = excluded.note,
                updated_at = (strftime('%s', 'now') * 1000);",
            params![
                slot_key(entry.timestamp),
                entry.category.as_str(),
                entry.numeric_value,
                entry.text_value.as_deref(),
                entry.note.as_deref(),
            ],
        )?;

        Ok(())
    }

    fn query(&self, start: NaiveDate, end: NaiveDate) -> RepoResult<Vec<TimelineEntry>> {
        if start > end {
            return Ok(Vec::new());
        }

        let lower = slot_key(start.and_time(NaiveTime::MIN));
        // Open upper bound keeps the last day's 23:00 slot inside the range.
        let upper = end
            .checked_add_days(Days::new(1))
            .map(|next| slot_key(next.and_time(NaiveTime::MIN)));

        let mut stmt = self.conn.prepare(&format!(
            "{ENTRY_SELECT_SQL}
             WHERE slot >= ?1
               AND (?2 IS NULL OR slot < ?2)
             ORDER BY slot ASC, category ASC;"
        ))?;
        let mut rows = stmt.query(params![lower, upper])?;

        let mut entries = Vec::new();
        while let Some(row) = rows.next()? {
            entries.push(parse_entry_row(row)?);
        }
        Ok(entries)
    }

    fn delete(&self, timestamp: NaiveDateTime, category: &str) -> RepoResult<()> {
        validate_category(category)?;
        let slot = slot_key(timestamp);
        let changed = self.conn.execute(
            "DELETE FROM timeline_entries WHERE slot = ?1 AND category = ?2;",
            params![slot, category],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound(format!("{slot}/{category}")));
        }
        Ok(())
    }
}

fn slot_key(timestamp: NaiveDateTime) -> String {
    hour_slot(timestamp).format(SLOT_FORMAT).to_string()
}

fn parse_entry_row(row: &Row<'_>) -> RepoResult<TimelineEntry> {
    let slot_text: String = row.get("slot")?;
    let timestamp = NaiveDateTime::parse_from_str(&slot_text, SLOT_FORMAT).map_err(|_| {
        RepoError::InvalidData(format!(
            "invalid slot `{slot_text}` in timeline_entries.slot"
        ))
    })?;

    let entry = TimelineEntry {
        timestamp,
        category: row.get("category")?,
        numeric_value: row.get("numeric_value")?,
        text_value: row.get("text_value")?,
        note: row.get("note")?,
    };
    entry
        .validate()
        .map_err(|err| RepoError::InvalidData(err.to_string()))?;
    Ok(entry)
}
