//! Biorhythm cycles from elapsed days since birth.

use crate::config::ConfigurationError;
use crate::model::biorhythm::{BiorhythmSnapshot, Cycle, CycleReading, CycleStatus};
use chrono::NaiveDate;
use std::f64::consts::PI;

const CRITICAL_THRESHOLD: f64 = 0.1;

/// Computes all three cycles for `target_date`.
///
/// # Errors
/// - `MissingBirthDate` when `birth_date` is `None`.
pub fn snapshot(
    birth_date: Option<NaiveDate>,
    target_date: NaiveDate,
) -> Result<BiorhythmSnapshot, ConfigurationError> {
    let birth_date = birth_date.ok_or(ConfigurationError::MissingBirthDate)?;
    let days_since_birth = target_date.signed_duration_since(birth_date).num_days();

    Ok(BiorhythmSnapshot {
        date: target_date,
        days_since_birth,
        physical: reading(Cycle::Physical, days_since_birth),
        emotional: reading(Cycle::Emotional, days_since_birth),
        intellectual: reading(Cycle::Intellectual, days_since_birth),
    })
}

/// One snapshot per date in `start..=end`; empty when `start > end`.
pub fn snapshot_range(
    birth_date: Option<NaiveDate>,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<Vec<BiorhythmSnapshot>, ConfigurationError> {
    start
        .iter_days()
        .take_while(|date| *date <= end)
        .map(|date| snapshot(birth_date, date))
        .collect()
}

/// Raw sine value for a cycle after `days` days.
pub fn cycle_value(days: i64, cycle: Cycle) -> f64 {
    (2.0 * PI * days as f64 / f64::from(cycle.length_days())).sin()
}

pub fn status_for(value: f64) -> CycleStatus {
    if value.abs() < CRITICAL_THRESHOLD {
        CycleStatus::Critical
    } else if value > 0.0 {
        CycleStatus::Positive
    } else {
        CycleStatus::Negative
    }
}

fn reading(cycle: Cycle, days: i64) -> CycleReading {
    let value = cycle_value(days, cycle);
    CycleReading {
        value: (value * 1000.0).round() / 1000.0,
        status: status_for(value),
        percentage: ((value + 1.0) * 50.0).round().clamp(0.0, 100.0) as u8,
        cycle_length: cycle.length_days(),
    }
}
