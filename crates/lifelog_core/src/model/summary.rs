//! Per-day analytical summary assembled by the aggregation service.

use crate::model::astro::MoonPhaseRecord;
use crate::model::biorhythm::BiorhythmSnapshot;
use crate::model::entry::TimelineEntry;
use crate::model::environment::EnvironmentalRecord;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Everything known about one calendar date.
///
/// `None` means "unknown", never zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailySummary {
    pub date: NaiveDate,
    /// Mean of all mood entries of the day.
    pub avg_mood: Option<f64>,
    pub avg_energy: Option<f64>,
    pub avg_stress: Option<f64>,
    /// First chronological sleep quality entry of the day.
    pub sleep_quality: Option<f64>,
    /// Sum of caffeine entries of the day.
    pub caffeine_total: Option<f64>,
    /// Computed locally from the configured latitude.
    pub daylight_hours: Option<f64>,
    pub environment: Option<EnvironmentalRecord>,
    pub moon_phase: MoonPhaseRecord,
    pub biorhythm: Option<BiorhythmSnapshot>,
    /// Entries of the day grouped by category, each list chronological.
    pub entries_by_category: BTreeMap<String, Vec<TimelineEntry>>,
    /// Text values and notes of the day in chronological order.
    pub notes: Vec<String>,
}

impl DailySummary {
    pub fn entry_count(&self) -> usize {
        self.entries_by_category.values().map(Vec::len).sum()
    }

    /// Whether any user-logged metric is present.
    pub fn has_metrics(&self) -> bool {
        self.avg_mood.is_some()
            || self.avg_energy.is_some()
            || self.avg_stress.is_some()
            || self.sleep_quality.is_some()
            || self.caffeine_total.is_some()
    }
}
