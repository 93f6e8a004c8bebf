//! Per-day aggregation of timeline entries and environmental enrichment.
//!
//! # Responsibility
//! - Build one `DailySummary` per calendar date in a range.
//! - Re-bucket raw entries into a date -> hour -> entries view.
//!
//! # Invariants
//! - A range summary has exactly one element per date, ascending.
//! - Days without entries or without environmental data are not errors.
//! - mood/energy/stress are averaged over every entry of the day; sleep
//!   quality is the first chronological value.

use crate::calc::astronomy::daylight_hours;
use crate::calc::biorhythm;
use crate::config::Settings;
use crate::model::entry::{
    TimelineEntry, CATEGORY_CAFFEINE, CATEGORY_ENERGY, CATEGORY_MOOD, CATEGORY_SLEEP_QUALITY,
    CATEGORY_STRESS,
};
use crate::model::summary::DailySummary;
use crate::model::validation::{parse_date, ValidationError};
use crate::repo::timeline_repo::TimelineStore;
use crate::repo::RepoError;
use crate::service::environment_cache::EnvironmentLookup;
use chrono::NaiveDate;
use log::{debug, info};
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;

/// Date -> hour of day (`0..=23`) -> entries in that slot.
pub type TimelineView = BTreeMap<NaiveDate, BTreeMap<u32, Vec<TimelineEntry>>>;

#[derive(Debug)]
pub enum AggregationError {
    InvalidRange { start: NaiveDate, end: NaiveDate },
    Validation(ValidationError),
    Repo(RepoError),
}

impl Display for AggregationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidRange { start, end } => {
                write!(f, "invalid range: start {start} is after end {end}")
            }
            Self::Validation(err) => write!(f, "{err}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for AggregationError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidRange { .. } => None,
            Self::Validation(err) => Some(err),
            Self::Repo(err) => Some(err),
        }
    }
}

impl From<ValidationError> for AggregationError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<RepoError> for AggregationError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

pub struct AggregationEngine<T, E> {
    timeline: T,
    environment: E,
    settings: Settings,
}

impl<T: TimelineStore, E: EnvironmentLookup> AggregationEngine<T, E> {
    pub fn new(timeline: T, environment: E, settings: Settings) -> Self {
        Self {
            timeline,
            environment,
            settings,
        }
    }

    pub fn daily_summary(&self, date: NaiveDate) -> Result<DailySummary, AggregationError> {
        let entries = self.timeline.query(date, date)?;
        Ok(self.build_summary(date, &entries))
    }

    /// One summary per date in `start..=end`, ascending.
    pub fn range_summary(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<DailySummary>, AggregationError> {
        ensure_ordered(start, end)?;
        let started_at = Instant::now();

        let mut by_date: BTreeMap<NaiveDate, Vec<TimelineEntry>> = BTreeMap::new();
        for entry in self.timeline.query(start, end)? {
            by_date.entry(entry.date()).or_default().push(entry);
        }

        let summaries: Vec<DailySummary> = start
            .iter_days()
            .take_while(|date| *date <= end)
            .map(|date| {
                let entries = by_date.remove(&date).unwrap_or_default();
                self.build_summary(date, &entries)
            })
            .collect();

        info!(
            "event=range_summary module=service status=ok start={} end={} days={} duration_ms={}",
            start,
            end,
            summaries.len(),
            started_at.elapsed().as_millis()
        );
        Ok(summaries)
    }

    /// Parses `YYYY-MM-DD` and delegates to `daily_summary`.
    pub fn daily_summary_str(&self, date: &str) -> Result<DailySummary, AggregationError> {
        self.daily_summary(parse_date(date)?)
    }

    pub fn range_summary_str(
        &self,
        start: &str,
        end: &str,
    ) -> Result<Vec<DailySummary>, AggregationError> {
        self.range_summary(parse_date(start)?, parse_date(end)?)
    }

    /// Groups raw entries by calendar date and hour of day.
    ///
    /// Dates without entries are absent from the view. One hour slot holds
    /// several entries when their categories differ.
    pub fn timeline_view(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<TimelineView, AggregationError> {
        ensure_ordered(start, end)?;
        let mut view = TimelineView::new();
        for entry in self.timeline.query(start, end)? {
            view.entry(entry.date())
                .or_default()
                .entry(entry.hour())
                .or_default()
                .push(entry);
        }
        Ok(view)
    }

    fn build_summary(&self, date: NaiveDate, entries: &[TimelineEntry]) -> DailySummary {
        let mut entries_by_category: BTreeMap<String, Vec<TimelineEntry>> = BTreeMap::new();
        let mut notes = Vec::new();
        for entry in entries {
            entries_by_category
                .entry(entry.category.clone())
                .or_default()
                .push(entry.clone());
            notes.extend(entry.text_value.iter().cloned());
            notes.extend(entry.note.iter().cloned());
        }

        let values = |category: &str| {
            entries_by_category
                .get(category)
                .into_iter()
                .flatten()
                .filter_map(|entry| entry.numeric_value)
        };

        let avg_mood = mean(values(CATEGORY_MOOD));
        let avg_energy = mean(values(CATEGORY_ENERGY));
        let avg_stress = mean(values(CATEGORY_STRESS));
        let sleep_quality = values(CATEGORY_SLEEP_QUALITY).next();
        let caffeine_total = values(CATEGORY_CAFFEINE).reduce(|total, cups| total + cups);

        let biorhythm = match biorhythm::snapshot(self.settings.birth_date, date) {
            Ok(snapshot) => Some(snapshot),
            Err(err) => {
                debug!(
                    "event=daily_summary module=service status=degraded date={} field=biorhythm error={}",
                    date, err
                );
                None
            }
        };

        DailySummary {
            date,
            avg_mood,
            avg_energy,
            avg_stress,
            sleep_quality,
            caffeine_total,
            daylight_hours: self
                .settings
                .latitude
                .and_then(|latitude| daylight_hours(date, latitude).ok()),
            environment: self.environment.environment(date),
            moon_phase: self.environment.moon_phase(date),
            biorhythm,
            entries_by_category,
            notes,
        }
    }
}

fn ensure_ordered(start: NaiveDate, end: NaiveDate) -> Result<(), AggregationError> {
    if start > end {
        return Err(AggregationError::InvalidRange { start, end });
    }
    Ok(())
}

fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, count) = values.fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    (count > 0).then(|| sum / count as f64)
}
