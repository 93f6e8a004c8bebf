//! Timeline entry and entry type definitions.
//!
//! # Responsibility
//! - Define the hourly timeline record written by user actions.
//! - Describe each category (label, icon, value kind, range) for the registry.
//!
//! # Invariants
//! - `TimelineEntry::timestamp` is always aligned to the start of its hour.
//! - Categories are lowercase slugs (`[a-z][a-z0-9_]*`, max 32 chars).
//! - Numeric/select definitions carry an inclusive `[min, max]` range.

use crate::model::validation::ValidationError;
use chrono::{NaiveDate, NaiveDateTime, Timelike};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

static CATEGORY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z][a-z0-9_]{0,31}$").expect("valid category regex"));

pub const CATEGORY_MOOD: &str = "mood";
pub const CATEGORY_ENERGY: &str = "energy";
pub const CATEGORY_STRESS: &str = "stress";
pub const CATEGORY_SLEEP_QUALITY: &str = "sleep_quality";
pub const CATEGORY_CAFFEINE: &str = "caffeine";
pub const CATEGORY_NOTE: &str = "note";

/// One user-logged value occupying an hour slot on the timeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineEntry {
    /// Start of the hour slot this entry belongs to.
    pub timestamp: NaiveDateTime,
    pub category: String,
    pub numeric_value: Option<f64>,
    pub text_value: Option<String>,
    pub note: Option<String>,
}

impl TimelineEntry {
    /// Creates an entry with no payload; the timestamp is aligned to its hour.
    pub fn new(timestamp: NaiveDateTime, category: impl Into<String>) -> Self {
        Self {
            timestamp: hour_slot(timestamp),
            category: category.into(),
            numeric_value: None,
            text_value: None,
            note: None,
        }
    }

    /// Creates a numeric entry (mood, energy, caffeine, ...).
    pub fn numeric(timestamp: NaiveDateTime, category: impl Into<String>, value: f64) -> Self {
        let mut entry = Self::new(timestamp, category);
        entry.numeric_value = Some(value);
        entry
    }

    /// Creates a free-text entry.
    pub fn text(
        timestamp: NaiveDateTime,
        category: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        let mut entry = Self::new(timestamp, category);
        entry.text_value = Some(value.into());
        entry
    }

    /// Attaches a note to the entry.
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }

    pub fn date(&self) -> NaiveDate {
        self.timestamp.date()
    }

    /// Hour of day, `0..=23`.
    pub fn hour(&self) -> u32 {
        self.timestamp.hour()
    }

    /// Checks structural invariants that hold regardless of the registry.
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_category(&self.category)?;
        if let Some(value) = self.numeric_value {
            if !value.is_finite() {
                return Err(ValidationError::ValueOutOfRange {
                    category: self.category.clone(),
                    value,
                    min: f64::MIN,
                    max: f64::MAX,
                });
            }
        }
        Ok(())
    }
}

/// Truncates a timestamp to the start of its hour.
pub fn hour_slot(timestamp: NaiveDateTime) -> NaiveDateTime {
    timestamp
        .date()
        .and_hms_opt(timestamp.hour(), 0, 0)
        .unwrap_or(timestamp)
}

/// Rejects categories that are not lowercase slugs.
pub fn validate_category(category: &str) -> Result<(), ValidationError> {
    if CATEGORY_RE.is_match(category) {
        Ok(())
    } else {
        Err(ValidationError::InvalidCategory(category.to_string()))
    }
}

/// How values of a category are captured and interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueKind {
    /// Continuous value within `[min, max]`.
    Numeric,
    /// Ordinal choice encoded as a number within `[min, max]`.
    Select,
    /// Free text in `text_value`.
    Text,
    /// `0` or `1` in `numeric_value`.
    Boolean,
}

impl ValueKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Numeric => "numeric",
            Self::Select => "select",
            Self::Text => "text",
            Self::Boolean => "boolean",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "numeric" => Some(Self::Numeric),
            "select" => Some(Self::Select),
            "text" => Some(Self::Text),
            "boolean" => Some(Self::Boolean),
            _ => None,
        }
    }
}

/// Registry metadata for one timeline category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntryTypeDefinition {
    pub category: String,
    pub display_label: String,
    pub icon: String,
    pub value_kind: ValueKind,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub default: Option<f64>,
    pub description: String,
}

impl EntryTypeDefinition {
    fn ranged(
        category: &str,
        display_label: &str,
        icon: &str,
        value_kind: ValueKind,
        (min, max, default): (f64, f64, f64),
        description: &str,
    ) -> Self {
        Self {
            category: category.to_string(),
            display_label: display_label.to_string(),
            icon: icon.to_string(),
            value_kind,
            min: Some(min),
            max: Some(max),
            default: Some(default),
            description: description.to_string(),
        }
    }

    fn unranged(
        category: &str,
        display_label: &str,
        icon: &str,
        value_kind: ValueKind,
        description: &str,
    ) -> Self {
        Self {
            category: category.to_string(),
            display_label: display_label.to_string(),
            icon: icon.to_string(),
            value_kind,
            min: None,
            max: None,
            default: None,
            description: description.to_string(),
        }
    }

    /// Checks an entry's payload against this definition.
    ///
    /// # Errors
    /// - `MissingValue` when a numeric/select/boolean entry has no number.
    /// - `ValueOutOfRange` when the number falls outside `[min, max]`, or a
    ///   boolean is neither `0` nor `1`.
    pub fn check_value(&self, entry: &TimelineEntry) -> Result<(), ValidationError> {
        match self.value_kind {
            ValueKind::Text => Ok(()),
            ValueKind::Boolean => match entry.numeric_value {
                None => Err(self.missing_value()),
                Some(value) if value == 0.0 || value == 1.0 => Ok(()),
                Some(value) => Err(self.out_of_range(value, 0.0, 1.0)),
            },
            ValueKind::Numeric | ValueKind::Select => {
                let value = entry.numeric_value.ok_or_else(|| self.missing_value())?;
                match (self.min, self.max) {
                    (Some(min), Some(max)) if value < min || value > max => {
                        Err(self.out_of_range(value, min, max))
                    }
                    _ => Ok(()),
                }
            }
        }
    }

    fn missing_value(&self) -> ValidationError {
        ValidationError::MissingValue {
            category: self.category.clone(),
        }
    }

    fn out_of_range(&self, value: f64, min: f64, max: f64) -> ValidationError {
        ValidationError::ValueOutOfRange {
            category: self.category.clone(),
            value,
            min,
            max,
        }
    }
}

/// Default category set seeded into a fresh registry.
#[rustfmt::skip]
pub fn default_entry_types() -> Vec<EntryTypeDefinition> {
    use ValueKind::{Boolean, Numeric, Select, Text};

    vec![
        EntryTypeDefinition::ranged(CATEGORY_MOOD, "Mood", "😊", Numeric, (1.0, 5.0, 3.0), "Overall mood, 1 (low) to 5 (great)"),
        EntryTypeDefinition::ranged(CATEGORY_ENERGY, "Energy", "⚡", Numeric, (1.0, 5.0, 3.0), "Energy level, 1 (drained) to 5 (energetic)"),
        EntryTypeDefinition::ranged(CATEGORY_STRESS, "Stress", "😰", Numeric, (1.0, 5.0, 3.0), "Stress level, 1 (calm) to 5 (overwhelmed)"),
        EntryTypeDefinition::ranged(CATEGORY_SLEEP_QUALITY, "Sleep quality", "😴", Numeric, (1.0, 5.0, 3.0), "Quality of last night's sleep"),
        EntryTypeDefinition::ranged(CATEGORY_CAFFEINE, "Caffeine", "☕", Numeric, (0.0, 10.0, 1.0), "Caffeinated drinks consumed in this hour"),
        EntryTypeDefinition::ranged("alcohol", "Alcohol", "🍷", Numeric, (0.0, 10.0, 1.0), "Alcoholic drinks consumed in this hour"),
        EntryTypeDefinition::ranged("exercise", "Exercise", "🏃", Select, (0.0, 3.0, 1.0), "Exercise intensity: 0 none, 1 light, 2 moderate, 3 intense"),
        EntryTypeDefinition::ranged("meal", "Meal", "🍽️", Boolean, (0.0, 1.0, 1.0), "A meal was eaten in this hour"),
        EntryTypeDefinition::ranged("medication", "Medication", "💊", Boolean, (0.0, 1.0, 1.0), "Medication taken in this hour"),
        EntryTypeDefinition::unranged(CATEGORY_NOTE, "Note", "📝", Text, "Free-form note"),
    ]
}

#[cfg(test)]
mod tests {
    use super::{default_entry_types, hour_slot, validate_category, TimelineEntry, ValueKind};
    use crate::model::validation::ValidationError;
    use chrono::NaiveDate;

    fn at(hour: u32, minute: u32) -> chrono::NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 6, 10)
            .unwrap()
            .and_hms_opt(hour, minute, 42)
            .unwrap()
    }

    #[test]
    fn entries_are_aligned_to_hour_slots() {
        let entry = TimelineEntry::numeric(at(8, 37), "mood", 4.0);
        assert_eq!(entry.timestamp, hour_slot(at(8, 0)));
        assert_eq!(entry.hour(), 8);
    }

    #[test]
    fn category_must_be_lowercase_slug() {
        assert!(validate_category("sleep_quality").is_ok());
        assert!(validate_category("Mood").is_err());
        assert!(validate_category("1mood").is_err());
        assert!(validate_category("").is_err());
    }

    #[test]
    fn numeric_defaults_carry_ranges() {
        for definition in default_entry_types() {
            if matches!(definition.value_kind, ValueKind::Numeric | ValueKind::Select) {
                let (min, max) = (definition.min.unwrap(), definition.max.unwrap());
                assert!(min <= max, "{}", definition.category);
            }
        }
    }

    #[test]
    fn check_value_enforces_inclusive_range() {
        let mood = default_entry_types()
            .into_iter()
            .find(|definition| definition.category == "mood")
            .unwrap();
        assert!(mood.check_value(&TimelineEntry::numeric(at(9, 0), "mood", 5.0)).is_ok());
        let err = mood
            .check_value(&TimelineEntry::numeric(at(9, 0), "mood", 6.0))
            .unwrap_err();
        assert!(matches!(err, ValidationError::ValueOutOfRange { .. }));
        let err = mood.check_value(&TimelineEntry::new(at(9, 0), "mood")).unwrap_err();
        assert!(matches!(err, ValidationError::MissingValue { .. }));
    }
}
