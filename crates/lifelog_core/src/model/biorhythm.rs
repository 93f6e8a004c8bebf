//! Biorhythm cycle readings.
//!
//! Snapshots are computed on demand and never persisted.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// The three classic biorhythm cycles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Cycle {
    Physical,
    Emotional,
    Intellectual,
}

impl Cycle {
    pub const ALL: [Cycle; 3] = [Cycle::Physical, Cycle::Emotional, Cycle::Intellectual];

    /// Period in days.
    pub fn length_days(self) -> u32 {
        match self {
            Self::Physical => 23,
            Self::Emotional => 28,
            Self::Intellectual => 33,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Physical => "physical",
            Self::Emotional => "emotional",
            Self::Intellectual => "intellectual",
        }
    }

    pub fn emoji(self, status: CycleStatus) -> &'static str {
        match (self, status) {
            (Self::Physical, CycleStatus::Positive) => "💪",
            (Self::Physical, CycleStatus::Negative) => "😴",
            (Self::Physical, CycleStatus::Critical) => "⚠️",
            (Self::Emotional, CycleStatus::Positive) => "😊",
            (Self::Emotional, CycleStatus::Negative) => "😔",
            (Self::Emotional, CycleStatus::Critical) => "🤔",
            (Self::Intellectual, CycleStatus::Positive) => "🧠",
            (Self::Intellectual, CycleStatus::Negative) => "😵",
            (Self::Intellectual, CycleStatus::Critical) => "💭",
        }
    }

    /// Human-readable hint for a cycle in the given status.
    pub fn description(self, status: CycleStatus) -> &'static str {
        match (self, status) {
            (Self::Physical, CycleStatus::Positive) => "High physical energy and stamina",
            (Self::Physical, CycleStatus::Negative) => "Low physical energy, rest recommended",
            (Self::Physical, CycleStatus::Critical) => "Physical transition period, be cautious",
            (Self::Emotional, CycleStatus::Positive) => "Positive emotional state and creativity",
            (Self::Emotional, CycleStatus::Negative) => {
                "Lower emotional resilience, practice self-care"
            }
            (Self::Emotional, CycleStatus::Critical) => "Emotional sensitivity heightened",
            (Self::Intellectual, CycleStatus::Positive) => {
                "Sharp mental focus and analytical thinking"
            }
            (Self::Intellectual, CycleStatus::Negative) => {
                "Reduced mental clarity, avoid complex decisions"
            }
            (Self::Intellectual, CycleStatus::Critical) => "Mental transition, good for reflection",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CycleStatus {
    Positive,
    Negative,
    /// `|value| < 0.1`: the cycle is crossing zero.
    Critical,
}

/// One cycle's value on a given day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CycleReading {
    /// `-1.0..=1.0`.
    pub value: f64,
    pub status: CycleStatus,
    /// `0..=100`.
    pub percentage: u8,
    pub cycle_length: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BiorhythmSnapshot {
    pub date: NaiveDate,
    /// Negative when the target date precedes the birth date.
    pub days_since_birth: i64,
    pub physical: CycleReading,
    pub emotional: CycleReading,
    pub intellectual: CycleReading,
}

impl BiorhythmSnapshot {
    pub fn reading(&self, cycle: Cycle) -> &CycleReading {
        match cycle {
            Cycle::Physical => &self.physical,
            Cycle::Emotional => &self.emotional,
            Cycle::Intellectual => &self.intellectual,
        }
    }
}
