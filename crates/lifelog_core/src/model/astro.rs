//! Lunar phase records.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One of the eight canonical lunar phases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MoonPhase {
    NewMoon,
    WaxingCrescent,
    FirstQuarter,
    WaxingGibbous,
    FullMoon,
    WaningGibbous,
    LastQuarter,
    WaningCrescent,
}

impl MoonPhase {
    /// Display name, also the persisted form.
    pub fn label(self) -> &'static str {
        match self {
            Self::NewMoon => "New Moon",
            Self::WaxingCrescent => "Waxing Crescent",
            Self::FirstQuarter => "First Quarter",
            Self::WaxingGibbous => "Waxing Gibbous",
            Self::FullMoon => "Full Moon",
            Self::WaningGibbous => "Waning Gibbous",
            Self::LastQuarter => "Last Quarter",
            Self::WaningCrescent => "Waning Crescent",
        }
    }

    pub fn emoji(self) -> &'static str {
        match self {
            Self::NewMoon => "🌑",
            Self::WaxingCrescent => "🌒",
            Self::FirstQuarter => "🌓",
            Self::WaxingGibbous => "🌔",
            Self::FullMoon => "🌕",
            Self::WaningGibbous => "🌖",
            Self::LastQuarter => "🌗",
            Self::WaningCrescent => "🌘",
        }
    }

    pub fn from_label(value: &str) -> Option<Self> {
        match value {
            "New Moon" => Some(Self::NewMoon),
            "Waxing Crescent" => Some(Self::WaxingCrescent),
            "First Quarter" => Some(Self::FirstQuarter),
            "Waxing Gibbous" => Some(Self::WaxingGibbous),
            "Full Moon" => Some(Self::FullMoon),
            "Waning Gibbous" => Some(Self::WaningGibbous),
            "Last Quarter" => Some(Self::LastQuarter),
            "Waning Crescent" => Some(Self::WaningCrescent),
            _ => None,
        }
    }
}

/// Moon phase for a calendar date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoonPhaseRecord {
    pub date: NaiveDate,
    pub phase_name: MoonPhase,
    /// `0..=100`.
    pub illumination_percent: f64,
}
