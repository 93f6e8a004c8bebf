//! Input validation errors and date parsing helpers.

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use std::error::Error;
use std::fmt::{Display, Formatter};

static ISO_DATE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").expect("valid iso date regex"));

/// Malformed caller input. Never produced by network or storage failures.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// Date string is not a real `YYYY-MM-DD` calendar date.
    MalformedDate(String),
    /// Date too close to the calendar limits to derive its provider query window.
    DateOutOfRange(NaiveDate),
    /// Latitude outside `[-90, 90]` degrees.
    LatitudeOutOfRange(f64),
    /// Longitude outside `[-180, 180]` degrees.
    LongitudeOutOfRange(f64),
    /// Category is not a lowercase slug.
    InvalidCategory(String),
    /// Category is not present in the entry type registry.
    UnknownCategory(String),
    /// Numeric/select category written without a numeric value.
    MissingValue { category: String },
    /// Ranged entry type declared without a usable `[min, max]`.
    InvalidRange {
        category: String,
        min: Option<f64>,
        max: Option<f64>,
    },
    /// Numeric value outside the inclusive range declared by the entry type.
    ValueOutOfRange {
        category: String,
        value: f64,
        min: f64,
        max: f64,
    },
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MalformedDate(value) => {
                write!(f, "malformed date `{value}`; expected YYYY-MM-DD")
            }
            Self::DateOutOfRange(date) => write!(f, "date {date} is outside the supported range"),
            Self::LatitudeOutOfRange(value) => {
                write!(f, "latitude {value} is outside [-90, 90]")
            }
            Self::LongitudeOutOfRange(value) => {
                write!(f, "longitude {value} is outside [-180, 180]")
            }
            Self::InvalidCategory(value) => write!(f, "invalid category `{value}`"),
            Self::UnknownCategory(value) => write!(f, "unknown category `{value}`"),
            Self::MissingValue { category } => {
                write!(f, "category `{category}` requires a numeric value")
            }
            Self::InvalidRange { category, min, max } => {
                write!(f, "invalid range for `{category}`: min={min:?} max={max:?}")
            }
            Self::ValueOutOfRange {
                category,
                value,
                min,
                max,
            } => write!(
                f,
                "value {value} for `{category}` is outside [{min}, {max}]"
            ),
        }
    }
}

impl Error for ValidationError {}

/// Parses a strict `YYYY-MM-DD` calendar date.
///
/// Leading/trailing whitespace is ignored; anything else (times, single-digit
/// months, impossible dates) is rejected.
pub fn parse_date(value: &str) -> Result<NaiveDate, ValidationError> {
    let trimmed = value.trim();
    if !ISO_DATE_RE.is_match(trimmed) {
        return Err(ValidationError::MalformedDate(value.to_string()));
    }
    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .map_err(|_| ValidationError::MalformedDate(value.to_string()))
}

/// Checks a latitude in degrees.
pub fn check_latitude(latitude: f64) -> Result<f64, ValidationError> {
    if latitude.is_finite() && (-90.0..=90.0).contains(&latitude) {
        Ok(latitude)
    } else {
        Err(ValidationError::LatitudeOutOfRange(latitude))
    }
}

/// Checks a longitude in degrees.
pub fn check_longitude(longitude: f64) -> Result<f64, ValidationError> {
    if longitude.is_finite() && (-180.0..=180.0).contains(&longitude) {
        Ok(longitude)
    } else {
        Err(ValidationError::LongitudeOutOfRange(longitude))
    }
}

#[cfg(test)]
mod tests {
    use super::{check_latitude, parse_date, ValidationError};
    use chrono::NaiveDate;

    #[test]
    fn parse_date_accepts_iso_dates() {
        assert_eq!(
            parse_date(" 2024-06-10 ").unwrap(),
            NaiveDate::from_ymd_opt(2024, 6, 10).unwrap()
        );
    }

    #[test]
    fn parse_date_rejects_loose_or_impossible_values() {
        for raw in ["2024-6-10", "2024-02-30", "10/06/2024", "2024-06-10T08:00", ""] {
            let err = parse_date(raw).expect_err("malformed date must be rejected");
            assert!(matches!(err, ValidationError::MalformedDate(_)), "{raw}");
        }
    }

    #[test]
    fn latitude_bounds_are_inclusive() {
        assert!(check_latitude(90.0).is_ok());
        assert!(check_latitude(-90.0).is_ok());
        assert!(check_latitude(90.5).is_err());
        assert!(check_latitude(f64::NAN).is_err());
    }
}
