//! Moon phase and daylight duration.
//!
//! A calendar date is evaluated at 12:00 UTC for lunar calculations.

use crate::model::astro::{MoonPhase, MoonPhaseRecord};
use crate::model::validation::{check_latitude, ValidationError};
use chrono::{DateTime, Datelike, NaiveDate, NaiveTime, TimeZone, Utc};

/// Mean length of a lunation in days.
pub const SYNODIC_MONTH_DAYS: f64 = 29.530588853;

const SECONDS_PER_DAY: f64 = 86_400.0;
const AXIAL_TILT_DEGREES: f64 = 23.45;

/// Phase boundaries over the cycle position; each bin is centred on a phase.
const PHASE_THRESHOLDS: [(f64, MoonPhase); 8] = [
    (0.0625, MoonPhase::NewMoon),
    (0.1875, MoonPhase::WaxingCrescent),
    (0.3125, MoonPhase::FirstQuarter),
    (0.4375, MoonPhase::WaxingGibbous),
    (0.5625, MoonPhase::FullMoon),
    (0.6875, MoonPhase::WaningGibbous),
    (0.8125, MoonPhase::LastQuarter),
    (0.9375, MoonPhase::WaningCrescent),
];

/// Known new moon: 2000-01-06T18:14:00Z.
pub fn reference_new_moon() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2000, 1, 6, 18, 14, 0)
        .single()
        .unwrap_or_default()
}

/// Position within the lunar cycle at `instant`, in `[0, 1)`.
pub fn cycle_position(instant: DateTime<Utc>) -> f64 {
    let elapsed = instant.signed_duration_since(reference_new_moon());
    let days_since = elapsed.num_seconds() as f64 / SECONDS_PER_DAY;
    let position = days_since.rem_euclid(SYNODIC_MONTH_DAYS) / SYNODIC_MONTH_DAYS;
    // rem_euclid can round up to the modulus itself for tiny negative inputs.
    if position >= 1.0 {
        0.0
    } else {
        position
    }
}

/// Phase and illumination percentage at an exact instant.
pub fn moon_phase_at(instant: DateTime<Utc>) -> (MoonPhase, f64) {
    let position = cycle_position(instant);
    let illumination = if position <= 0.5 {
        2.0 * position * 100.0
    } else {
        2.0 * (1.0 - position) * 100.0
    };
    (phase_for_position(position), illumination)
}

/// Moon phase for a calendar date.
pub fn moon_phase(date: NaiveDate) -> MoonPhaseRecord {
    let (phase_name, illumination_percent) = moon_phase_at(midday_utc(date));
    MoonPhaseRecord {
        date,
        phase_name,
        illumination_percent,
    }
}

fn phase_for_position(position: f64) -> MoonPhase {
    PHASE_THRESHOLDS
        .iter()
        .find(|(upper, _)| position < *upper)
        .map_or(MoonPhase::NewMoon, |(_, phase)| *phase)
}

fn midday_utc(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::from_hms_opt(12, 0, 0).unwrap_or(NaiveTime::MIN))
        .and_utc()
}

/// Solar declination in degrees for a day of year.
pub fn solar_declination(day_of_year: u32) -> f64 {
    let angle = 360.0 * (284.0 + f64::from(day_of_year)) / 365.0;
    AXIAL_TILT_DEGREES * angle.to_radians().sin()
}

/// Hours between sunrise and sunset at `latitude` degrees.
///
/// Returns `0.0` during polar night and `24.0` during polar day.
///
/// # Errors
/// - `LatitudeOutOfRange` when `latitude` is outside `[-90, 90]`.
pub fn daylight_hours(date: NaiveDate, latitude: f64) -> Result<f64, ValidationError> {
    let latitude = check_latitude(latitude)?;
    let declination = solar_declination(date.ordinal());
    let cos_hour_angle = -latitude.to_radians().tan() * declination.to_radians().tan();

    if cos_hour_angle > 1.0 {
        return Ok(0.0);
    }
    if cos_hour_angle < -1.0 {
        return Ok(24.0);
    }

    let hour_angle = cos_hour_angle.acos().to_degrees();
    Ok((2.0 * hour_angle / 15.0).clamp(0.0, 24.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn reference_date_is_new_moon() {
        let record = moon_phase(date(2000, 1, 6));
        assert_eq!(record.phase_name, MoonPhase::NewMoon);
        assert!(record.illumination_percent < 2.0, "{}", record.illumination_percent);
    }

    #[test]
    fn exact_reference_instant_has_zero_illumination() {
        let (phase, illumination) = moon_phase_at(reference_new_moon());
        assert_eq!(phase, MoonPhase::NewMoon);
        assert!(illumination.abs() < 1e-9);
    }

    #[test]
    fn moon_phase_is_periodic_over_synodic_month() {
        let lunation = Duration::seconds((SYNODIC_MONTH_DAYS * SECONDS_PER_DAY).round() as i64);
        let mut instant = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        for _ in 0..40 {
            let (phase_a, illum_a) = moon_phase_at(instant);
            let (phase_b, illum_b) = moon_phase_at(instant + lunation);
            assert!((illum_a - illum_b).abs() < 0.01, "{instant}");
            assert_eq!(phase_a, phase_b, "{instant}");
            instant += Duration::hours(19);
        }
    }

    #[test]
    fn half_cycle_after_reference_is_full_moon() {
        let half = Duration::seconds((SYNODIC_MONTH_DAYS * SECONDS_PER_DAY / 2.0) as i64);
        let (phase, illumination) = moon_phase_at(reference_new_moon() + half);
        assert_eq!(phase, MoonPhase::FullMoon);
        assert!(illumination > 99.9);
    }

    #[test]
    fn dates_before_reference_stay_in_range() {
        let record = moon_phase(date(1969, 7, 20));
        assert!((0.0..=100.0).contains(&record.illumination_percent));
        assert_eq!(record.phase_name, MoonPhase::FirstQuarter);
    }

    #[test]
    fn equator_has_roughly_twelve_hours_all_year() {
        let mut day = date(2023, 1, 1);
        while day.year() == 2023 {
            let hours = daylight_hours(day, 0.0).unwrap();
            assert!((hours - 12.0).abs() < 0.5, "{day}: {hours}");
            day = day.succ_opt().unwrap();
        }
    }

    #[test]
    fn daylight_is_symmetric_around_june_solstice() {
        let solstice = date(2023, 6, 21);
        for offset in [10, 30, 60, 90] {
            let before = daylight_hours(solstice - Duration::days(offset), 52.4).unwrap();
            let after = daylight_hours(solstice + Duration::days(offset), 52.4).unwrap();
            assert!((before - after).abs() < 0.1, "offset {offset}: {before} vs {after}");
        }
    }

    #[test]
    fn polar_regions_clamp_to_full_day_or_night() {
        assert_eq!(daylight_hours(date(2023, 6, 21), 80.0).unwrap(), 24.0);
        assert_eq!(daylight_hours(date(2023, 12, 21), 80.0).unwrap(), 0.0);
        assert_eq!(daylight_hours(date(2023, 12, 21), -80.0).unwrap(), 24.0);
    }

    #[test]
    fn daylight_stays_within_bounds_near_polar_circle() {
        for latitude in [65.0, 66.0, 66.5, 67.0, 68.0] {
            let mut day = date(2023, 1, 1);
            while day.year() == 2023 {
                let hours = daylight_hours(day, latitude).unwrap();
                assert!((0.0..=24.0).contains(&hours));
                day = day.succ_opt().unwrap();
            }
        }
    }

    #[test]
    fn invalid_latitude_is_rejected() {
        let err = daylight_hours(date(2023, 6, 21), 91.0).unwrap_err();
        assert_eq!(err, ValidationError::LatitudeOutOfRange(91.0));
    }
}
