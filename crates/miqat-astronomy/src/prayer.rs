//! Prayer Times Calculation Module.
//!
//! Computes the six daily times from the sun's declination and equation of
//! time: Dhuhr at solar noon, twilight times from the hour angle at a given
//! depression, Asr from the shadow-length ratio.

use chrono::{DateTime, Duration, FixedOffset, NaiveDate};
use miqat_types::{
    AsrMethod, CalculationMethod, GeoCoordinate, MidnightMode, MiqatError, PrayerTimes, TwilightRule,
};

use crate::solar::{darccos, darccot, dcos, dsin, dtan, fix_hour, julian_date, sun_position};

/// Depression of the sun's centre at sunrise and sunset (refraction plus
/// solar semi-diameter).
pub const RISE_SET_ANGLE: f64 = 0.833;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    Morning,
    Evening,
}

/// Solar geometry of one day at one place.
struct SolarDay {
    /// Julian date corrected to local longitude.
    jd: f64,
    lat: f64,
}

impl SolarDay {
    /// Solar noon in hours (UT + longitude correction).
    fn mid_day(&self, t: f64) -> f64 {
        let (_, eqt) = sun_position(self.jd + t);
        fix_hour(12.0 - eqt)
    }

    /// Time at which the sun is `angle` degrees below the horizon.
    /// NaN when it never gets there that day.
    fn angle_time(&self, angle: f64, t: f64, side: Side) -> f64 {
        let (decl, _) = sun_position(self.jd + t);
        let noon = self.mid_day(t);
        let cos_h = (-dsin(angle) - dsin(decl) * dsin(self.lat)) / (dcos(decl) * dcos(self.lat));
        if !(-1.0..=1.0).contains(&cos_h) {
            return f64::NAN;
        }
        let hours = darccos(cos_h) / 15.0;
        match side {
            Side::Morning => noon - hours,
            Side::Evening => noon + hours,
        }
    }

    /// Asr: shadow equals `factor` times the object length plus its noon shadow.
    fn asr_time(&self, factor: f64, t: f64) -> f64 {
        let (decl, _) = sun_position(self.jd + t);
        let altitude = darccot(factor + dtan((self.lat - decl).abs()));
        self.angle_time(-altitude, t, Side::Evening)
    }
}

/// Raw times in fractional hours, local mean time.
#[derive(Debug, Clone, Copy)]
struct RawTimes {
    fajr: f64,
    sunrise: f64,
    dhuhr: f64,
    asr: f64,
    maghrib: f64,
    isha: f64,
    midnight: f64,
}

fn compute_raw(
    date: NaiveDate,
    coords: GeoCoordinate,
    method: CalculationMethod,
    asr_method: AsrMethod,
) -> RawTimes {
    let params = method.params();
    let day = SolarDay {
        jd: julian_date(date) - coords.lng / (15.0 * 24.0),
        lat: coords.lat,
    };

    // Initial guesses as day fractions; one pass is accurate to well under a minute.
    let fajr = day.angle_time(params.fajr_angle, 5.0 / 24.0, Side::Morning);
    let sunrise = day.angle_time(RISE_SET_ANGLE, 6.0 / 24.0, Side::Morning);
    let dhuhr = day.mid_day(12.0 / 24.0);
    let asr = day.asr_time(asr_method.shadow_factor(), 13.0 / 24.0);
    let sunset = day.angle_time(RISE_SET_ANGLE, 18.0 / 24.0, Side::Evening);

    let maghrib = match params.maghrib {
        TwilightRule::Angle(angle) => day.angle_time(angle, 18.0 / 24.0, Side::Evening),
        TwilightRule::MinutesAfter(minutes) => sunset + f64::from(minutes) / 60.0,
    };
    let isha = match params.isha {
        TwilightRule::Angle(angle) => day.angle_time(angle, 18.0 / 24.0, Side::Evening),
        TwilightRule::MinutesAfter(minutes) => maghrib + f64::from(minutes) / 60.0,
    };

    let night_end = match params.midnight {
        MidnightMode::Standard => sunrise,
        MidnightMode::Jafari => fajr,
    };
    let midnight = sunset + fix_hour(night_end - sunset) / 2.0;

    RawTimes { fajr, sunrise, dhuhr, asr, maghrib, isha, midnight }
}

/// Rounds fractional local hours to the nearest minute (.5 rounds up), applies
/// the method offset and anchors the result on `date` in `utc_offset`.
fn to_wall_clock(
    date: NaiveDate,
    hours: f64,
    offset_minutes: i64,
    utc_offset: FixedOffset,
) -> Option<DateTime<FixedOffset>> {
    if !hours.is_finite() {
        return None;
    }
    let minutes = (hours * 60.0 + 0.5).floor() as i64 + offset_minutes;
    let local = date.and_hms_opt(0, 0, 0)? + Duration::minutes(minutes);
    local.and_local_timezone(utc_offset).single()
}

/// Calculates prayer times for a given date and location.
///
/// `utc_offset` must be the offset in force at the location on `date`, as
/// resolved by the caller's time-zone source, so that DST is honoured.
///
/// A slot whose sun angle is never reached (polar day or night) is `None`;
/// the other slots are still computed.
///
/// # Errors
/// Returns `InvalidCoordinates` for |lat| > 90 or |lng| > 180.
///
/// # Example
/// ```rust
/// use chrono::{FixedOffset, NaiveDate};
/// use miqat_astronomy::calculate_prayer_times;
/// use miqat_types::{AsrMethod, CalculationMethod, GeoCoordinate};
///
/// let date = NaiveDate::from_ymd_opt(2024, 6, 15).unwrap();
/// let makkah = GeoCoordinate::new(21.4225, 39.8262).unwrap();
/// let ast = FixedOffset::east_opt(3 * 3600).unwrap();
///
/// let times = calculate_prayer_times(date, makkah, CalculationMethod::UmmAlQura, AsrMethod::Standard, ast).unwrap();
/// assert!(times.fajr < times.dhuhr);
/// ```
pub fn calculate_prayer_times(
    date: NaiveDate,
    coords: GeoCoordinate,
    method: CalculationMethod,
    asr_method: AsrMethod,
    utc_offset: FixedOffset,
) -> Result<PrayerTimes, MiqatError> {
    coords.validate()?;

    let raw = compute_raw(date, coords, method, asr_method);
    let shift = f64::from(utc_offset.local_minus_utc()) / 3600.0 - coords.lng / 15.0;
    let offsets = method.params().offsets;
    let at = |hours: f64, minutes: i64| to_wall_clock(date, hours + shift, minutes, utc_offset);

    let times = PrayerTimes {
        date,
        coords,
        fajr: at(raw.fajr, offsets.fajr),
        sunrise: at(raw.sunrise, offsets.sunrise),
        dhuhr: at(raw.dhuhr, offsets.dhuhr),
        asr: at(raw.asr, offsets.asr),
        maghrib: at(raw.maghrib, offsets.maghrib),
        isha: at(raw.isha, offsets.isha),
        midnight: at(raw.midnight, 0),
        method,
        asr_method,
        location_name: None,
        hijri: None,
    };

    if times.has_unknown() {
        tracing::debug!(%date, %coords, %method, "sun angle unreachable for some slots");
    }
    Ok(times)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;
    use miqat_types::Prayer;

    fn offset(hours: i32) -> FixedOffset {
        FixedOffset::east_opt(hours * 3600).unwrap()
    }

    fn hm(times: &PrayerTimes, prayer: Prayer) -> (u32, u32) {
        let t = times.time(prayer).expect("slot should be known");
        (t.hour(), t.minute())
    }

    fn assert_close(times: &PrayerTimes, prayer: Prayer, expected: (u32, u32)) {
        let (h, m) = hm(times, prayer);
        let diff = (h * 60 + m) as i64 - (expected.0 * 60 + expected.1) as i64;
        assert!(diff.abs() <= 1, "{prayer}: got {h:02}:{m:02}, expected {:02}:{:02}", expected.0, expected.1);
    }

    #[test]
    fn test_makkah_umm_al_qura_fixture() {
        let date = NaiveDate::from_ymd_opt(2024, 6, 15).unwrap();
        let makkah = GeoCoordinate::new(21.4225, 39.8262).unwrap();
        let times =
            calculate_prayer_times(date, makkah, CalculationMethod::UmmAlQura, AsrMethod::Standard, offset(3))
                .unwrap();

        assert_close(&times, Prayer::Fajr, (4, 10));
        assert_close(&times, Prayer::Sunrise, (5, 38));
        assert_close(&times, Prayer::Dhuhr, (12, 21));
        assert_close(&times, Prayer::Asr, (15, 41));
        assert_close(&times, Prayer::Maghrib, (19, 4));
        assert_close(&times, Prayer::Isha, (20, 34));
    }

    #[test]
    fn test_umm_al_qura_isha_is_ninety_minutes_after_maghrib() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let makkah = GeoCoordinate::new(21.4225, 39.8262).unwrap();
        let times =
            calculate_prayer_times(date, makkah, CalculationMethod::UmmAlQura, AsrMethod::Standard, offset(3))
                .unwrap();
        let gap = times.isha.unwrap() - times.maghrib.unwrap();
        assert_eq!(gap.num_minutes(), 90);
    }

    #[test]
    fn test_london_mwl() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
        let london = GeoCoordinate::new(51.5074, -0.1278).unwrap();
        let times =
            calculate_prayer_times(date, london, CalculationMethod::MuslimWorldLeague, AsrMethod::Standard, offset(0))
                .unwrap();

        assert_close(&times, Prayer::Fajr, (4, 21));
        assert_close(&times, Prayer::Sunrise, (6, 14));
        assert_close(&times, Prayer::Dhuhr, (12, 9));
        assert_close(&times, Prayer::Asr, (15, 21));
        assert_close(&times, Prayer::Maghrib, (18, 6));
        assert_close(&times, Prayer::Isha, (19, 52));
        assert!(times.is_ordered());
    }

    #[test]
    fn test_hanafi_asr_later() {
        let date = NaiveDate::from_ymd_opt(2024, 6, 15).unwrap();
        let makkah = GeoCoordinate::new(21.4225, 39.8262).unwrap();
        let standard =
            calculate_prayer_times(date, makkah, CalculationMethod::UmmAlQura, AsrMethod::Standard, offset(3))
                .unwrap();
        let hanafi =
            calculate_prayer_times(date, makkah, CalculationMethod::UmmAlQura, AsrMethod::Hanafi, offset(3))
                .unwrap();

        assert_close(&hanafi, Prayer::Asr, (17, 0));
        assert!(hanafi.asr > standard.asr);
        assert_eq!(hanafi.dhuhr, standard.dhuhr);
    }

    #[test]
    fn test_invalid_coordinates_rejected() {
        let date = NaiveDate::from_ymd_opt(2024, 6, 15).unwrap();
        let bad = GeoCoordinate::new_unchecked(91.0, 0.0);
        let result =
            calculate_prayer_times(date, bad, CalculationMethod::MuslimWorldLeague, AsrMethod::Standard, offset(0));
        assert!(matches!(result, Err(MiqatError::InvalidCoordinates { .. })));
    }

    #[test]
    fn test_polar_summer_leaves_unreachable_slots_unknown() {
        let date = NaiveDate::from_ymd_opt(2024, 6, 21).unwrap();
        let tromso = GeoCoordinate::new(69.6492, 18.9553).unwrap();
        let times =
            calculate_prayer_times(date, tromso, CalculationMethod::UmmAlQura, AsrMethod::Standard, offset(2))
                .unwrap();

        assert!(times.fajr.is_none());
        assert!(times.sunrise.is_none());
        assert!(times.maghrib.is_none());
        // Minutes-after-Maghrib Isha cannot exist without Maghrib.
        assert!(times.isha.is_none());
        assert!(times.dhuhr.is_some());
        assert!(times.asr.is_some());
    }

    #[test]
    fn test_dst_offset_shifts_wall_clock_only() {
        let date = NaiveDate::from_ymd_opt(2024, 7, 1).unwrap();
        let paris = GeoCoordinate::new(48.8566, 2.3522).unwrap();
        let winter =
            calculate_prayer_times(date, paris, CalculationMethod::France, AsrMethod::Standard, offset(1)).unwrap();
        let summer =
            calculate_prayer_times(date, paris, CalculationMethod::France, AsrMethod::Standard, offset(2)).unwrap();

        // Same instant, different wall clock.
        assert_eq!(winter.dhuhr.unwrap().timestamp(), summer.dhuhr.unwrap().timestamp());
        assert_eq!(summer.dhuhr.unwrap().hour(), winter.dhuhr.unwrap().hour() + 1);
    }

    #[test]
    fn test_method_offsets_applied() {
        let date = NaiveDate::from_ymd_opt(2024, 6, 15).unwrap();
        let istanbul = GeoCoordinate::new(41.0082, 28.9784).unwrap();
        let mwl = calculate_prayer_times(date, istanbul, CalculationMethod::MuslimWorldLeague, AsrMethod::Standard, offset(3))
            .unwrap();
        let turkey =
            calculate_prayer_times(date, istanbul, CalculationMethod::Turkey, AsrMethod::Standard, offset(3)).unwrap();

        assert_eq!((turkey.dhuhr.unwrap() - mwl.dhuhr.unwrap()).num_minutes(), 5);
        assert_eq!((turkey.sunrise.unwrap() - mwl.sunrise.unwrap()).num_minutes(), -7);
        // Same Fajr and Isha angles as MWL.
        assert_eq!(turkey.fajr, mwl.fajr);
        assert_eq!(turkey.isha, mwl.isha);
    }

    #[test]
    fn test_midnight_between_sunset_and_sunrise() {
        let date = NaiveDate::from_ymd_opt(2024, 6, 15).unwrap();
        let makkah = GeoCoordinate::new(21.4225, 39.8262).unwrap();
        let times =
            calculate_prayer_times(date, makkah, CalculationMethod::MuslimWorldLeague, AsrMethod::Standard, offset(3))
                .unwrap();
        let midnight = times.midnight.unwrap();
        assert!(midnight > times.isha.unwrap());
        assert_eq!(midnight.date_naive(), date.succ_opt().unwrap());
    }
}
