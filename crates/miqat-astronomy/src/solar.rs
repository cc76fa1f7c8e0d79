//! Low-precision solar coordinates (accurate to about a minute of time
//! between 1950 and 2050), enough for civil prayer times.

use chrono::{Datelike, NaiveDate};

/// Julian date at 0h UT of a Gregorian calendar date.
pub fn julian_date(date: NaiveDate) -> f64 {
    let (mut year, mut month) = (date.year() as f64, date.month() as f64);
    if month <= 2.0 {
        year -= 1.0;
        month += 12.0;
    }

    let a = (year / 100.0).floor();
    let b = 2.0 - a + (a / 4.0).floor();

    (365.25 * (year + 4716.0)).floor() + (30.6001 * (month + 1.0)).floor() + date.day() as f64 + b
        - 1524.5
}

/// Sun declination (degrees) and equation of time (hours) at a Julian date.
pub fn sun_position(jd: f64) -> (f64, f64) {
    let d = jd - 2_451_545.0;
    let g = fix_angle(357.529 + 0.985_600_28 * d);
    let q = fix_angle(280.459 + 0.985_647_36 * d);
    let l = fix_angle(q + 1.915 * dsin(g) + 0.020 * dsin(2.0 * g));
    let e = 23.439 - 0.000_000_36 * d;

    let declination = darcsin(dsin(e) * dsin(l));
    let right_ascension = fix_hour(darctan2(dcos(e) * dsin(l), dcos(l)) / 15.0);
    let equation_of_time = q / 15.0 - right_ascension;

    (declination, equation_of_time)
}

pub(crate) fn dsin(d: f64) -> f64 {
    d.to_radians().sin()
}

pub(crate) fn dcos(d: f64) -> f64 {
    d.to_radians().cos()
}

pub(crate) fn dtan(d: f64) -> f64 {
    d.to_radians().tan()
}

pub(crate) fn darcsin(x: f64) -> f64 {
    x.asin().to_degrees()
}

pub(crate) fn darccos(x: f64) -> f64 {
    x.acos().to_degrees()
}

pub(crate) fn darctan2(y: f64, x: f64) -> f64 {
    y.atan2(x).to_degrees()
}

pub(crate) fn darccot(x: f64) -> f64 {
    (1.0 / x).atan().to_degrees()
}

/// Range-reduces an angle to [0, 360).
pub fn fix_angle(a: f64) -> f64 {
    wrap(a, 360.0)
}

/// Range-reduces hours to [0, 24).
pub fn fix_hour(a: f64) -> f64 {
    wrap(a, 24.0)
}

fn wrap(a: f64, b: f64) -> f64 {
    let a = a - b * (a / b).floor();
    if a < 0.0 { a + b } else { a }
}
