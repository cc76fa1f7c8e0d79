use chrono::{Datelike, NaiveDate};
use miqat_types::{HijriDate, MiqatError, HIJRI_MAX_YEAR, HIJRI_MIN_YEAR};

/// Days per month assumed by [`apply_adjustment`].
pub const ADJUSTMENT_MONTH_DAYS: i64 = 30;

/// Converts Gregorian to Hijri using the tabular Umm al-Qura calendar.
///
/// Approximate by nature: local moon sighting may differ by a day or two,
/// which is what the user adjustment compensates for.
///
/// # Errors
/// Returns `DateOutOfRange` if outside 1938-2076.
pub fn to_hijri(date: NaiveDate) -> Result<HijriDate, MiqatError> {
    if date.year() < HIJRI_MIN_YEAR || date.year() > HIJRI_MAX_YEAR {
        return Err(MiqatError::date_out_of_range(date));
    }

    let tabular = hijri_date::HijriDate::from_gr(
        date.year() as usize,
        date.month() as usize,
        date.day() as usize,
    )
    .map_err(|_| MiqatError::date_out_of_range(date))?;

    Ok(HijriDate::new(
        tabular.year() as u16,
        tabular.month() as u8,
        tabular.day() as u8,
    ))
}

/// Shifts a Hijri date by `offset_days`, rolling months and years in both
/// directions.
///
/// Every month is treated as 30 days long. Real months have 29 or 30 days;
/// the simplification is kept so that adjusted dates match what users
/// already see, and it makes `+n` followed by `-n` an exact round trip.
pub fn apply_adjustment(date: HijriDate, offset_days: i64) -> HijriDate {
    if offset_days == 0 {
        return date;
    }

    let months = i64::from(date.year) * 12 + i64::from(date.month.clamp(1, 12)) - 1;
    let day_index = i64::from(date.day.clamp(1, 30)) - 1;
    let total = months * ADJUSTMENT_MONTH_DAYS + day_index + offset_days;

    let total_months = total.div_euclid(ADJUSTMENT_MONTH_DAYS);
    let day = total.rem_euclid(ADJUSTMENT_MONTH_DAYS) + 1;
    let year = total_months.div_euclid(12).clamp(0, i64::from(u16::MAX));
    let month = total_months.rem_euclid(12) + 1;

    HijriDate::new(year as u16, month as u8, day as u8)
}

/// Gregorian to displayed Hijri: tabular conversion followed by the user adjustment.
pub fn hijri_for(date: NaiveDate, adjustment: i64) -> Result<HijriDate, MiqatError> {
    to_hijri(date).map(|h| apply_adjustment(h, adjustment))
}
