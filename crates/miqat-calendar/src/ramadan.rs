//! Start dates of Ramadan.
//!
//! A small table of astronomical estimates for recent and near years. Years
//! outside the table report `RamadanDataUnavailable`; nothing is extrapolated.

use chrono::{Duration, NaiveDate};
use miqat_types::MiqatError;

use crate::hijri::hijri_for;

/// Days in an Imsakiya calendar.
pub const RAMADAN_DAYS: i64 = 30;

/// (Hijri year, Gregorian date of 1 Ramadan).
const RAMADAN_STARTS: [(u16, (i32, u32, u32)); 9] = [
    (1442, (2021, 4, 13)),
    (1443, (2022, 4, 2)),
    (1444, (2023, 3, 23)),
    (1445, (2024, 3, 11)),
    (1446, (2025, 3, 1)),
    (1447, (2026, 2, 18)),
    (1448, (2027, 2, 8)),
    (1449, (2028, 1, 28)),
    (1450, (2029, 1, 16)),
];

/// Hijri years covered by the table.
pub fn known_years() -> impl Iterator<Item = u16> {
    RAMADAN_STARTS.iter().map(|(year, _)| *year)
}

/// Gregorian date of 1 Ramadan for `hijri_year`.
pub fn ramadan_start(hijri_year: u16) -> Result<NaiveDate, MiqatError> {
    RAMADAN_STARTS
        .iter()
        .find(|(year, _)| *year == hijri_year)
        .and_then(|(_, (y, m, d))| NaiveDate::from_ymd_opt(*y, *m, *d))
        .ok_or(MiqatError::RamadanDataUnavailable { hijri_year })
}

/// The Ramadan in progress on `today`, or the next one.
///
/// Returns the Hijri year and its start date.
pub fn current_or_upcoming(today: NaiveDate, adjustment: i64) -> Result<(u16, NaiveDate), MiqatError> {
    let hijri = hijri_for(today, adjustment)?;
    let in_progress = ramadan_start(hijri.year)
        .ok()
        .filter(|start| *start <= today && today < *start + Duration::days(RAMADAN_DAYS));
    if let Some(start) = in_progress {
        tracing::debug!(%today, year = hijri.year, %start, "Ramadan in progress");
        return Ok((hijri.year, start));
    }

    let mut year = if hijri.month <= 9 { hijri.year } else { hijri.year + 1 };
    let mut start = ramadan_start(year)?;

    if today >= start + Duration::days(RAMADAN_DAYS) {
        year += 1;
        start = ramadan_start(year)?;
    }

    tracing::debug!(%today, year, %start, "resolved Ramadan");
    Ok((year, start))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_known_start() {
        assert_eq!(ramadan_start(1445).unwrap(), date(2024, 3, 11));
        assert_eq!(ramadan_start(1447).unwrap(), date(2026, 2, 18));
    }

    #[test]
    fn test_unknown_year_not_extrapolated() {
        assert_eq!(
            ramadan_start(1460),
            Err(MiqatError::RamadanDataUnavailable { hijri_year: 1460 })
        );
        assert!(ramadan_start(1300).is_err());
    }

    #[test]
    fn test_table_is_sorted_and_spaced_like_lunar_years() {
        let starts: Vec<NaiveDate> = known_years().map(|y| ramadan_start(y).unwrap()).collect();
        for pair in starts.windows(2) {
            let gap = (pair[1] - pair[0]).num_days();
            assert!((353..=356).contains(&gap), "gap {gap} between {} and {}", pair[0], pair[1]);
        }
    }

    #[test]
    fn test_during_ramadan_returns_current() {
        let (year, start) = current_or_upcoming(date(2024, 3, 20), 0).unwrap();
        assert_eq!(year, 1445);
        assert_eq!(start, date(2024, 3, 11));
    }

    #[test]
    fn test_after_ramadan_returns_next() {
        let (year, start) = current_or_upcoming(date(2024, 6, 1), 0).unwrap();
        assert_eq!(year, 1446);
        assert_eq!(start, date(2025, 3, 1));
    }

    #[test]
    fn test_last_tabled_day_with_positive_adjustment_stays_current() {
        // The last tabled day of 1445 can read as Shawwal once adjusted.
        let (year, start) = current_or_upcoming(date(2024, 4, 9), 1).unwrap();
        assert_eq!(year, 1445);
        assert_eq!(start, date(2024, 3, 11));

        let (year, _) = current_or_upcoming(date(2024, 4, 10), 1).unwrap();
        assert_eq!(year, 1446);
    }

    #[test]
    fn test_outside_table_reports_unavailable() {
        let result = current_or_upcoming(date(2035, 6, 1), 0);
        assert!(matches!(result, Err(MiqatError::RamadanDataUnavailable { .. })));
    }
}
