//! Time-zone lookup.
//!
//! Calculations take a plain UTC offset; the resolver picks the one in force
//! on a given date so that daylight-saving transitions land on the right day.

use chrono::{DateTime, FixedOffset, Local, NaiveDate, NaiveTime, TimeZone, Utc};
use miqat_types::GeoCoordinate;

pub trait ZoneResolver: Send + Sync {
    /// Offset in force at local noon of `date`.
    fn utc_offset(&self, coords: GeoCoordinate, date: NaiveDate) -> FixedOffset;

    /// Calendar date of `instant` in this zone.
    fn local_date(&self, instant: DateTime<Utc>) -> NaiveDate;
}

/// The device zone.
impl ZoneResolver for Local {
    fn utc_offset(&self, _coords: GeoCoordinate, date: NaiveDate) -> FixedOffset {
        let noon = date
            .and_hms_opt(12, 0, 0)
            .unwrap_or_else(|| date.and_time(NaiveTime::MIN));

        match self.offset_from_local_datetime(&noon).earliest() {
            Some(offset) => offset,
            None => self.offset_from_utc_datetime(&noon),
        }
    }

    fn local_date(&self, instant: DateTime<Utc>) -> NaiveDate {
        instant.with_timezone(self).date_naive()
    }
}

/// A zone without transitions.
impl ZoneResolver for FixedOffset {
    fn utc_offset(&self, _coords: GeoCoordinate, _date: NaiveDate) -> FixedOffset {
        *self
    }

    fn local_date(&self, instant: DateTime<Utc>) -> NaiveDate {
        instant.with_timezone(self).date_naive()
    }
}
