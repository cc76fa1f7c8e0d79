//! Imsakiya: the month of Ramadan with Imsak and prayer times per day.

use crate::provider::PrayerTimesProvider;
use chrono::{DateTime, FixedOffset, NaiveDate, TimeDelta};
use miqat_calendar::RAMADAN_DAYS;
use miqat_types::{AsrMethod, CalculationMethod, GeoCoordinate, MiqatError, PrayerTimes};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

#[derive(Debug, Clone, PartialEq)]
pub struct RamadanDay {
    /// 1-based day of Ramadan.
    pub day: u8,
    pub date: NaiveDate,
    /// End of Suhoor: Fajr minus the Imsak buffer.
    pub imsak: Option<DateTime<FixedOffset>>,
    pub times: PrayerTimes,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RamadanCalendar {
    pub hijri_year: u16,
    pub start: NaiveDate,
    pub days: Vec<RamadanDay>,
}

impl RamadanCalendar {
    pub fn day_for(&self, date: NaiveDate) -> Option<&RamadanDay> {
        self.days.iter().find(|day| day.date == date)
    }

    /// Last day of the month.
    pub fn end(&self) -> NaiveDate {
        self.days.last().map_or(self.start, |day| day.date)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct MonthKey {
    hijri_year: u16,
    start: NaiveDate,
    location: (i32, i32),
    method: CalculationMethod,
    asr_method: AsrMethod,
    imsak_buffer_minutes: u32,
    hijri_adjustment: i64,
}

/// Builds and memoises Ramadan calendars on top of the provider cache.
#[derive(Debug)]
pub struct RamadanCalendarBuilder {
    provider: Arc<PrayerTimesProvider>,
    months: Mutex<HashMap<MonthKey, RamadanCalendar>>,
}

impl RamadanCalendarBuilder {
    pub fn new(provider: Arc<PrayerTimesProvider>) -> Self {
        Self { provider, months: Mutex::new(HashMap::new()) }
    }

    fn months(&self) -> MutexGuard<'_, HashMap<MonthKey, RamadanCalendar>> {
        self.months.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Gregorian start of Ramadan in `hijri_year`, from the estimate table.
    pub fn ramadan_start(&self, hijri_year: u16) -> Result<NaiveDate, MiqatError> {
        miqat_calendar::ramadan_start(hijri_year)
    }

    /// The 30 days starting at `start`.
    pub async fn build_month(
        &self,
        start: NaiveDate,
        hijri_year: u16,
        coords: GeoCoordinate,
        method: CalculationMethod,
        asr_method: AsrMethod,
    ) -> Result<RamadanCalendar, MiqatError> {
        let settings = self.provider.settings().await;
        let buffer = settings.imsak_buffer_minutes;
        let key = MonthKey {
            hijri_year,
            start,
            location: coords.rounded_e4(),
            method,
            asr_method,
            imsak_buffer_minutes: buffer,
            hijri_adjustment: settings.hijri_adjustment,
        };

        if let Some(calendar) = self.months().get(&key) {
            tracing::debug!(hijri_year, "Ramadan calendar from memo");
            return Ok(calendar.clone());
        }

        let mut days = Vec::with_capacity(RAMADAN_DAYS as usize);
        for (index, date) in start.iter_days().take(RAMADAN_DAYS as usize).enumerate() {
            let times = self.provider.get_prayer_times(coords, date, method, asr_method).await?;
            days.push(RamadanDay {
                day: index as u8 + 1,
                date,
                imsak: times.fajr.map(|fajr| fajr - TimeDelta::minutes(i64::from(buffer))),
                times,
            });
        }

        let calendar = RamadanCalendar { hijri_year, start, days };
        self.months().insert(key, calendar.clone());
        tracing::info!(hijri_year, %start, %coords, "Ramadan calendar built");
        Ok(calendar)
    }

    /// Calendar of the Hijri year's Ramadan from the estimate table.
    pub async fn build_year(
        &self,
        hijri_year: u16,
        coords: GeoCoordinate,
        method: CalculationMethod,
        asr_method: AsrMethod,
    ) -> Result<RamadanCalendar, MiqatError> {
        let start = self.ramadan_start(hijri_year)?;
        self.build_month(start, hijri_year, coords, method, asr_method).await
    }

    /// The Ramadan in progress on `today`, otherwise the next one.
    pub async fn upcoming(
        &self,
        today: NaiveDate,
        coords: GeoCoordinate,
        method: CalculationMethod,
        asr_method: AsrMethod,
    ) -> Result<RamadanCalendar, MiqatError> {
        let adjustment = self.provider.settings().await.hijri_adjustment;
        let (hijri_year, start) = miqat_calendar::current_or_upcoming(today, adjustment)?;
        self.build_month(start, hijri_year, coords, method, asr_method).await
    }

    pub fn invalidate_all(&self) {
        self.months().clear();
    }

    pub fn len(&self) -> usize {
        self.months().len()
    }

    pub fn is_empty(&self) -> bool {
        self.months().is_empty()
    }
}
