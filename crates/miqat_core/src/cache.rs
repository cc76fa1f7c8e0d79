//! In-memory cache of computed prayer times.

use chrono::NaiveDate;
use miqat_types::{AsrMethod, CalculationMethod, GeoCoordinate, PrayerTimes};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Identity of a computation: location to 4 decimals (about 11 m), date and
/// both method choices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CacheKey {
    lat_e4: i32,
    lng_e4: i32,
    pub date: NaiveDate,
    pub method: CalculationMethod,
    pub asr_method: AsrMethod,
}

impl CacheKey {
    pub fn new(coords: GeoCoordinate, date: NaiveDate, method: CalculationMethod, asr_method: AsrMethod) -> Self {
        let (lat_e4, lng_e4) = coords.rounded_e4();
        Self { lat_e4, lng_e4, date, method, asr_method }
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:.4},{:.4}@{}#{}/{}",
            f64::from(self.lat_e4) / 1e4,
            f64::from(self.lng_e4) / 1e4,
            self.date,
            self.method.id(),
            self.asr_method.id()
        )
    }
}

/// Entries never change once stored; the whole map is dropped when settings
/// that affect results change.
#[derive(Debug, Default)]
pub struct PrayerTimesCache {
    entries: Mutex<HashMap<CacheKey, PrayerTimes>>,
}

impl PrayerTimesCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<CacheKey, PrayerTimes>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn get(&self, key: &CacheKey) -> Option<PrayerTimes> {
        self.lock().get(key).cloned()
    }

    pub fn put(&self, key: CacheKey, times: PrayerTimes) {
        self.lock().insert(key, times);
    }

    pub fn invalidate_all(&self) {
        let mut entries = self.lock();
        let dropped = entries.len();
        entries.clear();
        tracing::debug!(dropped, "prayer times cache cleared");
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::FixedOffset;

    fn sample(date: NaiveDate) -> PrayerTimes {
        let coords = GeoCoordinate::new_unchecked(21.4225, 39.8262);
        miqat_astronomy::calculate_prayer_times(
            date,
            coords,
            CalculationMethod::UmmAlQura,
            AsrMethod::Standard,
            FixedOffset::east_opt(3 * 3600).unwrap(),
        )
        .unwrap()
    }

    #[test]
    fn test_key_rounds_to_four_decimals() {
        let date = NaiveDate::from_ymd_opt(2024, 6, 15).unwrap();
        let a = CacheKey::new(GeoCoordinate::new_unchecked(21.42251, 39.82619), date, CalculationMethod::UmmAlQura, AsrMethod::Standard);
        let b = CacheKey::new(GeoCoordinate::new_unchecked(21.4225, 39.8262), date, CalculationMethod::UmmAlQura, AsrMethod::Standard);
        assert_eq!(a, b);
        assert_eq!(a.to_string(), "21.4225,39.8262@2024-06-15#1/0");

        let hanafi = CacheKey { asr_method: AsrMethod::Hanafi, ..b };
        assert_ne!(hanafi, b);
    }

    #[test]
    fn test_put_get_invalidate() {
        let cache = PrayerTimesCache::new();
        let date = NaiveDate::from_ymd_opt(2024, 6, 15).unwrap();
        let times = sample(date);
        let key = CacheKey::new(times.coords, date, times.method, times.asr_method);

        assert!(cache.get(&key).is_none());
        cache.put(key, times.clone());
        assert_eq!(cache.get(&key), Some(times));
        assert_eq!(cache.len(), 1);

        cache.invalidate_all();
        assert!(cache.is_empty());
        assert!(cache.get(&key).is_none());
    }
}
