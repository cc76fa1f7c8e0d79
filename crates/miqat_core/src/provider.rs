//! Cache-through access to prayer times.
//!
//! The provider owns the settings, the cache and the calculator. Reads hold
//! the settings read guard for the whole lookup, so a settings change (which
//! clears the cache under the write guard) is never interleaved with a
//! lookup that would store a result computed under the old settings.

use crate::cache::{CacheKey, PrayerTimesCache};
use crate::location::{LocationStatus, ResolvedLocation};
use crate::settings::PrayerSettings;
use crate::zone::ZoneResolver;
use chrono::{DateTime, FixedOffset, NaiveDate, TimeDelta, Utc};
use miqat_types::{AsrMethod, CalculationMethod, GeoCoordinate, Location, MiqatError, Prayer, PrayerTimes};
use smallvec::SmallVec;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::RwLock;

/// Source of raw prayer times.
pub trait PrayerCalculator: Send + Sync {
    fn calculate(
        &self,
        date: NaiveDate,
        coords: GeoCoordinate,
        method: CalculationMethod,
        asr_method: AsrMethod,
        utc_offset: FixedOffset,
    ) -> Result<PrayerTimes, MiqatError>;
}

/// The solar-position calculator.
#[derive(Debug, Clone, Copy, Default)]
pub struct AstronomicalCalculator;

impl PrayerCalculator for AstronomicalCalculator {
    fn calculate(
        &self,
        date: NaiveDate,
        coords: GeoCoordinate,
        method: CalculationMethod,
        asr_method: AsrMethod,
        utc_offset: FixedOffset,
    ) -> Result<PrayerTimes, MiqatError> {
        miqat_astronomy::calculate_prayer_times(date, coords, method, asr_method, utc_offset)
    }
}

/// Time left until a prayer, floored to the minute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Countdown {
    pub hours: i64,
    pub minutes: i64,
}

impl Countdown {
    pub fn from_delta(delta: TimeDelta) -> Self {
        let total = delta.num_minutes().max(0);
        Self { hours: total / 60, minutes: total % 60 }
    }
}

impl fmt::Display for Countdown {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}h {:02}m", self.hours, self.minutes)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NextPrayer {
    pub prayer: Prayer,
    pub at: DateTime<FixedOffset>,
    pub remaining: Countdown,
    /// The slot belongs to the day after the supplied times.
    pub is_tomorrow: bool,
}

/// Non-fatal conditions attached to a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Warning {
    /// Computed for Makkah because no location is known.
    LocationNotSet,
    /// Computation failed; an earlier result is shown instead.
    StaleDataServed,
    PlaceNameUnavailable,
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::LocationNotSet => "Location not set, showing times for Makkah",
            Self::StaleDataServed => "Showing previously calculated times",
            Self::PlaceNameUnavailable => "Place name unavailable",
        };
        f.write_str(text)
    }
}

pub type Warnings = SmallVec<[Warning; 2]>;

#[derive(Debug, Clone, PartialEq)]
pub struct PrayerTimesOutcome {
    pub times: PrayerTimes,
    pub location_status: LocationStatus,
    pub warnings: Warnings,
}

impl PrayerTimesOutcome {
    pub fn has_warning(&self, warning: Warning) -> bool {
        self.warnings.contains(&warning)
    }
}

pub struct PrayerTimesProvider {
    calculator: Arc<dyn PrayerCalculator>,
    zone: Arc<dyn ZoneResolver>,
    settings: RwLock<PrayerSettings>,
    cache: PrayerTimesCache,
    in_flight: Mutex<HashMap<CacheKey, Arc<tokio::sync::Mutex<()>>>>,
    last_good: Mutex<Option<PrayerTimes>>,
}

impl fmt::Debug for PrayerTimesProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PrayerTimesProvider")
            .field("cache", &self.cache)
            .finish_non_exhaustive()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl PrayerTimesProvider {
    /// Provider backed by the astronomical calculator.
    pub fn new(settings: PrayerSettings, zone: Arc<dyn ZoneResolver>) -> Self {
        Self::with_calculator(Arc::new(AstronomicalCalculator), zone, settings)
    }

    pub fn with_calculator(
        calculator: Arc<dyn PrayerCalculator>,
        zone: Arc<dyn ZoneResolver>,
        settings: PrayerSettings,
    ) -> Self {
        Self {
            calculator,
            zone,
            settings: RwLock::new(settings),
            cache: PrayerTimesCache::new(),
            in_flight: Mutex::new(HashMap::new()),
            last_good: Mutex::new(None),
        }
    }

    pub fn cache(&self) -> &PrayerTimesCache {
        &self.cache
    }

    pub fn zone(&self) -> &dyn ZoneResolver {
        self.zone.as_ref()
    }

    /// Snapshot of the current settings.
    pub async fn settings(&self) -> PrayerSettings {
        self.settings.read().await.clone()
    }

    /// Replaces the settings. Returns true when the cache was cleared.
    ///
    /// The cache is cleared before the write guard is released.
    pub async fn update_settings(&self, new: PrayerSettings) -> bool {
        let mut settings = self.settings.write().await;
        let invalidate = settings.invalidates_cache(&new);
        *settings = new;

        if invalidate {
            self.cache.invalidate_all();
            *lock(&self.last_good) = None;
            tracing::info!(method = %settings.method, asr = %settings.asr_method, "settings changed, cache invalidated");
        }
        invalidate
    }

    /// Prayer times for an explicit method pair, from the cache when present.
    ///
    /// Concurrent calls for the same key compute once.
    pub async fn get_prayer_times(
        &self,
        coords: GeoCoordinate,
        date: NaiveDate,
        method: CalculationMethod,
        asr_method: AsrMethod,
    ) -> Result<PrayerTimes, MiqatError> {
        let settings = self.settings.read().await;
        self.lookup(&settings, coords, date, method, asr_method).await
    }

    /// Prayer times for a location using the configured methods, labelled
    /// with the location name.
    pub async fn prayer_times_for(&self, location: &Location, date: NaiveDate) -> Result<PrayerTimes, MiqatError> {
        let settings = self.settings.read().await;
        let mut times = self
            .lookup(&settings, location.coords, date, settings.method, settings.asr_method)
            .await?;
        times.location_name = location.name.clone();
        Ok(times)
    }

    async fn lookup(
        &self,
        settings: &PrayerSettings,
        coords: GeoCoordinate,
        date: NaiveDate,
        method: CalculationMethod,
        asr_method: AsrMethod,
    ) -> Result<PrayerTimes, MiqatError> {
        coords.validate()?;
        let key = CacheKey::new(coords, date, method, asr_method);

        if let Some(times) = self.cache.get(&key) {
            tracing::debug!(%key, "cache hit");
            return Ok(times);
        }

        let gate = lock(&self.in_flight).entry(key).or_default().clone();
        let _permit = gate.lock().await;

        if let Some(times) = self.cache.get(&key) {
            tracing::debug!(%key, "cache hit after wait");
            return Ok(times);
        }

        tracing::debug!(%key, "cache miss");
        let utc_offset = self.zone.utc_offset(coords, date);
        let computed = self.calculator.calculate(date, coords, method, asr_method, utc_offset);
        let result = computed.map(|mut times| {
            times.hijri = match miqat_calendar::hijri_for(date, settings.hijri_adjustment) {
                Ok(hijri) => Some(hijri),
                Err(error) => {
                    tracing::debug!(%date, %error, "no Hijri date");
                    None
                }
            };
            self.cache.put(key, times.clone());
            times
        });

        lock(&self.in_flight).remove(&key);
        result
    }

    /// Computes the day for a resolved location, serving the last good
    /// result when computation fails.
    pub async fn refresh(
        &self,
        resolved: &ResolvedLocation,
        date: NaiveDate,
    ) -> Result<PrayerTimesOutcome, MiqatError> {
        let mut warnings = Warnings::new();
        if resolved.is_fallback() {
            warnings.push(Warning::LocationNotSet);
        }

        let times = match self.prayer_times_for(&resolved.location, date).await {
            Ok(times) => {
                *lock(&self.last_good) = Some(times.clone());
                times
            }
            Err(error) => {
                let stale = lock(&self.last_good).clone();
                match stale {
                    Some(stale) => {
                        tracing::warn!(%date, %error, served = %stale.date, "serving stale prayer times");
                        warnings.push(Warning::StaleDataServed);
                        stale
                    }
                    None => return Err(error),
                }
            }
        };

        Ok(PrayerTimesOutcome { times, location_status: resolved.status, warnings })
    }

    /// The first known slot strictly after `now`; past the last slot of the
    /// day, the first slot of the following day.
    pub async fn next_prayer(&self, times: &PrayerTimes, now: DateTime<Utc>) -> Result<NextPrayer, MiqatError> {
        if let Some(next) = first_after(times, now, false) {
            return Ok(next);
        }

        let tomorrow = times
            .date
            .succ_opt()
            .ok_or(MiqatError::NoPrayerTimeAvailable { date: times.date })?;
        let next_day = self
            .get_prayer_times(times.coords, tomorrow, times.method, times.asr_method)
            .await?;

        first_after(&next_day, now, true).ok_or(MiqatError::NoPrayerTimeAvailable { date: tomorrow })
    }
}

fn first_after(times: &PrayerTimes, now: DateTime<Utc>, is_tomorrow: bool) -> Option<NextPrayer> {
    times
        .known()
        .find(|(_, at)| *at > now)
        .map(|(prayer, at)| NextPrayer {
            prayer,
            at,
            remaining: Countdown::from_delta(at.with_timezone(&Utc) - now),
            is_tomorrow,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use miqat_types::HijriDate;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    #[derive(Default)]
    struct CountingCalculator {
        calls: AtomicUsize,
        fail: AtomicBool,
        delay: Option<std::time::Duration>,
    }

    impl PrayerCalculator for CountingCalculator {
        fn calculate(
            &self,
            date: NaiveDate,
            coords: GeoCoordinate,
            method: CalculationMethod,
            asr_method: AsrMethod,
            utc_offset: FixedOffset,
        ) -> Result<PrayerTimes, MiqatError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(delay) = self.delay {
                std::thread::sleep(delay);
            }
            if self.fail.load(Ordering::SeqCst) {
                return Err(MiqatError::Network("calculator offline".into()));
            }
            AstronomicalCalculator.calculate(date, coords, method, asr_method, utc_offset)
        }
    }

    fn riyadh_time() -> Arc<dyn ZoneResolver> {
        Arc::new(FixedOffset::east_opt(3 * 3600).unwrap())
    }

    fn makkah() -> GeoCoordinate {
        GeoCoordinate::new_unchecked(21.4225, 39.8262)
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn provider_with(calculator: Arc<CountingCalculator>) -> PrayerTimesProvider {
        PrayerTimesProvider::with_calculator(calculator, riyadh_time(), PrayerSettings::default())
    }

    #[tokio::test]
    async fn test_second_request_served_from_cache() {
        let calculator = Arc::new(CountingCalculator::default());
        let provider = provider_with(calculator.clone());
        let day = date(2024, 6, 15);

        let first = provider.get_prayer_times(makkah(), day, CalculationMethod::UmmAlQura, AsrMethod::Standard).await.unwrap();
        let second = provider.get_prayer_times(makkah(), day, CalculationMethod::UmmAlQura, AsrMethod::Standard).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(calculator.calls.load(Ordering::SeqCst), 1);
        assert_eq!(provider.cache().len(), 1);
    }

    #[tokio::test]
    async fn test_join_computes_once() {
        let calculator = Arc::new(CountingCalculator::default());
        let provider = provider_with(calculator.clone());
        let day = date(2024, 6, 15);

        let (a, b) = tokio::join!(
            provider.get_prayer_times(makkah(), day, CalculationMethod::UmmAlQura, AsrMethod::Standard),
            provider.get_prayer_times(makkah(), day, CalculationMethod::UmmAlQura, AsrMethod::Standard),
        );
        assert_eq!(a.unwrap(), b.unwrap());
        assert_eq!(calculator.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_tasks_compute_once() {
        let calculator = Arc::new(CountingCalculator {
            delay: Some(std::time::Duration::from_millis(20)),
            ..Default::default()
        });
        let provider = Arc::new(provider_with(calculator.clone()));
        let day = date(2024, 6, 15);

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let provider = provider.clone();
                tokio::spawn(async move {
                    provider.get_prayer_times(makkah(), day, CalculationMethod::UmmAlQura, AsrMethod::Standard).await
                })
            })
            .collect();

        let mut results = Vec::new();
        for handle in handles {
            results.push(handle.await.unwrap().unwrap());
        }
        assert!(results.windows(2).all(|pair| pair[0] == pair[1]));
        assert_eq!(calculator.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_distinct_keys_compute_separately() {
        let calculator = Arc::new(CountingCalculator::default());
        let provider = provider_with(calculator.clone());
        let day = date(2024, 6, 15);

        provider.get_prayer_times(makkah(), day, CalculationMethod::UmmAlQura, AsrMethod::Standard).await.unwrap();
        provider.get_prayer_times(makkah(), day, CalculationMethod::UmmAlQura, AsrMethod::Hanafi).await.unwrap();
        provider.get_prayer_times(makkah(), day.succ_opt().unwrap(), CalculationMethod::UmmAlQura, AsrMethod::Standard).await.unwrap();

        assert_eq!(calculator.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_invalid_coordinates_not_cached() {
        let provider = PrayerTimesProvider::new(PrayerSettings::default(), riyadh_time());
        let result = provider
            .get_prayer_times(GeoCoordinate::new_unchecked(95.0, 0.0), date(2024, 6, 15), CalculationMethod::default(), AsrMethod::default())
            .await;
        assert!(matches!(result, Err(MiqatError::InvalidCoordinates { .. })));
        assert!(provider.cache().is_empty());
    }

    #[tokio::test]
    async fn test_settings_change_invalidates() {
        let provider = PrayerTimesProvider::new(PrayerSettings::default(), riyadh_time());
        let location = Location::makkah();
        provider.prayer_times_for(&location, date(2024, 6, 15)).await.unwrap();
        assert_eq!(provider.cache().len(), 1);

        let renamed = provider.settings().await.language("ar");
        assert!(!provider.update_settings(renamed).await);
        assert_eq!(provider.cache().len(), 1);

        let switched = provider.settings().await.method(CalculationMethod::UmmAlQura);
        assert!(provider.update_settings(switched).await);
        assert!(provider.cache().is_empty());

        let times = provider.prayer_times_for(&location, date(2024, 6, 15)).await.unwrap();
        assert_eq!(times.method, CalculationMethod::UmmAlQura);
    }

    #[tokio::test]
    async fn test_hijri_and_name_attached() {
        let provider = PrayerTimesProvider::new(PrayerSettings::default(), riyadh_time());
        let times = provider.prayer_times_for(&Location::makkah(), date(2024, 3, 20)).await.unwrap();

        assert_eq!(times.location_name.as_deref(), Some("Makkah, Saudi Arabia"));
        let hijri = times.hijri.unwrap();
        assert_eq!((hijri.year, hijri.month), (1445, 9));
    }

    #[tokio::test]
    async fn test_hijri_adjustment_applied() {
        let settings = PrayerSettings::default().hijri_adjustment(1);
        let provider = PrayerTimesProvider::new(settings, riyadh_time());
        let adjusted = provider.prayer_times_for(&Location::makkah(), date(2024, 3, 20)).await.unwrap();
        let base = miqat_calendar::to_hijri(date(2024, 3, 20)).unwrap();

        assert_eq!(adjusted.hijri, Some(miqat_calendar::apply_adjustment(base, 1)));
        assert_ne!(adjusted.hijri, Some(HijriDate::new(base.year, base.month, base.day)));
    }

    #[tokio::test]
    async fn test_next_prayer_same_day() {
        let provider = PrayerTimesProvider::new(PrayerSettings::default(), riyadh_time());
        let times = provider
            .get_prayer_times(makkah(), date(2024, 6, 15), CalculationMethod::UmmAlQura, AsrMethod::Standard)
            .await
            .unwrap();

        // 12:00 in Makkah
        let now = Utc.with_ymd_and_hms(2024, 6, 15, 9, 0, 0).unwrap();
        let next = provider.next_prayer(&times, now).await.unwrap();

        assert_eq!(next.prayer, Prayer::Dhuhr);
        assert!(!next.is_tomorrow);
        assert_eq!(next.remaining.hours, 0);
        assert!((20..=22).contains(&next.remaining.minutes), "{}", next.remaining);
    }

    #[tokio::test]
    async fn test_next_prayer_rolls_to_tomorrow_fajr() {
        let provider = PrayerTimesProvider::new(PrayerSettings::default(), riyadh_time());
        let times = provider
            .get_prayer_times(makkah(), date(2024, 6, 15), CalculationMethod::UmmAlQura, AsrMethod::Standard)
            .await
            .unwrap();

        // 21:00 in Makkah, after Isha
        let now = Utc.with_ymd_and_hms(2024, 6, 15, 18, 0, 0).unwrap();
        let next = provider.next_prayer(&times, now).await.unwrap();

        assert_eq!(next.prayer, Prayer::Fajr);
        assert!(next.is_tomorrow);
        assert_eq!(next.at.date_naive(), date(2024, 6, 16));
        assert_eq!(next.remaining.hours, 7);
        assert_eq!(provider.cache().len(), 2);
    }

    #[test]
    fn test_countdown_floors() {
        let countdown = Countdown::from_delta(TimeDelta::seconds(2 * 3600 + 5 * 60 + 59));
        assert_eq!(countdown, Countdown { hours: 2, minutes: 5 });
        assert_eq!(countdown.to_string(), "2h 05m");
        assert_eq!(Countdown::from_delta(TimeDelta::seconds(-30)), Countdown { hours: 0, minutes: 0 });
    }

    proptest::proptest! {
        #[test]
        fn countdown_is_floored(seconds in 0i64..200_000) {
            let countdown = Countdown::from_delta(TimeDelta::seconds(seconds));
            proptest::prop_assert!(countdown.minutes < 60);
            proptest::prop_assert_eq!(countdown.hours * 60 + countdown.minutes, seconds / 60);
        }
    }

    #[tokio::test]
    async fn test_refresh_serves_stale_on_failure() {
        let calculator = Arc::new(CountingCalculator::default());
        let provider = provider_with(calculator.clone());
        let resolved = ResolvedLocation::new(Location::makkah(), LocationStatus::Saved);

        let fresh = provider.refresh(&resolved, date(2024, 6, 15)).await.unwrap();
        assert!(fresh.warnings.is_empty());

        calculator.fail.store(true, Ordering::SeqCst);
        let stale = provider.refresh(&resolved, date(2024, 6, 16)).await.unwrap();
        assert!(stale.has_warning(Warning::StaleDataServed));
        assert_eq!(stale.times, fresh.times);
    }

    #[tokio::test]
    async fn test_refresh_without_history_fails() {
        let calculator = Arc::new(CountingCalculator::default());
        calculator.fail.store(true, Ordering::SeqCst);
        let provider = provider_with(calculator);
        let resolved = ResolvedLocation::new(Location::makkah(), LocationStatus::Saved);

        assert!(provider.refresh(&resolved, date(2024, 6, 15)).await.is_err());
    }

    #[tokio::test]
    async fn test_refresh_flags_fallback_location() {
        let provider = PrayerTimesProvider::new(PrayerSettings::default(), riyadh_time());
        let resolved = ResolvedLocation::new(Location::makkah(), LocationStatus::Fallback);

        let outcome = provider.refresh(&resolved, date(2024, 6, 15)).await.unwrap();
        assert!(outcome.has_warning(Warning::LocationNotSet));
        assert_eq!(outcome.location_status, LocationStatus::Fallback);
        assert_eq!(outcome.times.coords, makkah());
    }
}
