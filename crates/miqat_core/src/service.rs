//! Application entry point.
//!
//! `reschedule_all` is the one operation hosts call from every trigger (app
//! open, boot, settings or time-zone change, manual refresh). It is safe to
//! call repeatedly and never fails; problems are logged and show up as a
//! smaller report.

use crate::location::{resolve_location, LocationService, PlaceNameResolver, ResolvedLocation};
use crate::provider::{NextPrayer, PrayerTimesOutcome, PrayerTimesProvider, Warning};
use crate::ramadan::{RamadanCalendar, RamadanCalendarBuilder};
use crate::scheduler::{AlarmScheduler, NotificationScheduler, ScheduleReport};
use crate::settings::PrayerSettings;
use chrono::{DateTime, Utc};
use miqat_types::MiqatError;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

/// Why a rescheduling run was requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RescheduleTrigger {
    AppOpen,
    Boot,
    SettingsChanged,
    TimeZoneChanged,
    Refresh,
}

impl fmt::Display for RescheduleTrigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::AppOpen => "app_open",
            Self::Boot => "boot",
            Self::SettingsChanged => "settings_changed",
            Self::TimeZoneChanged => "time_zone_changed",
            Self::Refresh => "refresh",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServiceConfig {
    pub location_timeout: Duration,
    pub place_name_timeout: Duration,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            location_timeout: Duration::from_secs(10),
            place_name_timeout: Duration::from_secs(5),
        }
    }
}

pub struct PrayerService {
    provider: Arc<PrayerTimesProvider>,
    scheduler: NotificationScheduler,
    ramadan: RamadanCalendarBuilder,
    location: Arc<dyn LocationService>,
    place_names: Option<Arc<dyn PlaceNameResolver>>,
    config: ServiceConfig,
    run_lock: tokio::sync::Mutex<()>,
}

impl fmt::Debug for PrayerService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PrayerService")
            .field("provider", &self.provider)
            .field("scheduler", &self.scheduler)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl PrayerService {
    pub fn new(
        provider: Arc<PrayerTimesProvider>,
        location: Arc<dyn LocationService>,
        alarms: Arc<dyn AlarmScheduler>,
    ) -> Self {
        Self {
            ramadan: RamadanCalendarBuilder::new(provider.clone()),
            scheduler: NotificationScheduler::new(alarms),
            provider,
            location,
            place_names: None,
            config: ServiceConfig::default(),
            run_lock: tokio::sync::Mutex::new(()),
        }
    }

    pub fn with_place_names(mut self, resolver: Arc<dyn PlaceNameResolver>) -> Self {
        self.place_names = Some(resolver);
        self
    }

    pub fn with_config(mut self, config: ServiceConfig) -> Self {
        self.config = config;
        self
    }

    pub fn provider(&self) -> &PrayerTimesProvider {
        &self.provider
    }

    pub fn scheduler(&self) -> &NotificationScheduler {
        &self.scheduler
    }

    pub fn ramadan(&self) -> &RamadanCalendarBuilder {
        &self.ramadan
    }

    async fn resolve(&self) -> (ResolvedLocation, Option<Warning>) {
        let mut resolved = resolve_location(self.location.as_ref(), self.config.location_timeout).await;

        let Some(resolver) = self.place_names.as_ref() else {
            return (resolved, None);
        };
        if resolved.location.name.is_some() {
            return (resolved, None);
        }

        let coords = resolved.location.coords;
        match tokio::time::timeout(self.config.place_name_timeout, resolver.place_name(coords)).await {
            Ok(Ok(name)) => {
                resolved.location.name = Some(name);
                self.location.save_location(resolved.location.clone());
                (resolved, None)
            }
            Ok(Err(error)) => {
                tracing::warn!(%coords, %error, "place name lookup failed");
                (resolved, Some(Warning::PlaceNameUnavailable))
            }
            Err(_) => {
                tracing::warn!(%coords, "place name lookup timed out");
                (resolved, Some(Warning::PlaceNameUnavailable))
            }
        }
    }

    /// Today's prayer times at the current location.
    pub async fn current_prayer_times(&self, now: DateTime<Utc>) -> Result<PrayerTimesOutcome, MiqatError> {
        let (resolved, name_warning) = self.resolve().await;
        let today = self.provider.zone().local_date(now);
        let mut outcome = self.provider.refresh(&resolved, today).await?;
        outcome.warnings.extend(name_warning);
        Ok(outcome)
    }

    pub async fn next_prayer(&self, now: DateTime<Utc>) -> Result<NextPrayer, MiqatError> {
        let outcome = self.current_prayer_times(now).await?;
        self.provider.next_prayer(&outcome.times, now).await
    }

    /// The Ramadan in progress or the next one, for the current location.
    pub async fn ramadan_calendar(&self, now: DateTime<Utc>) -> Result<RamadanCalendar, MiqatError> {
        let (resolved, _) = self.resolve().await;
        let settings = self.provider.settings().await;
        let today = self.provider.zone().local_date(now);
        self.ramadan
            .upcoming(today, resolved.location.coords, settings.method, settings.asr_method)
            .await
    }

    /// Recomputes today and tomorrow and replaces their alarms.
    pub async fn reschedule_all(&self, trigger: RescheduleTrigger, now: DateTime<Utc>) -> ScheduleReport {
        let _run = self.run_lock.lock().await;
        tracing::info!(%trigger, "rescheduling prayer notifications");

        let (resolved, _) = self.resolve().await;
        let settings = self.provider.settings().await;
        let today = self.provider.zone().local_date(now);
        let mut report = ScheduleReport::default();

        let pruned = self.scheduler.prune_before(today);
        if pruned > 0 {
            tracing::debug!(pruned, "dropped past notification slots");
        }

        for date in [Some(today), today.succ_opt()].into_iter().flatten() {
            match self.provider.refresh(&resolved, date).await {
                Ok(outcome) if outcome.times.date == date => {
                    let day = self
                        .scheduler
                        .schedule_prayer_notifications(&outcome.times, &settings.notifications, now);
                    report.merge(day);
                }
                Ok(outcome) => {
                    tracing::warn!(%date, served = %outcome.times.date, "not scheduling from stale prayer times");
                }
                Err(error) => {
                    tracing::warn!(%date, %error, "prayer times unavailable, nothing scheduled");
                }
            }
        }

        report
    }

    /// Runs `reschedule_all` on the runtime, detached from the caller.
    pub fn spawn_reschedule(self: &Arc<Self>, trigger: RescheduleTrigger, now: DateTime<Utc>) -> JoinHandle<ScheduleReport> {
        let service = Arc::clone(self);
        tokio::spawn(async move { service.reschedule_all(trigger, now).await })
    }

    /// Applies new settings, then reschedules.
    pub async fn update_settings(&self, settings: PrayerSettings, now: DateTime<Utc>) -> ScheduleReport {
        if self.provider.update_settings(settings).await {
            self.ramadan.invalidate_all();
        }
        self.reschedule_all(RescheduleTrigger::SettingsChanged, now).await
    }
}
