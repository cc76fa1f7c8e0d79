//! Prayer-time engine: cache-through provider, notification scheduling,
//! Ramadan calendar and the service that ties them to the host platform.

pub mod cache;
pub mod location;
pub mod provider;
pub mod ramadan;
pub mod scheduler;
pub mod service;
pub mod settings;
pub mod zone;

pub use miqat_astronomy::calculate_prayer_times;
pub use miqat_calendar::{apply_adjustment, hijri_for, ramadan_start, to_hijri};
pub use miqat_types::*;

pub use cache::{CacheKey, PrayerTimesCache};
pub use location::{
    resolve_location, LocationService, LocationStatus, PlaceNameResolver, ResolvedLocation,
    StaticLocationService,
};
pub use provider::{
    AstronomicalCalculator, Countdown, NextPrayer, PrayerCalculator, PrayerTimesOutcome,
    PrayerTimesProvider, Warning, Warnings,
};
pub use ramadan::{RamadanCalendar, RamadanCalendarBuilder, RamadanDay};
pub use scheduler::{
    AlarmHandle, AlarmRequest, AlarmScheduler, NotificationScheduler, ScheduleReport,
    ScheduledNotification, SkipReason, SlotState,
};
pub use service::{PrayerService, RescheduleTrigger, ServiceConfig};
pub use settings::{NotificationPreference, PrayerSettings, PrayerSettingsBuilder};
pub use zone::ZoneResolver;

#[cfg(feature = "network")]
pub use miqat_network::{NominatimClient, PlaceName};

pub mod prelude {
    pub use crate::{
        calculate_prayer_times, to_hijri, AsrMethod, CalculationMethod, GeoCoordinate, Location,
        MiqatError, NotificationMode, Prayer, PrayerService, PrayerSettings, PrayerTimes,
        PrayerTimesProvider, RescheduleTrigger, ZoneResolver,
    };
}
