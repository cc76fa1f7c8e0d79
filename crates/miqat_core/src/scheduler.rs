//! Exact-time prayer notifications.
//!
//! Every run for a date first cancels whatever was registered for that date
//! and then registers the enabled future slots again, so running it any
//! number of times leaves exactly one alarm per slot.

use chrono::{DateTime, Datelike, FixedOffset, NaiveDate, Utc};
use miqat_types::{NotificationMode, Prayer, PrayerTimes, SchedulingError};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::settings::NotificationPreference;

/// Platform identifier of a registered alarm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AlarmHandle(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlarmRequest {
    pub fire_at_epoch_millis: i64,
    pub prayer: Prayer,
    pub mode: NotificationMode,
    /// Same for a (date, prayer) pair across runs and process restarts.
    pub slot_id: u64,
}

impl AlarmRequest {
    /// `yyyymmddN` where N is the prayer index.
    pub fn slot_id_for(date: NaiveDate, prayer: Prayer) -> u64 {
        let ymd = u64::from(date.year().unsigned_abs()) * 10_000 + u64::from(date.month()) * 100 + u64::from(date.day());
        ymd * 10 + prayer.index() as u64
    }
}

/// Platform alarm access.
pub trait AlarmScheduler: Send + Sync {
    /// Registers an exact alarm.
    ///
    /// Implementations must replace any alarm already registered under
    /// `request.slot_id`. Handles only live in memory, so after a process
    /// restart the slot id is the only thing preventing a duplicate alarm.
    fn schedule_at(&self, request: AlarmRequest) -> Result<AlarmHandle, SchedulingError>;

    fn cancel(&self, handle: AlarmHandle);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotState {
    NotScheduled,
    Scheduled {
        handle: AlarmHandle,
        fire_at: DateTime<FixedOffset>,
        mode: NotificationMode,
    },
    Fired,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduledNotification {
    pub date: NaiveDate,
    pub prayer: Prayer,
    pub fire_at: DateTime<FixedOffset>,
    pub mode: NotificationMode,
    pub handle: AlarmHandle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    Disabled,
    /// No time could be computed for the slot.
    Unknown,
    Past,
    /// The slot's alarm already went off today.
    AlreadyFired,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScheduleReport {
    pub scheduled: Vec<ScheduledNotification>,
    pub cancelled: usize,
    pub skipped: Vec<(NaiveDate, Prayer, SkipReason)>,
    pub failed: Vec<(NaiveDate, Prayer, SchedulingError)>,
}

impl ScheduleReport {
    pub fn merge(&mut self, other: ScheduleReport) {
        self.scheduled.extend(other.scheduled);
        self.cancelled += other.cancelled;
        self.skipped.extend(other.skipped);
        self.failed.extend(other.failed);
    }
}

pub struct NotificationScheduler {
    alarms: Arc<dyn AlarmScheduler>,
    slots: Mutex<BTreeMap<(NaiveDate, Prayer), SlotState>>,
}

impl fmt::Debug for NotificationScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NotificationScheduler")
            .field("slots", &self.slots)
            .finish_non_exhaustive()
    }
}

impl NotificationScheduler {
    pub fn new(alarms: Arc<dyn AlarmScheduler>) -> Self {
        Self { alarms, slots: Mutex::new(BTreeMap::new()) }
    }

    fn slots(&self) -> MutexGuard<'_, BTreeMap<(NaiveDate, Prayer), SlotState>> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Replaces the alarms of `times.date`.
    ///
    /// A rejected registration is logged and reported; the remaining slots
    /// are still scheduled.
    pub fn schedule_prayer_notifications(
        &self,
        times: &PrayerTimes,
        preferences: &[NotificationPreference; 6],
        now: DateTime<Utc>,
    ) -> ScheduleReport {
        let date = times.date;
        let mut slots = self.slots();
        let mut report = ScheduleReport {
            cancelled: self.cancel_locked(&mut slots, |d| d == date),
            ..Default::default()
        };

        for (prayer, time) in times.iter() {
            let preference = preferences[prayer.index()];
            let fired = matches!(slots.get(&(date, prayer)), Some(SlotState::Fired));
            let fire_at = match time {
                _ if fired => {
                    report.skipped.push((date, prayer, SkipReason::AlreadyFired));
                    continue;
                }
                _ if !preference.enabled => {
                    report.skipped.push((date, prayer, SkipReason::Disabled));
                    continue;
                }
                None => {
                    report.skipped.push((date, prayer, SkipReason::Unknown));
                    continue;
                }
                Some(at) if at <= now => {
                    report.skipped.push((date, prayer, SkipReason::Past));
                    continue;
                }
                Some(at) => at,
            };

            let request = AlarmRequest {
                fire_at_epoch_millis: fire_at.timestamp_millis(),
                prayer,
                mode: preference.mode,
                slot_id: AlarmRequest::slot_id_for(date, prayer),
            };

            match self.alarms.schedule_at(request) {
                Ok(handle) => {
                    slots.insert((date, prayer), SlotState::Scheduled { handle, fire_at, mode: preference.mode });
                    report.scheduled.push(ScheduledNotification { date, prayer, fire_at, mode: preference.mode, handle });
                }
                Err(error) => {
                    tracing::warn!(%date, %prayer, %error, "alarm registration rejected");
                    report.failed.push((date, prayer, error));
                }
            }
        }

        tracing::info!(
            %date,
            scheduled = report.scheduled.len(),
            cancelled = report.cancelled,
            failed = report.failed.len(),
            "prayer notifications scheduled"
        );
        report
    }

    /// Cancels every pending alarm of `date`. Returns how many were cancelled.
    pub fn cancel_day(&self, date: NaiveDate) -> usize {
        let mut slots = self.slots();
        self.cancel_locked(&mut slots, |d| d == date)
    }

    /// Forgets every slot before `date`, cancelling those still pending.
    pub fn prune_before(&self, date: NaiveDate) -> usize {
        let mut slots = self.slots();
        let before = slots.len();
        self.cancel_locked(&mut slots, |d| d < date);
        slots.retain(|(d, _), _| *d >= date);
        before - slots.len()
    }

    /// Records that the alarm of a slot went off. False unless it was pending.
    pub fn mark_fired(&self, date: NaiveDate, prayer: Prayer) -> bool {
        let mut slots = self.slots();
        match slots.get_mut(&(date, prayer)) {
            Some(state) if matches!(state, SlotState::Scheduled { .. }) => {
                *state = SlotState::Fired;
                true
            }
            _ => false,
        }
    }

    pub fn slot_state(&self, date: NaiveDate, prayer: Prayer) -> SlotState {
        self.slots().get(&(date, prayer)).copied().unwrap_or(SlotState::NotScheduled)
    }

    /// Number of pending alarms.
    pub fn active_alarms(&self) -> usize {
        self.slots()
            .values()
            .filter(|state| matches!(state, SlotState::Scheduled { .. }))
            .count()
    }

    fn cancel_locked(
        &self,
        slots: &mut BTreeMap<(NaiveDate, Prayer), SlotState>,
        matches_date: impl Fn(NaiveDate) -> bool,
    ) -> usize {
        let mut cancelled = 0;
        slots.retain(|(date, _), state| match state {
            SlotState::Scheduled { handle, .. } if matches_date(*date) => {
                self.alarms.cancel(*handle);
                cancelled += 1;
                false
            }
            _ => true,
        });
        cancelled
    }
}
