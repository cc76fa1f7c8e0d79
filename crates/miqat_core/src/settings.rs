//! User configuration for prayer-time calculation and notifications.

use miqat_types::{AsrMethod, CalculationMethod, MiqatError, NotificationMode, Prayer};
use serde::{Deserialize, Serialize};

/// Hijri adjustment bound applied by every setter.
pub const MAX_HIJRI_ADJUSTMENT: i64 = 30;
/// Hijri adjustment bound of the strict builder.
pub const STRICT_HIJRI_ADJUSTMENT: i64 = 2;
/// Minutes between Imsak and Fajr.
pub const DEFAULT_IMSAK_BUFFER_MINUTES: u32 = 10;

/// Whether and how a prayer slot is announced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationPreference {
    pub enabled: bool,
    pub mode: NotificationMode,
}

impl NotificationPreference {
    pub const fn enabled(mode: NotificationMode) -> Self {
        Self { enabled: true, mode }
    }

    pub const fn disabled() -> Self {
        Self { enabled: false, mode: NotificationMode::Notification }
    }
}

impl Default for NotificationPreference {
    fn default() -> Self {
        Self::enabled(NotificationMode::Notification)
    }
}

/// Prayer-time settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrayerSettings {
    pub method: CalculationMethod,
    pub asr_method: AsrMethod,
    /// Hijri day offset. Clamped to [-30, 30].
    pub hijri_adjustment: i64,
    /// Indexed by `Prayer::index`.
    pub notifications: [NotificationPreference; 6],
    /// Display language tag. Not used by any calculation.
    pub language: String,
    pub imsak_buffer_minutes: u32,
}

impl Default for PrayerSettings {
    fn default() -> Self {
        let mut notifications = [NotificationPreference::default(); 6];
        notifications[Prayer::Sunrise.index()] = NotificationPreference::disabled();

        Self {
            method: CalculationMethod::default(),
            asr_method: AsrMethod::default(),
            hijri_adjustment: 0,
            notifications,
            language: "en".to_string(),
            imsak_buffer_minutes: DEFAULT_IMSAK_BUFFER_MINUTES,
        }
    }
}

impl PrayerSettings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn method(mut self, method: CalculationMethod) -> Self {
        self.method = method;
        self
    }

    pub fn asr_method(mut self, asr_method: AsrMethod) -> Self {
        self.asr_method = asr_method;
        self
    }

    pub fn hijri_adjustment(mut self, adjustment: i64) -> Self {
        self.hijri_adjustment = adjustment.clamp(-MAX_HIJRI_ADJUSTMENT, MAX_HIJRI_ADJUSTMENT);
        self
    }

    pub fn notification(mut self, prayer: Prayer, preference: NotificationPreference) -> Self {
        self.notifications[prayer.index()] = preference;
        self
    }

    pub fn language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    pub fn imsak_buffer_minutes(mut self, minutes: u32) -> Self {
        self.imsak_buffer_minutes = minutes;
        self
    }

    pub fn preference(&self, prayer: Prayer) -> NotificationPreference {
        self.notifications[prayer.index()]
    }

    /// True when switching from `self` to `other` changes computed results.
    pub fn invalidates_cache(&self, other: &PrayerSettings) -> bool {
        self.method != other.method
            || self.asr_method != other.asr_method
            || self.hijri_adjustment != other.hijri_adjustment
    }

    /// Parses persisted settings. Missing fields take their defaults and an
    /// out-of-range adjustment is clamped.
    pub fn from_json(json: &str) -> Result<Self, MiqatError> {
        let settings: PrayerSettings =
            serde_json::from_str(json).map_err(|e| MiqatError::Serialization(e.to_string()))?;
        let adjustment = settings.hijri_adjustment;
        Ok(settings.hijri_adjustment(adjustment))
    }

    pub fn to_json(&self) -> Result<String, MiqatError> {
        serde_json::to_string(self).map_err(|e| MiqatError::Serialization(e.to_string()))
    }
}

/// Builder with validation for `PrayerSettings`.
#[derive(Debug, Default)]
pub struct PrayerSettingsBuilder {
    method: Option<CalculationMethod>,
    asr_method: Option<AsrMethod>,
    hijri_adjustment: Option<i64>,
    notifications: Vec<(Prayer, NotificationPreference)>,
    language: Option<String>,
    imsak_buffer_minutes: Option<u32>,
    strict_adjustment: bool,
}

impl PrayerSettingsBuilder {
    pub fn new() -> Self { Self::default() }

    pub fn method(mut self, method: CalculationMethod) -> Self { self.method = Some(method); self }
    pub fn asr_method(mut self, asr_method: AsrMethod) -> Self { self.asr_method = Some(asr_method); self }
    pub fn hijri_adjustment(mut self, adjustment: i64) -> Self { self.hijri_adjustment = Some(adjustment); self }
    pub fn language(mut self, language: impl Into<String>) -> Self { self.language = Some(language.into()); self }
    pub fn imsak_buffer_minutes(mut self, minutes: u32) -> Self { self.imsak_buffer_minutes = Some(minutes); self }

    pub fn notification(mut self, prayer: Prayer, preference: NotificationPreference) -> Self {
        self.notifications.push((prayer, preference));
        self
    }

    /// Enables strict adjustment bounds [-2, 2].
    pub fn strict_adjustment(mut self, strict: bool) -> Self { self.strict_adjustment = strict; self }

    /// Builds and validates.
    pub fn build(self) -> Result<PrayerSettings, MiqatError> {
        let adjustment = self.hijri_adjustment.unwrap_or(0);

        if self.strict_adjustment && adjustment.abs() > STRICT_HIJRI_ADJUSTMENT {
            return Err(MiqatError::invalid_config(format!(
                "Hijri adjustment {} outside strict bounds [-{bound}, {bound}]",
                adjustment,
                bound = STRICT_HIJRI_ADJUSTMENT
            )));
        }

        let defaults = PrayerSettings::default();
        let mut settings = PrayerSettings {
            method: self.method.unwrap_or(defaults.method),
            asr_method: self.asr_method.unwrap_or(defaults.asr_method),
            language: self.language.unwrap_or(defaults.language),
            imsak_buffer_minutes: self.imsak_buffer_minutes.unwrap_or(defaults.imsak_buffer_minutes),
            ..defaults
        }
        .hijri_adjustment(adjustment);

        for (prayer, preference) in self.notifications {
            settings.notifications[prayer.index()] = preference;
        }
        Ok(settings)
    }
}
