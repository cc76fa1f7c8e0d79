use chrono::{DateTime, FixedOffset, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::geo::GeoCoordinate;
use crate::method::{AsrMethod, CalculationMethod};

/// The six daily time slots, in chronological order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Prayer {
    Fajr,
    /// Not a prayer; marks the end of the Fajr window.
    Sunrise,
    Dhuhr,
    Asr,
    Maghrib,
    Isha,
}

impl Prayer {
    pub const ALL: [Prayer; 6] = [
        Prayer::Fajr,
        Prayer::Sunrise,
        Prayer::Dhuhr,
        Prayer::Asr,
        Prayer::Maghrib,
        Prayer::Isha,
    ];

    /// Position in [`Prayer::ALL`].
    pub const fn index(self) -> usize {
        self as usize
    }

    pub fn is_prayer(self) -> bool {
        !matches!(self, Prayer::Sunrise)
    }
}

impl fmt::Display for Prayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Prayer::Fajr => "Fajr",
            Prayer::Sunrise => "Sunrise",
            Prayer::Dhuhr => "Dhuhr",
            Prayer::Asr => "Asr",
            Prayer::Maghrib => "Maghrib",
            Prayer::Isha => "Isha",
        };
        write!(f, "{}", s)
    }
}

/// How a prayer alert is delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum NotificationMode {
    Silent,
    #[default]
    Notification,
    /// Full call-to-prayer audio.
    Athan,
}

const HIJRI_MONTH_NAMES: [&str; 12] = [
    "Muharram",
    "Safar",
    "Rabi' al-Awwal",
    "Rabi' al-Thani",
    "Jumada al-Ula",
    "Jumada al-Akhirah",
    "Rajab",
    "Sha'ban",
    "Ramadan",
    "Shawwal",
    "Dhu al-Qi'dah",
    "Dhu al-Hijjah",
];

/// Returns Hijri month name.
pub fn hijri_month_name(month: u8) -> &'static str {
    match month {
        1..=12 => HIJRI_MONTH_NAMES[month as usize - 1],
        _ => "Unknown",
    }
}

/// A date in the Islamic calendar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct HijriDate {
    pub year: u16,
    pub month: u8,
    pub day: u8,
}

impl HijriDate {
    pub const fn new(year: u16, month: u8, day: u8) -> Self {
        Self { year, month, day }
    }

    pub fn month_name(&self) -> &'static str {
        hijri_month_name(self.month)
    }
}

impl fmt::Display for HijriDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {} AH", self.day, self.month_name(), self.year)
    }
}

/// Prayer times for one date and location.
///
/// A `None` slot means the sun never reaches the required angle that day
/// (polar latitudes) and is shown as "Unknown".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrayerTimes {
    pub date: NaiveDate,
    pub coords: GeoCoordinate,
    pub fajr: Option<DateTime<FixedOffset>>,
    pub sunrise: Option<DateTime<FixedOffset>>,
    pub dhuhr: Option<DateTime<FixedOffset>>,
    pub asr: Option<DateTime<FixedOffset>>,
    pub maghrib: Option<DateTime<FixedOffset>>,
    pub isha: Option<DateTime<FixedOffset>>,
    /// Middle of the night following this date, per the method's convention.
    pub midnight: Option<DateTime<FixedOffset>>,
    pub method: CalculationMethod,
    pub asr_method: AsrMethod,
    pub location_name: Option<String>,
    pub hijri: Option<HijriDate>,
}

impl PrayerTimes {
    pub fn time(&self, prayer: Prayer) -> Option<DateTime<FixedOffset>> {
        match prayer {
            Prayer::Fajr => self.fajr,
            Prayer::Sunrise => self.sunrise,
            Prayer::Dhuhr => self.dhuhr,
            Prayer::Asr => self.asr,
            Prayer::Maghrib => self.maghrib,
            Prayer::Isha => self.isha,
        }
    }

    /// All six slots in order.
    pub fn iter(&self) -> impl Iterator<Item = (Prayer, Option<DateTime<FixedOffset>>)> + '_ {
        Prayer::ALL.into_iter().map(move |p| (p, self.time(p)))
    }

    /// Slots with a known time, in order.
    pub fn known(&self) -> impl Iterator<Item = (Prayer, DateTime<FixedOffset>)> + '_ {
        self.iter().filter_map(|(p, t)| t.map(|t| (p, t)))
    }

    pub fn has_unknown(&self) -> bool {
        self.iter().any(|(_, t)| t.is_none())
    }

    /// True when every known slot is strictly later than the previous known one.
    pub fn is_ordered(&self) -> bool {
        let known: Vec<_> = self.known().map(|(_, t)| t).collect();
        known.windows(2).all(|w| w[0] < w[1])
    }

    /// "HH:MM" in the location's wall-clock time, or "Unknown".
    pub fn display_time(&self, prayer: Prayer) -> String {
        self.time(prayer)
            .map(|t| t.format("%H:%M").to_string())
            .unwrap_or_else(|| "Unknown".to_string())
    }
}
