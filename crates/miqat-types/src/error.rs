use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Minimum Gregorian year for Hijri conversion.
pub const HIJRI_MIN_YEAR: i32 = 1938;
/// Maximum Gregorian year for Hijri conversion.
pub const HIJRI_MAX_YEAR: i32 = 2076;

/// Errors from miqat operations.
#[derive(Debug, Error, Clone, PartialEq, Serialize, Deserialize)]
pub enum MiqatError {
    /// Latitude or longitude outside the valid range. Never clamped.
    #[error("Invalid coordinates ({latitude}, {longitude}): latitude must be within ±90 and longitude within ±180")]
    InvalidCoordinates { latitude: f64, longitude: f64 },

    /// Date outside the supported Hijri conversion range (1938-2076).
    #[error("Date {date} is out of supported range ({min} to {max})")]
    DateOutOfRange {
        date: NaiveDate,
        min: NaiveDate,
        max: NaiveDate,
    },

    /// Persisted calculation method ID with no table entry.
    #[error("Unknown calculation method id {0}")]
    UnknownMethod(u8),

    /// Persisted Asr juristic method ID with no table entry.
    #[error("Unknown Asr method id {0}")]
    UnknownAsrMethod(u8),

    /// Invalid configuration.
    #[error("Invalid configuration: {reason}")]
    InvalidConfiguration { reason: String },

    /// The Ramadan start table has no entry for this Hijri year.
    #[error("Ramadan data not available for {hijri_year} AH")]
    RamadanDataUnavailable { hijri_year: u16 },

    /// Every slot of a day came out undefined (polar day or night).
    #[error("No prayer time could be computed for {date}")]
    NoPrayerTimeAvailable { date: NaiveDate },

    /// Remote lookup failure.
    #[error("Network error: {0}")]
    Network(String),

    /// Settings (de)serialization failure.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl MiqatError {
    /// Creates a `DateOutOfRange` error with standard bounds.
    pub fn date_out_of_range(date: NaiveDate) -> Self {
        Self::DateOutOfRange {
            date,
            min: NaiveDate::from_ymd_opt(HIJRI_MIN_YEAR, 1, 1).unwrap_or(NaiveDate::MIN),
            max: NaiveDate::from_ymd_opt(HIJRI_MAX_YEAR, 12, 31).unwrap_or(NaiveDate::MAX),
        }
    }

    /// Creates an `InvalidConfiguration` error.
    pub fn invalid_config(reason: impl Into<String>) -> Self {
        Self::InvalidConfiguration { reason: reason.into() }
    }

    /// True for failures that leave previously computed data usable.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Network(_) | Self::NoPrayerTimeAvailable { .. })
    }
}

/// Failures reported by the platform location collaborator.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LocationError {
    #[error("Location permission denied")]
    PermissionDenied,
    #[error("Location request timed out")]
    Timeout,
    #[error("Location unavailable: {0}")]
    Unavailable(String),
}

/// Failures reported by the platform alarm collaborator.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SchedulingError {
    #[error("Alarm registration rejected: {0}")]
    Rejected(String),
}
