use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::MiqatError;

/// Latitude of the fallback location (Makkah).
pub const DEFAULT_LATITUDE: f64 = 21.4225;
/// Longitude of the fallback location (Makkah).
pub const DEFAULT_LONGITUDE: f64 = 39.8262;
/// Display name of the fallback location.
pub const DEFAULT_LOCATION_NAME: &str = "Makkah, Saudi Arabia";
/// Shown when no place name is known.
pub const LOCATION_NOT_SET: &str = "Location not set";

/// Geographic coordinates in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoCoordinate {
    pub lat: f64,
    pub lng: f64,
}

impl GeoCoordinate {
    /// Validated constructor. Out-of-range values are rejected, never clamped.
    pub fn new(lat: f64, lng: f64) -> Result<Self, MiqatError> {
        let coords = Self { lat, lng };
        coords.validate()?;
        Ok(coords)
    }

    /// For trusted constants and values validated elsewhere.
    pub const fn new_unchecked(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Checks |lat| <= 90 and |lng| <= 180 (NaN fails).
    pub fn validate(&self) -> Result<(), MiqatError> {
        if (-90.0..=90.0).contains(&self.lat) && (-180.0..=180.0).contains(&self.lng) {
            Ok(())
        } else {
            Err(MiqatError::InvalidCoordinates {
                latitude: self.lat,
                longitude: self.lng,
            })
        }
    }

    /// Coordinates rounded to 4 decimals (~11 m), as integers usable in hash keys.
    pub fn rounded_e4(&self) -> (i32, i32) {
        ((self.lat * 1e4).round() as i32, (self.lng * 1e4).round() as i32)
    }
}

impl fmt::Display for GeoCoordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.4}°, {:.4}°", self.lat, self.lng)
    }
}

/// The user's current location. Replaced wholesale on re-detection or manual entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub coords: GeoCoordinate,
    /// City / country, when known.
    pub name: Option<String>,
    pub is_auto_detected: bool,
}

impl Location {
    pub fn new(coords: GeoCoordinate, name: Option<String>, is_auto_detected: bool) -> Self {
        Self { coords, name, is_auto_detected }
    }

    /// The fallback used before the first location fix.
    pub fn makkah() -> Self {
        Self {
            coords: GeoCoordinate::new_unchecked(DEFAULT_LATITUDE, DEFAULT_LONGITUDE),
            name: Some(DEFAULT_LOCATION_NAME.to_string()),
            is_auto_detected: false,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Name for display, or "Location not set".
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(LOCATION_NOT_SET)
    }
}
