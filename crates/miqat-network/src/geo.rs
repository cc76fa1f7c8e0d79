//! Reverse geocoding.
//!
//! Turns coordinates into a human-readable place name. Best-effort only:
//! prayer times never depend on it.

use miqat_types::{GeoCoordinate, MiqatError};
use serde::Deserialize;
use std::time::Duration;

/// Public OpenStreetMap Nominatim instance.
pub const NOMINATIM_URL: &str = "https://nominatim.openstreetmap.org";

const USER_AGENT: &str = concat!("miqat/", env!("CARGO_PKG_VERSION"), " (prayer times)");

/// Place information for a coordinate.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaceName {
    pub coords: GeoCoordinate,
    pub city: Option<String>,
    /// Province / state.
    pub region: Option<String>,
    pub country: Option<String>,
}

impl PlaceName {
    /// "City, Country", falling back to the region, then to the coordinates.
    pub fn display_name(&self) -> String {
        let parts: Vec<&str> = [
            self.city.as_deref().or(self.region.as_deref()),
            self.country.as_deref(),
        ]
        .into_iter()
        .flatten()
        .collect();

        if parts.is_empty() {
            self.coords.to_string()
        } else {
            parts.join(", ")
        }
    }
}

#[derive(Debug, Deserialize)]
struct NominatimResponse {
    address: NominatimAddress,
}

#[derive(Debug, Deserialize)]
struct NominatimAddress {
    city: Option<String>,
    town: Option<String>,
    village: Option<String>,
    municipality: Option<String>,
    state: Option<String>,
    country: Option<String>,
}

/// Reverse geocoding client for the Nominatim API.
///
/// # Rate Limiting
/// The public instance allows one request per second. Callers look a name
/// up once per location change, not per prayer-time request.
#[derive(Debug, Clone)]
pub struct NominatimClient {
    client: reqwest::Client,
    base_url: String,
    language: String,
}

impl NominatimClient {
    /// Client for the public instance. `language` is an `accept-language` tag.
    pub fn new(language: impl Into<String>) -> Result<Self, MiqatError> {
        Self::with_base_url(NOMINATIM_URL, language)
    }

    pub fn with_base_url(base_url: impl Into<String>, language: impl Into<String>) -> Result<Self, MiqatError> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| MiqatError::Network(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            language: language.into(),
        })
    }

    /// Looks up the place at `coords`.
    ///
    /// # Errors
    /// `MiqatError::Network` on transport failure, non-success status or an
    /// unparseable body.
    pub async fn reverse(&self, coords: GeoCoordinate) -> Result<PlaceName, MiqatError> {
        let url = format!("{}/reverse", self.base_url);
        let lat = coords.lat.to_string();
        let lng = coords.lng.to_string();

        let response = self
            .client
            .get(&url)
            .query(&[
                ("lat", lat.as_str()),
                ("lon", lng.as_str()),
                ("format", "json"),
                ("addressdetails", "1"),
                ("accept-language", self.language.as_str()),
            ])
            .send()
            .await
            .map_err(|e| MiqatError::Network(format!("Nominatim request failed: {}", e)))?
            .error_for_status()
            .map_err(|e| MiqatError::Network(format!("Nominatim returned an error: {}", e)))?;

        let data: NominatimResponse = response
            .json()
            .await
            .map_err(|e| MiqatError::Network(format!("Failed to parse Nominatim response: {}", e)))?;

        let addr = data.address;
        let city = addr.city.or(addr.town).or(addr.village).or(addr.municipality);

        tracing::debug!(%coords, city = ?city, "reverse geocoded");
        Ok(PlaceName {
            coords,
            city,
            region: addr.state,
            country: addr.country,
        })
    }
}
