//! Location collaborators and the fallback chain: live fix, then the saved
//! location, then Makkah.

use futures::future::BoxFuture;
use miqat_types::{GeoCoordinate, Location, LocationError, MiqatError};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

/// Platform location access.
pub trait LocationService: Send + Sync {
    /// Asks the platform for a fresh fix.
    fn current_location(&self) -> BoxFuture<'_, Result<Location, LocationError>>;

    fn saved_location(&self) -> Option<Location>;

    fn save_location(&self, location: Location);

    fn saved_location_or_default(&self) -> Location {
        self.saved_location().unwrap_or_else(Location::makkah)
    }
}

/// Best-effort reverse geocoding.
pub trait PlaceNameResolver: Send + Sync {
    fn place_name(&self, coords: GeoCoordinate) -> BoxFuture<'_, Result<String, MiqatError>>;
}

#[cfg(feature = "network")]
impl PlaceNameResolver for miqat_network::NominatimClient {
    fn place_name(&self, coords: GeoCoordinate) -> BoxFuture<'_, Result<String, MiqatError>> {
        Box::pin(async move { self.reverse(coords).await.map(|place| place.display_name()) })
    }
}

/// Where a resolved location came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocationStatus {
    Detected,
    Saved,
    /// Nothing detected or saved; Makkah is in use.
    Fallback,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedLocation {
    pub location: Location,
    pub status: LocationStatus,
}

impl ResolvedLocation {
    pub fn new(location: Location, status: LocationStatus) -> Self {
        Self { location, status }
    }

    pub fn is_fallback(&self) -> bool {
        self.status == LocationStatus::Fallback
    }
}

/// Detects the location within `timeout`, persisting a fresh fix.
///
/// Never fails: on denial, timeout or error the saved location is used, and
/// without one Makkah.
pub async fn resolve_location(service: &dyn LocationService, timeout: Duration) -> ResolvedLocation {
    match tokio::time::timeout(timeout, service.current_location()).await {
        Ok(Ok(location)) => {
            tracing::debug!(coords = %location.coords, "location detected");
            service.save_location(location.clone());
            return ResolvedLocation::new(location, LocationStatus::Detected);
        }
        Ok(Err(error)) => tracing::warn!(%error, "location detection failed"),
        Err(_) => tracing::warn!(?timeout, "location detection timed out"),
    }

    match service.saved_location() {
        Some(location) => ResolvedLocation::new(location, LocationStatus::Saved),
        None => {
            tracing::warn!("no saved location, falling back to Makkah");
            ResolvedLocation::new(Location::makkah(), LocationStatus::Fallback)
        }
    }
}

/// A location service with a fixed answer and in-memory persistence.
///
/// Suits hosts that take the location from configuration instead of a
/// device sensor.
#[derive(Debug, Default)]
pub struct StaticLocationService {
    current: Option<Location>,
    saved: Mutex<Option<Location>>,
}

impl StaticLocationService {
    /// Always reports `location`.
    pub fn new(location: Location) -> Self {
        Self { current: Some(location), saved: Mutex::new(None) }
    }

    /// Reports `LocationError::Unavailable`.
    pub fn unavailable() -> Self {
        Self::default()
    }

    pub fn with_saved(self, location: Location) -> Self {
        *self.saved.lock().unwrap_or_else(PoisonError::into_inner) = Some(location);
        self
    }
}

impl LocationService for StaticLocationService {
    fn current_location(&self) -> BoxFuture<'_, Result<Location, LocationError>> {
        let result = self
            .current
            .clone()
            .ok_or_else(|| LocationError::Unavailable("no location configured".to_string()));
        Box::pin(async move { result })
    }

    fn saved_location(&self) -> Option<Location> {
        self.saved.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    fn save_location(&self, location: Location) {
        *self.saved.lock().unwrap_or_else(PoisonError::into_inner) = Some(location);
    }
}
