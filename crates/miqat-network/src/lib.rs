//! Network module for remote data fetching.
//!
//! Only place-name enrichment lives here; every prayer-time computation is
//! offline.

pub mod geo;

pub use geo::{NominatimClient, PlaceName, NOMINATIM_URL};
