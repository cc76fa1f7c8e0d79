//! # Miqat
//!
//! Prayer times from coordinates, Hijri dates, a Ramadan Imsakiya and
//! idempotent scheduling of prayer notifications.
//!
//! This crate is a facade that re-exports functionality from the `miqat` workspace.
//!
//! ## Crates
//!
//! - `miqat-types`: Core types (GeoCoordinate, CalculationMethod, PrayerTimes, errors)
//! - `miqat-astronomy`: Solar position and prayer-time calculation
//! - `miqat-calendar`: Hijri conversion and Ramadan start dates
//! - `miqat-network`: Reverse geocoding (optional, `network` feature)
//! - `miqat-core`: Cache, provider, scheduler, Ramadan calendar, service
//!
//! ## Usage
//!
//! ```rust
//! use miqat::prelude::*;
//! use chrono::{FixedOffset, NaiveDate};
//!
//! let date = NaiveDate::from_ymd_opt(2024, 6, 15).unwrap();
//! let makkah = GeoCoordinate::new(21.4225, 39.8262).unwrap();
//! let times = calculate_prayer_times(
//!     date,
//!     makkah,
//!     CalculationMethod::UmmAlQura,
//!     AsrMethod::Standard,
//!     FixedOffset::east_opt(3 * 3600).unwrap(),
//! )
//! .unwrap();
//! assert_eq!(times.display_time(Prayer::Dhuhr), "12:21");
//! ```

pub use miqat_core::*;
