//! Astronomical prayer time calculations for miqat.
//!
//! Pure functions: no I/O, no state, deterministic for a given input.

pub mod prayer;
pub mod solar;

pub use prayer::{calculate_prayer_times, RISE_SET_ANGLE};
pub use solar::{julian_date, sun_position};
