//! Hijri calendar conversion and the Ramadan start table.

pub mod hijri;
pub mod ramadan;

pub use hijri::{apply_adjustment, hijri_for, to_hijri, ADJUSTMENT_MONTH_DAYS};
pub use ramadan::{current_or_upcoming, known_years, ramadan_start, RAMADAN_DAYS};
