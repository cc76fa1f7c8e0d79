//! Core types for miqat: coordinates, calculation methods, prayer times and
//! the error taxonomy shared by every crate in the workspace.

pub mod error;
pub mod geo;
pub mod method;
pub mod times;

pub use error::{LocationError, MiqatError, SchedulingError, HIJRI_MAX_YEAR, HIJRI_MIN_YEAR};
pub use geo::{
    GeoCoordinate, Location, DEFAULT_LATITUDE, DEFAULT_LOCATION_NAME, DEFAULT_LONGITUDE,
    LOCATION_NOT_SET,
};
pub use method::{AsrMethod, CalculationMethod, MethodParams, MidnightMode, MinuteOffsets, TwilightRule};
pub use times::{hijri_month_name, HijriDate, NotificationMode, Prayer, PrayerTimes};
