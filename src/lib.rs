//! Nullable column scalars that bridge MySQL driver values, JSON documents
//! and GraphQL wire values. See [`scalars`] for the type table.

pub mod error;
pub mod scalars;

pub use error::Error;
pub use scalars::{
    format_duration, parse_duration, DateTime, Duration, LatLng, MySqlColumn, Point, TimeOfDay,
    DATE_TIME_FORMAT, TIME_OF_DAY_FORMAT, TIME_OF_DAY_FORMAT_EXTENDED, WGS84_SRID,
};
