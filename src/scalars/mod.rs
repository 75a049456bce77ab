// src/scalars/mod.rs

//! Nullable column scalars shared between MySQL rows, JSON documents and the
//! GraphQL schema.
//!
//! # Types
//!
//! | Scalar        | MySQL column  | JSON form            | GraphQL form         |
//! |---------------|---------------|----------------------|----------------------|
//! | [`DateTime`]  | `datetime(3)` | `"YYYY-MM-DDTHH:MM"` | `String`             |
//! | [`Duration`]  | `BIGINT` (ns) | `"1h2m3s"`           | `String`             |
//! | [`TimeOfDay`] | `TIME`        | `"HH:MM"`            | `String`             |
//! | [`Point`]     | `geometry`    | `{"lat": , "lng": }` | object scalar        |
//!
//! # Nullable
//!
//! Every scalar wraps an `Option` and treats absence uniformly: it encodes as
//! a NULL driver value, a JSON `null`, and a GraphQL `null`. Decoding a JSON
//! or GraphQL empty string leaves the scalar absent without raising an error;
//! decoding any non-string wire value is a type mismatch.

mod datetime;
mod duration;
mod point;
mod time_of_day;

pub use datetime::{DateTime, DATE_TIME_FORMAT};
pub use duration::{format_duration, parse_duration, Duration};
pub use point::{LatLng, Point, WGS84_SRID};
pub use time_of_day::{TimeOfDay, TIME_OF_DAY_FORMAT, TIME_OF_DAY_FORMAT_EXTENDED};

/// Column declaration hint for the mapping layer.
///
/// Returns the MySQL column type a scalar expects its table column to be
/// declared as, suitable for splicing into `CREATE TABLE` DDL.
pub trait MySqlColumn {
    fn column_type() -> &'static str;
}

/// Shared empty-input convention: trimmed-empty text means "leave the value
/// absent", not an error.
pub(crate) fn trimmed(text: &str) -> Option<&str> {
    let text = text.trim();
    (!text.is_empty()).then_some(text)
}

#[cfg(test)]
pub(crate) fn mysql_encode<'q, T>(value: &T) -> (sqlx::encode::IsNull, Vec<u8>)
where
    T: sqlx::Encode<'q, sqlx::mysql::MySql>,
{
    let mut buf = Vec::new();
    let is_null = value.encode_by_ref(&mut buf).expect("encode");
    (is_null, buf)
}
