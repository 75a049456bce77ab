// src/scalars/point.rs
use async_graphql::{InputValueError, InputValueResult, Scalar, ScalarType, SimpleObject, Value};
use geo_types::Point as GeoPoint;
use serde::{de, Deserialize, Serialize};
use sqlx::encode::IsNull;
use sqlx::error::BoxDynError;
use sqlx::mysql::{MySql, MySqlTypeInfo, MySqlValueRef};
use sqlx::{Decode, Encode, Type, TypeInfo, ValueRef};

use crate::error::Error;
use crate::scalars::{trimmed, MySqlColumn};

/// WGS-84 longitude/latitude, the reference system every new point is
/// tagged with.
pub const WGS84_SRID: u32 = 4326;

const SCALAR: &str = "Point";

/// Byte length of a WKB XY point: order flag, geometry type, two f64 axes.
const WKB_POINT_LEN: usize = 21;
const WKB_POINT_TYPE: u32 = 1;

/// Nullable geographic coordinate stored as a MySQL `geometry` value:
/// a 4-byte little-endian SRID prefix followed by the WKB point.
///
/// The inner point keeps (longitude, latitude) axis order per the WKB
/// convention; [`Point::lat_lng`] swaps back for callers.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Point(Option<SpatialValue>);

#[derive(Clone, Copy, Debug, PartialEq)]
struct SpatialValue {
    point: GeoPoint<f64>,
    srid: u32,
}

/// Latitude/longitude pair handed to resolvers and JSON documents.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize, SimpleObject)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl Point {
    pub fn from_coordinates(lat: f64, lng: f64) -> Self {
        let mut point = Point::default();
        point.set_coordinates(lat, lng);
        point
    }

    /// Sets the point to the given latitude and longitude degrees, tagged
    /// with SRID 4326.
    pub fn set_coordinates(&mut self, lat: f64, lng: f64) {
        self.0 = Some(SpatialValue {
            point: GeoPoint::new(lng, lat),
            srid: WGS84_SRID,
        });
    }

    /// Coordinates of the stored point, `None` when absent.
    pub fn lat_lng(&self) -> Option<LatLng> {
        self.0.map(|value| LatLng {
            lat: value.point.y(),
            lng: value.point.x(),
        })
    }

    /// Spatial reference identifier of the stored point, `None` when absent.
    pub fn srid(&self) -> Option<u32> {
        self.0.map(|value| value.srid)
    }
}

fn encode_column_value(value: SpatialValue) -> Vec<u8> {
    let mut blob = Vec::with_capacity(4 + WKB_POINT_LEN);
    blob.extend_from_slice(&value.srid.to_le_bytes());
    blob.push(0x01); // little-endian WKB
    blob.extend_from_slice(&WKB_POINT_TYPE.to_le_bytes());
    blob.extend_from_slice(&value.point.x().to_le_bytes());
    blob.extend_from_slice(&value.point.y().to_le_bytes());
    blob
}

/// Splits the SRID prefix off a stored geometry value and decodes the WKB
/// payload. The decoded point keeps whatever SRID the row carried.
fn decode_column_value(bytes: &[u8]) -> Result<SpatialValue, Error> {
    if bytes.len() < 4 {
        return Err(Error::Malformed {
            scalar: SCALAR,
            len: bytes.len(),
        });
    }
    let mut srid_bytes = [0u8; 4];
    srid_bytes.copy_from_slice(&bytes[..4]);
    let srid = u32::from_le_bytes(srid_bytes);
    let point = decode_wkb_point(&bytes[4..])?;
    Ok(SpatialValue { point, srid })
}

fn decode_wkb_point(wkb: &[u8]) -> Result<GeoPoint<f64>, Error> {
    if wkb.len() != WKB_POINT_LEN {
        return Err(Error::encoding(
            SCALAR,
            format!(
                "geometry payload must be {WKB_POINT_LEN} bytes, got {}",
                wkb.len()
            ),
        ));
    }
    let big_endian = match wkb[0] {
        0x00 => true,
        0x01 => false,
        flag => {
            return Err(Error::encoding(
                SCALAR,
                format!("unknown byte-order flag {flag:#04x}"),
            ))
        }
    };

    let mut u32_bytes = [0u8; 4];
    u32_bytes.copy_from_slice(&wkb[1..5]);
    let geometry_type = if big_endian {
        u32::from_be_bytes(u32_bytes)
    } else {
        u32::from_le_bytes(u32_bytes)
    };
    if geometry_type != WKB_POINT_TYPE {
        return Err(Error::encoding(
            SCALAR,
            format!("geometry type {geometry_type} is not a point"),
        ));
    }

    let mut axis_bytes = [0u8; 8];
    axis_bytes.copy_from_slice(&wkb[5..13]);
    let x = if big_endian {
        f64::from_be_bytes(axis_bytes)
    } else {
        f64::from_le_bytes(axis_bytes)
    };
    axis_bytes.copy_from_slice(&wkb[13..21]);
    let y = if big_endian {
        f64::from_be_bytes(axis_bytes)
    } else {
        f64::from_le_bytes(axis_bytes)
    };
    Ok(GeoPoint::new(x, y))
}

impl Serialize for Point {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        match self.lat_lng() {
            Some(coords) => coords.serialize(serializer),
            None => serializer.serialize_none(),
        }
    }
}

impl<'de> Deserialize<'de> for Point {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        // An empty string leaves the point absent, like every other scalar
        // here; any other string is a mismatch.
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Coords(LatLng),
            Text(String),
        }

        match Option::<Repr>::deserialize(deserializer)? {
            None => Ok(Point(None)),
            Some(Repr::Coords(coords)) => Ok(Point::from_coordinates(coords.lat, coords.lng)),
            Some(Repr::Text(raw)) => match trimmed(&raw) {
                None => Ok(Point(None)),
                Some(text) => Err(de::Error::custom(Error::parse(
                    SCALAR,
                    text,
                    "expected a lat/lng object",
                ))),
            },
        }
    }
}

#[Scalar]
impl ScalarType for Point {
    fn parse(value: Value) -> InputValueResult<Self> {
        match value {
            Value::Null => Ok(Point(None)),
            Value::String(s) if trimmed(&s).is_none() => Ok(Point(None)),
            Value::Object(_) => {
                let json = value.into_json().map_err(InputValueError::custom)?;
                let coords: LatLng =
                    serde_json::from_value(json).map_err(InputValueError::custom)?;
                Ok(Point::from_coordinates(coords.lat, coords.lng))
            }
            other => Err(InputValueError::expected_type(other)),
        }
    }

    fn to_value(&self) -> Value {
        match self.lat_lng() {
            Some(coords) => serde_json::to_value(coords)
                .ok()
                .and_then(|json| Value::from_json(json).ok())
                .unwrap_or(Value::Null),
            None => Value::Null,
        }
    }
}

impl Type<MySql> for Point {
    fn type_info() -> MySqlTypeInfo {
        <[u8] as Type<MySql>>::type_info()
    }

    fn compatible(ty: &MySqlTypeInfo) -> bool {
        <[u8] as Type<MySql>>::compatible(ty) || ty.name() == "GEOMETRY"
    }
}

impl Encode<'_, MySql> for Point {
    fn encode_by_ref(&self, buf: &mut Vec<u8>) -> Result<IsNull, BoxDynError> {
        match self.0 {
            Some(value) => {
                let blob = encode_column_value(value);
                <Vec<u8> as Encode<'_, MySql>>::encode_by_ref(&blob, buf)
            }
            None => Ok(IsNull::Yes),
        }
    }
}

impl<'r> Decode<'r, MySql> for Point {
    fn decode(value: MySqlValueRef<'r>) -> Result<Self, BoxDynError> {
        if value.is_null() {
            return Ok(Point(None));
        }
        let bytes = <&[u8] as Decode<'r, MySql>>::decode(value)?;
        let spatial = decode_column_value(bytes)?;
        Ok(Point(Some(spatial)))
    }
}

impl MySqlColumn for Point {
    fn column_type() -> &'static str {
        "geometry"
    }
}
