// src/scalars/datetime.rs
use async_graphql::{InputValueError, InputValueResult, Scalar, ScalarType, Value};
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use sqlx::encode::IsNull;
use sqlx::error::BoxDynError;
use sqlx::mysql::{MySql, MySqlTypeInfo, MySqlValueRef};
use sqlx::types::chrono::NaiveDateTime;
use sqlx::{Decode, Encode, Type, ValueRef};

use crate::error::Error;
use crate::scalars::{trimmed, MySqlColumn};

/// Minute-precision timestamp layout used by the JSON and GraphQL forms.
/// The database column keeps the full timestamp; only the textual forms
/// truncate.
pub const DATE_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M";

const SCALAR: &str = "DateTime";

/// Nullable calendar date and time, formatted to the minute as
/// `YYYY-MM-DDTHH:MM` without a timezone suffix.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct DateTime(pub Option<NaiveDateTime>);

impl DateTime {
    fn format(dt: NaiveDateTime) -> String {
        dt.format(DATE_TIME_FORMAT).to_string()
    }
}

fn parse_date_time(text: &str) -> Result<NaiveDateTime, Error> {
    NaiveDateTime::parse_from_str(text, DATE_TIME_FORMAT)
        .map_err(|err| Error::parse(SCALAR, text, err))
}

impl From<NaiveDateTime> for DateTime {
    fn from(dt: NaiveDateTime) -> Self {
        DateTime(Some(dt))
    }
}

impl From<DateTime> for Option<NaiveDateTime> {
    fn from(dt: DateTime) -> Self {
        dt.0
    }
}

impl Serialize for DateTime {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self.0 {
            Some(dt) => serializer.serialize_str(&Self::format(dt)),
            None => serializer.serialize_none(),
        }
    }
}

impl<'de> Deserialize<'de> for DateTime {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Option::<String>::deserialize(deserializer)? {
            None => Ok(DateTime(None)),
            Some(raw) => match trimmed(&raw) {
                None => Ok(DateTime(None)),
                Some(text) => parse_date_time(text)
                    .map(|dt| DateTime(Some(dt)))
                    .map_err(de::Error::custom),
            },
        }
    }
}

#[Scalar]
impl ScalarType for DateTime {
    fn parse(value: Value) -> InputValueResult<Self> {
        match value {
            Value::Null => Ok(DateTime(None)),
            Value::String(s) => match trimmed(&s) {
                None => Ok(DateTime(None)),
                Some(text) => parse_date_time(text)
                    .map(|dt| DateTime(Some(dt)))
                    .map_err(InputValueError::custom),
            },
            other => Err(InputValueError::expected_type(other)),
        }
    }

    fn to_value(&self) -> Value {
        match self.0 {
            Some(dt) => Value::String(Self::format(dt)),
            None => Value::Null,
        }
    }
}

impl Type<MySql> for DateTime {
    fn type_info() -> MySqlTypeInfo {
        <NaiveDateTime as Type<MySql>>::type_info()
    }

    fn compatible(ty: &MySqlTypeInfo) -> bool {
        <NaiveDateTime as Type<MySql>>::compatible(ty)
    }
}

impl Encode<'_, MySql> for DateTime {
    fn encode_by_ref(&self, buf: &mut Vec<u8>) -> Result<IsNull, BoxDynError> {
        match self.0 {
            Some(ref dt) => <NaiveDateTime as Encode<'_, MySql>>::encode_by_ref(dt, buf),
            None => Ok(IsNull::Yes),
        }
    }
}

impl<'r> Decode<'r, MySql> for DateTime {
    fn decode(value: MySqlValueRef<'r>) -> Result<Self, BoxDynError> {
        if value.is_null() {
            return Ok(DateTime(None));
        }
        let dt = <NaiveDateTime as Decode<'r, MySql>>::decode(value)?;
        Ok(DateTime(Some(dt)))
    }
}

impl MySqlColumn for DateTime {
    fn column_type() -> &'static str {
        "datetime(3)"
    }
}
