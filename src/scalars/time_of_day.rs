// src/scalars/time_of_day.rs
use async_graphql::{InputValueError, InputValueResult, Scalar, ScalarType, Value};
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use sqlx::encode::IsNull;
use sqlx::error::BoxDynError;
use sqlx::mysql::{MySql, MySqlTypeInfo, MySqlValueRef};
use sqlx::types::chrono::NaiveTime;
use sqlx::{Decode, Encode, Type, ValueRef};

use crate::error::Error;
use crate::scalars::{trimmed, MySqlColumn};

/// Clock-time layout used everywhere a [`TimeOfDay`] is rendered as text.
pub const TIME_OF_DAY_FORMAT: &str = "%H:%M";

/// Layout of the stored column value. The database hands back full second
/// precision; every rendered form stops at the minute.
pub const TIME_OF_DAY_FORMAT_EXTENDED: &str = "%H:%M:%S";

const SCALAR: &str = "TimeOfDay";

/// Nullable clock time, formatted as `HH:MM`.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct TimeOfDay(pub Option<NaiveTime>);

impl TimeOfDay {
    fn format(time: NaiveTime) -> String {
        time.format(TIME_OF_DAY_FORMAT).to_string()
    }
}

fn parse_time_of_day(text: &str) -> Result<NaiveTime, Error> {
    NaiveTime::parse_from_str(text, TIME_OF_DAY_FORMAT)
        .map_err(|err| Error::parse(SCALAR, text, err))
}

fn parse_stored_time(text: &str) -> Result<NaiveTime, Error> {
    NaiveTime::parse_from_str(text, TIME_OF_DAY_FORMAT_EXTENDED)
        .map_err(|err| Error::parse(SCALAR, text, err))
}

impl From<NaiveTime> for TimeOfDay {
    fn from(time: NaiveTime) -> Self {
        TimeOfDay(Some(time))
    }
}

impl From<TimeOfDay> for Option<NaiveTime> {
    fn from(time: TimeOfDay) -> Self {
        time.0
    }
}

impl Serialize for TimeOfDay {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self.0 {
            Some(time) => serializer.serialize_str(&Self::format(time)),
            None => serializer.serialize_none(),
        }
    }
}

impl<'de> Deserialize<'de> for TimeOfDay {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Option::<String>::deserialize(deserializer)? {
            None => Ok(TimeOfDay(None)),
            Some(raw) => match trimmed(&raw) {
                None => Ok(TimeOfDay(None)),
                Some(text) => parse_time_of_day(text)
                    .map(|time| TimeOfDay(Some(time)))
                    .map_err(de::Error::custom),
            },
        }
    }
}

#[Scalar]
impl ScalarType for TimeOfDay {
    fn parse(value: Value) -> InputValueResult<Self> {
        match value {
            Value::Null => Ok(TimeOfDay(None)),
            Value::String(s) => match trimmed(&s) {
                None => Ok(TimeOfDay(None)),
                Some(text) => parse_time_of_day(text)
                    .map(|time| TimeOfDay(Some(time)))
                    .map_err(InputValueError::custom),
            },
            other => Err(InputValueError::expected_type(other)),
        }
    }

    fn to_value(&self) -> Value {
        match self.0 {
            Some(time) => Value::String(Self::format(time)),
            None => Value::Null,
        }
    }
}

impl Type<MySql> for TimeOfDay {
    fn type_info() -> MySqlTypeInfo {
        <NaiveTime as Type<MySql>>::type_info()
    }

    fn compatible(ty: &MySqlTypeInfo) -> bool {
        // The encoder sends text, so string columns are accepted alongside
        // TIME.
        <NaiveTime as Type<MySql>>::compatible(ty) || <str as Type<MySql>>::compatible(ty)
    }
}

impl Encode<'_, MySql> for TimeOfDay {
    fn encode_by_ref(&self, buf: &mut Vec<u8>) -> Result<IsNull, BoxDynError> {
        match self.0 {
            Some(time) => <String as Encode<'_, MySql>>::encode_by_ref(&Self::format(time), buf),
            None => Ok(IsNull::Yes),
        }
    }

    fn produces(&self) -> Option<MySqlTypeInfo> {
        // Parameters travel as text; the server coerces into the TIME column.
        Some(<str as Type<MySql>>::type_info())
    }
}

impl<'r> Decode<'r, MySql> for TimeOfDay {
    fn decode(value: MySqlValueRef<'r>) -> Result<Self, BoxDynError> {
        if value.is_null() {
            return Ok(TimeOfDay(None));
        }
        let text = <&str as Decode<'r, MySql>>::decode(value)?;
        let time = parse_stored_time(text)?;
        Ok(TimeOfDay(Some(time)))
    }
}

impl MySqlColumn for TimeOfDay {
    fn column_type() -> &'static str {
        "TIME"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scalars::mysql_encode;

    fn sample() -> NaiveTime {
        NaiveTime::from_hms_opt(9, 5, 0).unwrap()
    }

    #[test]
    fn test_stored_value_truncates_to_minute() {
        // The column stores seconds; the JSON form drops them.
        let time = parse_stored_time("09:05:00").unwrap();
        let json = serde_json::to_string(&TimeOfDay(Some(time))).unwrap();
        assert_eq!(json, "\"09:05\"");

        let time = parse_stored_time("23:59:42").unwrap();
        let json = serde_json::to_string(&TimeOfDay(Some(time))).unwrap();
        assert_eq!(json, "\"23:59\"");
    }

    #[test]
    fn test_stored_value_requires_seconds() {
        assert!(parse_stored_time("09:05").is_err());
        assert!(parse_stored_time("not-a-time").is_err());
    }

    #[test]
    fn test_json_round_trip() {
        let json = "\"09:05\"";
        let time: TimeOfDay = serde_json::from_str(json).unwrap();
        assert_eq!(time, TimeOfDay(Some(sample())));
        assert_eq!(serde_json::to_string(&time).unwrap(), json);
    }

    #[test]
    fn test_json_null_and_empty() {
        assert_eq!(serde_json::to_string(&TimeOfDay(None)).unwrap(), "null");

        let back: TimeOfDay = serde_json::from_str("null").unwrap();
        assert_eq!(back, TimeOfDay(None));

        let back: TimeOfDay = serde_json::from_str("\"  \"").unwrap();
        assert_eq!(back, TimeOfDay(None));

        // Seconds are not part of the textual contract.
        assert!(serde_json::from_str::<TimeOfDay>("\"09:05:00\"").is_err());
        assert!(serde_json::from_str::<TimeOfDay>("905").is_err());
    }

    #[test]
    fn test_scalar_parse() {
        let time = TimeOfDay::parse(Value::String(" 09:05 ".to_string())).unwrap();
        assert_eq!(time, TimeOfDay(Some(sample())));

        assert_eq!(TimeOfDay::parse(Value::Null).unwrap(), TimeOfDay(None));
        assert_eq!(
            TimeOfDay::parse(Value::String(String::new())).unwrap(),
            TimeOfDay(None)
        );

        assert!(TimeOfDay::parse(Value::Number(905.into())).is_err());
        assert!(TimeOfDay::parse(Value::String("25:61".to_string())).is_err());
    }

    #[test]
    fn test_scalar_to_value() {
        assert_eq!(TimeOfDay(None).to_value(), Value::Null);
        assert_eq!(
            TimeOfDay(Some(sample())).to_value(),
            Value::String("09:05".to_string())
        );
    }

    #[test]
    fn test_mysql_encode_sends_minute_text() {
        let (is_null, buf) = mysql_encode(&TimeOfDay(None));
        assert!(matches!(is_null, IsNull::Yes));
        assert!(buf.is_empty());

        let (is_null, buf) = mysql_encode(&TimeOfDay(Some(sample())));
        assert!(matches!(is_null, IsNull::No));
        let (_, text_buf) = mysql_encode(&"09:05".to_string());
        assert_eq!(buf, text_buf);

        assert_eq!(
            Encode::<MySql>::produces(&TimeOfDay(Some(sample()))),
            Some(<str as Type<MySql>>::type_info())
        );
    }
}
