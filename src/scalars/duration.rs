// src/scalars/duration.rs
use async_graphql::{InputValueError, InputValueResult, Scalar, ScalarType, Value};
use chrono::Duration as ChronoDuration;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use sqlx::encode::IsNull;
use sqlx::error::BoxDynError;
use sqlx::mysql::{MySql, MySqlTypeInfo, MySqlValueRef};
use sqlx::{Decode, Encode, Type, ValueRef};

use crate::error::Error;
use crate::scalars::{trimmed, MySqlColumn};

const SCALAR: &str = "Duration";

const NANOS_PER_MICROSECOND: i128 = 1_000;
const NANOS_PER_MILLISECOND: i128 = 1_000_000;
const NANOS_PER_SECOND: i128 = 1_000_000_000;
const NANOS_PER_MINUTE: i128 = 60 * NANOS_PER_SECOND;
const NANOS_PER_HOUR: i128 = 60 * NANOS_PER_MINUTE;

/// Nullable elapsed time, stored as a BIGINT nanosecond count and rendered
/// as unit-suffixed text (`1h2m3s`, `500ms`).
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Duration(pub Option<ChronoDuration>);

impl From<ChronoDuration> for Duration {
    fn from(duration: ChronoDuration) -> Self {
        Duration(Some(duration))
    }
}

impl From<Duration> for Option<ChronoDuration> {
    fn from(duration: Duration) -> Self {
        duration.0
    }
}

/// Renders a duration as unit-suffixed text, largest unit first. Only
/// non-zero components are written; zero renders as `0s` and negative
/// durations carry a leading `-`.
pub fn format_duration(duration: ChronoDuration) -> String {
    let mut nanos =
        i128::from(duration.num_seconds()) * NANOS_PER_SECOND + i128::from(duration.subsec_nanos());
    if nanos == 0 {
        return "0s".to_string();
    }
    let mut out = String::new();
    if nanos < 0 {
        out.push('-');
        nanos = -nanos;
    }
    for (suffix, scale) in [
        ("h", NANOS_PER_HOUR),
        ("m", NANOS_PER_MINUTE),
        ("s", NANOS_PER_SECOND),
        ("ms", NANOS_PER_MILLISECOND),
        ("us", NANOS_PER_MICROSECOND),
        ("ns", 1),
    ] {
        let count = nanos / scale;
        if count > 0 {
            out.push_str(&format!("{count}{suffix}"));
            nanos %= scale;
        }
    }
    out
}

fn unit_nanos(unit: &str) -> Option<i128> {
    match unit {
        "ns" => Some(1),
        "us" | "µs" => Some(NANOS_PER_MICROSECOND),
        "ms" => Some(NANOS_PER_MILLISECOND),
        "s" => Some(NANOS_PER_SECOND),
        "m" => Some(NANOS_PER_MINUTE),
        "h" => Some(NANOS_PER_HOUR),
        _ => None,
    }
}

/// Parses unit-suffixed duration text: an optional sign followed by one or
/// more `<number><unit>` components (`1h30m`, `1.5s`, `300µs`). A bare `0`
/// is accepted; anything outside the signed 64-bit nanosecond range is a
/// parse failure.
pub fn parse_duration(text: &str) -> Result<ChronoDuration, Error> {
    let (negative, mut rest) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text.strip_prefix('+').unwrap_or(text)),
    };
    if rest == "0" {
        return Ok(ChronoDuration::zero());
    }
    if rest.is_empty() {
        return Err(Error::parse(SCALAR, text, "missing duration components"));
    }

    let mut total: i128 = 0;
    while !rest.is_empty() {
        let digits_end = rest
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(rest.len());
        let (int_digits, mut after) = rest.split_at(digits_end);

        let mut frac_digits = "";
        if let Some(frac) = after.strip_prefix('.') {
            let frac_end = frac
                .find(|c: char| !c.is_ascii_digit())
                .unwrap_or(frac.len());
            frac_digits = &frac[..frac_end];
            after = &frac[frac_end..];
        }
        if int_digits.is_empty() && frac_digits.is_empty() {
            return Err(Error::parse(SCALAR, text, "expected a number before the unit"));
        }

        let unit_end = after
            .find(|c: char| c.is_ascii_digit() || c == '.')
            .unwrap_or(after.len());
        let (unit, next) = after.split_at(unit_end);
        let scale = unit_nanos(unit).ok_or_else(|| {
            if unit.is_empty() {
                Error::parse(SCALAR, text, "missing unit suffix")
            } else {
                Error::parse(SCALAR, text, format!("unknown unit {unit:?}"))
            }
        })?;

        let whole: i128 = if int_digits.is_empty() {
            0
        } else {
            int_digits
                .parse()
                .map_err(|_| Error::parse(SCALAR, text, "number too large"))?
        };
        total = whole
            .checked_mul(scale)
            .and_then(|nanos| total.checked_add(nanos))
            .ok_or_else(|| Error::parse(SCALAR, text, "value overflows the nanosecond range"))?;
        if !frac_digits.is_empty() {
            let frac: f64 = format!("0.{frac_digits}")
                .parse()
                .map_err(|_| Error::parse(SCALAR, text, "number too large"))?;
            total += (frac * scale as f64) as i128;
        }
        rest = next;
    }

    if negative {
        total = -total;
    }
    let nanos = i64::try_from(total)
        .map_err(|_| Error::parse(SCALAR, text, "value overflows the nanosecond range"))?;
    Ok(ChronoDuration::nanoseconds(nanos))
}

impl Serialize for Duration {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self.0 {
            Some(duration) => serializer.serialize_str(&format_duration(duration)),
            None => serializer.serialize_none(),
        }
    }
}

impl<'de> Deserialize<'de> for Duration {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Option::<String>::deserialize(deserializer)? {
            None => Ok(Duration(None)),
            Some(raw) => match trimmed(&raw) {
                None => Ok(Duration(None)),
                Some(text) => parse_duration(text)
                    .map(|duration| Duration(Some(duration)))
                    .map_err(de::Error::custom),
            },
        }
    }
}

#[Scalar]
impl ScalarType for Duration {
    fn parse(value: Value) -> InputValueResult<Self> {
        match value {
            Value::Null => Ok(Duration(None)),
            Value::String(s) => match trimmed(&s) {
                None => Ok(Duration(None)),
                Some(text) => parse_duration(text)
                    .map(|duration| Duration(Some(duration)))
                    .map_err(InputValueError::custom),
            },
            other => Err(InputValueError::expected_type(other)),
        }
    }

    fn to_value(&self) -> Value {
        match self.0 {
            Some(duration) => Value::String(format_duration(duration)),
            None => Value::Null,
        }
    }
}

impl Type<MySql> for Duration {
    fn type_info() -> MySqlTypeInfo {
        <i64 as Type<MySql>>::type_info()
    }

    fn compatible(ty: &MySqlTypeInfo) -> bool {
        <i64 as Type<MySql>>::compatible(ty)
    }
}

impl Encode<'_, MySql> for Duration {
    fn encode_by_ref(&self, buf: &mut Vec<u8>) -> Result<IsNull, BoxDynError> {
        match self.0 {
            Some(duration) => {
                let nanos = duration.num_nanoseconds().ok_or_else(|| {
                    Error::encoding(SCALAR, "duration exceeds the BIGINT nanosecond range")
                })?;
                <i64 as Encode<'_, MySql>>::encode_by_ref(&nanos, buf)
            }
            None => Ok(IsNull::Yes),
        }
    }
}

impl<'r> Decode<'r, MySql> for Duration {
    fn decode(value: MySqlValueRef<'r>) -> Result<Self, BoxDynError> {
        if value.is_null() {
            return Ok(Duration(None));
        }
        let ty = value.type_info().into_owned();
        if !<i64 as Type<MySql>>::compatible(&ty) {
            return Err(Error::type_mismatch(SCALAR, "BIGINT", ty.to_string()).into());
        }
        let nanos = <i64 as Decode<'r, MySql>>::decode(value)?;
        Ok(Duration(Some(ChronoDuration::nanoseconds(nanos))))
    }
}

impl MySqlColumn for Duration {
    fn column_type() -> &'static str {
        "BIGINT"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scalars::mysql_encode;

    fn nanos(n: i64) -> ChronoDuration {
        ChronoDuration::nanoseconds(n)
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(ChronoDuration::zero()), "0s");
        assert_eq!(
            format_duration(ChronoDuration::seconds(3723)),
            "1h2m3s"
        );
        assert_eq!(format_duration(ChronoDuration::milliseconds(500)), "500ms");
        assert_eq!(format_duration(nanos(1_500_000_000)), "1s500ms");
        assert_eq!(format_duration(ChronoDuration::seconds(-90)), "-1m30s");
        assert_eq!(format_duration(nanos(1_000_500)), "1ms500ns");
        assert_eq!(format_duration(ChronoDuration::microseconds(300)), "300us");
    }

    #[test]
    fn test_parse_duration() {
        assert_eq!(
            parse_duration("1h2m3s").unwrap(),
            ChronoDuration::seconds(3723)
        );
        assert_eq!(parse_duration("0").unwrap(), ChronoDuration::zero());
        assert_eq!(parse_duration("1.5s").unwrap(), nanos(1_500_000_000));
        assert_eq!(
            parse_duration("300µs").unwrap(),
            ChronoDuration::microseconds(300)
        );
        assert_eq!(
            parse_duration("300us").unwrap(),
            ChronoDuration::microseconds(300)
        );
        assert_eq!(parse_duration("-1m30s").unwrap(), ChronoDuration::seconds(-90));
        assert_eq!(parse_duration("+10m").unwrap(), ChronoDuration::minutes(10));
        assert_eq!(parse_duration(".5s").unwrap(), nanos(500_000_000));
    }

    #[test]
    fn test_parse_duration_rejects_malformed_input() {
        assert!(parse_duration("").is_err());
        assert!(parse_duration("abc").is_err());
        // A number with no unit suffix.
        assert!(parse_duration("17").is_err());
        assert!(parse_duration("10x").is_err());
        assert!(parse_duration("h").is_err());
        // One past i64::MAX nanoseconds.
        assert!(parse_duration("9223372036854775808ns").is_err());
        assert!(parse_duration("9999999999999h").is_err());
    }

    #[test]
    fn test_text_round_trip_preserves_nanoseconds() {
        for duration in [
            nanos(1),
            nanos(999),
            ChronoDuration::microseconds(1_000_001),
            ChronoDuration::seconds(3723),
            nanos(i64::MAX),
            nanos(-1_500_000_000),
        ] {
            let text = format_duration(duration);
            assert_eq!(parse_duration(&text).unwrap(), duration, "{text}");
        }
    }

    #[test]
    fn test_json_round_trip() {
        let duration = Duration(Some(ChronoDuration::seconds(3723)));
        let json = serde_json::to_string(&duration).unwrap();
        assert_eq!(json, "\"1h2m3s\"");

        let back: Duration = serde_json::from_str(&json).unwrap();
        assert_eq!(back, duration);
    }

    #[test]
    fn test_json_null_and_empty() {
        assert_eq!(serde_json::to_string(&Duration(None)).unwrap(), "null");

        let back: Duration = serde_json::from_str("null").unwrap();
        assert_eq!(back, Duration(None));

        let back: Duration = serde_json::from_str("\" \"").unwrap();
        assert_eq!(back, Duration(None));

        assert!(serde_json::from_str::<Duration>("\"bogus\"").is_err());
        assert!(serde_json::from_str::<Duration>("17").is_err());
    }

    #[test]
    fn test_scalar_parse() {
        let duration = Duration::parse(Value::String(" 1h30m ".to_string())).unwrap();
        assert_eq!(duration, Duration(Some(ChronoDuration::minutes(90))));

        assert_eq!(Duration::parse(Value::Null).unwrap(), Duration(None));
        assert_eq!(
            Duration::parse(Value::String(String::new())).unwrap(),
            Duration(None)
        );

        assert!(Duration::parse(Value::Number(17.into())).is_err());
        assert!(Duration::parse(Value::String("bogus".to_string())).is_err());
    }

    #[test]
    fn test_scalar_to_value() {
        assert_eq!(Duration(None).to_value(), Value::Null);
        assert_eq!(
            Duration(Some(ChronoDuration::milliseconds(500))).to_value(),
            Value::String("500ms".to_string())
        );
    }

    #[test]
    fn test_mysql_encode_writes_nanosecond_count() {
        let (is_null, buf) = mysql_encode(&Duration(None));
        assert!(matches!(is_null, IsNull::Yes));
        assert!(buf.is_empty());

        let (is_null, buf) = mysql_encode(&Duration(Some(ChronoDuration::seconds(1))));
        assert!(matches!(is_null, IsNull::No));
        assert_eq!(buf, 1_000_000_000i64.to_le_bytes());
    }
}
