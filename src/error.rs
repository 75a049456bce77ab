use thiserror::Error;

/// Failures produced while moving a scalar across one of its boundaries.
///
/// Every variant is returned to the caller untouched; nothing here is
/// retried or logged.
#[derive(Debug, Error)]
pub enum Error {
    /// A driver value arrived as a column type the scalar cannot accept.
    #[error("{scalar} must be a {expected} but got a {received}")]
    TypeMismatch {
        scalar: &'static str,
        expected: &'static str,
        received: String,
    },

    /// Text input did not match the scalar's format.
    #[error("cannot parse {input:?} as {scalar}: {reason}")]
    Parse {
        scalar: &'static str,
        input: String,
        reason: String,
    },

    /// A geometry payload failed to encode or decode, or a value fell
    /// outside the range its column can represent.
    #[error("{scalar} encoding failed: {reason}")]
    Encoding {
        scalar: &'static str,
        reason: String,
    },

    /// A byte sequence was too short to carry its required metadata.
    #[error("{scalar} value of {len} bytes is too short to hold a spatial reference prefix")]
    Malformed { scalar: &'static str, len: usize },
}

impl Error {
    pub(crate) fn type_mismatch(
        scalar: &'static str,
        expected: &'static str,
        received: impl Into<String>,
    ) -> Self {
        Error::TypeMismatch {
            scalar,
            expected,
            received: received.into(),
        }
    }

    pub(crate) fn parse(
        scalar: &'static str,
        input: &str,
        reason: impl std::fmt::Display,
    ) -> Self {
        Error::Parse {
            scalar,
            input: input.to_owned(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn encoding(scalar: &'static str, reason: impl Into<String>) -> Self {
        Error::Encoding {
            scalar,
            reason: reason.into(),
        }
    }
}
