//! Error taxonomy for credential decoding.

use std::fmt;

/// Why a present field failed to parse into its typed value.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum ParseFailure {
    /// A byte outside the base-32-hex alphabet `0-9a-v`.
    InvalidBase32Digit(char),
    /// A fixed-width numeric field did not contain only ASCII digits.
    NotDigits,
    /// A date string did not parse as a real calendar date.
    InvalidDate,
    /// A height string had neither `in`, `cm`, nor a `F'-II"` suffix.
    UnknownHeightUnit,
    /// A sex code was outside `1`, `2`, `9`, `M`, `F`.
    InvalidSexCode,
    /// A fixed-width field had the wrong length.
    WrongLength { expected: usize, got: usize },
}

impl fmt::Display for ParseFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidBase32Digit(c) => write!(f, "invalid base-32-hex digit '{c}'"),
            Self::NotDigits => write!(f, "expected only ASCII digits"),
            Self::InvalidDate => write!(f, "not a valid calendar date"),
            Self::UnknownHeightUnit => write!(f, "unrecognized height unit suffix"),
            Self::InvalidSexCode => write!(f, "sex code outside 1/2/9/M/F"),
            Self::WrongLength { expected, got } => {
                write!(f, "expected {expected} bytes, got {got}")
            }
        }
    }
}

/// Errors returned by `decode` and the individual format decoders.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    /// `decode` was invoked with an empty byte string.
    #[error("no input to decode")]
    NoInput,

    /// No decoder recognized the input under the given preferences.
    #[error("unrecognized credential format")]
    UnrecognizedFormat,

    /// The preferred decoder's envelope or sentinels are malformed.
    #[error("malformed envelope: {0}")]
    ReadError(String),

    /// A present field could not be decoded.
    #[error("field {field}: {reason}")]
    ParseError {
        field: &'static str,
        reason: ParseFailure,
    },

    /// A required element for the selected version is absent.
    #[error("missing required field {code} for version {version}")]
    MissingRequiredField { code: &'static str, version: u8 },

    /// The envelope declared a version with no registered decoder.
    #[error("version {0} is not implemented")]
    NotImplemented(u8),

    /// A closed-set field held an out-of-vocabulary value.
    #[error("unknown value {value:?} for code {code}")]
    UnknownCodeValue { code: &'static str, value: String },
}
