//! Format dispatcher (§4.6): the single public entry point that routes raw
//! bytes to the right decoder by preference list and input shape.

use crate::cac::{decode_cac, CacRecord};
use crate::error::DecodeError;
use crate::magstripe::decode_magstripe;
use crate::pdf417::decode_pdf417;
use crate::record::CredentialRecord;

/// A format a caller may prefer, or `Any` to try every decoder in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Any,
    Magstripe,
    Pdf417,
    Cac,
}

/// Options controlling a single `decode` call.
#[derive(Debug, Clone)]
pub struct DecodeOptions {
    /// Formats to attempt, in order. `Any` expands to
    /// `[Magstripe, Pdf417, Cac]` (§4.6).
    pub formats: Vec<Format>,
    /// Whether an out-of-vocabulary closed-set value is fatal.
    pub strict: bool,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self {
            formats: vec![Format::Any],
            strict: true,
        }
    }
}

/// The decoded credential, tagged by which decoder produced it. CAC
/// records carry a different shape than AAMVA DL/ID records, so the two
/// are kept distinct rather than forced into one structure.
#[derive(Debug, Clone)]
pub enum Credential {
    DlId(CredentialRecord),
    Cac(CacRecord),
}

fn expand(formats: &[Format]) -> Vec<Format> {
    let mut out = Vec::new();
    for f in formats {
        match f {
            Format::Any => out.extend([Format::Magstripe, Format::Pdf417, Format::Cac]),
            other => out.push(*other),
        }
    }
    out
}

/// Decodes `data` per `options` (§4.6, §6.1).
///
/// `ANY` tries MAGSTRIPE, then PDF417, then CAC; a failure in a
/// non-preferred format is silent, a failure in the sole preferred format
/// is fatal.
#[tracing::instrument(skip(data), fields(len = data.len()))]
pub fn decode(data: &[u8], options: &DecodeOptions) -> Result<Credential, DecodeError> {
    if data.is_empty() {
        return Err(DecodeError::NoInput);
    }

    let preferred = expand(&options.formats);
    let single_format = preferred.len() == 1;

    for format in &preferred {
        tracing::debug!(?format, "attempting decoder");
        let result = match format {
            Format::Magstripe => std::str::from_utf8(data)
                .map_err(|_| DecodeError::ReadError("magstripe input is not valid UTF-8".to_owned()))
                .and_then(decode_magstripe)
                .map(Credential::DlId),
            Format::Pdf417 => decode_pdf417(data, options.strict).map(Credential::DlId),
            Format::Cac => decode_cac(data, options.strict).map(Credential::Cac),
            Format::Any => unreachable!("Any is expanded before dispatch"),
        };

        match result {
            Ok(credential) => return Ok(credential),
            Err(err) if single_format => {
                tracing::warn!(?format, %err, "preferred decoder rejected input");
                return Err(err);
            }
            Err(err) => {
                tracing::trace!(?format, %err, "decoder declined, trying next");
                continue;
            }
        }
    }

    Err(DecodeError::UnrecognizedFormat)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn any_recognizes_magstripe_by_prefix() {
        let input = b"%TXAUSTIN^DOE$JOHN^12345 SHERBOURNE ST^?;63601538774194=150819810101?#\" 78729      C               1505130BLKBLK?";
        let options = DecodeOptions::default();
        let credential = decode(input, &options).unwrap();
        match credential {
            Credential::DlId(record) => assert_eq!(record.last, "DOE"),
            Credential::Cac(_) => panic!("expected a DL/ID record"),
        }
    }

    #[test]
    fn empty_input_is_no_input() {
        let options = DecodeOptions::default();
        assert!(matches!(decode(&[], &options), Err(DecodeError::NoInput)));
    }

    #[test]
    fn specific_format_surfaces_its_error_directly() {
        let options = DecodeOptions {
            formats: vec![Format::Cac],
            strict: true,
        };
        let err = decode(b"not a cac", &options).unwrap_err();
        assert!(matches!(err, DecodeError::ReadError(_)));
    }

    #[test]
    fn unrecognized_input_under_any_is_unrecognized_format() {
        let options = DecodeOptions::default();
        let err = decode(b"2xxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxx", &options).unwrap_err();
        assert!(matches!(err, DecodeError::UnrecognizedFormat));
    }
}
