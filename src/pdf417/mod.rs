//! PDF417 AAMVA barcode envelope parser (§4.3) and versioned field
//! decoders (§4.4).

mod versions;

use std::collections::HashMap;

use crate::error::DecodeError;
use crate::record::CredentialRecord;

const LINEFEED: u8 = 0x0A;
const RECORD_SEP: u8 = 0x1E;
const RECORD_SEP_DEVIATION: u8 = 0x1C;
const SEGMENT_TERMINATOR: u8 = 0x0D;

/// Known off-by-one first-subfile-offset deviations, keyed by `(IIN,
/// version)` rather than an inline `if`, so a newly observed jurisdiction
/// deviation is a table entry instead of a new branch.
const OFFSET_FIXUPS: &[(&str, u8, i64)] = &[("636005", 0, 1), ("636005", 1, 1)];

fn offset_fixup(iin: &str, version: u8) -> i64 {
    OFFSET_FIXUPS
        .iter()
        .find(|(fixup_iin, fixup_version, _)| *fixup_iin == iin && *fixup_version == version)
        .map(|(_, _, bias)| *bias)
        .unwrap_or(0)
}

fn digits(bytes: &[u8], range: std::ops::Range<usize>, what: &'static str) -> Result<usize, DecodeError> {
    let slice = bytes
        .get(range)
        .ok_or_else(|| DecodeError::ReadError(format!("envelope too short reading {what}")))?;
    std::str::from_utf8(slice)
        .ok()
        .and_then(|s| s.parse().ok())
        .ok_or_else(|| DecodeError::ReadError(format!("{what} is not a decimal integer")))
}

/// Parses the 4-byte compliance header and yields the IIN, the format
/// version, and any deviation warnings observed along the way.
struct Header {
    iin: String,
    version: u8,
    warnings: Vec<String>,
}

fn parse_header(data: &[u8]) -> Result<Header, DecodeError> {
    if data.first() != Some(&b'@') {
        return Err(DecodeError::ReadError("missing compliance character '@'".to_owned()));
    }
    if data.get(1) != Some(&LINEFEED) {
        return Err(DecodeError::ReadError("missing data element separator (LF)".to_owned()));
    }

    let mut warnings = Vec::new();
    match data.get(2) {
        Some(&RECORD_SEP) => {}
        Some(&RECORD_SEP_DEVIATION) => {
            tracing::warn!("record separator 0x1E missing, got 0x1C instead");
            warnings.push("record separator 0x1E missing, got 0x1C instead (older South Carolina issuance)".to_owned());
        }
        _ => return Err(DecodeError::ReadError("missing record separator".to_owned())),
    }
    if data.get(3) != Some(&SEGMENT_TERMINATOR) {
        return Err(DecodeError::ReadError("missing segment terminator (CR)".to_owned()));
    }

    let filetype = data.get(4..9).unwrap_or_default();
    if filetype == b"AAMVA" {
        tracing::warn!("file type 'AAMVA' in place of 'ANSI '");
        warnings.push("file type 'AAMVA' in place of 'ANSI ' (older Maryland issuance)".to_owned());
    } else if filetype != b"ANSI " {
        return Err(DecodeError::ReadError(format!(
            "wrong file type {:?}, should be 'ANSI '",
            String::from_utf8_lossy(filetype)
        )));
    }

    let iin_bytes = data
        .get(9..15)
        .ok_or_else(|| DecodeError::ReadError("envelope too short reading issuer identification number".to_owned()))?;
    if !iin_bytes.iter().all(u8::is_ascii_digit) {
        return Err(DecodeError::ReadError("issuer identification number is not numeric".to_owned()));
    }
    let iin = String::from_utf8_lossy(iin_bytes).into_owned();

    let version = digits(data, 15..17, "format version")?;
    if version > 63 {
        return Err(DecodeError::ReadError(format!("invalid format version {version}, should be 0-63")));
    }

    Ok(Header {
        iin,
        version: version as u8,
        warnings,
    })
}

/// Reads subfile descriptors and bodies for versions 0-1, whose header has
/// no jurisdiction version field and whose first descriptor is embedded at
/// a fixed offset following the entry count.
fn read_subfiles_v01(data: &[u8], iin: &str, version: u8) -> Result<Vec<Vec<u8>>, DecodeError> {
    let entries = digits(data, 17..19, "entry count")?;

    let record_type = data
        .get(19..21)
        .ok_or_else(|| DecodeError::ReadError("envelope too short reading subfile type".to_owned()))?;
    if record_type != b"DL" && record_type != b"ID" {
        return Err(DecodeError::ReadError(format!(
            "not a driver's license or ID (got {:?}, should be 'DL' or 'ID')",
            String::from_utf8_lossy(record_type)
        )));
    }

    let declared_offset = digits(data, 21..25, "subfile offset")? as i64;
    let bias = offset_fixup(iin, version);
    if bias != 0 {
        tracing::debug!(iin, version, bias, "applying known subfile-offset fixup");
    }
    let offset = (declared_offset + bias) as usize;
    let length = digits(data, 25..29, "subfile length")?;

    let mut bodies = Vec::with_capacity(entries.max(1));
    let first_body = data
        .get(offset..offset + length)
        .ok_or_else(|| DecodeError::ReadError("subfile body out of range".to_owned()))?;
    let mut first_body = first_body.to_vec();
    while first_body.last() == Some(&b'\r') {
        first_body.pop();
    }
    if !first_body.starts_with(record_type) {
        let mut prefixed = record_type.to_vec();
        prefixed.extend_from_slice(&first_body);
        first_body = prefixed;
    }
    bodies.push(first_body);

    let mut read_offset = 10usize;
    for _ in 0..entries.saturating_sub(1) {
        let offset = digits(data, read_offset + 21..read_offset + 25, "subfile offset")?;
        let length = digits(data, read_offset + 25..read_offset + 29, "subfile length")? + 2;
        let body = data
            .get(offset..offset + length)
            .ok_or_else(|| DecodeError::ReadError("subfile body out of range".to_owned()))?;
        bodies.push(body.to_vec());
        read_offset += 10;
    }

    Ok(bodies)
}

/// Reads subfile descriptors and bodies for versions 2-9, whose header adds
/// a 2-digit jurisdiction version before the entry count.
fn read_subfiles_v2plus(data: &[u8]) -> Result<Vec<Vec<u8>>, DecodeError> {
    let _jurisdiction_version = digits(data, 17..19, "jurisdiction version")?;
    let entries = digits(data, 19..21, "entry count")?;

    let mut bodies = Vec::with_capacity(entries);
    let mut read_offset = 0usize;
    for _ in 0..entries {
        let offset = digits(data, read_offset + 23..read_offset + 27, "subfile offset")?;
        let length = digits(data, read_offset + 27..read_offset + 31, "subfile length")?;
        let body = data
            .get(offset..offset + length)
            .ok_or_else(|| DecodeError::ReadError("subfile body out of range".to_owned()))?;
        bodies.push(body.to_vec());
        read_offset += 10;
    }

    Ok(bodies)
}

/// Flattens subfile bodies into a code → value element map, splitting on
/// line feeds and stripping the leading `DL`/`ID` record-type prefix from
/// the first line. Duplicate keys overwrite earlier values and push a
/// warning.
fn build_element_map(bodies: Vec<Vec<u8>>, warnings: &mut Vec<String>) -> HashMap<String, String> {
    let mut joined = bodies.join(&LINEFEED);
    joined.retain(|&b| b != SEGMENT_TERMINATOR);

    let mut lines: Vec<Vec<u8>> = joined.split(|&b| b == LINEFEED).map(|l| l.to_vec()).collect();
    if let Some(first) = lines.first_mut() {
        if first.len() >= 2 {
            first.drain(0..2);
        }
    }

    let mut map = HashMap::new();
    for line in lines {
        if line.len() < 3 {
            continue;
        }
        let (code, value) = line.split_at(3);
        let code = String::from_utf8_lossy(code).into_owned();
        let value = String::from_utf8_lossy(value).trim().to_owned();
        if map.insert(code.clone(), value).is_some() {
            warnings.push(format!("duplicate element code {code}; later value kept"));
        }
    }
    map
}

/// Decodes a PDF417 AAMVA barcode payload (§4.3, §4.4).
pub fn decode_pdf417(data: &[u8], strict: bool) -> Result<CredentialRecord, DecodeError> {
    if data.is_empty() {
        return Err(DecodeError::NoInput);
    }

    // Leading garbage before the first '@' is stripped.
    let start = data
        .iter()
        .position(|&b| b == b'@')
        .ok_or_else(|| DecodeError::ReadError("no compliance character '@' found".to_owned()))?;
    let data = &data[start..];

    let header = parse_header(data)?;
    let mut warnings = header.warnings;

    tracing::debug!(iin = %header.iin, version = header.version, "parsed PDF417 header");

    let bodies = match header.version {
        0 | 1 => read_subfiles_v01(data, &header.iin, header.version)?,
        2..=9 => read_subfiles_v2plus(data)?,
        other => return Err(DecodeError::NotImplemented(other)),
    };

    let elements = build_element_map(bodies, &mut warnings);

    let mut record = match header.version {
        1 => versions::decode_v1(&elements, &header.iin, strict)?,
        3 => versions::decode_v3(&elements, &header.iin, strict)?,
        4 => versions::decode_v4(&elements, &header.iin, strict)?,
        5 => versions::decode_v5(&elements, &header.iin, strict)?,
        6 => versions::decode_v6(&elements, &header.iin, strict)?,
        7 | 8 => versions::decode_v8(&elements, &header.iin, header.version, strict)?,
        9 => versions::decode_v9(&elements, &header.iin, strict)?,
        other => return Err(DecodeError::NotImplemented(other)),
    };

    record.warnings.splice(0..0, warnings);
    record.standards = record.warnings.is_empty();
    Ok(record)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_v3() -> Vec<u8> {
        let elements = [
            ("DCS", "MAURY"),
            ("DCT", "JUSTIN,WILLIAM"),
            ("DAG", "123 MAIN ST"),
            ("DAI", "RICHMOND"),
            ("DAJ", "VA"),
            ("DAK", "23219"),
            ("DCG", "USA"),
            ("DAQ", "T16700185"),
            ("DCF", "061234567"),
            ("DCA", "D"),
            ("DCB", "NONE"),
            ("DCD", "NONE"),
            ("DBC", "1"),
            ("DAU", "075 in"),
            ("DAY", "BLU"),
            ("DBA", "08142017"),
            ("DBB", "07151958"),
            ("DBD", "08142009"),
        ];
        build_dl_envelope(2, 3, &elements)
    }

    fn build_dl_envelope(jurisdiction_version: u32, version: u8, elements: &[(&str, &str)]) -> Vec<u8> {
        let mut body = Vec::new();
        body.extend_from_slice(b"DL");
        for (code, value) in elements {
            body.push(code.as_bytes()[0]);
            body.extend_from_slice(&code.as_bytes()[1..]);
            body.extend_from_slice(value.as_bytes());
            body.push(LINEFEED);
        }
        body.push(SEGMENT_TERMINATOR);

        let header_len = 31;
        let offset = header_len;
        let length = body.len();

        let mut out = Vec::new();
        out.extend_from_slice(b"@\n\x1e\rANSI ");
        out.extend_from_slice(b"636000"); // IIN
        out.extend_from_slice(format!("{version:02}").as_bytes());
        out.extend_from_slice(format!("{jurisdiction_version:02}").as_bytes());
        out.extend_from_slice(b"01"); // entry count
        out.extend_from_slice(b"DL");
        out.extend_from_slice(format!("{offset:04}").as_bytes());
        out.extend_from_slice(format!("{length:04}").as_bytes());
        out.extend_from_slice(&body);
        out
    }

    #[test]
    fn decodes_v3_envelope() {
        let data = sample_v3();
        let record = decode_pdf417(&data, false).unwrap();
        assert_eq!(record.first, "JUSTIN");
        assert_eq!(record.middle.as_deref(), Some("WILLIAM"));
        assert_eq!(record.last, "MAURY");
        assert_eq!(record.version, 3);
        assert_eq!(record.document.as_deref(), Some("061234567"));
    }

    #[test]
    fn strips_leading_garbage_before_at_sign() {
        let mut data = b"garbage-before-header".to_vec();
        data.extend_from_slice(&sample_v3());
        let record = decode_pdf417(&data, false).unwrap();
        assert_eq!(record.last, "MAURY");
    }

    #[test]
    fn accepts_aamva_filetype_deviation_with_warning() {
        let mut data = sample_v3();
        data[4..9].copy_from_slice(b"AAMVA");
        let record = decode_pdf417(&data, false).unwrap();
        assert!(record.warnings.iter().any(|w| w.contains("AAMVA")));
        assert!(!record.standards);
    }

    #[test]
    fn rejects_empty_input() {
        assert!(matches!(decode_pdf417(&[], false), Err(DecodeError::NoInput)));
    }
}
