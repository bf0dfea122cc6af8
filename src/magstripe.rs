//! Three-track magstripe decoder (§4.2).
//!
//! Magstripe format carries no format version and no `DCG` country field;
//! dates are always `MMDDYYYY`-free fixed encodings local to the track
//! layout, and the unit system is always imperial.

use chrono::NaiveDate;

use crate::codec::magstripe_expiry;
use crate::error::{DecodeError, ParseFailure};
use crate::physical::{EyeColor, HairColor, Height, Units, Weight};
use crate::record::{ArrivalDates, CardType, CredentialRecord, Sex};

fn field_error(field: &'static str, reason: ParseFailure) -> DecodeError {
    DecodeError::ParseError { field, reason }
}

fn parse_sex(code: &str, warnings: &mut Vec<String>) -> Result<Sex, DecodeError> {
    match code.trim() {
        "1" => Ok(Sex::Male),
        "2" => Ok(Sex::Female),
        "9" => Ok(Sex::NotSpecified),
        "M" => {
            tracing::warn!("sex code 'M' is a non-standard literal");
            warnings.push("sex code 'M' is a non-standard literal; treating as MALE".to_owned());
            Ok(Sex::Male)
        }
        "F" => {
            tracing::warn!("sex code 'F' is a non-standard literal");
            warnings.push("sex code 'F' is a non-standard literal; treating as FEMALE".to_owned());
            Ok(Sex::Female)
        }
        _ => Err(field_error("sex", ParseFailure::InvalidSexCode)),
    }
}

/// Decodes a three-track magstripe payload (§4.2).
pub fn decode_magstripe(input: &str) -> Result<CredentialRecord, DecodeError> {
    tracing::debug!(len = input.len(), "decoding magstripe input");
    if input.is_empty() {
        return Err(DecodeError::NoInput);
    }

    let mut warnings = Vec::new();

    let fields: Vec<&str> = input.split('^').collect();
    if fields.len() < 3 {
        return Err(DecodeError::ReadError(
            "magstripe input must contain at least three `^`-delimited fields".to_owned(),
        ));
    }

    let field0 = fields[0];
    if !field0.starts_with('%') {
        return Err(DecodeError::ReadError(
            "magstripe field 0 must begin with '%'".to_owned(),
        ));
    }
    if field0.starts_with("%E?") {
        return Err(DecodeError::ReadError(
            "magstripe start sentinel reports a reader error".to_owned(),
        ));
    }

    if field0.len() < 3 {
        return Err(DecodeError::ReadError(
            "magstripe field 0 is too short to contain a state code".to_owned(),
        ));
    }
    let state = field0[1..3].to_owned();

    // City is a fixed 13-character field starting at offset 3, excluding the
    // `^` field separator. When field 0 is long enough to fill all 13, the
    // name has nowhere else to go but directly after it in the same field,
    // and every subsequent field shifts up by one position.
    let rest0 = &field0[3..];
    let (city, name_field, address_field_index) = if rest0.len() >= 13 {
        let (city_part, name_tail) = rest0.split_at(13);
        (city_part.trim_end().to_owned(), name_tail.to_owned(), 1)
    } else {
        let name = fields
            .get(1)
            .copied()
            .ok_or_else(|| DecodeError::ReadError("missing magstripe name field".to_owned()))?;
        (rest0.trim_end().to_owned(), name.to_owned(), 2)
    };

    let name_parts: Vec<&str> = name_field.split('$').collect();
    let last = name_parts
        .first()
        .copied()
        .unwrap_or_default()
        .trim()
        .to_owned();
    let first = name_parts
        .get(1)
        .copied()
        .unwrap_or_default()
        .trim()
        .to_owned();
    let middle = name_parts
        .get(2)
        .map(|m| m.trim())
        .filter(|m| !m.is_empty())
        .map(str::to_owned);

    let address = fields
        .get(address_field_index)
        .copied()
        .unwrap_or_default()
        .split('$')
        .next()
        .unwrap_or_default()
        .trim()
        .to_owned();

    // Everything after the address field belongs to tracks 2 and 3,
    // separated by `?`.
    let remainder = fields[address_field_index + 1..].join("^");
    // `remainder` opens with the track-1 end sentinel `?` left over from the
    // split above; drop it before splitting tracks 2 and 3 apart.
    let remainder = remainder.strip_prefix('?').unwrap_or(&remainder);
    let mut track_parts = remainder.splitn(2, '?');
    let track2_raw = track_parts.next().unwrap_or_default();
    let track3_raw = track_parts.next().unwrap_or_default();

    let track2 = track2_raw.strip_prefix(';').unwrap_or(track2_raw);

    let eq_parts: Vec<&str> = track2.split('=').collect();
    if eq_parts.len() != 2 && eq_parts.len() != 3 {
        return Err(DecodeError::ReadError(
            "magstripe track 2 must contain one or two '=' separators".to_owned(),
        ));
    }
    let part0 = eq_parts[0];
    let part1 = eq_parts[1];

    let iin = part0.get(0..6).unwrap_or_default().to_owned();
    // Three equals-separated parts means the license number fit without
    // overflowing into part 1; two parts means it overflowed and the tail
    // lives at a fixed offset into part 1.
    let license_number = if eq_parts.len() == 3 {
        part0.get(6..20.min(part0.len())).unwrap_or_default().trim().to_owned()
    } else {
        let head = part0.get(6..20.min(part0.len())).unwrap_or_default();
        let tail = part1.get(13..25.min(part1.len())).unwrap_or_default();
        format!("{head}{tail}").trim().to_owned()
    };

    if part1.len() < 12 {
        return Err(DecodeError::ReadError(
            "magstripe track 2 expiry/DOB field is too short".to_owned(),
        ));
    }
    let expiry_digits = &part1[0..4];
    let dob_digits = &part1[4..12];

    let expiry = magstripe_expiry(expiry_digits).map_err(|r| field_error("expiry", r))?;
    let dob = parse_magstripe_dob(dob_digits)?;

    // Track 3, fixed width, offset by one unused leading byte: template(1)
    // security(1) postal(11) class(2) restrictions(10) endorsements(4)
    // sex(1) height(3) weight(3) hair(3) eyes(3).
    let track3 = track3_raw.trim_end_matches('?');
    let field_at = |range: std::ops::Range<usize>, name: &'static str| -> Result<&str, DecodeError> {
        track3
            .get(range)
            .ok_or_else(|| DecodeError::ReadError(format!("magstripe track 3 too short reading {name}")))
    };

    let _template = field_at(1..2, "template")?;
    let _security = field_at(2..3, "security")?;
    let postal = field_at(3..14, "postal")?.trim().to_owned();
    let class = field_at(14..16, "class")?.trim().to_owned();
    let restrictions = field_at(16..26, "restrictions")?.trim().to_owned();
    let endorsements = field_at(26..30, "endorsements")?.trim().to_owned();
    let sex_code = field_at(30..31, "sex")?;
    let height_digits = field_at(31..34, "height")?;
    let weight_digits = field_at(34..37, "weight")?;
    let hair_code = field_at(37..40, "hair")?;
    let eyes_code = field_at(40..43, "eyes")?;

    let sex = parse_sex(sex_code, &mut warnings)?;
    let height = Height::from_magstripe_digits(height_digits).map_err(|r| field_error("height", r))?;
    let weight_value: u32 = weight_digits
        .trim()
        .parse()
        .map_err(|_| field_error("weight", ParseFailure::NotDigits))?;
    let weight = Some(Weight::exact(weight_value, Units::Imperial));

    let hair = HairColor::from_code(hair_code);
    if hair.is_none() && !hair_code.trim().is_empty() {
        warnings.push(format!("unknown hair colour code {hair_code:?}"));
    }
    let eyes = EyeColor::from_code(eyes_code);
    if eyes.is_none() && !eyes_code.trim().is_empty() {
        warnings.push(format!("unknown eye colour code {eyes_code:?}"));
    }

    let standards = warnings.is_empty();

    Ok(CredentialRecord {
        first,
        last,
        middle,
        suffix: None,
        prefix: None,
        address: Some(address),
        address2: None,
        city: Some(city),
        state: Some(state),
        country: None,
        zip: Some(postal),
        iin,
        license_number,
        expiry,
        dob,
        issued: None,
        class: Some(class).filter(|s| !s.is_empty()),
        restrictions: Some(restrictions).filter(|s| !s.is_empty()),
        endorsements: Some(endorsements).filter(|s| !s.is_empty()),
        sex,
        height,
        weight,
        hair,
        eyes,
        units: Units::Imperial,
        card_type: CardType::DriverLicense,
        document: None,
        arrival_dates: ArrivalDates::default(),
        version: 0,
        warnings,
        standards,
    })
}

fn parse_magstripe_dob(digits: &str) -> Result<NaiveDate, DecodeError> {
    if digits.len() != 8 || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(field_error("dob", ParseFailure::NotDigits));
    }
    let year: i32 = digits[0..4].parse().map_err(|_| field_error("dob", ParseFailure::InvalidDate))?;
    let month: u32 = digits[4..6].parse().map_err(|_| field_error("dob", ParseFailure::InvalidDate))?;
    let day: u32 = digits[6..8].parse().map_err(|_| field_error("dob", ParseFailure::InvalidDate))?;
    NaiveDate::from_ymd_opt(year, month, day).ok_or_else(|| field_error("dob", ParseFailure::InvalidDate))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn s1_texas() {
        let input = "%TXAUSTIN^DOE$JOHN^12345 SHERBOURNE ST^?;63601538774194=150819810101?#\" 78729      C               1505130BLKBLK?";
        let record = decode_magstripe(input).unwrap();
        assert_eq!(record.first, "JOHN");
        assert_eq!(record.last, "DOE");
        assert_eq!(record.city.as_deref(), Some("AUSTIN"));
        assert_eq!(record.state.as_deref(), Some("TX"));
        assert_eq!(record.iin, "636015");
        assert_eq!(record.dob, NaiveDate::from_ymd_opt(1981, 1, 1).unwrap());
        assert_eq!(record.expiry, NaiveDate::from_ymd_opt(2015, 8, 31).unwrap());
        assert_eq!(record.units, Units::Imperial);
        assert!(record.issued.is_none());
    }

    #[test]
    fn units_always_imperial_and_issued_always_absent() {
        let input = "%TXAUSTIN^DOE$JOHN^12345 SHERBOURNE ST^?;63601538774194=150819810101?#\" 78729      C               1505130BLKBLK?";
        let record = decode_magstripe(input).unwrap();
        assert_eq!(record.units, Units::Imperial);
        assert!(record.issued.is_none());
    }

    #[test]
    fn rejects_reader_error_sentinel() {
        let err = decode_magstripe("%E?garbage^^?").unwrap_err();
        assert!(matches!(err, DecodeError::ReadError(_)));
    }

    #[test]
    fn rejects_empty_input() {
        assert!(matches!(decode_magstripe(""), Err(DecodeError::NoInput)));
    }
}
