//! Per-version field extraction (§4.4). Every version shares the same
//! small set of typed helpers over the element map; only the handful of
//! version-specific behaviors (name-field shape, truncation flags,
//! Indiana fallbacks) differ between the seven functions below.

use std::collections::HashMap;

use crate::codec::{parse_aamva_date, DateOrder};
use crate::error::{DecodeError, ParseFailure};
use crate::physical::{EyeColor, HairColor, Height, Units, Weight};
use crate::record::{ArrivalDates, CardType, CredentialRecord, Sex};

type Elements = HashMap<String, String>;

fn field_error(field: &'static str, reason: ParseFailure) -> DecodeError {
    DecodeError::ParseError { field, reason }
}

fn required<'a>(elements: &'a Elements, code: &'static str, version: u8) -> Result<&'a str, DecodeError> {
    elements
        .get(code)
        .map(|s| s.as_str())
        .ok_or(DecodeError::MissingRequiredField { code, version })
}

fn optional<'a>(elements: &'a Elements, code: &str) -> Option<&'a str> {
    elements.get(code).map(|s| s.as_str())
}

fn parse_sex(
    code: &str,
    allow_literal_mf: bool,
    allow_not_specified: bool,
    warnings: &mut Vec<String>,
) -> Result<Sex, DecodeError> {
    match code.trim() {
        "1" => Ok(Sex::Male),
        "2" => Ok(Sex::Female),
        "9" if allow_not_specified => Ok(Sex::NotSpecified),
        "M" if allow_literal_mf => {
            warnings.push("sex code 'M' is a non-standard literal; treating as MALE".to_owned());
            Ok(Sex::Male)
        }
        "F" if allow_literal_mf => {
            warnings.push("sex code 'F' is a non-standard literal; treating as FEMALE".to_owned());
            Ok(Sex::Female)
        }
        _ => Err(field_error("sex", ParseFailure::InvalidSexCode)),
    }
}

fn parse_field_date(digits: &str, order: DateOrder, field: &'static str) -> Result<chrono::NaiveDate, DecodeError> {
    parse_aamva_date(digits, order).map_err(|r| field_error(field, r))
}

/// Parses one of the four accepted height encodings (§4.4).
fn parse_height(raw: &str) -> Option<Height> {
    let trimmed = raw.trim();
    if trimmed.len() >= 5 && trimmed[trimmed.len() - 2..].eq_ignore_ascii_case("in") {
        Height::from_unit_suffixed(trimmed).ok()
    } else if trimmed.len() >= 5 && trimmed[trimmed.len() - 2..].eq_ignore_ascii_case("cm") {
        Height::from_unit_suffixed(trimmed).ok()
    } else if trimmed.ends_with('"') {
        Height::from_feet_inches(trimmed).ok()
    } else {
        None
    }
}

/// Weight resolution order (§4.4): exact element for the active unit
/// system, else the range element, else absent.
fn resolve_weight(elements: &Elements, units: Units) -> Option<Weight> {
    let exact_code = match units {
        Units::Imperial => "DAW",
        Units::Metric => "DAX",
    };
    if let Some(v) = optional(elements, exact_code) {
        if let Ok(value) = v.trim().parse() {
            return Some(Weight::exact(value, units));
        }
    }
    if let Some(v) = optional(elements, "DCE") {
        if let Ok(index) = v.trim().parse::<u8>() {
            return Some(Weight::range(index, units));
        }
    }
    None
}

fn jurisdiction_fields(
    elements: &Elements,
) -> (Option<String>, Option<String>, Option<String>, CardType) {
    match (
        optional(elements, "DCA"),
        optional(elements, "DCB"),
        optional(elements, "DCD"),
    ) {
        (Some(class), restrictions, endorsements) => (
            Some(class.trim().to_owned()),
            restrictions.map(|s| s.trim().to_owned()),
            endorsements.map(|s| s.trim().to_owned()),
            CardType::DriverLicense,
        ),
        _ => (None, None, None, CardType::IdentityCard),
    }
}

fn arrival_dates(elements: &Elements, order: DateOrder) -> Result<ArrivalDates, DecodeError> {
    Ok(ArrivalDates {
        under_18_until: optional(elements, "DDH")
            .map(|d| parse_field_date(d, order, "under_18_until"))
            .transpose()?,
        under_19_until: optional(elements, "DDI")
            .map(|d| parse_field_date(d, order, "under_19_until"))
            .transpose()?,
        under_21_until: optional(elements, "DDJ")
            .map(|d| parse_field_date(d, order, "under_21_until"))
            .transpose()?,
    })
}

/// Version 1 (AAMVA DL/ID-2000 standard). No `DCG` country field; dates
/// are plain `YYYYMMDD`.
pub fn decode_v1(elements: &Elements, iin: &str, _strict: bool) -> Result<CredentialRecord, DecodeError> {
    let mut warnings = Vec::new();

    let (last, first, middle, suffix, prefix) = match (
        optional(elements, "DAB"),
        optional(elements, "DAC"),
    ) {
        (Some(last), Some(first)) => (
            last.trim().to_owned(),
            first.trim().to_owned(),
            optional(elements, "DAD").map(|s| s.trim().to_owned()).filter(|s| !s.is_empty()),
            optional(elements, "DAE").map(|s| s.trim().to_owned()),
            optional(elements, "DAF").map(|s| s.trim().to_owned()),
        ),
        _ => {
            let combined = required(elements, "DAA", 1)?;
            let mut parts = combined.split(',');
            let last = parts.next().unwrap_or_default().trim().to_owned();
            let first = parts.next().unwrap_or_default().trim().to_owned();
            let middle = parts.next().map(|s| s.trim().to_owned()).filter(|s| !s.is_empty());
            (last, first, middle, None, None)
        }
    };

    let order = DateOrder::IsoOrCanada;
    let expiry = parse_field_date(required(elements, "DBA", 1)?, order, "expiry")?;
    let dob = parse_field_date(required(elements, "DBB", 1)?, order, "dob")?;
    let issued = Some(parse_field_date(required(elements, "DBD", 1)?, order, "issued")?);

    // Version 1 predates NOT_SPECIFIED; only 1/2 (plus the literal M/F
    // deviation) are accepted.
    let sex = parse_sex(required(elements, "DBC", 1)?, true, false, &mut warnings)?;

    let (height, weight, units, country) = if let Some(h) = optional(elements, "DAV") {
        let magnitude: u32 = h.trim().parse().unwrap_or_default();
        (
            Height::new(magnitude, Units::Metric),
            optional(elements, "DAX").and_then(|w| w.trim().parse().ok()).map(|v| Weight::exact(v, Units::Metric)),
            Units::Metric,
            "CAN".to_owned(),
        )
    } else if let Some(h) = optional(elements, "DAU") {
        let height = parse_height(h).unwrap_or(Height::new(0, Units::Imperial));
        (
            height,
            optional(elements, "DAW").and_then(|w| w.trim().parse().ok()).map(|v| Weight::exact(v, Units::Imperial)),
            Units::Imperial,
            "USA".to_owned(),
        )
    } else {
        warnings.push("no height element present; defaulting to IMPERIAL".to_owned());
        (Height::new(0, Units::Imperial), None, Units::Imperial, "USA".to_owned())
    };

    let hair = optional(elements, "DAZ").and_then(|h| HairColor::from_code(h.trim()));
    let eyes = optional(elements, "DAY").and_then(|e| EyeColor::from_code(e.trim()));

    let restrictions = optional(elements, "DAS").map(|s| s.trim().to_owned());
    if restrictions.is_none() {
        warnings.push("missing required field: restrictions (DAS)".to_owned());
    }
    let (endorsements, card_type) = match optional(elements, "DAT") {
        Some(e) => (Some(e.trim().to_owned()), CardType::DriverLicense),
        None => {
            warnings.push("missing required field: endorsements (DAT)".to_owned());
            (None, CardType::IdentityCard)
        }
    };

    let standards = warnings.is_empty();

    Ok(CredentialRecord {
        first,
        last,
        middle,
        suffix,
        prefix,
        address: Some(required(elements, "DAG", 1)?.trim().to_owned()),
        address2: optional(elements, "DAH").map(|s| s.trim().to_owned()),
        city: Some(required(elements, "DAI", 1)?.trim().to_owned()),
        state: Some(required(elements, "DAJ", 1)?.trim().to_owned()),
        country: Some(country),
        zip: Some(required(elements, "DAK", 1)?.trim().to_owned()),
        iin: iin.to_owned(),
        license_number: required(elements, "DAQ", 1)?.trim().to_owned(),
        expiry,
        dob,
        issued,
        class: Some(required(elements, "DAR", 1)?.trim().to_owned()),
        restrictions,
        endorsements,
        sex,
        height,
        weight,
        hair,
        eyes,
        units,
        card_type,
        document: None,
        arrival_dates: ArrivalDates::default(),
        version: 1,
        warnings,
        standards,
    })
}

/// Version 3 (AAMVA 2003 standard), including the Indiana jurisdictional
/// extensions the original implementation special-cased.
pub fn decode_v3(elements: &Elements, iin: &str, strict: bool) -> Result<CredentialRecord, DecodeError> {
    let mut warnings = Vec::new();
    let country = required(elements, "DCG", 3)?;
    let order = DateOrder::for_country(country);

    let expiry = parse_field_date(required(elements, "DBA", 3)?, order, "expiry")?;
    let issued = Some(parse_field_date(required(elements, "DBD", 3)?, order, "issued")?);
    let dob = parse_field_date(required(elements, "DBB", 3)?, order, "dob")?;

    let (class, restrictions, endorsements, card_type) = jurisdiction_fields(elements);

    // Version 3 predates NOT_SPECIFIED; only 1/2 are accepted.
    let sex = parse_sex(required(elements, "DBC", 3)?, false, false, &mut warnings)?;

    let (height, units) = match optional(elements, "DAU").and_then(parse_height) {
        Some(h) => {
            let u = h.units();
            (Some(h), u)
        }
        None => {
            // Indiana wrongly omits DAU; it keeps height in ZIJ as `F-II`.
            match optional(elements, "ZIJ") {
                Some(zij) => {
                    let mut parts = zij.splitn(2, '-');
                    let feet: u32 = parts.next().and_then(|s| s.parse().ok()).unwrap_or(0);
                    let inches: u32 = parts.next().and_then(|s| s.parse().ok()).unwrap_or(0);
                    (Some(Height::new(feet * 12 + inches, Units::Imperial)), Units::Imperial)
                }
                None => {
                    warnings.push("unable to parse height (DAU/ZIJ both absent or malformed); defaulting to IMPERIAL".to_owned());
                    (None, Units::Imperial)
                }
            }
        }
    };

    let eyes_raw = required(elements, "DAY", 3)?;
    let eyes = match EyeColor::from_code(eyes_raw) {
        Some(e) => Some(e),
        None => {
            if strict {
                return Err(DecodeError::UnknownCodeValue {
                    code: "DAY",
                    value: eyes_raw.to_owned(),
                });
            }
            warnings.push(format!("unknown eye colour code {eyes_raw:?}"));
            None
        }
    };

    let hair = optional(elements, "DAZ")
        .and_then(|h| HairColor::from_code(h))
        .or_else(|| optional(elements, "ZIL").and_then(|h| HairColor::from_code(h)));

    let mut weight = resolve_weight(elements, units);
    if weight.is_none() {
        weight = optional(elements, "ZIK").and_then(|w| w.trim().parse().ok()).map(|v| Weight::exact(v, Units::Imperial));
    }

    let suffix = optional(elements, "DCU").map(|s| s.trim().to_owned());

    let dct = required(elements, "DCT", 3)?;
    let (first, middle) = if dct.contains(',') {
        let mut parts = dct.split(',');
        let first = parts.next().unwrap_or_default().trim().to_owned();
        let rest: Vec<&str> = parts.collect();
        let middle = if rest.is_empty() { None } else { Some(rest.join(", ").trim().to_owned()) };
        (first, middle)
    } else {
        let mut parts = dct.split(' ');
        let first = parts.next().unwrap_or_default().trim().to_owned();
        let rest: Vec<&str> = parts.collect();
        let middle = if rest.is_empty() { None } else { Some(rest.join(" ").trim().to_owned()) };
        (first, middle)
    };

    let standards = warnings.is_empty();

    Ok(CredentialRecord {
        first,
        last: required(elements, "DCS", 3)?.trim().to_owned(),
        middle,
        suffix,
        prefix: None,
        address: Some(required(elements, "DAG", 3)?.trim().to_owned()),
        address2: optional(elements, "DAH").map(|s| s.trim().to_owned()),
        city: Some(required(elements, "DAI", 3)?.trim().to_owned()),
        state: Some(required(elements, "DAJ", 3)?.trim().to_owned()),
        country: Some(country.to_owned()),
        zip: Some(required(elements, "DAK", 3)?.trim().to_owned()),
        iin: iin.to_owned(),
        license_number: required(elements, "DAQ", 3)?.trim().to_owned(),
        expiry,
        dob,
        issued,
        class,
        restrictions,
        endorsements,
        sex,
        height: height.unwrap_or(Height::new(0, units)),
        weight,
        hair,
        eyes,
        units,
        card_type,
        document: Some(required(elements, "DCF", 3)?.trim().to_owned()),
        arrival_dates: ArrivalDates::default(),
        version: 3,
        warnings,
        standards,
    })
}

/// Shared skeleton for versions 4, 5, 6, 8 (as 7 or 8), and 9: they differ
/// only in which name/truncation/hair/eyes fields are required versus
/// optional, which this closure-based table captures per call site.
struct VersionShape {
    version: u8,
    truncation_flags: bool,
    eyes_required: bool,
    hair_required: bool,
    sex_allows_not_specified: bool,
    arrival_dates_supported: bool,
}

fn decode_common(
    elements: &Elements,
    iin: &str,
    shape: VersionShape,
    strict: bool,
) -> Result<CredentialRecord, DecodeError> {
    let mut warnings = Vec::new();
    let version = shape.version;
    let country = required(elements, "DCG", version)?;
    let order = DateOrder::for_country(country);

    let expiry = parse_field_date(required(elements, "DBA", version)?, order, "expiry")?;
    let issued = Some(parse_field_date(required(elements, "DBD", version)?, order, "issued")?);
    let dob = parse_field_date(required(elements, "DBB", version)?, order, "dob")?;

    let (class, restrictions, endorsements, card_type) = jurisdiction_fields(elements);

    let sex_code = required(elements, "DBC", version)?;
    let sex = parse_sex(sex_code, false, shape.sex_allows_not_specified, &mut warnings)?;

    let eyes_raw = if shape.eyes_required {
        Some(required(elements, "DAY", version)?)
    } else {
        optional(elements, "DAY")
    };
    let eyes = match eyes_raw {
        Some(raw) => match EyeColor::from_code(raw) {
            Some(e) => Some(e),
            None if shape.eyes_required => {
                if strict {
                    return Err(DecodeError::UnknownCodeValue {
                        code: "DAY",
                        value: raw.to_owned(),
                    });
                }
                warnings.push(format!("unknown eye colour code {raw:?}"));
                None
            }
            None => {
                warnings.push(format!("unknown eye colour code {raw:?}"));
                None
            }
        },
        None => None,
    };

    let height_raw = required(elements, "DAU", version)?;
    let height = parse_height(height_raw);
    let units = height.as_ref().map(|h| h.units()).unwrap_or(Units::Imperial);
    if height.is_none() {
        warnings.push(format!("unrecognized height encoding {height_raw:?}; defaulting to IMPERIAL"));
    }

    let weight = resolve_weight(elements, units);

    let hair_raw = if shape.hair_required {
        Some(required(elements, "DAZ", version)?)
    } else {
        optional(elements, "DAZ")
    };
    let hair = match hair_raw {
        Some(raw) => match HairColor::from_code(raw) {
            Some(h) => Some(h),
            None if shape.hair_required => {
                if strict {
                    return Err(DecodeError::UnknownCodeValue {
                        code: "DAZ",
                        value: raw.to_owned(),
                    });
                }
                warnings.push(format!("invalid hair colour code {raw:?}"));
                None
            }
            None => {
                warnings.push(format!("invalid hair colour code {raw:?}"));
                None
            }
        },
        None => None,
    };

    let (mut last, mut first, mut middle) = (
        required(elements, "DCS", version)?.trim().to_owned(),
        required(elements, "DAC", version)?.trim().to_owned(),
        required(elements, "DAD", version)?.trim().to_owned(),
    );
    if shape.truncation_flags {
        if optional(elements, "DDE") == Some("T") {
            last.push('…');
        }
        if optional(elements, "DDF") == Some("T") {
            first.push('…');
        }
        if optional(elements, "DDG") == Some("T") {
            middle.push('…');
        }
    }
    let middle = if middle.is_empty() { None } else { Some(middle) };

    let suffix = optional(elements, "DCU").map(|s| s.trim().to_owned());

    let arrival = if shape.arrival_dates_supported {
        arrival_dates(elements, order)?
    } else {
        ArrivalDates::default()
    };

    let standards = warnings.is_empty();

    Ok(CredentialRecord {
        first,
        last,
        middle,
        suffix,
        prefix: None,
        address: Some(required(elements, "DAG", version)?.trim().to_owned()),
        address2: optional(elements, "DAH").map(|s| s.trim().to_owned()),
        city: Some(required(elements, "DAI", version)?.trim().to_owned()),
        state: Some(required(elements, "DAJ", version)?.trim().to_owned()),
        country: Some(country.to_owned()),
        zip: Some(required(elements, "DAK", version)?.trim().to_owned()),
        iin: iin.to_owned(),
        license_number: required(elements, "DAQ", version)?.trim().to_owned(),
        expiry,
        dob,
        issued,
        class,
        restrictions,
        endorsements,
        sex,
        height: height.unwrap_or(Height::new(0, units)),
        weight,
        hair,
        eyes,
        units,
        card_type,
        document: Some(required(elements, "DCF", version)?.trim().to_owned()),
        arrival_dates: arrival,
        version,
        warnings,
        standards,
    })
}

pub fn decode_v4(elements: &Elements, iin: &str, strict: bool) -> Result<CredentialRecord, DecodeError> {
    decode_common(
        elements,
        iin,
        VersionShape {
            version: 4,
            truncation_flags: false,
            eyes_required: true,
            hair_required: true,
            sex_allows_not_specified: false,
            arrival_dates_supported: false,
        },
        strict,
    )
}

pub fn decode_v5(elements: &Elements, iin: &str, strict: bool) -> Result<CredentialRecord, DecodeError> {
    decode_common(
        elements,
        iin,
        VersionShape {
            version: 5,
            truncation_flags: false,
            eyes_required: true,
            hair_required: true,
            sex_allows_not_specified: false,
            arrival_dates_supported: true,
        },
        strict,
    )
}

pub fn decode_v6(elements: &Elements, iin: &str, strict: bool) -> Result<CredentialRecord, DecodeError> {
    decode_common(
        elements,
        iin,
        VersionShape {
            version: 6,
            truncation_flags: true,
            eyes_required: true,
            hair_required: false,
            sex_allows_not_specified: true,
            arrival_dates_supported: true,
        },
        strict,
    )
}

/// Versions 7 and 8 share a decoder in the original implementation
/// (version 7's dedicated function was never written); `actual_version`
/// is stamped onto the returned record so a 7-encoded card is not
/// mislabeled as version 8.
pub fn decode_v8(elements: &Elements, iin: &str, actual_version: u8, strict: bool) -> Result<CredentialRecord, DecodeError> {
    decode_common(
        elements,
        iin,
        VersionShape {
            version: actual_version,
            truncation_flags: true,
            eyes_required: true,
            hair_required: false,
            sex_allows_not_specified: true,
            arrival_dates_supported: true,
        },
        strict,
    )
}

pub fn decode_v9(elements: &Elements, iin: &str, strict: bool) -> Result<CredentialRecord, DecodeError> {
    decode_common(
        elements,
        iin,
        VersionShape {
            version: 9,
            truncation_flags: true,
            eyes_required: true,
            hair_required: false,
            sex_allows_not_specified: true,
            arrival_dates_supported: true,
        },
        strict,
    )
}
