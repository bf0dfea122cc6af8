//! DoD Common Access Card fixed-position barcode decoder (§4.5).
//!
//! Unlike the AAMVA formats, a CAC barcode has no envelope: the first
//! byte is a version discriminator and every field afterward sits at a
//! fixed byte offset.

use chrono::NaiveDate;

use crate::codec::{base32_to_int, julian_date};
use crate::error::{DecodeError, ParseFailure};

/// CAC barcode layout version (§4.5).
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum CacVersion {
    /// Version `1`: no middle-initial byte.
    V1,
    /// Version `N`: one extra byte for the cardholder's middle initial.
    VN,
}

/// The type of identifier carried in the person-identifier field
/// (Appendix C; ported from `original_source/dodid.py`'s
/// `PERSON_DESIGNATOR_TYPES`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum PersonDesignator {
    SocialSecurityNumber,
    NonSsnIdentifier,
    PreSsnIdentifier,
    TemporaryIdentifierNumber,
    ForeignIdentifierNumber,
    TestIdentificationNumber,
    TaxpayerId,
}

impl PersonDesignator {
    pub fn from_code(code: char) -> Option<Self> {
        Some(match code {
            'S' => Self::SocialSecurityNumber,
            'N' => Self::NonSsnIdentifier,
            'P' => Self::PreSsnIdentifier,
            'D' => Self::TemporaryIdentifierNumber,
            'F' => Self::ForeignIdentifierNumber,
            'T' => Self::TestIdentificationNumber,
            'I' => Self::TaxpayerId,
            _ => return None,
        })
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::SocialSecurityNumber => "Social Security Number",
            Self::NonSsnIdentifier => "Nine-digit code that looks like an SSN, but is not in a valid SSN range",
            Self::PreSsnIdentifier => {
                "Special nine-digit code created for U.S. military personnel from Service numbers before the switch to SSNs"
            }
            Self::TemporaryIdentifierNumber => {
                "Special nine-digit code created for dependents without an SSN when added to DEERS"
            }
            Self::ForeignIdentifierNumber => "Special nine-digit code created for foreign military and nationals",
            Self::TestIdentificationNumber => "Test (858 series)",
            Self::TaxpayerId => "Individual Taxpayer Identification Number",
        }
    }
}

/// Service branch code (ported from `original_source/dodid.py`'s
/// `BRANCH_CODES`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum ServiceBranch {
    Army,
    CoastGuard,
    DepartmentOfDefense,
    AirForce,
    PublicHealthService,
    MarineCorps,
    Navy,
    Noaa,
    ForeignArmy,
    ForeignNavy,
    ForeignMarineCorps,
    ForeignAirForce,
    Other,
}

impl ServiceBranch {
    pub fn from_code(code: char) -> Option<Self> {
        Some(match code {
            'A' => Self::Army,
            'C' => Self::CoastGuard,
            'D' => Self::DepartmentOfDefense,
            'F' => Self::AirForce,
            'H' => Self::PublicHealthService,
            'M' => Self::MarineCorps,
            'N' => Self::Navy,
            'O' => Self::Noaa,
            '1' => Self::ForeignArmy,
            '2' => Self::ForeignNavy,
            '3' => Self::ForeignMarineCorps,
            '4' => Self::ForeignAirForce,
            'X' => Self::Other,
            _ => return None,
        })
    }
}

/// Entitlement condition (ported from `original_source/dodid.py`'s
/// `PERSON_ENTITLEMENT_CONDITIONS`; only the codes relevant to real-world
/// cards are kept, the rest surface as `Other`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum EntitlementCondition {
    Unknown,
    ActiveDuty,
    Retired,
    Other,
}

impl EntitlementCondition {
    pub fn from_code(code: &str) -> Self {
        match code {
            "00" => Self::Unknown,
            "01" => Self::ActiveDuty,
            "13" => Self::Retired,
            _ => Self::Other,
        }
    }
}

/// A decoded DoD CAC barcode (§4.5).
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct CacRecord {
    pub version: CacVersion,
    pub person_identifier: u64,
    pub person_designator: Option<PersonDesignator>,
    pub edipi: u64,
    pub first: String,
    pub last: String,
    pub middle: Option<char>,
    pub dob: NaiveDate,
    pub person_category_code: char,
    pub service_branch: Option<ServiceBranch>,
    pub entitlement_code: String,
    pub entitlement_condition: EntitlementCondition,
    pub rank: String,
    pub pay_plan_code: String,
    pub pay_grade_code: String,
    pub issued: NaiveDate,
    pub expiry: NaiveDate,
    pub card_instance: char,
    pub warnings: Vec<String>,
    pub standards: bool,
}

fn byte_at(data: &[u8], index: usize, field: &'static str) -> Result<u8, DecodeError> {
    data.get(index)
        .copied()
        .ok_or(DecodeError::ReadError(format!("truncated CAC barcode reading {field}")))
}

fn ascii_slice<'a>(data: &'a [u8], range: std::ops::Range<usize>, field: &'static str) -> Result<&'a str, DecodeError> {
    let bytes = data
        .get(range.clone())
        .ok_or(DecodeError::ReadError(format!("truncated CAC barcode reading {field}")))?;
    std::str::from_utf8(bytes).map_err(|_| DecodeError::ParseError {
        field,
        reason: ParseFailure::NotDigits,
    })
}

fn base32_field(data: &[u8], range: std::ops::Range<usize>, field: &'static str) -> Result<u64, DecodeError> {
    let text = ascii_slice(data, range, field)?;
    base32_to_int(text).map_err(|reason| DecodeError::ParseError { field, reason })
}

fn julian_field(data: &[u8], range: std::ops::Range<usize>, field: &'static str) -> Result<NaiveDate, DecodeError> {
    let text = ascii_slice(data, range, field)?;
    julian_date(text).map_err(|reason| DecodeError::ParseError { field, reason })
}

/// Decodes a DoD CAC barcode given its full byte content (§4.5).
///
/// `strict` controls whether an out-of-vocabulary code set value (branch,
/// designator) is fatal (`true`) or a recorded warning (`false`).
pub fn decode_cac(data: &[u8], strict: bool) -> Result<CacRecord, DecodeError> {
    tracing::debug!(len = data.len(), strict, "decoding CAC barcode");
    if data.is_empty() {
        return Err(DecodeError::NoInput);
    }

    let version = match data[0] {
        b'1' => CacVersion::V1,
        b'N' => CacVersion::VN,
        other => {
            return Err(DecodeError::ReadError(format!(
                "unrecognized CAC version byte '{}'",
                other as char
            )))
        }
    };

    let min_len = match version {
        CacVersion::V1 => 88,
        CacVersion::VN => 89,
    };
    if data.len() < min_len {
        return Err(DecodeError::ReadError(format!(
            "CAC barcode too short: expected at least {min_len} bytes, got {}",
            data.len()
        )));
    }

    let mut warnings = Vec::new();

    let person_identifier = base32_field(data, 1..7, "PDI")?;

    let designator_code = byte_at(data, 7, "designator")? as char;
    let person_designator = PersonDesignator::from_code(designator_code);
    if person_designator.is_none() {
        let msg = format!("unknown person designator code '{designator_code}'");
        if strict {
            return Err(DecodeError::UnknownCodeValue {
                code: "designator",
                value: designator_code.to_string(),
            });
        }
        tracing::warn!(code = %designator_code, "unknown person designator code");
        warnings.push(msg);
    }

    let edipi = base32_field(data, 8..15, "EDIPI")?;
    if edipi.to_string().len() != 10 {
        return Err(DecodeError::ParseError {
            field: "EDIPI",
            reason: ParseFailure::WrongLength {
                expected: 10,
                got: edipi.to_string().len(),
            },
        });
    }

    let first = ascii_slice(data, 15..35, "first")?.trim_end().to_owned();
    let last = ascii_slice(data, 35..61, "last")?.trim_end().to_owned();
    let dob = julian_field(data, 61..65, "DOB")?;

    let person_category_code = byte_at(data, 65, "category")? as char;

    let branch_code = byte_at(data, 66, "branch")? as char;
    let service_branch = ServiceBranch::from_code(branch_code);
    if service_branch.is_none() {
        let msg = format!("unknown service branch code '{branch_code}'");
        if strict {
            return Err(DecodeError::UnknownCodeValue {
                code: "branch",
                value: branch_code.to_string(),
            });
        }
        tracing::warn!(code = %branch_code, "unknown service branch code");
        warnings.push(msg);
    }

    let entitlement_code = ascii_slice(data, 67..69, "entitlement")?.to_owned();
    let entitlement_condition = EntitlementCondition::from_code(&entitlement_code);

    let rank = ascii_slice(data, 69..75, "rank")?.trim_end().to_owned();
    let pay_plan_code = ascii_slice(data, 75..77, "pay plan")?.to_owned();
    let pay_grade_code = ascii_slice(data, 77..79, "pay grade")?.to_owned();

    let issued = julian_field(data, 79..83, "issue date")?;
    let expiry = julian_field(data, 83..87, "expiry date")?;

    let card_instance = byte_at(data, 87, "card instance")? as char;

    let middle = match version {
        CacVersion::V1 => None,
        CacVersion::VN => Some(byte_at(data, 88, "middle initial")? as char),
    };

    let standards = warnings.is_empty();

    Ok(CacRecord {
        version,
        person_identifier,
        person_designator,
        edipi,
        first,
        last,
        middle,
        dob,
        person_category_code,
        service_branch,
        entitlement_code,
        entitlement_condition,
        rank,
        pay_plan_code,
        pay_grade_code,
        issued,
        expiry,
        card_instance,
        warnings,
        standards,
    })
}
