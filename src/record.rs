//! The canonical, immutable credential record (§3.1) produced by every
//! decoder.

use chrono::NaiveDate;

use crate::physical::{EyeColor, HairColor, Height, Units, Weight};

/// Sex as encoded on the credential (§3.1).
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Sex {
    Male,
    Female,
    NotSpecified,
}

/// Whether the document is a driver's license or a plain identity card
/// (§3.1); determined by the presence of DL-only fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum CardType {
    DriverLicense,
    IdentityCard,
}

/// The three optional `v5+` age-threshold dates (§3.1).
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ArrivalDates {
    pub under_18_until: Option<NaiveDate>,
    pub under_19_until: Option<NaiveDate>,
    pub under_21_until: Option<NaiveDate>,
}

impl ArrivalDates {
    pub fn is_empty(&self) -> bool {
        self.under_18_until.is_none() && self.under_19_until.is_none() && self.under_21_until.is_none()
    }
}

/// The canonical decoded record (§3.1). Constructed once by a decoder and
/// never mutated afterward.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct CredentialRecord {
    pub first: String,
    pub last: String,
    pub middle: Option<String>,
    pub suffix: Option<String>,
    pub prefix: Option<String>,

    pub address: Option<String>,
    pub address2: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub country: Option<String>,
    pub zip: Option<String>,

    pub iin: String,
    pub license_number: String,

    pub expiry: NaiveDate,
    pub dob: NaiveDate,
    pub issued: Option<NaiveDate>,

    pub class: Option<String>,
    pub restrictions: Option<String>,
    pub endorsements: Option<String>,

    pub sex: Sex,
    pub height: Height,
    pub weight: Option<Weight>,
    pub hair: Option<HairColor>,
    pub eyes: Option<EyeColor>,
    pub units: Units,

    pub card_type: CardType,
    pub document: Option<String>,
    pub arrival_dates: ArrivalDates,

    pub version: u8,

    /// Non-fatal deviations observed while decoding, in the order
    /// encountered.
    pub warnings: Vec<String>,

    /// True iff `warnings` is empty (§3.1, §8 property 5). Kept as a
    /// stored field rather than derived so a deserialized record (built
    /// by something other than this crate's decoders) still carries it.
    pub standards: bool,
}
