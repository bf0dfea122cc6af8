//! Physical-description value objects: height, weight, and the closed
//! eye/hair colour code sets (§3.2, §3.3).

use crate::error::ParseFailure;

/// Unit system a physical measurement was encoded in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum Units {
    Metric,
    Imperial,
}

/// A height measurement tagged with the unit it was encoded in.
///
/// Equality compares magnitude *and* unit — no implicit conversion (§3.2).
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Height {
    magnitude: u32,
    units: Units,
}

impl Height {
    pub fn new(magnitude: u32, units: Units) -> Self {
        Self { magnitude, units }
    }

    /// Parses a 3-digit magnitude with an `in`/`cm` suffix (case-insensitive
    /// for `cm`, as in the AAMVA `DAU` element).
    pub fn from_unit_suffixed(value: &str) -> Result<Self, ParseFailure> {
        let value = value.trim();
        if value.len() < 5 {
            return Err(ParseFailure::UnknownHeightUnit);
        }
        let (digits, suffix) = value.split_at(3);
        let magnitude: u32 = digits.parse().map_err(|_| ParseFailure::NotDigits)?;
        let suffix = suffix.trim();

        if suffix.eq_ignore_ascii_case("in") {
            Ok(Self::new(magnitude, Units::Imperial))
        } else if suffix.eq_ignore_ascii_case("cm") {
            Ok(Self::new(magnitude, Units::Metric))
        } else {
            Err(ParseFailure::UnknownHeightUnit)
        }
    }

    /// Parses a `F'-II"` feet-and-inches pattern (e.g. `6'-01"`).
    pub fn from_feet_inches(value: &str) -> Result<Self, ParseFailure> {
        let value = value.trim();
        let bytes = value.as_bytes();
        if bytes.len() < 2 || bytes[1] != b'\'' {
            return Err(ParseFailure::UnknownHeightUnit);
        }
        let feet: u32 = value[0..1].parse().map_err(|_| ParseFailure::NotDigits)?;

        let inches_part = value
            .rsplit('-')
            .next()
            .ok_or(ParseFailure::UnknownHeightUnit)?;
        let inches_digits: String = inches_part.chars().filter(|c| c.is_ascii_digit()).collect();
        if inches_digits.is_empty() {
            return Err(ParseFailure::UnknownHeightUnit);
        }
        let inches: u32 = inches_digits.parse().map_err(|_| ParseFailure::NotDigits)?;

        Ok(Self::new(feet * 12 + inches, Units::Imperial))
    }

    /// Parses a raw 3-digit magstripe height where the first digit is feet
    /// and the remaining two are inches.
    pub fn from_magstripe_digits(value: &str) -> Result<Self, ParseFailure> {
        if value.len() != 3 || !value.bytes().all(|b| b.is_ascii_digit()) {
            return Err(ParseFailure::WrongLength {
                expected: 3,
                got: value.len(),
            });
        }
        let feet: u32 = value[0..1].parse().unwrap();
        let inches: u32 = value[1..3].parse().unwrap();
        Ok(Self::new(feet * 12 + inches, Units::Imperial))
    }

    pub fn magnitude(&self) -> u32 {
        self.magnitude
    }

    pub fn units(&self) -> Units {
        self.units
    }

    /// Height in whole centimetres, rounded.
    pub fn as_metric(&self) -> u32 {
        match self.units {
            Units::Metric => self.magnitude,
            Units::Imperial => ((self.magnitude as f64) * 2.54).round() as u32,
        }
    }

    /// Height in whole inches, rounded.
    pub fn as_imperial(&self) -> u32 {
        match self.units {
            Units::Imperial => self.magnitude,
            Units::Metric => ((self.magnitude as f64) / 2.54).round() as u32,
        }
    }
}

/// Fixed imperial-pound weight range boundaries, inclusive upper bound,
/// range 9 open-ended (§3.2, with Open Question (b) resolved as `>= 146`
/// for the metric table's symmetric range 9).
const IMPERIAL_RANGES: [u32; 9] = [70, 100, 130, 160, 190, 220, 250, 280, 320];
const METRIC_RANGES: [u32; 9] = [31, 45, 59, 70, 86, 100, 113, 127, 145];

const IMPERIAL_MIDPOINTS: [u32; 10] = [50, 85, 115, 145, 175, 205, 235, 265, 300, 320];
const METRIC_MIDPOINTS: [u32; 10] = [20, 38, 53, 65, 79, 94, 107, 121, 137, 146];

fn classify_range(weight: u32, bounds: &[u32; 9]) -> u8 {
    for (i, bound) in bounds.iter().enumerate() {
        if weight <= *bound {
            return i as u8;
        }
    }
    9
}

/// A weight that is either an exact value or an approximate range index
/// (0-9), tagged with its unit system (§3.2).
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Weight {
    Exact { value: u32, units: Units },
    Range { index: u8, units: Units },
}

impl Weight {
    pub fn exact(value: u32, units: Units) -> Self {
        Self::Exact { value, units }
    }

    /// Range must be `0..=9`; out-of-range values are clamped to 9, the
    /// same open-ended top bucket the table names.
    pub fn range(index: u8, units: Units) -> Self {
        Self::Range {
            index: index.min(9),
            units,
        }
    }

    pub fn units(&self) -> Units {
        match self {
            Self::Exact { units, .. } | Self::Range { units, .. } => *units,
        }
    }

    /// The range index this weight falls (or was declared) into.
    pub fn range_index(&self) -> u8 {
        match self {
            Self::Range { index, .. } => *index,
            Self::Exact { value, units } => match units {
                Units::Imperial => classify_range(*value, &IMPERIAL_RANGES),
                Units::Metric => classify_range(*value, &METRIC_RANGES),
            },
        }
    }

    /// An exact value: the stored value if exact, else the range's
    /// approximation midpoint.
    pub fn approximate_value(&self) -> u32 {
        match self {
            Self::Exact { value, .. } => *value,
            Self::Range { index, units } => match units {
                Units::Imperial => IMPERIAL_MIDPOINTS[*index as usize],
                Units::Metric => METRIC_MIDPOINTS[*index as usize],
            },
        }
    }

    pub fn as_imperial_lbs(&self) -> u32 {
        match self.units() {
            Units::Imperial => self.approximate_value(),
            Units::Metric => ((self.approximate_value() as f64) * 2.2).round() as u32,
        }
    }

    pub fn as_metric_kg(&self) -> u32 {
        match self.units() {
            Units::Metric => self.approximate_value(),
            Units::Imperial => ((self.approximate_value() as f64) / 2.2).round() as u32,
        }
    }
}

/// Closed eye-colour code set (§3.3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum EyeColor {
    Black,
    Blue,
    Brown,
    Gray,
    Hazel,
    Maroon,
    Pink,
    DichromaticOrDifferent,
    Unknown,
    Green,
}

impl EyeColor {
    pub fn from_code(code: &str) -> Option<Self> {
        Some(match code.trim() {
            "BLK" => Self::Black,
            "BLU" => Self::Blue,
            "BRO" => Self::Brown,
            "GRY" => Self::Gray,
            "HAZ" => Self::Hazel,
            "MAR" => Self::Maroon,
            "PNK" => Self::Pink,
            "DIC" => Self::DichromaticOrDifferent,
            "UNK" => Self::Unknown,
            "GRN" => Self::Green,
            _ => return None,
        })
    }
}

/// Closed hair-colour code set (§3.3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum HairColor {
    Bald,
    Black,
    Blond,
    Brown,
    Gray,
    Red,
    Sandy,
    White,
    Unknown,
}

impl HairColor {
    pub fn from_code(code: &str) -> Option<Self> {
        Some(match code.trim() {
            "BAL" => Self::Bald,
            "BLK" => Self::Black,
            "BLN" => Self::Blond,
            "BRO" => Self::Brown,
            "GRY" => Self::Gray,
            "RED" => Self::Red,
            "SDY" => Self::Sandy,
            "WHI" => Self::White,
            "UNK" => Self::Unknown,
            _ => return None,
        })
    }
}
