//! Decodes driver's license and ID card barcodes defined by the AAMVA
//! DL/ID Card Design Standard (magstripe and PDF417) and the U.S.
//! Department of Defense CAC fixed-position barcode layout into a single
//! normalized record.
//!
//! The three format-specific decoders ([`magstripe`], [`pdf417`],
//! [`cac`]) are pure functions over borrowed bytes; [`decode`] is the
//! single entry point most callers want, dispatching across them by
//! format preference.

pub mod cac;
pub mod codec;
pub mod dispatch;
pub mod error;
pub mod issuers;
pub mod magstripe;
pub mod pdf417;
pub mod physical;
pub mod record;

pub use cac::{decode_cac, CacRecord, CacVersion};
pub use dispatch::{decode, Credential, DecodeOptions, Format};
pub use error::{DecodeError, ParseFailure};
pub use magstripe::decode_magstripe;
pub use pdf417::decode_pdf417;
pub use physical::{EyeColor, HairColor, Height, Units, Weight};
pub use record::{ArrivalDates, CardType, CredentialRecord, Sex};
