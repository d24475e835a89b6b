#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Pollutant category taxonomy types.
//!
//! This crate defines the canonical set of pollutant categories the map can
//! display. Each category maps 1:1 to a table in the bundled measurement
//! database; everything downstream (query shaping, overlay labeling) keys off
//! these variants.

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// A pollutant measurement category.
///
/// Selecting a category determines which table of the bundled database is
/// queried for point samples. The wire/string form is
/// `SCREAMING_SNAKE_CASE` (e.g. `"AEROSOL_INDEX"`).
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum Pollutant {
    /// Nitrogen dioxide (tropospheric vertical column)
    No2,
    /// Formaldehyde (HCHO)
    Formaldehyde,
    /// Total column ozone
    Ozone,
    /// UV aerosol index
    AerosolIndex,
    /// Fine particulate matter (PM2.5)
    ParticulateMatter,
}

impl Default for Pollutant {
    fn default() -> Self {
        Self::No2
    }
}

impl Pollutant {
    /// Returns the name of the database table holding this category's
    /// samples.
    #[must_use]
    pub const fn table_name(self) -> &'static str {
        match self {
            Self::No2 => "no2_data",
            Self::Formaldehyde => "hcho_data",
            Self::Ozone => "o3_data",
            Self::AerosolIndex => "aerosol_index_data",
            Self::ParticulateMatter => "pm25_data",
        }
    }

    /// Returns the human-readable label for this category.
    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::No2 => "Nitrogen Dioxide",
            Self::Formaldehyde => "Formaldehyde",
            Self::Ozone => "Ozone",
            Self::AerosolIndex => "Aerosol Index",
            Self::ParticulateMatter => "Particulate Matter",
        }
    }

    /// Resolves a category from its string form, falling back to the
    /// default category ([`Pollutant::No2`]) for unknown names.
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        name.trim().parse().unwrap_or_default()
    }

    /// Returns all variants of this enum.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::No2,
            Self::Formaldehyde,
            Self::Ozone,
            Self::AerosolIndex,
            Self::ParticulateMatter,
        ]
    }
}
