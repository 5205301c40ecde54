#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Farm, location, and crop record types for the farm survey dataset.
//!
//! These are the flat records loaded from the survey export files. They are
//! immutable once loaded; everything the dashboard shows is derived from
//! them.

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Unique farm identifier (a UUID string in the survey export).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FarmId(pub String);

impl FarmId {
    /// Creates a farm identifier from anything string-like.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for FarmId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Numeric crop identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CropId(pub i64);

impl std::fmt::Display for CropId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Country identifier taken from the boundary file's feature id (e.g. `"CAN"`).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CountryId(pub String);

impl CountryId {
    /// Creates a country identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl std::fmt::Display for CountryId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// The kind of a farm location.
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
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum LocationType {
    /// Covered growing structure.
    Greenhouse,
    /// Open cultivated field.
    Field,
    /// Garden plot.
    Garden,
    /// Outline of the whole farm site.
    FarmSiteBoundary,
    /// Dwelling.
    Residence,
    /// Uncultivated land.
    NaturalArea,
    /// Barn or storage building.
    Barn,
    /// Pond, lake, or stream.
    SurfaceWater,
    /// Ceremonial ground.
    CeremonialArea,
}

impl LocationType {
    /// Whether this location's area counts toward the farm's cultivated
    /// `total_area`. Only fields, gardens, and greenhouses do.
    #[must_use]
    pub const fn counts_toward_farm_area(self) -> bool {
        matches!(self, Self::Field | Self::Garden | Self::Greenhouse)
    }

    /// Returns all variants of this enum.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::Greenhouse,
            Self::Field,
            Self::Garden,
            Self::FarmSiteBoundary,
            Self::Residence,
            Self::NaturalArea,
            Self::Barn,
            Self::SurfaceWater,
            Self::CeremonialArea,
        ]
    }
}

/// A latitude/longitude pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridPoint {
    /// Latitude in degrees.
    pub lat: f64,
    /// Longitude in degrees.
    pub lng: f64,
}

/// A farm as it appears in `farm.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FarmRecord {
    /// Unique farm identifier.
    pub farm_id: FarmId,
    /// Number of user accounts attached to the farm.
    #[serde(default)]
    pub number_of_users: u32,
    /// Country name as written in the survey (matched against the
    /// boundary file's `properties.name`).
    #[serde(default)]
    pub country_name: Option<String>,
    /// Farm location.
    #[serde(default)]
    pub grid_points: Option<GridPoint>,
    /// Certification scheme (e.g. "Organic").
    #[serde(default)]
    pub certification: Option<String>,
    /// Certifying body.
    #[serde(default)]
    pub certifier: Option<String>,
}

/// A farm with its derived cultivated area attached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Farm {
    /// Unique farm identifier.
    pub farm_id: FarmId,
    /// Number of user accounts attached to the farm.
    pub number_of_users: u32,
    /// Country name as written in the survey.
    pub country_name: Option<String>,
    /// Farm location.
    pub grid_points: Option<GridPoint>,
    /// Certification scheme.
    pub certification: Option<String>,
    /// Certifying body.
    pub certifier: Option<String>,
    /// Sum of field, garden, and greenhouse location areas in square metres.
    pub total_area: f64,
}

impl Farm {
    /// Attaches a precomputed cultivated area to a raw record.
    #[must_use]
    pub fn from_record(record: FarmRecord, total_area: f64) -> Self {
        Self {
            farm_id: record.farm_id,
            number_of_users: record.number_of_users,
            country_name: record.country_name,
            grid_points: record.grid_points,
            certification: record.certification,
            certifier: record.certifier,
            total_area,
        }
    }

    /// Returns the `(certification, certifier)` pair when both are set.
    #[must_use]
    pub fn certification_pair(&self) -> Option<(&str, &str)> {
        match (self.certification.as_deref(), self.certifier.as_deref()) {
            (Some(certification), Some(certifier)) => Some((certification, certifier)),
            _ => None,
        }
    }
}

/// A location as it appears in `location.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    /// Unique location identifier.
    pub location_id: String,
    /// Owning farm.
    pub farm_id: FarmId,
    /// Location kind.
    #[serde(rename = "type")]
    pub location_type: LocationType,
    /// Area in square metres.
    #[serde(default)]
    pub total_area: f64,
}

/// A crop as it appears in `crop.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Crop {
    /// Unique crop identifier.
    pub crop_id: CropId,
    /// Common name (e.g. "Tomato").
    pub crop_common_name: String,
    /// Crop group (e.g. "Fruit and nuts").
    pub crop_group: String,
}

/// A crop variety grown on a farm, as it appears in `variety.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CropVariety {
    /// Farm growing this variety.
    pub farm_id: FarmId,
    /// Crop this is a variety of.
    pub crop_id: CropId,
    /// Variety name.
    pub crop_variety_name: String,
}
