#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Farm survey data loading and immutable lookup indexes.
//!
//! The five survey inputs (country boundaries, farms, crop varieties, crops,
//! and locations) are read once at startup and folded into a [`Dataset`].
//! The dataset derives each farm's cultivated `total_area` and precomputes
//! every lookup the dashboard needs per filter pass, so filtering never has
//! to rescan the raw records.

pub mod countries;
pub mod load;
pub mod paths;

use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;
use std::sync::Arc;

use farm_map_farm_models::{
    CountryId, Crop, CropId, CropVariety, Farm, FarmId, FarmRecord, Location, LocationType,
};
use thiserror::Error;

pub use countries::Country;
pub use load::load_from_dir;

/// Errors that can occur while loading the survey data.
#[derive(Debug, Error)]
pub enum DatasetError {
    /// An input file could not be read.
    #[error("Failed to read {path}: {source}")]
    Read {
        /// File that failed to read.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// An input file is not valid JSON for its record type.
    #[error("Failed to parse {path}: {source}")]
    Parse {
        /// File that failed to parse.
        path: PathBuf,
        /// Underlying JSON error.
        source: serde_json::Error,
    },

    /// The country boundary file is not usable.
    #[error("Invalid country boundaries: {0}")]
    Boundaries(#[from] countries::CountryError),
}

/// The raw record collections, exactly as read from the input files.
#[derive(Debug, Clone, Default)]
pub struct RawData {
    /// Countries from the boundary file.
    pub countries: Vec<Country>,
    /// Farm records.
    pub farms: Vec<FarmRecord>,
    /// Crop variety records.
    pub varieties: Vec<CropVariety>,
    /// Crop records.
    pub crops: Vec<Crop>,
    /// Location records.
    pub locations: Vec<Location>,
}

/// Immutable, indexed view of the survey data.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    farms: Vec<Arc<Farm>>,
    farm_index: BTreeMap<FarmId, usize>,
    countries: Vec<Country>,
    country_ids_by_name: BTreeMap<String, CountryId>,
    farm_ids_by_country_name: BTreeMap<String, Vec<FarmId>>,
    crops: BTreeMap<CropId, Crop>,
    locations_by_farm: BTreeMap<FarmId, Vec<Location>>,
    varieties_by_farm: BTreeMap<FarmId, Vec<CropVariety>>,
    farm_ids_by_crop: BTreeMap<CropId, BTreeSet<FarmId>>,
    farm_ids_by_crop_group: BTreeMap<String, BTreeSet<FarmId>>,
    user_counts: BTreeSet<u32>,
    location_types: BTreeSet<LocationType>,
}

impl Dataset {
    /// Builds the indexes from raw records.
    ///
    /// Farms keep their input order. A farm's `total_area` is the sum of
    /// its field, garden, and greenhouse location areas; farms without
    /// locations get an area of zero. Duplicate farm ids keep the first
    /// record. Crop varieties that reference an unknown crop are left out
    /// of the crop indexes.
    #[must_use]
    pub fn build(raw: RawData) -> Self {
        let RawData {
            countries,
            farms,
            varieties,
            crops,
            locations,
        } = raw;

        let mut locations_by_farm: BTreeMap<FarmId, Vec<Location>> = BTreeMap::new();
        let mut location_types = BTreeSet::new();
        for location in locations {
            location_types.insert(location.location_type);
            locations_by_farm
                .entry(location.farm_id.clone())
                .or_default()
                .push(location);
        }

        let mut dataset_farms = Vec::with_capacity(farms.len());
        let mut farm_index = BTreeMap::new();
        let mut farm_ids_by_country_name: BTreeMap<String, Vec<FarmId>> = BTreeMap::new();
        let mut user_counts = BTreeSet::new();

        for mut record in farms {
            if farm_index.contains_key(&record.farm_id) {
                log::warn!("Duplicate farm id {}, keeping first record", record.farm_id);
                continue;
            }

            record.country_name = non_blank(record.country_name);
            record.certification = non_blank(record.certification);
            record.certifier = non_blank(record.certifier);

            let total_area = locations_by_farm
                .get(&record.farm_id)
                .map_or(0.0, |locations| cultivated_area(locations));

            user_counts.insert(record.number_of_users);
            if let Some(country_name) = &record.country_name {
                farm_ids_by_country_name
                    .entry(country_name.clone())
                    .or_default()
                    .push(record.farm_id.clone());
            }

            farm_index.insert(record.farm_id.clone(), dataset_farms.len());
            dataset_farms.push(Arc::new(Farm::from_record(record, total_area)));
        }

        let orphaned = locations_by_farm
            .keys()
            .filter(|id| !farm_index.contains_key(*id))
            .count();
        if orphaned > 0 {
            log::debug!("{orphaned} location farm ids do not match any farm");
        }

        let crops: BTreeMap<CropId, Crop> = crops
            .into_iter()
            .map(|crop| (crop.crop_id, crop))
            .collect();

        let mut varieties_by_farm: BTreeMap<FarmId, Vec<CropVariety>> = BTreeMap::new();
        let mut farm_ids_by_crop: BTreeMap<CropId, BTreeSet<FarmId>> = BTreeMap::new();
        let mut farm_ids_by_crop_group: BTreeMap<String, BTreeSet<FarmId>> = BTreeMap::new();
        let mut unknown_crop_varieties = 0_usize;

        for variety in varieties {
            let Some(crop) = crops.get(&variety.crop_id) else {
                unknown_crop_varieties += 1;
                continue;
            };
            farm_ids_by_crop_group
                .entry(crop.crop_group.clone())
                .or_default()
                .insert(variety.farm_id.clone());
            farm_ids_by_crop
                .entry(variety.crop_id)
                .or_default()
                .insert(variety.farm_id.clone());
            varieties_by_farm
                .entry(variety.farm_id.clone())
                .or_default()
                .push(variety);
        }

        if unknown_crop_varieties > 0 {
            log::warn!("Skipped {unknown_crop_varieties} crop varieties with unknown crop ids");
        }

        let country_ids_by_name = countries
            .iter()
            .map(|country| (country.name.clone(), country.id.clone()))
            .collect();

        Self {
            farms: dataset_farms,
            farm_index,
            countries,
            country_ids_by_name,
            farm_ids_by_country_name,
            crops,
            locations_by_farm,
            varieties_by_farm,
            farm_ids_by_crop,
            farm_ids_by_crop_group,
            user_counts,
            location_types,
        }
    }

    /// All farms in input order.
    #[must_use]
    pub fn farms(&self) -> &[Arc<Farm>] {
        &self.farms
    }

    /// Looks up a farm by id.
    #[must_use]
    pub fn farm(&self, farm_id: &FarmId) -> Option<&Arc<Farm>> {
        self.farm_index.get(farm_id).map(|&idx| &self.farms[idx])
    }

    /// Countries from the boundary file.
    #[must_use]
    pub fn countries(&self) -> &[Country] {
        &self.countries
    }

    /// Country name to country id mapping.
    #[must_use]
    pub const fn country_ids_by_name(&self) -> &BTreeMap<String, CountryId> {
        &self.country_ids_by_name
    }

    /// Ids of the farms recorded under a country name, in input order.
    #[must_use]
    pub fn farm_ids_in_country(&self, country_name: &str) -> &[FarmId] {
        self.farm_ids_by_country_name
            .get(country_name)
            .map_or(&[], Vec::as_slice)
    }

    /// Looks up a crop by id.
    #[must_use]
    pub fn crop(&self, crop_id: CropId) -> Option<&Crop> {
        self.crops.get(&crop_id)
    }

    /// A farm's locations; empty when the farm has none.
    #[must_use]
    pub fn locations_of(&self, farm_id: &FarmId) -> &[Location] {
        self.locations_by_farm
            .get(farm_id)
            .map_or(&[], Vec::as_slice)
    }

    /// A farm's crop varieties; empty when the farm has none.
    #[must_use]
    pub fn varieties_of(&self, farm_id: &FarmId) -> &[CropVariety] {
        self.varieties_by_farm
            .get(farm_id)
            .map_or(&[], Vec::as_slice)
    }

    /// Whether the farm grows at least one variety of the crop.
    #[must_use]
    pub fn farm_grows_crop(&self, farm_id: &FarmId, crop_id: CropId) -> bool {
        self.farm_ids_by_crop
            .get(&crop_id)
            .is_some_and(|farms| farms.contains(farm_id))
    }

    /// Whether the farm grows at least one crop of the crop group.
    #[must_use]
    pub fn farm_grows_crop_group(&self, farm_id: &FarmId, crop_group: &str) -> bool {
        self.farm_ids_by_crop_group
            .get(crop_group)
            .is_some_and(|farms| farms.contains(farm_id))
    }

    /// Whether the farm has at least one location of the given type.
    #[must_use]
    pub fn farm_has_location_type(&self, farm_id: &FarmId, location_type: LocationType) -> bool {
        self.locations_of(farm_id)
            .iter()
            .any(|location| location.location_type == location_type)
    }

    /// Distinct `number_of_users` values observed across all farms.
    #[must_use]
    pub const fn user_counts(&self) -> &BTreeSet<u32> {
        &self.user_counts
    }

    /// Distinct location types observed across all locations.
    #[must_use]
    pub const fn location_types(&self) -> &BTreeSet<LocationType> {
        &self.location_types
    }
}

/// Sums the areas of the locations that count toward a farm's cultivated
/// area.
#[must_use]
pub fn cultivated_area(locations: &[Location]) -> f64 {
    locations
        .iter()
        .filter(|location| location.location_type.counts_toward_farm_area())
        .map(|location| location.total_area)
        .sum()
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

#[cfg(test)]
pub(crate) mod test_support {
    use farm_map_farm_models::{
        Crop, CropId, CropVariety, FarmId, FarmRecord, Location, LocationType,
    };

    pub fn farm(id: &str, users: u32, country: &str) -> FarmRecord {
        FarmRecord {
            farm_id: FarmId::new(id),
            number_of_users: users,
            country_name: Some(country.to_string()),
            grid_points: None,
            certification: None,
            certifier: None,
        }
    }

    pub fn location(id: &str, farm_id: &str, location_type: LocationType, area: f64) -> Location {
        Location {
            location_id: id.to_string(),
            farm_id: FarmId::new(farm_id),
            location_type,
            total_area: area,
        }
    }

    pub fn crop(id: i64, name: &str, group: &str) -> Crop {
        Crop {
            crop_id: CropId(id),
            crop_common_name: name.to_string(),
            crop_group: group.to_string(),
        }
    }

    pub fn variety(farm_id: &str, crop_id: i64, name: &str) -> CropVariety {
        CropVariety {
            farm_id: FarmId::new(farm_id),
            crop_id: CropId(crop_id),
            crop_variety_name: name.to_string(),
        }
    }
}
