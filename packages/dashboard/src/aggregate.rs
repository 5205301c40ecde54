//! Pure aggregation over farm slices.
//!
//! Every grouping here returns ordered maps, so output order is a function of
//! the input alone.

use std::collections::BTreeMap;
use std::sync::Arc;

use farm_map_dashboard_models::views::{HierarchyNode, LocationArea, TreemapGroup};
use farm_map_dashboard_models::{AreaBreakpoints, AreaBucket};
use farm_map_dataset::Dataset;
use farm_map_farm_models::{CountryId, CropId, Farm, FarmId, LocationType};

/// Farms per users-per-farm value and area bucket.
pub type BucketCounts = BTreeMap<u32, BTreeMap<AreaBucket, usize>>;

/// Root name of the crop hierarchy.
pub const CROP_ROOT: &str = "crop_group";

/// Root name of the certification hierarchy.
pub const CERTIFICATION_ROOT: &str = "certification";

/// Groups farms by the id of their country. Farms whose country name has no
/// boundary are dropped.
#[must_use]
pub fn farms_by_country<'a>(
    farms: &'a [Arc<Farm>],
    country_ids_by_name: &BTreeMap<String, CountryId>,
) -> BTreeMap<CountryId, Vec<&'a Arc<Farm>>> {
    let mut grouped: BTreeMap<CountryId, Vec<&Arc<Farm>>> = BTreeMap::new();
    let mut unmapped = 0_usize;

    for farm in farms {
        let country_id = farm
            .country_name
            .as_ref()
            .and_then(|name| country_ids_by_name.get(name));
        match country_id {
            Some(id) => grouped.entry(id.clone()).or_default().push(farm),
            None => unmapped += 1,
        }
    }

    if unmapped > 0 {
        log::debug!("{unmapped} farms have no matching country boundary");
    }

    grouped
}

/// Number of farms per country.
#[must_use]
pub fn farm_count_by_country(
    farms: &[Arc<Farm>],
    country_ids_by_name: &BTreeMap<String, CountryId>,
) -> BTreeMap<CountryId, usize> {
    farms_by_country(farms, country_ids_by_name)
        .into_iter()
        .map(|(id, farms)| (id, farms.len()))
        .collect()
}

/// Summed cultivated area per country.
#[must_use]
pub fn total_area_by_country(
    farms: &[Arc<Farm>],
    country_ids_by_name: &BTreeMap<String, CountryId>,
) -> BTreeMap<CountryId, f64> {
    farms_by_country(farms, country_ids_by_name)
        .into_iter()
        .map(|(id, farms)| (id, farms.iter().map(|farm| farm.total_area).sum()))
        .collect()
}

/// The farm's area bucket, or `None` below the smallest breakpoint.
#[must_use]
pub fn bucket_by_area(farm: &Farm, breakpoints: &AreaBreakpoints) -> Option<AreaBucket> {
    breakpoints.bucket_for(farm.total_area)
}

/// Groups farms by exact `number_of_users`, then by area bucket. Unbucketed
/// farms are left out.
#[must_use]
pub fn farms_by_user_count_and_area_bucket<'a>(
    farms: &'a [Arc<Farm>],
    breakpoints: &AreaBreakpoints,
) -> BTreeMap<u32, BTreeMap<AreaBucket, Vec<&'a Arc<Farm>>>> {
    let mut grouped: BTreeMap<u32, BTreeMap<AreaBucket, Vec<&Arc<Farm>>>> = BTreeMap::new();
    for farm in farms {
        if let Some(bucket) = bucket_by_area(farm, breakpoints) {
            grouped
                .entry(farm.number_of_users)
                .or_default()
                .entry(bucket)
                .or_default()
                .push(farm);
        }
    }
    grouped
}

/// Counts of [`farms_by_user_count_and_area_bucket`].
#[must_use]
pub fn bucket_counts(farms: &[Arc<Farm>], breakpoints: &AreaBreakpoints) -> BucketCounts {
    farms_by_user_count_and_area_bucket(farms, breakpoints)
        .into_iter()
        .map(|(users, buckets)| {
            let counts = buckets
                .into_iter()
                .map(|(bucket, farms)| (bucket, farms.len()))
                .collect();
            (users, counts)
        })
        .collect()
}

/// Each configured bucket's share of its user-count group, in percent.
/// Buckets without farms report `0.0`.
#[must_use]
pub fn percentage_by_bucket<T>(
    grouped: &BTreeMap<u32, BTreeMap<AreaBucket, Vec<T>>>,
    breakpoints: &AreaBreakpoints,
) -> BTreeMap<u32, BTreeMap<AreaBucket, f64>> {
    grouped
        .iter()
        .map(|(&users, buckets)| {
            let counts = buckets.iter().map(|(&bucket, farms)| (bucket, farms.len()));
            (users, shares(counts, breakpoints))
        })
        .collect()
}

/// Per-group farm counts with every configured bucket present.
#[must_use]
pub fn count_by_user_count_group(
    counts: &BucketCounts,
    breakpoints: &AreaBreakpoints,
) -> BucketCounts {
    counts
        .iter()
        .map(|(&users, buckets)| {
            let row = breakpoints
                .buckets()
                .map(|bucket| (bucket, buckets.get(&bucket).copied().unwrap_or(0)))
                .collect();
            (users, row)
        })
        .collect()
}

/// Per-group bucket percentages, computed from counts.
#[must_use]
pub fn percentage_by_user_count_group(
    counts: &BucketCounts,
    breakpoints: &AreaBreakpoints,
) -> BTreeMap<u32, BTreeMap<AreaBucket, f64>> {
    counts
        .iter()
        .map(|(&users, buckets)| {
            let counts = buckets.iter().map(|(&bucket, &count)| (bucket, count));
            (users, shares(counts, breakpoints))
        })
        .collect()
}

#[allow(clippy::cast_precision_loss)]
fn shares(
    counts: impl Iterator<Item = (AreaBucket, usize)>,
    breakpoints: &AreaBreakpoints,
) -> BTreeMap<AreaBucket, f64> {
    let counts: BTreeMap<AreaBucket, usize> = counts.collect();
    let total: usize = counts.values().sum();

    breakpoints
        .buckets()
        .map(|bucket| {
            let count = counts.get(&bucket).copied().unwrap_or(0);
            let pct = if total == 0 {
                0.0
            } else {
                count as f64 / total as f64 * 100.0
            };
            (bucket, pct)
        })
        .collect()
}

/// Crop group, crop, and variety tree. Each variety a farm grows is a leaf
/// of value 1.
#[must_use]
pub fn crop_group_hierarchy(farms: &[Arc<Farm>], dataset: &Dataset) -> HierarchyNode {
    let mut groups: BTreeMap<&str, BTreeMap<CropId, (&str, Vec<HierarchyNode>)>> = BTreeMap::new();

    for farm in farms {
        for variety in dataset.varieties_of(&farm.farm_id) {
            let Some(crop) = dataset.crop(variety.crop_id) else {
                continue;
            };
            groups
                .entry(crop.crop_group.as_str())
                .or_default()
                .entry(crop.crop_id)
                .or_insert_with(|| (crop.crop_common_name.as_str(), Vec::new()))
                .1
                .push(HierarchyNode::leaf(variety.crop_variety_name.clone()));
        }
    }

    let children = groups
        .into_iter()
        .map(|(group, crops)| {
            let crops = crops
                .into_iter()
                .map(|(crop_id, (name, varieties))| {
                    HierarchyNode::branch(name, varieties).with_crop_id(crop_id)
                })
                .collect();
            HierarchyNode::branch(group, crops)
        })
        .collect();

    HierarchyNode::branch(CROP_ROOT, children)
}

/// Certification, certifier, farm, and location type tree. Each location is
/// a leaf of value 1. Farms without both a certification and a certifier
/// are left out.
#[must_use]
pub fn certification_hierarchy(farms: &[Arc<Farm>], dataset: &Dataset) -> HierarchyNode {
    let mut certifications: BTreeMap<&str, BTreeMap<&str, Vec<HierarchyNode>>> = BTreeMap::new();

    for farm in farms {
        let Some((certification, certifier)) = farm.certification_pair() else {
            continue;
        };
        let locations = dataset
            .locations_of(&farm.farm_id)
            .iter()
            .map(|location| HierarchyNode::leaf(location.location_type.to_string()))
            .collect();
        certifications
            .entry(certification)
            .or_default()
            .entry(certifier)
            .or_default()
            .push(
                HierarchyNode::branch(farm.farm_id.as_str(), locations)
                    .with_farm_id(farm.farm_id.clone()),
            );
    }

    let children = certifications
        .into_iter()
        .map(|(certification, certifiers)| {
            let certifiers = certifiers
                .into_iter()
                .map(|(certifier, farms)| HierarchyNode::branch(certifier, farms))
                .collect();
            HierarchyNode::branch(certification, certifiers)
        })
        .collect();

    HierarchyNode::branch(CERTIFICATION_ROOT, children)
}

/// Summed location area per farm and location type. Every location type
/// counts, not only the cultivated ones.
#[must_use]
pub fn location_area_by_farm_and_type(
    farms: &[Arc<Farm>],
    dataset: &Dataset,
) -> BTreeMap<(FarmId, LocationType), f64> {
    let mut areas = BTreeMap::new();
    for farm in farms {
        for location in dataset.locations_of(&farm.farm_id) {
            *areas
                .entry((farm.farm_id.clone(), location.location_type))
                .or_insert(0.0) += location.total_area;
        }
    }
    areas
}

/// Treemap input: per-farm areas grouped by location type. Groups and the
/// cells inside them are ordered largest first.
#[must_use]
pub fn treemap_groups(areas: &BTreeMap<(FarmId, LocationType), f64>) -> Vec<TreemapGroup> {
    let mut by_type: BTreeMap<LocationType, Vec<LocationArea>> = BTreeMap::new();
    for ((farm_id, location_type), &area) in areas {
        by_type.entry(*location_type).or_default().push(LocationArea {
            farm_id: farm_id.clone(),
            location_type: *location_type,
            area,
        });
    }

    let mut groups: Vec<TreemapGroup> = by_type
        .into_iter()
        .map(|(location_type, mut cells)| {
            cells.sort_by(|a, b| b.area.total_cmp(&a.area));
            TreemapGroup {
                location_type,
                total_area: cells.iter().map(|cell| cell.area).sum(),
                cells,
            }
        })
        .collect();
    groups.sort_by(|a, b| b.total_area.total_cmp(&a.total_area));
    groups
}

#[cfg(test)]
pub(crate) mod test_support {
    use farm_map_dataset::{Country, RawData};
    use farm_map_farm_models::{Crop, CropVariety, FarmRecord, GridPoint, Location};

    use super::*;

    pub fn farm(id: &str, users: u32, country: &str) -> FarmRecord {
        FarmRecord {
            farm_id: FarmId::new(id),
            number_of_users: users,
            country_name: Some(country.to_string()),
            grid_points: Some(GridPoint { lat: 10.0, lng: 20.0 }),
            certification: None,
            certifier: None,
        }
    }

    pub fn certified(id: &str, users: u32, certification: &str, certifier: &str) -> FarmRecord {
        FarmRecord {
            certification: Some(certification.to_string()),
            certifier: Some(certifier.to_string()),
            ..farm(id, users, "Canada")
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

    pub fn countries() -> Vec<Country> {
        vec![
            Country {
                id: CountryId::new("CAN"),
                name: "Canada".to_string(),
            },
            Country {
                id: CountryId::new("KEN"),
                name: "Kenya".to_string(),
            },
        ]
    }

    /// Farm `a` (5 users, 50 000 ㎡ field), farm `b` (5 users, 5 000 ㎡
    /// garden), farm `c` (2 users, 200 000 ㎡ field, certified, in Kenya).
    pub fn sample_dataset() -> Dataset {
        Dataset::build(RawData {
            countries: countries(),
            farms: vec![
                farm("a", 5, "Canada"),
                farm("b", 5, "Canada"),
                FarmRecord {
                    country_name: Some("Kenya".to_string()),
                    ..certified("c", 2, "Organic", "Ecocert")
                },
            ],
            varieties: vec![
                variety("a", 1, "Roma"),
                variety("a", 1, "Cherry"),
                variety("b", 2, "Russet"),
                variety("c", 2, "Yukon"),
            ],
            crops: vec![crop(1, "Tomato", "Fruit"), crop(2, "Potato", "Root")],
            locations: vec![
                location("l1", "a", LocationType::Field, 50_000.0),
                location("l2", "a", LocationType::Barn, 300.0),
                location("l3", "b", LocationType::Garden, 5_000.0),
                location("l4", "c", LocationType::Field, 150_000.0),
                location("l5", "c", LocationType::Field, 50_000.0),
                location("l6", "c", LocationType::Barn, 800.0),
            ],
        })
    }
}
