//! Reads the survey export files from a data directory.
//!
//! A missing file, or one that is not a JSON array, is fatal and returned to
//! the caller without retry. Individual records that do not match their
//! record type (e.g. a location with an unknown `type`) are skipped with a
//! warning.

use std::path::Path;

use serde::de::DeserializeOwned;

use crate::paths::DataFiles;
use crate::{Dataset, DatasetError, RawData, countries};

/// Loads and indexes all five input files from `dir`.
///
/// # Errors
///
/// Returns [`DatasetError`] if any file cannot be read or parsed.
pub fn load_from_dir(dir: &Path) -> Result<Dataset, DatasetError> {
    let files = DataFiles::in_dir(dir);
    log::info!("Loading farm survey data from {}", dir.display());

    let raw = read_raw(&files)?;
    log::info!(
        "Read {} countries, {} farms, {} varieties, {} crops, {} locations",
        raw.countries.len(),
        raw.farms.len(),
        raw.varieties.len(),
        raw.crops.len(),
        raw.locations.len(),
    );

    Ok(Dataset::build(raw))
}

/// Reads the raw record collections without indexing them.
///
/// # Errors
///
/// Returns [`DatasetError`] if any file cannot be read or parsed.
pub fn read_raw(files: &DataFiles) -> Result<RawData, DatasetError> {
    let boundaries = read_file(&files.countries)?;
    Ok(RawData {
        countries: countries::parse_countries(&boundaries)?,
        farms: read_records(&files.farms)?,
        varieties: read_records(&files.varieties)?,
        crops: read_records(&files.crops)?,
        locations: read_records(&files.locations)?,
    })
}

fn read_file(path: &Path) -> Result<String, DatasetError> {
    std::fs::read_to_string(path).map_err(|source| DatasetError::Read {
        path: path.to_path_buf(),
        source,
    })
}

fn read_records<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>, DatasetError> {
    let contents = read_file(path)?;
    let values: Vec<serde_json::Value> =
        serde_json::from_str(&contents).map_err(|source| DatasetError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

    let total = values.len();
    let mut skipped = 0_usize;
    let records: Vec<T> = values
        .into_iter()
        .filter_map(|value| match serde_json::from_value(value) {
            Ok(record) => Some(record),
            Err(e) => {
                skipped += 1;
                log::debug!("Skipping record in {}: {e}", path.display());
                None
            }
        })
        .collect();

    if skipped > 0 {
        log::warn!(
            "Skipped {skipped} of {total} malformed records in {}",
            path.display()
        );
    }

    Ok(records)
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use farm_map_farm_models::FarmId;

    use super::*;
    use crate::paths;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "farm_map_dataset_{name}_{}",
            std::process::id()
        ));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn write_fixture(dir: &Path) {
        std::fs::write(
            dir.join(paths::COUNTRIES_FILE),
            r#"{"type":"FeatureCollection","features":[
                {"type":"Feature","id":"CAN","properties":{"name":"Canada"},"geometry":null}
            ]}"#,
        )
        .unwrap();
        std::fs::write(
            dir.join(paths::FARMS_FILE),
            r#"[{"farm_id":"f1","number_of_users":2,"country_name":"Canada",
                 "grid_points":{"lat":49.2,"lng":-123.1},
                 "certification":"Organic","certifier":"Ecocert"}]"#,
        )
        .unwrap();
        std::fs::write(
            dir.join(paths::VARIETIES_FILE),
            r#"[{"farm_id":"f1","crop_id":1,"crop_variety_name":"Roma"}]"#,
        )
        .unwrap();
        std::fs::write(
            dir.join(paths::CROPS_FILE),
            r#"[{"crop_id":1,"crop_common_name":"Tomato","crop_group":"Fruit"}]"#,
        )
        .unwrap();
        std::fs::write(
            dir.join(paths::LOCATIONS_FILE),
            r#"[{"location_id":"l1","farm_id":"f1","type":"greenhouse","total_area":320.5}]"#,
        )
        .unwrap();
    }

    #[test]
    fn loads_complete_directory() {
        let dir = scratch_dir("complete");
        write_fixture(&dir);

        let dataset = load_from_dir(&dir).unwrap();
        let farm = dataset.farm(&FarmId::new("f1")).unwrap();
        assert!((farm.total_area - 320.5).abs() < f64::EPSILON);
        assert_eq!(dataset.countries().len(), 1);

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let dir = scratch_dir("missing");
        write_fixture(&dir);
        std::fs::remove_file(dir.join(paths::CROPS_FILE)).unwrap();

        let err = load_from_dir(&dir).unwrap_err();
        assert!(matches!(
            err,
            DatasetError::Read { ref path, .. } if path.ends_with(paths::CROPS_FILE)
        ));

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn non_array_file_is_a_parse_error() {
        let dir = scratch_dir("malformed");
        write_fixture(&dir);
        std::fs::write(dir.join(paths::LOCATIONS_FILE), r#"{"location_id":"l1"}"#).unwrap();

        let err = load_from_dir(&dir).unwrap_err();
        assert!(matches!(err, DatasetError::Parse { .. }));

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn unknown_location_type_is_skipped() {
        let dir = scratch_dir("unknown_type");
        write_fixture(&dir);
        std::fs::write(
            dir.join(paths::LOCATIONS_FILE),
            r#"[{"location_id":"l1","farm_id":"f1","type":"greenhouse","total_area":320.5},
                {"location_id":"l2","farm_id":"f1","type":"buffer_zone","total_area":1.0},
                {"location_id":"l3"}]"#,
        )
        .unwrap();

        let dataset = load_from_dir(&dir).unwrap();
        let farm_id = FarmId::new("f1");
        assert_eq!(dataset.locations_of(&farm_id).len(), 1);
        let farm = dataset.farm(&farm_id).unwrap();
        assert!((farm.total_area - 320.5).abs() < f64::EPSILON);

        std::fs::remove_dir_all(&dir).unwrap();
    }
}
