//! Canonical input file locations inside the data directory.

use std::path::{Path, PathBuf};

/// Country boundary `GeoJSON` file name.
pub const COUNTRIES_FILE: &str = "world_countries.json";
/// Farm records file name.
pub const FARMS_FILE: &str = "farm.json";
/// Crop variety records file name.
pub const VARIETIES_FILE: &str = "variety.json";
/// Crop records file name.
pub const CROPS_FILE: &str = "crop.json";
/// Location records file name.
pub const LOCATIONS_FILE: &str = "location.json";

/// Returns the workspace root directory.
///
/// Resolved at compile time from `CARGO_MANIFEST_DIR`; falls back to the
/// current directory when the manifest is not nested as expected.
#[must_use]
pub fn project_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .ancestors()
        .nth(2)
        .map_or_else(|| PathBuf::from("."), Path::to_path_buf)
}

/// Returns the default `data/` directory path.
#[must_use]
pub fn data_dir() -> PathBuf {
    project_root().join("data")
}

/// Paths of the five input files inside a data directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataFiles {
    /// Country boundaries.
    pub countries: PathBuf,
    /// Farms.
    pub farms: PathBuf,
    /// Crop varieties.
    pub varieties: PathBuf,
    /// Crops.
    pub crops: PathBuf,
    /// Locations.
    pub locations: PathBuf,
}

impl DataFiles {
    /// Resolves the standard file names under `dir`.
    #[must_use]
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            countries: dir.join(COUNTRIES_FILE),
            farms: dir.join(FARMS_FILE),
            varieties: dir.join(VARIETIES_FILE),
            crops: dir.join(CROPS_FILE),
            locations: dir.join(LOCATIONS_FILE),
        }
    }
}
