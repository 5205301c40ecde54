//! Chart view models.
//!
//! These are the data each chart adapter derives on `update_vis` and the
//! frontend draws. They carry no layout or color information.

use std::collections::BTreeMap;

use farm_map_farm_models::{CountryId, CropId, FarmId, LocationType};
use serde::{Deserialize, Serialize};

use crate::{AreaBucket, BarMode};

/// A node of a crop or certification hierarchy.
///
/// A leaf has value 1; an interior node's value is the sum of its
/// children's values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HierarchyNode {
    /// Display name.
    pub name: String,
    /// Leaf count below (or 1 for a leaf).
    pub value: u64,
    /// Crop id for crop-level nodes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crop_id: Option<CropId>,
    /// Farm id for farm-level nodes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub farm_id: Option<FarmId>,
    /// Child nodes.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Self>,
}

impl HierarchyNode {
    /// A leaf with value 1.
    #[must_use]
    pub fn leaf(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: 1,
            crop_id: None,
            farm_id: None,
            children: Vec::new(),
        }
    }

    /// An interior node whose value is the sum of its children.
    #[must_use]
    pub fn branch(name: impl Into<String>, children: Vec<Self>) -> Self {
        Self {
            name: name.into(),
            value: children.iter().map(|child| child.value).sum(),
            crop_id: None,
            farm_id: None,
            children,
        }
    }

    /// Attaches a crop id.
    #[must_use]
    pub const fn with_crop_id(mut self, crop_id: CropId) -> Self {
        self.crop_id = Some(crop_id);
        self
    }

    /// Attaches a farm id.
    #[must_use]
    pub fn with_farm_id(mut self, farm_id: FarmId) -> Self {
        self.farm_id = Some(farm_id);
        self
    }

    /// Finds a direct child by name.
    #[must_use]
    pub fn child(&self, name: &str) -> Option<&Self> {
        self.children.iter().find(|child| child.name == name)
    }

    /// Number of leaves below this node (1 for a leaf).
    #[must_use]
    pub fn leaf_count(&self) -> usize {
        if self.children.is_empty() {
            1
        } else {
            self.children.iter().map(Self::leaf_count).sum()
        }
    }
}

/// One users-per-farm group of the bar chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BarRow {
    /// Users-per-farm value.
    pub number_of_users: u32,
    /// Farms per bucket (every configured bucket present).
    pub counts: BTreeMap<AreaBucket, usize>,
    /// Bucket share of the group in percent (every configured bucket
    /// present).
    pub percentages: BTreeMap<AreaBucket, f64>,
}

/// A bar chart legend entry for a bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BucketLegend {
    /// The bucket.
    pub bucket: AreaBucket,
    /// Display label.
    pub label: String,
    /// Whether the bucket is currently included.
    pub included: bool,
}

/// A bar chart legend entry for a users-per-farm value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserCountLegend {
    /// Users-per-farm value.
    pub number_of_users: u32,
    /// Whether the value is currently included.
    pub included: bool,
}

/// Bar chart view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BarView {
    /// Current scaling mode.
    pub mode: BarMode,
    /// Bucket legend, largest bucket first.
    pub buckets: Vec<BucketLegend>,
    /// Users-per-farm legend, ascending.
    pub user_counts: Vec<UserCountLegend>,
    /// One row per users-per-farm group present in the selection.
    pub rows: Vec<BarRow>,
    /// Upper bound of the value axis.
    pub y_max: f64,
}

/// Per-country choropleth values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CountryStats {
    /// Country id.
    pub country_id: CountryId,
    /// Visible farms in the country.
    pub farm_count: usize,
    /// Summed cultivated area of those farms.
    pub total_area: f64,
}

/// A farm marker on the map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FarmMarker {
    /// Farm id.
    pub farm_id: FarmId,
    /// Latitude.
    pub lat: f64,
    /// Longitude.
    pub lng: f64,
    /// Cultivated area (marker size).
    pub total_area: f64,
    /// Farm-size bucket (marker fill).
    pub bucket: Option<AreaBucket>,
    /// Whether the farm passes the current filters.
    pub clickable: bool,
    /// Whether the farm is visible and selected on the map.
    pub selected: bool,
}

/// Map view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeoView {
    /// Countries with at least one visible farm.
    pub countries: Vec<CountryStats>,
    /// Visible farms across all countries.
    pub total_farms: usize,
    /// Cultivated area across all countries.
    pub total_area: f64,
    /// Every farm with a position.
    pub markers: Vec<FarmMarker>,
}

/// Summed area of one location type on one farm.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationArea {
    /// Farm id.
    pub farm_id: FarmId,
    /// Location type.
    pub location_type: LocationType,
    /// Summed area.
    pub area: f64,
}

/// One location type's cells in the treemap.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TreemapGroup {
    /// Location type.
    pub location_type: LocationType,
    /// Sum of the cells' areas.
    pub total_area: f64,
    /// One cell per farm, largest first.
    pub cells: Vec<LocationArea>,
}

/// Treemap view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TreemapView {
    /// Location types currently required by the filter.
    pub selected_types: Vec<LocationType>,
    /// Groups, largest first.
    pub groups: Vec<TreemapGroup>,
}

/// Bubble chart view. The drill path lives in the filter state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BubbleView {
    /// Certification hierarchy.
    pub root: HierarchyNode,
}

/// Sunburst view. The drill path lives in the filter state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PieView {
    /// Crop hierarchy.
    pub root: HierarchyNode,
}

/// Compact description of the filtered dataset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilteredSummary {
    /// Farms passing every filter.
    pub farm_count: usize,
    /// Farms in the effective selection.
    pub selected_count: usize,
    /// Whether the map selection narrowed the visible farms.
    pub has_explicit_selection: bool,
    /// Ids of the selected farms.
    pub selected_farm_ids: Vec<FarmId>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn branch_value_sums_children() {
        let crop = HierarchyNode::branch(
            "Tomato",
            vec![HierarchyNode::leaf("Roma"), HierarchyNode::leaf("Cherry")],
        )
        .with_crop_id(CropId(1));
        let group = HierarchyNode::branch("Fruit", vec![crop]);
        assert_eq!(group.value, 2);
        assert_eq!(group.leaf_count(), 2);
        assert_eq!(group.child("Tomato").unwrap().crop_id, Some(CropId(1)));
    }

    #[test]
    fn empty_branch_has_zero_value() {
        let node = HierarchyNode::branch("certification", Vec::new());
        assert_eq!(node.value, 0);
        let json = serde_json::to_value(&node).unwrap();
        assert_eq!(json, serde_json::json!({ "name": "certification", "value": 0 }));
    }
}
