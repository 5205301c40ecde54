//! Filtered-state derivation.
//!
//! [`recompute`] is the only producer of [`FilteredState`]. It applies every
//! active predicate to the full farm list from scratch, so the result never
//! depends on the previous filtered state.

use std::collections::BTreeSet;
use std::sync::Arc;

use farm_map_dashboard_models::views::FilteredSummary;
use farm_map_dashboard_models::{AreaBreakpoints, FilterState};
use farm_map_dataset::Dataset;
use farm_map_farm_models::{Farm, FarmId};

use crate::aggregate::{self, BucketCounts};

/// Everything derived from the dataset and the current filters.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilteredState {
    /// Farms passing every filter, in input order.
    pub farms: Vec<Arc<Farm>>,
    /// Passing farms in the map selection, or all passing farms when the
    /// selection does not intersect them.
    pub selected_farms: Vec<Arc<Farm>>,
    /// Ids of `farms`.
    pub farm_id_set: BTreeSet<FarmId>,
    /// Whether the map selection narrowed `selected_farms`.
    pub has_explicit_selection: bool,
    /// Bar chart counts over `selected_farms`.
    pub bucket_counts: BucketCounts,
}

impl FilteredState {
    /// Whether the farm passes the current filters.
    #[must_use]
    pub fn contains(&self, farm_id: &FarmId) -> bool {
        self.farm_id_set.contains(farm_id)
    }

    /// Compact description for the API and CLI.
    #[must_use]
    pub fn summary(&self) -> FilteredSummary {
        FilteredSummary {
            farm_count: self.farms.len(),
            selected_count: self.selected_farms.len(),
            has_explicit_selection: self.has_explicit_selection,
            selected_farm_ids: self
                .selected_farms
                .iter()
                .map(|farm| farm.farm_id.clone())
                .collect(),
        }
    }
}

/// Whether a single farm passes every active filter.
#[must_use]
pub fn passes(
    dataset: &Dataset,
    filters: &FilterState,
    breakpoints: &AreaBreakpoints,
    farm: &Farm,
) -> bool {
    let Some(bucket) = aggregate::bucket_by_area(farm, breakpoints) else {
        return false;
    };
    if !filters.area().is_included(&bucket) {
        return false;
    }
    if !filters.user_count().is_included(&farm.number_of_users) {
        return false;
    }

    let bubble = filters.bubble();
    if bubble
        .certification()
        .is_some_and(|certification| farm.certification.as_deref() != Some(certification))
    {
        return false;
    }
    if bubble
        .certifier()
        .is_some_and(|certifier| farm.certifier.as_deref() != Some(certifier))
    {
        return false;
    }

    let pie = filters.pie();
    if pie
        .crop_id()
        .is_some_and(|crop_id| !dataset.farm_grows_crop(&farm.farm_id, crop_id))
    {
        return false;
    }
    if pie
        .crop_group()
        .is_some_and(|crop_group| !dataset.farm_grows_crop_group(&farm.farm_id, crop_group))
    {
        return false;
    }

    filters
        .location_types()
        .iter()
        .all(|&location_type| dataset.farm_has_location_type(&farm.farm_id, location_type))
}

/// Derives the filtered state from the dataset and filters.
#[must_use]
pub fn recompute(
    dataset: &Dataset,
    filters: &FilterState,
    breakpoints: &AreaBreakpoints,
) -> FilteredState {
    let farms: Vec<Arc<Farm>> = dataset
        .farms()
        .iter()
        .filter(|farm| passes(dataset, filters, breakpoints, farm))
        .cloned()
        .collect();

    let farm_id_set: BTreeSet<FarmId> = farms.iter().map(|farm| farm.farm_id.clone()).collect();

    let selection = filters.selected_farms();
    let narrowed: Vec<Arc<Farm>> = if selection.is_empty() {
        Vec::new()
    } else {
        farms
            .iter()
            .filter(|farm| selection.contains(&farm.farm_id))
            .cloned()
            .collect()
    };

    let has_explicit_selection = !narrowed.is_empty();
    let selected_farms = if has_explicit_selection {
        narrowed
    } else {
        farms.clone()
    };

    let bucket_counts = aggregate::bucket_counts(&selected_farms, breakpoints);

    log::trace!(
        "Recomputed filtered state: {} farms, {} selected",
        farms.len(),
        selected_farms.len()
    );

    FilteredState {
        farms,
        selected_farms,
        farm_id_set,
        has_explicit_selection,
        bucket_counts,
    }
}

#[cfg(test)]
mod tests {
    use farm_map_dashboard_models::{AreaBucket, BubbleDrill, ChartKind, FilterKey, PieDrill};
    use farm_map_farm_models::{CropId, LocationType};

    use super::*;
    use crate::aggregate::test_support::sample_dataset;

    fn setup() -> (Dataset, FilterState, AreaBreakpoints) {
        let dataset = sample_dataset();
        let breakpoints = AreaBreakpoints::default();
        let filters = FilterState::new(&breakpoints, dataset.user_counts().iter().copied());
        (dataset, filters, breakpoints)
    }

    fn ids(farms: &[Arc<Farm>]) -> Vec<&str> {
        farms.iter().map(|farm| farm.farm_id.as_str()).collect()
    }

    #[test]
    fn default_filters_pass_every_bucketed_farm() {
        let (dataset, filters, breakpoints) = setup();
        let filtered = recompute(&dataset, &filters, &breakpoints);
        assert_eq!(ids(&filtered.farms), vec!["a", "b", "c"]);
        assert_eq!(filtered.selected_farms, filtered.farms);
        assert!(!filtered.has_explicit_selection);
    }

    #[test]
    fn recompute_is_idempotent() {
        let (dataset, mut filters, breakpoints) = setup();
        filters
            .toggle(ChartKind::BarChart, FilterKey::UserCount(2))
            .unwrap();
        let first = recompute(&dataset, &filters, &breakpoints);
        let second = recompute(&dataset, &filters, &breakpoints);
        assert_eq!(first, second);
    }

    #[test]
    fn excluding_a_bucket_removes_its_farms() {
        let (dataset, mut filters, breakpoints) = setup();
        filters
            .toggle(ChartKind::BarChart, FilterKey::AreaBucket(AreaBucket(10_000)))
            .unwrap();
        let filtered = recompute(&dataset, &filters, &breakpoints);
        assert_eq!(ids(&filtered.farms), vec!["b", "c"]);
        assert!(!filtered.contains(&FarmId::new("a")));
        assert_eq!(filtered.bucket_counts[&5].get(&AreaBucket(10_000)), None);
    }

    #[test]
    fn unbucketed_farms_never_pass() {
        let (dataset, _, _) = setup();
        let breakpoints = AreaBreakpoints::new([10_000]);
        let filters = FilterState::new(&breakpoints, dataset.user_counts().iter().copied());
        let filtered = recompute(&dataset, &filters, &breakpoints);
        assert_eq!(ids(&filtered.farms), vec!["a", "c"]);
    }

    #[test]
    fn empty_or_disjoint_selection_falls_back_to_all_farms() {
        let (dataset, mut filters, breakpoints) = setup();
        filters
            .set(ChartKind::GeoMap, FilterKey::Farm(FarmId::new("ghost")), true)
            .unwrap();
        let filtered = recompute(&dataset, &filters, &breakpoints);
        assert_eq!(filtered.selected_farms, filtered.farms);
        assert!(!filtered.has_explicit_selection);

        filters
            .set(ChartKind::GeoMap, FilterKey::Farm(FarmId::new("b")), true)
            .unwrap();
        let filtered = recompute(&dataset, &filters, &breakpoints);
        assert_eq!(ids(&filtered.selected_farms), vec!["b"]);
        assert!(filtered.has_explicit_selection);
        assert_eq!(filtered.farms.len(), 3);
        assert_eq!(filtered.bucket_counts[&5][&AreaBucket(0)], 1);
    }

    #[test]
    fn treemap_types_must_all_be_present() {
        let (dataset, mut filters, breakpoints) = setup();
        filters
            .toggle(ChartKind::Treemap, FilterKey::LocationType(LocationType::Field))
            .unwrap();
        let filtered = recompute(&dataset, &filters, &breakpoints);
        assert_eq!(ids(&filtered.farms), vec!["a", "c"]);

        filters
            .toggle(ChartKind::Treemap, FilterKey::LocationType(LocationType::Garden))
            .unwrap();
        let filtered = recompute(&dataset, &filters, &breakpoints);
        assert!(filtered.farms.is_empty());
        assert!(filtered.selected_farms.is_empty());
    }

    #[test]
    fn bubble_drill_matches_certification_fields() {
        let (dataset, mut filters, breakpoints) = setup();
        filters.set_bubble_drill(BubbleDrill::Certifier {
            certification: "Organic".to_string(),
            certifier: "Ecocert".to_string(),
        });
        let filtered = recompute(&dataset, &filters, &breakpoints);
        assert_eq!(ids(&filtered.farms), vec!["c"]);

        filters.set_bubble_drill(BubbleDrill::Certifier {
            certification: "Organic".to_string(),
            certifier: "Other".to_string(),
        });
        assert!(recompute(&dataset, &filters, &breakpoints).farms.is_empty());
    }

    #[test]
    fn pie_drill_matches_crops_and_groups() {
        let (dataset, mut filters, breakpoints) = setup();
        filters.set_pie_drill(PieDrill::CropGroup {
            crop_group: "Root".to_string(),
        });
        let filtered = recompute(&dataset, &filters, &breakpoints);
        assert_eq!(ids(&filtered.farms), vec!["b", "c"]);

        filters.set_pie_drill(PieDrill::Crop {
            crop_group: "Fruit".to_string(),
            crop_id: CropId(1),
        });
        let filtered = recompute(&dataset, &filters, &breakpoints);
        assert_eq!(ids(&filtered.farms), vec!["a"]);
    }

    #[test]
    fn pie_drill_on_unknown_crop_matches_nothing() {
        let (dataset, mut filters, breakpoints) = setup();
        filters.set_pie_drill(PieDrill::Crop {
            crop_group: "Fruit".to_string(),
            crop_id: CropId(404),
        });
        let filtered = recompute(&dataset, &filters, &breakpoints);
        assert!(filtered.farms.is_empty());
        assert!(filtered.bucket_counts.is_empty());
    }

    #[test]
    fn summary_lists_selected_ids() {
        let (dataset, mut filters, breakpoints) = setup();
        filters.replace_selection([FarmId::new("a"), FarmId::new("c")]);
        let summary = recompute(&dataset, &filters, &breakpoints).summary();
        assert_eq!(summary.farm_count, 3);
        assert_eq!(summary.selected_count, 2);
        assert!(summary.has_explicit_selection);
        assert_eq!(
            summary.selected_farm_ids,
            vec![FarmId::new("a"), FarmId::new("c")]
        );
    }
}
