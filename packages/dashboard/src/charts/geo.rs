//! Choropleth map with farm markers.

use farm_map_dashboard_models::ChartKind;
use farm_map_dashboard_models::views::{CountryStats, FarmMarker, GeoView};

use super::{Chart, to_json};
use crate::aggregate;
use crate::state::AppState;

/// Map adapter.
#[derive(Debug, Default)]
pub struct GeoMap {
    view: Option<GeoView>,
}

impl GeoMap {
    /// The latest view.
    #[must_use]
    pub const fn view(&self) -> Option<&GeoView> {
        self.view.as_ref()
    }
}

/// Builds the map view.
///
/// Country shading covers every visible farm, not only the selected ones.
/// Markers are drawn for every farm with a position; only visible farms are
/// clickable.
#[must_use]
pub fn build(state: &AppState) -> GeoView {
    let dataset = state.dataset();
    let filtered = state.filtered();
    let country_ids = dataset.country_ids_by_name();

    let areas = aggregate::total_area_by_country(&filtered.farms, country_ids);
    let countries: Vec<CountryStats> =
        aggregate::farm_count_by_country(&filtered.farms, country_ids)
            .into_iter()
            .map(|(country_id, farm_count)| CountryStats {
                total_area: areas.get(&country_id).copied().unwrap_or(0.0),
                country_id,
                farm_count,
            })
            .collect();

    let selected = state.filters().selected_farms();
    let markers = dataset
        .farms()
        .iter()
        .filter_map(|farm| {
            let point = farm.grid_points?;
            let clickable = filtered.contains(&farm.farm_id);
            Some(FarmMarker {
                farm_id: farm.farm_id.clone(),
                lat: point.lat,
                lng: point.lng,
                total_area: farm.total_area,
                bucket: aggregate::bucket_by_area(farm, state.breakpoints()),
                clickable,
                selected: clickable && selected.contains(&farm.farm_id),
            })
        })
        .collect();

    GeoView {
        total_farms: countries.iter().map(|country| country.farm_count).sum(),
        total_area: countries.iter().map(|country| country.total_area).sum(),
        countries,
        markers,
    }
}

impl Chart for GeoMap {
    fn kind(&self) -> ChartKind {
        ChartKind::GeoMap
    }

    fn update_vis(&mut self, state: &AppState) {
        self.view = Some(build(state));
    }

    fn view_json(&self) -> Result<Option<serde_json::Value>, serde_json::Error> {
        to_json(self.view.as_ref())
    }
}
