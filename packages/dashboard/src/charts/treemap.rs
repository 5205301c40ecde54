//! Treemap of location area by type.

use farm_map_dashboard_models::ChartKind;
use farm_map_dashboard_models::views::TreemapView;

use super::{Chart, to_json};
use crate::aggregate;
use crate::state::AppState;

/// Treemap adapter.
#[derive(Debug, Default)]
pub struct Treemap {
    view: Option<TreemapView>,
}

impl Treemap {
    /// The latest view.
    #[must_use]
    pub const fn view(&self) -> Option<&TreemapView> {
        self.view.as_ref()
    }
}

/// Builds the treemap over the selected farms.
#[must_use]
pub fn build(state: &AppState) -> TreemapView {
    let areas = aggregate::location_area_by_farm_and_type(
        &state.filtered().selected_farms,
        state.dataset(),
    );
    TreemapView {
        selected_types: state.filters().location_types().iter().copied().collect(),
        groups: aggregate::treemap_groups(&areas),
    }
}

impl Chart for Treemap {
    fn kind(&self) -> ChartKind {
        ChartKind::Treemap
    }

    fn update_vis(&mut self, state: &AppState) {
        self.view = Some(build(state));
    }

    fn view_json(&self) -> Result<Option<serde_json::Value>, serde_json::Error> {
        to_json(self.view.as_ref())
    }
}
