//! Sunburst of crop groups, crops, and varieties.

use farm_map_dashboard_models::ChartKind;
use farm_map_dashboard_models::views::PieView;

use super::{Chart, to_json};
use crate::aggregate;
use crate::state::AppState;

/// Sunburst adapter.
#[derive(Debug, Default)]
pub struct PieChart {
    view: Option<PieView>,
}

impl PieChart {
    /// The latest view.
    #[must_use]
    pub const fn view(&self) -> Option<&PieView> {
        self.view.as_ref()
    }
}

/// Builds the crop hierarchy over the selected farms.
#[must_use]
pub fn build(state: &AppState) -> PieView {
    PieView {
        root: aggregate::crop_group_hierarchy(&state.filtered().selected_farms, state.dataset()),
    }
}

impl Chart for PieChart {
    fn kind(&self) -> ChartKind {
        ChartKind::PieChart
    }

    fn update_vis(&mut self, state: &AppState) {
        self.view = Some(build(state));
    }

    fn view_json(&self) -> Result<Option<serde_json::Value>, serde_json::Error> {
        to_json(self.view.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use farm_map_dashboard_models::{AreaBreakpoints, PieDrill};

    use super::*;
    use crate::aggregate::test_support::sample_dataset;

    #[test]
    fn follows_filtered_farms() {
        let mut state = AppState::new(Arc::new(sample_dataset()), AreaBreakpoints::default());
        state.filters_mut().set_pie_drill(PieDrill::CropGroup {
            crop_group: "Root".to_string(),
        });
        state.recompute();

        let view = build(&state);
        assert_eq!(view.root.value, 2);
        assert!(view.root.child("Fruit").is_none());
    }
}
