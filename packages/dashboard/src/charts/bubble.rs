//! Circle-pack chart of certifications.

use farm_map_dashboard_models::ChartKind;
use farm_map_dashboard_models::views::BubbleView;

use super::{Chart, to_json};
use crate::aggregate;
use crate::state::AppState;

/// Bubble chart adapter.
#[derive(Debug, Default)]
pub struct BubbleChart {
    view: Option<BubbleView>,
}

impl BubbleChart {
    /// The latest view.
    #[must_use]
    pub const fn view(&self) -> Option<&BubbleView> {
        self.view.as_ref()
    }
}

/// Builds the certification hierarchy over the selected farms.
#[must_use]
pub fn build(state: &AppState) -> BubbleView {
    BubbleView {
        root: aggregate::certification_hierarchy(&state.filtered().selected_farms, state.dataset()),
    }
}

impl Chart for BubbleChart {
    fn kind(&self) -> ChartKind {
        ChartKind::BubbleChart
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

    use farm_map_dashboard_models::AreaBreakpoints;

    use super::*;
    use crate::aggregate::test_support::sample_dataset;

    #[test]
    fn lists_certified_farms_only() {
        let state = AppState::new(Arc::new(sample_dataset()), AreaBreakpoints::default());
        let view = build(&state);
        assert_eq!(view.root.children.len(), 1);
        assert_eq!(view.root.leaf_count(), 3);
    }
}
