//! Stacked bar chart of farms per users-per-farm group and farm size.

use farm_map_dashboard_models::views::{BarRow, BarView, BucketLegend, UserCountLegend};
use farm_map_dashboard_models::{BarMode, ChartKind};

use super::{Chart, to_json};
use crate::aggregate;
use crate::state::AppState;

/// Bar chart adapter.
#[derive(Debug, Default)]
pub struct BarChart {
    view: Option<BarView>,
}

impl BarChart {
    /// The latest view.
    #[must_use]
    pub const fn view(&self) -> Option<&BarView> {
        self.view.as_ref()
    }
}

/// Builds the bar chart view over the selected farms.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn build(state: &AppState) -> BarView {
    let breakpoints = state.breakpoints();
    let filters = state.filters();
    let counts = &state.filtered().bucket_counts;

    let mut percentages = aggregate::percentage_by_user_count_group(counts, breakpoints);
    let rows: Vec<BarRow> = aggregate::count_by_user_count_group(counts, breakpoints)
        .into_iter()
        .map(|(number_of_users, counts)| BarRow {
            number_of_users,
            percentages: percentages.remove(&number_of_users).unwrap_or_default(),
            counts,
        })
        .collect();

    let y_max = match state.bar_mode() {
        BarMode::Percent => 100.0,
        BarMode::Count => rows
            .iter()
            .map(|row| row.counts.values().sum::<usize>())
            .max()
            .unwrap_or(0) as f64,
    };

    let buckets = breakpoints
        .buckets()
        .map(|bucket| BucketLegend {
            bucket,
            label: breakpoints
                .label(bucket)
                .unwrap_or_else(|| bucket.to_string()),
            included: filters.area().is_included(&bucket),
        })
        .collect();

    let user_counts = state
        .dataset()
        .user_counts()
        .iter()
        .map(|&number_of_users| UserCountLegend {
            number_of_users,
            included: filters.user_count().is_included(&number_of_users),
        })
        .collect();

    BarView {
        mode: state.bar_mode(),
        buckets,
        user_counts,
        rows,
        y_max,
    }
}

impl Chart for BarChart {
    fn kind(&self) -> ChartKind {
        ChartKind::BarChart
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

    use farm_map_dashboard_models::{AreaBreakpoints, AreaBucket};

    use super::*;
    use crate::aggregate::test_support::sample_dataset;

    fn state() -> AppState {
        AppState::new(Arc::new(sample_dataset()), AreaBreakpoints::default())
    }

    #[test]
    fn percent_rows_cover_every_bucket() {
        let view = build(&state());
        assert_eq!(view.mode, BarMode::Percent);
        assert!((view.y_max - 100.0).abs() < f64::EPSILON);

        let five = view.rows.iter().find(|row| row.number_of_users == 5).unwrap();
        assert!((five.percentages[&AreaBucket(10_000)] - 50.0).abs() < f64::EPSILON);
        assert!((five.percentages[&AreaBucket(0)] - 50.0).abs() < f64::EPSILON);
        assert!(five.percentages[&AreaBucket(100_000)].abs() < f64::EPSILON);
        assert_eq!(five.counts[&AreaBucket(100_000)], 0);
    }

    #[test]
    fn count_mode_scales_to_tallest_stack() {
        let mut state = state();
        state.set_bar_mode(BarMode::Count);
        let view = build(&state);
        assert!((view.y_max - 2.0).abs() < f64::EPSILON);
    }

    #[test]
    fn legends_reflect_filters() {
        let view = build(&state());
        assert_eq!(view.buckets.len(), 3);
        assert_eq!(view.buckets[0].bucket, AreaBucket(100_000));
        assert!(view.buckets.iter().all(|legend| legend.included));
        assert_eq!(
            view.user_counts
                .iter()
                .map(|legend| legend.number_of_users)
                .collect::<Vec<_>>(),
            vec![2, 5]
        );
    }

    #[test]
    fn view_json_is_empty_until_first_update() {
        let mut chart = BarChart::default();
        assert!(chart.view_json().unwrap().is_none());
        chart.update_vis(&state());
        let json = chart.view_json().unwrap().unwrap();
        assert_eq!(json["mode"], "percent");
        assert_eq!(json["yMax"], 100.0);
    }
}
