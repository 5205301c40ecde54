//! Shared dashboard state.

use std::sync::Arc;

use farm_map_dashboard_models::{AreaBreakpoints, BarMode, FilterState};
use farm_map_dataset::Dataset;

use crate::derive::{self, FilteredState};

/// Everything a chart reads when it redraws.
///
/// The filtered state is only ever written by [`AppState::recompute`], so
/// it is always the derivation of the current filters.
#[derive(Debug, Clone)]
pub struct AppState {
    dataset: Arc<Dataset>,
    breakpoints: AreaBreakpoints,
    filters: FilterState,
    filtered: FilteredState,
    bar_mode: BarMode,
}

impl AppState {
    /// Creates the initial state with every filter at its default.
    #[must_use]
    pub fn new(dataset: Arc<Dataset>, breakpoints: AreaBreakpoints) -> Self {
        let filters = FilterState::new(&breakpoints, dataset.user_counts().iter().copied());
        let filtered = derive::recompute(&dataset, &filters, &breakpoints);
        Self {
            dataset,
            breakpoints,
            filters,
            filtered,
            bar_mode: BarMode::default(),
        }
    }

    /// The loaded survey data.
    #[must_use]
    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    /// Farm-size breakpoints.
    #[must_use]
    pub const fn breakpoints(&self) -> &AreaBreakpoints {
        &self.breakpoints
    }

    /// Current filters.
    #[must_use]
    pub const fn filters(&self) -> &FilterState {
        &self.filters
    }

    /// Mutable filters. Call [`Self::recompute`] afterwards.
    pub const fn filters_mut(&mut self) -> &mut FilterState {
        &mut self.filters
    }

    /// The derived filtered state.
    #[must_use]
    pub const fn filtered(&self) -> &FilteredState {
        &self.filtered
    }

    /// Bar chart scaling mode.
    #[must_use]
    pub const fn bar_mode(&self) -> BarMode {
        self.bar_mode
    }

    /// Changes the bar chart scaling mode. Returns whether it changed.
    pub fn set_bar_mode(&mut self, mode: BarMode) -> bool {
        let changed = self.bar_mode != mode;
        self.bar_mode = mode;
        changed
    }

    /// Rederives the filtered state from the current filters.
    pub fn recompute(&mut self) {
        self.filtered = derive::recompute(&self.dataset, &self.filters, &self.breakpoints);
    }
}
