//! Chart adapters.
//!
//! A chart is anything that can re-derive its view from the shared
//! [`AppState`]. The built-in adapters compute the view models a frontend
//! renders; other implementations (test probes, alternative renderers) can
//! be registered in their place.

pub mod bar;
pub mod bubble;
pub mod geo;
pub mod pie;
pub mod treemap;

use std::collections::BTreeMap;

use farm_map_dashboard_models::ChartKind;
use serde::Serialize;

use crate::DashboardError;
use crate::state::AppState;

pub use bar::BarChart;
pub use bubble::BubbleChart;
pub use geo::GeoMap;
pub use pie::PieChart;
pub use treemap::Treemap;

/// Update contract every linked chart implements.
pub trait Chart: Send {
    /// Which chart this is.
    fn kind(&self) -> ChartKind;

    /// Re-derives the chart's view from the current state. Always a full
    /// rebuild.
    fn update_vis(&mut self, state: &AppState);

    /// The latest view as JSON, or `None` before the first update.
    ///
    /// # Errors
    ///
    /// Returns an error if the view cannot be serialized.
    fn view_json(&self) -> Result<Option<serde_json::Value>, serde_json::Error> {
        Ok(None)
    }
}

pub(crate) fn to_json<T: Serialize>(
    view: Option<&T>,
) -> Result<Option<serde_json::Value>, serde_json::Error> {
    view.map(serde_json::to_value).transpose()
}

/// The charts a dashboard drives, keyed by kind.
#[derive(Default)]
pub struct ChartRegistry {
    charts: BTreeMap<ChartKind, Box<dyn Chart>>,
}

impl std::fmt::Debug for ChartRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_set().entries(self.charts.keys()).finish()
    }
}

impl ChartRegistry {
    /// An empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding the five built-in adapters.
    #[must_use]
    pub fn with_builtin_charts() -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(BarChart::default()));
        registry.register(Box::new(GeoMap::default()));
        registry.register(Box::new(Treemap::default()));
        registry.register(Box::new(BubbleChart::default()));
        registry.register(Box::new(PieChart::default()));
        registry
    }

    /// Registers a chart under its kind, returning the one it replaced.
    pub fn register(&mut self, chart: Box<dyn Chart>) -> Option<Box<dyn Chart>> {
        self.charts.insert(chart.kind(), chart)
    }

    /// Whether a chart of this kind is registered.
    #[must_use]
    pub fn contains(&self, kind: ChartKind) -> bool {
        self.charts.contains_key(&kind)
    }

    /// Registered kinds.
    pub fn kinds(&self) -> impl Iterator<Item = ChartKind> + '_ {
        self.charts.keys().copied()
    }

    /// Runs one chart's `update_vis`. Returns `false` if no such chart is
    /// registered.
    pub fn update(&mut self, kind: ChartKind, state: &AppState) -> bool {
        match self.charts.get_mut(&kind) {
            Some(chart) => {
                chart.update_vis(state);
                true
            }
            None => {
                log::debug!("No {kind} chart registered, skipping update");
                false
            }
        }
    }

    /// Updates every registered chart in [`ChartKind::all`] order.
    pub fn update_all(&mut self, state: &AppState) -> Vec<ChartKind> {
        ChartKind::all()
            .iter()
            .copied()
            .filter(|&kind| self.update(kind, state))
            .collect()
    }

    /// The latest view of a chart as JSON.
    ///
    /// # Errors
    ///
    /// * [`DashboardError::UnknownChart`] if the chart is not registered
    /// * [`DashboardError::Json`] if the view cannot be serialized
    pub fn view_json(&self, kind: ChartKind) -> Result<Option<serde_json::Value>, DashboardError> {
        let chart = self
            .charts
            .get(&kind)
            .ok_or(DashboardError::UnknownChart(kind))?;
        Ok(chart.view_json()?)
    }
}
