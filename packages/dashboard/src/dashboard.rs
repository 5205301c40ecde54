//! The dashboard facade: one state, its charts, and the orchestrator.

use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use farm_map_dashboard_models::views::FilteredSummary;
use farm_map_dashboard_models::{
    AreaBreakpoints, ChartKind, DrillUpdate, EventKind, FilterState, Interaction,
};
use farm_map_dataset::Dataset;
use serde::{Deserialize, Serialize};

use crate::DashboardError;
use crate::charts::{Chart, ChartRegistry};
use crate::interactions;
use crate::orchestrator::{Dispatch, Orchestrator, OrchestratorConfig, SubscriptionTable};
use crate::state::AppState;

/// Dashboard settings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DashboardConfig {
    /// Farm-size breakpoints.
    pub breakpoints: AreaBreakpoints,
    /// Deferred redraw settings.
    pub orchestrator: OrchestratorConfig,
}

/// Result of handling one interaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Outcome {
    /// Event category of the interaction.
    pub event: EventKind,
    /// Whether the interaction changed anything.
    pub changed: bool,
    /// Outcome of a drill path request.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub drill: Option<DrillUpdate>,
    /// Charts redrawn before returning, in order.
    pub immediate: Vec<ChartKind>,
    /// Charts queued for a deferred redraw.
    pub deferred: Vec<ChartKind>,
    /// The filtered state after the interaction.
    pub summary: FilteredSummary,
}

/// Linked charts over one dataset.
#[derive(Debug)]
pub struct Dashboard {
    state: AppState,
    charts: ChartRegistry,
    orchestrator: Orchestrator,
}

impl Dashboard {
    /// Creates a dashboard with the built-in charts and renders them once.
    #[must_use]
    pub fn new(dataset: Arc<Dataset>, config: DashboardConfig) -> Self {
        Self::with_charts(
            dataset,
            config,
            ChartRegistry::with_builtin_charts(),
            SubscriptionTable::default(),
        )
    }

    /// Creates a dashboard with custom charts and subscriptions and renders
    /// every chart once.
    #[must_use]
    pub fn with_charts(
        dataset: Arc<Dataset>,
        config: DashboardConfig,
        mut charts: ChartRegistry,
        table: SubscriptionTable,
    ) -> Self {
        let state = AppState::new(dataset, config.breakpoints);
        let rendered = charts.update_all(&state);
        log::debug!("Initial render: {rendered:?}");

        Self {
            state,
            charts,
            orchestrator: Orchestrator::new(config.orchestrator, table),
        }
    }

    /// Loads the dataset from `dir` and builds a dashboard over it.
    ///
    /// # Errors
    ///
    /// Returns [`DashboardError::Dataset`] if the data cannot be loaded.
    pub fn load(dir: &Path, config: DashboardConfig) -> Result<Self, DashboardError> {
        let dataset = farm_map_dataset::load_from_dir(dir)?;
        Ok(Self::new(Arc::new(dataset), config))
    }

    /// Applies an interaction and propagates it to the charts.
    ///
    /// Interactions that change nothing (a blocked drill, a click on a
    /// hidden farm) are not propagated.
    ///
    /// # Errors
    ///
    /// Returns [`DashboardError::Filter`] if the interaction addresses the
    /// filter store inconsistently.
    pub fn handle(
        &mut self,
        interaction: &Interaction,
        now: Instant,
    ) -> Result<Outcome, DashboardError> {
        let event = interaction.event_kind();
        let applied = interactions::apply(interaction, &mut self.state)?;

        let dispatch = if applied.changed {
            self.orchestrator
                .dispatch(event, &mut self.state, &mut self.charts, now)
        } else {
            log::debug!("{event} interaction changed nothing");
            Dispatch::default()
        };

        Ok(Outcome {
            event,
            changed: applied.changed,
            drill: applied.drill,
            immediate: dispatch.immediate,
            deferred: dispatch.deferred,
            summary: self.state.filtered().summary(),
        })
    }

    /// Runs deferred redraws due at `now`.
    pub fn run_due(&mut self, now: Instant) -> Vec<ChartKind> {
        self.orchestrator.run_due(&self.state, &mut self.charts, now)
    }

    /// Runs every pending deferred redraw.
    pub fn flush_deferred(&mut self) -> Vec<ChartKind> {
        self.orchestrator.flush(&self.state, &mut self.charts)
    }

    /// Drops pending deferred redraws of a chart.
    pub fn cancel_deferred(&mut self, chart: ChartKind) -> usize {
        self.orchestrator.queue_mut().cancel(chart)
    }

    /// Earliest due time of a pending deferred redraw.
    #[must_use]
    pub fn next_due(&self) -> Option<Instant> {
        self.orchestrator.queue().next_due()
    }

    /// Delay before deferred redraws become due.
    #[must_use]
    pub const fn defer_delay(&self) -> Duration {
        self.orchestrator.defer_delay()
    }

    /// Registers (or replaces) a chart and renders it.
    pub fn register_chart(&mut self, mut chart: Box<dyn Chart>) {
        chart.update_vis(&self.state);
        self.charts.register(chart);
    }

    /// The latest view of a chart as JSON.
    ///
    /// # Errors
    ///
    /// * [`DashboardError::UnknownChart`] if the chart is not registered
    /// * [`DashboardError::Json`] if the view cannot be serialized
    pub fn chart_view(&self, kind: ChartKind) -> Result<Option<serde_json::Value>, DashboardError> {
        self.charts.view_json(kind)
    }

    /// Shared state.
    #[must_use]
    pub const fn state(&self) -> &AppState {
        &self.state
    }

    /// Current filters.
    #[must_use]
    pub const fn filters(&self) -> &FilterState {
        self.state.filters()
    }

    /// Summary of the filtered state.
    #[must_use]
    pub fn summary(&self) -> FilteredSummary {
        self.state.filtered().summary()
    }
}
