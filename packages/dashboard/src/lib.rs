#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Cross-filter engine for the farm survey dashboard.
//!
//! An [`Interaction`](farm_map_dashboard_models::Interaction) mutates the
//! shared [`FilterState`](farm_map_dashboard_models::FilterState), the
//! [`Orchestrator`] recomputes the [`FilteredState`], and every subscribed
//! [`Chart`] re-derives its view: bar chart, map, and treemap immediately,
//! the drill charts through a deferred queue.

pub mod aggregate;
pub mod charts;
pub mod dashboard;
pub mod derive;
pub mod interactions;
pub mod orchestrator;
pub mod state;

use farm_map_dashboard_models::{ChartKind, FilterError};
use farm_map_dataset::DatasetError;
use thiserror::Error;

pub use charts::{Chart, ChartRegistry};
pub use dashboard::{Dashboard, DashboardConfig, Outcome};
pub use derive::{FilteredState, recompute};
pub use orchestrator::{
    DeferredPolicy, DeferredQueue, Orchestrator, OrchestratorConfig, Subscription,
    SubscriptionTable,
};
pub use state::AppState;

/// Errors from the dashboard engine.
#[derive(Debug, Error)]
pub enum DashboardError {
    /// No chart of this kind is registered.
    #[error("Unknown chart: {0}")]
    UnknownChart(ChartKind),

    /// A filter mutation was rejected.
    #[error(transparent)]
    Filter(#[from] FilterError),

    /// The dataset could not be loaded.
    #[error(transparent)]
    Dataset(#[from] DatasetError),

    /// A chart view could not be serialized.
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}
