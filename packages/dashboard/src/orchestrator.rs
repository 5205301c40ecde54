//! Update orchestration.
//!
//! After a filter change the orchestrator looks the event up in a
//! [`SubscriptionTable`], recomputes the filtered state if the event asks for
//! it, redraws the immediate charts in order, and queues the deferred ones.
//! Deferred redraws only run when the caller drains the [`DeferredQueue`],
//! which is never before the immediate redraws of the same dispatch have
//! finished.

use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use farm_map_dashboard_models::{ChartKind, EventKind};
use serde::{Deserialize, Serialize};

use crate::charts::ChartRegistry;
use crate::state::AppState;

/// Delay before deferred redraws become due.
pub const DEFAULT_DEFER_DELAY: Duration = Duration::from_millis(500);

/// Charts to redraw for one event kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subscription {
    /// Whether the filtered state is recomputed first.
    pub recompute: bool,
    /// Charts redrawn synchronously, in order.
    pub immediate: Vec<ChartKind>,
    /// Charts queued for a later redraw, in order.
    pub deferred: Vec<ChartKind>,
}

/// Event kind to subscription mapping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriptionTable {
    entries: BTreeMap<EventKind, Subscription>,
}

impl Default for SubscriptionTable {
    /// Bar, map, and treemap redraw immediately after every filter change;
    /// the drill charts are deferred, and a drill chart never redraws
    /// because of its own drill event. Switching the bar mode only redraws
    /// the bar chart.
    fn default() -> Self {
        const IMMEDIATE: [ChartKind; 3] =
            [ChartKind::BarChart, ChartKind::GeoMap, ChartKind::Treemap];

        let filter = |deferred: &[ChartKind]| Subscription {
            recompute: true,
            immediate: IMMEDIATE.to_vec(),
            deferred: deferred.to_vec(),
        };
        let both = [ChartKind::BubbleChart, ChartKind::PieChart];

        let entries = BTreeMap::from([
            (EventKind::BarFilter, filter(&both)),
            (EventKind::GeoSelection, filter(&both)),
            (EventKind::TreemapFilter, filter(&both)),
            (EventKind::BubbleDrill, filter(&[ChartKind::PieChart])),
            (EventKind::PieDrill, filter(&[ChartKind::BubbleChart])),
            (
                EventKind::BarMode,
                Subscription {
                    recompute: false,
                    immediate: vec![ChartKind::BarChart],
                    deferred: Vec::new(),
                },
            ),
        ]);

        Self { entries }
    }
}

impl SubscriptionTable {
    /// A table with no subscriptions.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    /// The subscription for an event kind.
    #[must_use]
    pub fn get(&self, event: EventKind) -> Option<&Subscription> {
        self.entries.get(&event)
    }

    /// Replaces the subscription for an event kind.
    pub fn set(&mut self, event: EventKind, subscription: Subscription) -> Option<Subscription> {
        self.entries.insert(event, subscription)
    }
}

/// What happens to a pending redraw when the same chart is queued again.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeferredPolicy {
    /// Keep every queued redraw; each one runs.
    #[default]
    RunAll,
    /// Drop the pending redraw of that chart; only the newest runs.
    Coalesce,
}

/// A queued redraw.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeferredTask {
    /// Submission sequence number.
    pub seq: u64,
    /// Chart to redraw.
    pub chart: ChartKind,
    /// Earliest time the redraw may run.
    pub due: Instant,
}

/// Deferred redraws in submission order.
#[derive(Debug, Clone, Default)]
pub struct DeferredQueue {
    tasks: Vec<DeferredTask>,
    next_seq: u64,
    policy: DeferredPolicy,
}

impl DeferredQueue {
    /// An empty queue.
    #[must_use]
    pub const fn new(policy: DeferredPolicy) -> Self {
        Self {
            tasks: Vec::new(),
            next_seq: 0,
            policy,
        }
    }

    /// Queues a redraw and returns its sequence number.
    pub fn schedule(&mut self, chart: ChartKind, due: Instant) -> u64 {
        if self.policy == DeferredPolicy::Coalesce {
            self.cancel(chart);
        }
        let seq = self.next_seq;
        self.next_seq += 1;
        self.tasks.push(DeferredTask { seq, chart, due });
        seq
    }

    /// Drops every pending redraw of a chart. Returns how many were dropped.
    pub fn cancel(&mut self, chart: ChartKind) -> usize {
        let before = self.tasks.len();
        self.tasks.retain(|task| task.chart != chart);
        before - self.tasks.len()
    }

    /// Removes and returns the tasks due at `now`, in submission order.
    pub fn take_due(&mut self, now: Instant) -> Vec<DeferredTask> {
        let (due, pending) = std::mem::take(&mut self.tasks)
            .into_iter()
            .partition(|task| task.due <= now);
        self.tasks = pending;
        due
    }

    /// Removes and returns every task regardless of due time.
    pub fn take_all(&mut self) -> Vec<DeferredTask> {
        std::mem::take(&mut self.tasks)
    }

    /// Earliest due time among pending tasks.
    #[must_use]
    pub fn next_due(&self) -> Option<Instant> {
        self.tasks.iter().map(|task| task.due).min()
    }

    /// Pending tasks in submission order.
    #[must_use]
    pub fn pending(&self) -> &[DeferredTask] {
        &self.tasks
    }

    /// Number of pending tasks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// Whether nothing is pending.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

/// Orchestrator settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrchestratorConfig {
    /// Delay before deferred redraws become due.
    pub defer_delay: Duration,
    /// Queue policy.
    pub policy: DeferredPolicy,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            defer_delay: DEFAULT_DEFER_DELAY,
            policy: DeferredPolicy::default(),
        }
    }
}

/// Charts touched by one dispatch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dispatch {
    /// Whether the filtered state was recomputed.
    pub recomputed: bool,
    /// Charts redrawn synchronously, in call order.
    pub immediate: Vec<ChartKind>,
    /// Charts queued for later.
    pub deferred: Vec<ChartKind>,
}

/// Fans a filter change out to the charts.
#[derive(Debug, Clone)]
pub struct Orchestrator {
    table: SubscriptionTable,
    queue: DeferredQueue,
    defer_delay: Duration,
}

impl Default for Orchestrator {
    fn default() -> Self {
        Self::new(OrchestratorConfig::default(), SubscriptionTable::default())
    }
}

impl Orchestrator {
    /// Creates an orchestrator with an empty queue.
    #[must_use]
    pub const fn new(config: OrchestratorConfig, table: SubscriptionTable) -> Self {
        Self {
            table,
            queue: DeferredQueue::new(config.policy),
            defer_delay: config.defer_delay,
        }
    }

    /// The subscription table.
    #[must_use]
    pub const fn table(&self) -> &SubscriptionTable {
        &self.table
    }

    /// The deferred queue.
    #[must_use]
    pub const fn queue(&self) -> &DeferredQueue {
        &self.queue
    }

    /// Mutable access to the deferred queue, e.g. to cancel redraws.
    pub const fn queue_mut(&mut self) -> &mut DeferredQueue {
        &mut self.queue
    }

    /// Delay before deferred redraws become due.
    #[must_use]
    pub const fn defer_delay(&self) -> Duration {
        self.defer_delay
    }

    /// Propagates an event whose filter mutation has already been applied.
    ///
    /// Drill events reset the other chart's drill path before the
    /// recompute. Immediate charts are redrawn before this returns;
    /// deferred ones are due `defer_delay` after `now`.
    pub fn dispatch(
        &mut self,
        event: EventKind,
        state: &mut AppState,
        charts: &mut ChartRegistry,
        now: Instant,
    ) -> Dispatch {
        let Some(subscription) = self.table.get(event) else {
            log::warn!("No subscription for {event} events");
            return Dispatch::default();
        };

        let other_drill = match event {
            EventKind::BubbleDrill => Some(ChartKind::PieChart),
            EventKind::PieDrill => Some(ChartKind::BubbleChart),
            _ => None,
        };
        if let Some(view) = other_drill {
            // Both are drill views, so this cannot fail.
            if let Ok(true) = state.filters_mut().clear_drill(view) {
                log::debug!("Cleared {view} drill path");
            }
        }

        if subscription.recompute {
            state.recompute();
        }

        let immediate: Vec<ChartKind> = subscription
            .immediate
            .iter()
            .copied()
            .filter(|&kind| charts.update(kind, state))
            .collect();

        let due = now + self.defer_delay;
        let deferred = subscription.deferred.clone();
        for &chart in &deferred {
            self.queue.schedule(chart, due);
        }

        log::debug!("Dispatched {event}: immediate {immediate:?}, deferred {deferred:?}");

        Dispatch {
            recomputed: subscription.recompute,
            immediate,
            deferred,
        }
    }

    /// Runs the deferred redraws due at `now`, in submission order.
    pub fn run_due(
        &mut self,
        state: &AppState,
        charts: &mut ChartRegistry,
        now: Instant,
    ) -> Vec<ChartKind> {
        let tasks = self.queue.take_due(now);
        run_tasks(tasks, state, charts)
    }

    /// Runs every pending deferred redraw, due or not.
    pub fn flush(&mut self, state: &AppState, charts: &mut ChartRegistry) -> Vec<ChartKind> {
        let tasks = self.queue.take_all();
        run_tasks(tasks, state, charts)
    }
}

fn run_tasks(
    tasks: Vec<DeferredTask>,
    state: &AppState,
    charts: &mut ChartRegistry,
) -> Vec<ChartKind> {
    tasks
        .into_iter()
        .filter(|task| charts.update(task.chart, state))
        .map(|task| task.chart)
        .collect()
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::{Arc, Mutex};

    use farm_map_dashboard_models::ChartKind;

    use crate::charts::{Chart, ChartRegistry};
    use crate::state::AppState;

    /// Records every `update_vis` call into a shared log.
    pub struct Recorder {
        pub kind: ChartKind,
        pub calls: Arc<Mutex<Vec<ChartKind>>>,
    }

    impl Chart for Recorder {
        fn kind(&self) -> ChartKind {
            self.kind
        }

        fn update_vis(&mut self, _state: &AppState) {
            self.calls.lock().unwrap().push(self.kind);
        }
    }

    pub fn recording_registry() -> (ChartRegistry, Arc<Mutex<Vec<ChartKind>>>) {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let mut registry = ChartRegistry::new();
        for &kind in ChartKind::all() {
            registry.register(Box::new(Recorder {
                kind,
                calls: Arc::clone(&calls),
            }));
        }
        (registry, calls)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use farm_map_dashboard_models::{AreaBreakpoints, BubbleDrill, FilterKey, PieDrill};

    use super::test_support::recording_registry;
    use super::*;
    use crate::aggregate::test_support::sample_dataset;

    fn state() -> AppState {
        AppState::new(Arc::new(sample_dataset()), AreaBreakpoints::default())
    }

    #[test]
    fn immediate_charts_run_in_order_before_deferred() {
        let mut state = state();
        let (mut charts, calls) = recording_registry();
        let mut orchestrator = Orchestrator::default();
        let now = Instant::now();

        let dispatch = orchestrator.dispatch(EventKind::BarFilter, &mut state, &mut charts, now);
        assert!(dispatch.recomputed);
        assert_eq!(
            *calls.lock().unwrap(),
            vec![ChartKind::BarChart, ChartKind::GeoMap, ChartKind::Treemap]
        );
        assert_eq!(orchestrator.queue().len(), 2);

        assert!(orchestrator.run_due(&state, &mut charts, now).is_empty());
        let ran = orchestrator.run_due(&state, &mut charts, now + DEFAULT_DEFER_DELAY);
        assert_eq!(ran, vec![ChartKind::BubbleChart, ChartKind::PieChart]);
        assert_eq!(
            *calls.lock().unwrap(),
            vec![
                ChartKind::BarChart,
                ChartKind::GeoMap,
                ChartKind::Treemap,
                ChartKind::BubbleChart,
                ChartKind::PieChart,
            ]
        );
    }

    #[test]
    fn deferred_runs_keep_submission_order_without_cancellation() {
        let mut state = state();
        let (mut charts, calls) = recording_registry();
        let mut orchestrator = Orchestrator::default();
        let now = Instant::now();

        orchestrator.dispatch(EventKind::GeoSelection, &mut state, &mut charts, now);
        orchestrator.dispatch(EventKind::TreemapFilter, &mut state, &mut charts, now);
        calls.lock().unwrap().clear();

        let ran = orchestrator.flush(&state, &mut charts);
        assert_eq!(
            ran,
            vec![
                ChartKind::BubbleChart,
                ChartKind::PieChart,
                ChartKind::BubbleChart,
                ChartKind::PieChart,
            ]
        );
        assert!(orchestrator.queue().is_empty());
    }

    #[test]
    fn coalescing_keeps_only_latest_redraw() {
        let mut state = state();
        let (mut charts, _) = recording_registry();
        let config = OrchestratorConfig {
            defer_delay: Duration::ZERO,
            policy: DeferredPolicy::Coalesce,
        };
        let mut orchestrator = Orchestrator::new(config, SubscriptionTable::default());
        let now = Instant::now();

        orchestrator.dispatch(EventKind::BarFilter, &mut state, &mut charts, now);
        orchestrator.dispatch(EventKind::BubbleDrill, &mut state, &mut charts, now);
        let pending: Vec<_> = orchestrator
            .queue()
            .pending()
            .iter()
            .map(|task| (task.seq, task.chart))
            .collect();
        assert_eq!(
            pending,
            vec![(0, ChartKind::BubbleChart), (2, ChartKind::PieChart)]
        );
    }

    #[test]
    fn cancel_drops_pending_redraws() {
        let mut queue = DeferredQueue::default();
        let now = Instant::now();
        queue.schedule(ChartKind::PieChart, now);
        queue.schedule(ChartKind::BubbleChart, now);
        queue.schedule(ChartKind::PieChart, now);
        assert_eq!(queue.cancel(ChartKind::PieChart), 2);
        assert_eq!(queue.take_due(now).len(), 1);
        assert_eq!(queue.next_due(), None);
    }

    #[test]
    fn drill_events_exclude_originating_chart() {
        let mut state = state();
        let (mut charts, _) = recording_registry();
        let mut orchestrator = Orchestrator::default();
        let now = Instant::now();

        let dispatch =
            orchestrator.dispatch(EventKind::BubbleDrill, &mut state, &mut charts, now);
        assert_eq!(dispatch.deferred, vec![ChartKind::PieChart]);
        let dispatch = orchestrator.dispatch(EventKind::PieDrill, &mut state, &mut charts, now);
        assert_eq!(dispatch.deferred, vec![ChartKind::BubbleChart]);
    }

    #[test]
    fn drill_event_clears_other_drill_path() {
        let mut state = state();
        let (mut charts, _) = recording_registry();
        let mut orchestrator = Orchestrator::default();

        state.filters_mut().set_pie_drill(PieDrill::CropGroup {
            crop_group: "Root".to_string(),
        });
        orchestrator.dispatch(EventKind::BubbleDrill, &mut state, &mut charts, Instant::now());
        assert!(!state.filters().pie().is_active());
        assert_eq!(state.filtered().farms.len(), 3);
    }

    #[test]
    fn bar_mode_only_redraws_bar_chart() {
        let mut state = state();
        let (mut charts, calls) = recording_registry();
        let mut orchestrator = Orchestrator::default();

        state.filters_mut().set_bubble_drill(BubbleDrill::Certification {
            certification: "Organic".to_string(),
        });
        let dispatch =
            orchestrator.dispatch(EventKind::BarMode, &mut state, &mut charts, Instant::now());
        assert!(!dispatch.recomputed);
        assert_eq!(*calls.lock().unwrap(), vec![ChartKind::BarChart]);
        assert!(orchestrator.queue().is_empty());
        // Not recomputed, so the stale derivation is still the full set.
        assert_eq!(state.filtered().farms.len(), 3);
    }

    #[test]
    fn recompute_precedes_immediate_redraws() {
        let mut state = state();
        let mut charts = ChartRegistry::with_builtin_charts();
        let mut orchestrator = Orchestrator::default();

        state
            .filters_mut()
            .toggle(ChartKind::BarChart, FilterKey::UserCount(5))
            .unwrap();
        orchestrator.dispatch(EventKind::BarFilter, &mut state, &mut charts, Instant::now());

        let geo = charts.view_json(ChartKind::GeoMap).unwrap().unwrap();
        assert_eq!(geo["totalFarms"], 1);
        assert!(charts.view_json(ChartKind::PieChart).unwrap().is_none());
    }

    #[test]
    fn missing_subscription_does_nothing() {
        let mut state = state();
        let (mut charts, calls) = recording_registry();
        let mut orchestrator =
            Orchestrator::new(OrchestratorConfig::default(), SubscriptionTable::empty());
        let dispatch =
            orchestrator.dispatch(EventKind::BarFilter, &mut state, &mut charts, Instant::now());
        assert_eq!(dispatch, Dispatch::default());
        assert!(calls.lock().unwrap().is_empty());
    }
}
