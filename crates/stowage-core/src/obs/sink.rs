//! Metrics sink boundary.
//!
//! Update logic MUST NOT keep counters of its own.
//! All instrumentation flows through MetricsEvent and MetricsSink.
use serde::Serialize;
use std::cell::RefCell;

///
/// MetricsEvent
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum MetricsEvent {
    /// One `batch_commands` pass started building commands.
    PrepareStart { entries: u64 },
    CommandsBuilt {
        commands: u64,
        merged_entries: u64,
        dropped: u64,
    },
    GraphBuilt { vertices: u64, edges: u64 },
    CycleDetected,
    BatchEmitted { commands: u64 },
    BatchSplit { commands: u64 },
}

///
/// MetricsSink
///

pub trait MetricsSink {
    fn record(&self, event: MetricsEvent);
}

///
/// NoopMetricsSink
/// Default sink; drops every event.
///

#[derive(Clone, Copy, Debug, Default)]
pub struct NoopMetricsSink;

impl MetricsSink for NoopMetricsSink {
    fn record(&self, _: MetricsEvent) {}
}

///
/// EventCounters
///
/// Point-in-time snapshot of everything a `CounterMetricsSink` has seen.
///

#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize)]
pub struct EventCounters {
    pub prepare_calls: u64,
    pub entries_seen: u64,
    pub commands_built: u64,
    pub entries_merged: u64,
    pub commands_dropped: u64,
    pub graph_vertices: u64,
    pub graph_edges: u64,
    pub cycles_detected: u64,
    pub batches_emitted: u64,
    pub commands_emitted: u64,
    pub batches_split: u64,
    pub commands_split: u64,
}

///
/// CounterMetricsSink
///
/// Process-local sink accumulating saturating counters.
/// Not `Sync`; one sink per preparer.
///

#[derive(Debug, Default)]
pub struct CounterMetricsSink {
    counters: RefCell<EventCounters>,
}

impl CounterMetricsSink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn snapshot(&self) -> EventCounters {
        self.counters.borrow().clone()
    }

    pub fn reset(&self) {
        *self.counters.borrow_mut() = EventCounters::default();
    }
}

impl MetricsSink for CounterMetricsSink {
    fn record(&self, event: MetricsEvent) {
        let mut m = self.counters.borrow_mut();

        match event {
            MetricsEvent::PrepareStart { entries } => {
                m.prepare_calls = m.prepare_calls.saturating_add(1);
                m.entries_seen = m.entries_seen.saturating_add(entries);
            }

            MetricsEvent::CommandsBuilt {
                commands,
                merged_entries,
                dropped,
            } => {
                m.commands_built = m.commands_built.saturating_add(commands);
                m.entries_merged = m.entries_merged.saturating_add(merged_entries);
                m.commands_dropped = m.commands_dropped.saturating_add(dropped);
            }

            MetricsEvent::GraphBuilt { vertices, edges } => {
                m.graph_vertices = m.graph_vertices.saturating_add(vertices);
                m.graph_edges = m.graph_edges.saturating_add(edges);
            }

            MetricsEvent::CycleDetected => {
                m.cycles_detected = m.cycles_detected.saturating_add(1);
            }

            MetricsEvent::BatchEmitted { commands } => {
                m.batches_emitted = m.batches_emitted.saturating_add(1);
                m.commands_emitted = m.commands_emitted.saturating_add(commands);
            }

            MetricsEvent::BatchSplit { commands } => {
                m.batches_split = m.batches_split.saturating_add(1);
                m.commands_split = m.commands_split.saturating_add(commands);
            }
        }
    }
}
