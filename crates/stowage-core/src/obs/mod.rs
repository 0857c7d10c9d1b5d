//! Observability: metrics events and sink abstractions for the update
//! pipeline.
//!
//! Structured logs go through `tracing` at the call sites; this module only
//! carries counters.

mod sink;


pub use sink::{CounterMetricsSink, EventCounters, MetricsEvent, MetricsSink, NoopMetricsSink};
