//! HTTP Latency Probe - Userspace Library
//!
//! Provides reusable components for loading the probe, consuming latency
//! events from the kernel, and reporting percentile statistics.

pub mod collector;
pub mod events;
pub mod exporter;
pub mod loader;
pub mod report;
pub mod socket;

pub use collector::LatencyCollector;
pub use events::EventConsumer;
pub use exporter::{JsonExporter, LatencySummary};
pub use loader::ProbeLoader;
