//! Streaming latency aggregation
//!
//! Accumulates latency samples from the kernel into a bounded-memory
//! percentile histogram plus aggregate throughput counters. Single writer
//! (the event consumer); read by the reporter only after the consumer has
//! stopped.

use anyhow::{Context, Result};
use hdrhistogram::Histogram;
use httplat_common::constants::{HIGHEST_TRACKABLE_NS, LOWEST_TRACKABLE_NS, SIGNIFICANT_DIGITS};
use std::time::{Duration, Instant};

/// Aggregates latency samples for the lifetime of the process.
pub struct LatencyCollector {
    /// Log-bucketed histogram; memory depends on range and precision, not
    /// on the number of samples.
    histogram: Histogram<u64>,
    /// Total samples consumed
    events: u64,
    /// Consume time of the first sample
    first_event: Option<Instant>,
    /// Consume time of the most recent sample
    last_event: Option<Instant>,
}

impl LatencyCollector {
    pub fn new() -> Result<Self> {
        let histogram =
            Histogram::new_with_bounds(LOWEST_TRACKABLE_NS, HIGHEST_TRACKABLE_NS, SIGNIFICANT_DIGITS)
                .context("Failed to initialise the latency histogram")?;

        Ok(Self {
            histogram,
            events: 0,
            first_event: None,
            last_event: None,
        })
    }

    /// Records one latency sample in O(1).
    ///
    /// Values outside the trackable range are clamped to the nearest bound
    /// rather than rejected, so a pathological sample still shows up in the
    /// distribution tail instead of silently vanishing.
    pub fn record(&mut self, latency_ns: u64) {
        self.histogram.saturating_record(latency_ns);

        let now = Instant::now();
        self.first_event.get_or_insert(now);
        self.last_event = Some(now);
        self.events += 1;
    }

    /// Total samples consumed so far.
    pub fn events(&self) -> u64 {
        self.events
    }

    /// The percentile histogram.
    pub fn histogram(&self) -> &Histogram<u64> {
        &self.histogram
    }

    /// Wall-clock span between the first and last consumed sample, or
    /// `None` when no sample arrived.
    pub fn time_span(&self) -> Option<Duration> {
        match (self.first_event, self.last_event) {
            (Some(first), Some(last)) => Some(last.duration_since(first)),
            _ => None,
        }
    }
}
