//! Metrics export
//!
//! Optional JSON summary written next to the stdout report, for scripts
//! that post-process probe runs.

use crate::collector::LatencyCollector;
use anyhow::{Context, Result};
use serde::Serialize;
use std::{fs::File, io::Write, path::PathBuf};

const NS_PER_MS: f64 = 1_000_000.0;

/// Named latency percentiles in milliseconds.
#[derive(Serialize, Debug, Default)]
pub struct PercentilesMs {
    pub p50: f64,
    pub p90: f64,
    pub p99: f64,
    pub p999: f64,
    pub p9999: f64,
}

/// Aggregated run summary for export.
#[derive(Serialize, Debug)]
pub struct LatencySummary {
    /// ISO 8601 timestamp when the summary was generated
    pub timestamp: String,
    /// Total request/response pairs observed
    pub events: u64,
    /// Span between the first and last consumed sample, in seconds
    pub elapsed_seconds: f64,
    /// Average pairs per second; 0 when the span is empty
    pub throughput_rps: f64,
    /// Latency percentiles
    pub percentiles_ms: PercentilesMs,
}

impl LatencySummary {
    pub fn from_collector(collector: &LatencyCollector) -> Self {
        let histogram = collector.histogram();
        let at = |q: f64| histogram.value_at_quantile(q) as f64 / NS_PER_MS;

        let elapsed_seconds = collector
            .time_span()
            .map(|span| span.as_secs_f64())
            .unwrap_or(0.0);
        let throughput_rps = if elapsed_seconds > 0.0 {
            collector.events() as f64 / elapsed_seconds
        } else {
            0.0
        };

        Self {
            timestamp: chrono::Utc::now().to_rfc3339(),
            events: collector.events(),
            elapsed_seconds,
            throughput_rps,
            percentiles_ms: PercentilesMs {
                p50: at(0.50),
                p90: at(0.90),
                p99: at(0.99),
                p999: at(0.999),
                p9999: at(0.9999),
            },
        }
    }
}

/// JSON exporter
pub struct JsonExporter {
    output_path: PathBuf,
    pretty: bool,
}

impl JsonExporter {
    pub fn new(output_path: PathBuf, pretty: bool) -> Self {
        Self {
            output_path,
            pretty,
        }
    }

    pub fn export(&self, summary: &LatencySummary) -> Result<()> {
        let json = if self.pretty {
            serde_json::to_string_pretty(summary)?
        } else {
            serde_json::to_string(summary)?
        };

        let mut file = File::create(&self.output_path)
            .with_context(|| format!("Failed to create output file: {:?}", self.output_path))?;
        file.write_all(json.as_bytes())
            .with_context(|| format!("Failed to write to output file: {:?}", self.output_path))?;

        Ok(())
    }
}
