//! Shutdown reporting
//!
//! Prints the percentile distribution and aggregate throughput once, when
//! the probe stops. Values are recorded in nanoseconds and reported in
//! milliseconds.

use crate::collector::LatencyCollector;
use std::io::{self, Write};

const NS_PER_MS: f64 = 1_000_000.0;

/// Quantile ticks per half-distance for the distribution table; matches
/// the classic hdr_percentiles_print granularity of 5.
const QUANTILE_TICKS: u32 = 5;

/// Named percentiles printed below the table.
const NAMED_PERCENTILES: [(&str, f64); 5] = [
    ("50.0", 0.50),
    ("90.0", 0.90),
    ("99.0", 0.99),
    ("99.9", 0.999),
    ("99.99", 0.9999),
];

/// Writes the full shutdown report.
pub fn print_report(collector: &LatencyCollector, out: &mut impl Write) -> io::Result<()> {
    let histogram = collector.histogram();

    writeln!(out)?;
    writeln!(out, "Latency distribution (ms):")?;
    writeln!(out)?;
    writeln!(
        out,
        "{:>12} {:>12} {:>12} {:>16}",
        "Value", "Percentile", "TotalCount", "1/(1-Percentile)"
    )?;

    let mut total_count = 0u64;
    for v in histogram.iter_quantiles(QUANTILE_TICKS) {
        total_count += v.count_since_last_iteration();
        let quantile = v.quantile_iterated_to();
        let value_ms = v.value_iterated_to() as f64 / NS_PER_MS;
        if quantile < 1.0 {
            writeln!(
                out,
                "{:>12.3} {:>12.6} {:>12} {:>16.2}",
                value_ms,
                quantile,
                total_count,
                1.0 / (1.0 - quantile)
            )?;
        } else {
            writeln!(
                out,
                "{:>12.3} {:>12.6} {:>12} {:>16}",
                value_ms, quantile, total_count, "inf"
            )?;
        }
    }

    writeln!(out)?;
    for (label, quantile) in NAMED_PERCENTILES {
        writeln!(
            out,
            "{:>5}th percentile: {:.6} ms",
            label,
            histogram.value_at_quantile(quantile) as f64 / NS_PER_MS
        )?;
    }
    writeln!(out)?;

    match collector.time_span() {
        Some(span) if !span.is_zero() => {
            let secs = span.as_secs_f64();
            writeln!(out, "{} requests in {:.6}s", collector.events(), secs)?;
            writeln!(
                out,
                "Avg throughput: {:.3} req/sec",
                collector.events() as f64 / secs
            )?;
        }
        Some(_) => {
            // One sample, or all samples within a single clock reading; a
            // rate over a zero span is undefined, not infinite.
            writeln!(
                out,
                "{} requests (time span too short to compute throughput)",
                collector.events()
            )?;
        }
        None => {
            writeln!(out, "no data: no request/response pairs were observed")?;
        }
    }

    Ok(())
}
