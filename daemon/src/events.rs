//! Latency event consumption
//!
//! Drains the kernel ring buffer into the collector. Single consumer task;
//! wakes on ring readability and exits when the shutdown flag flips.

use crate::collector::LatencyCollector;
use anyhow::{Context, Result};
use aya::maps::{MapData, RingBuf};
use httplat_common::LatencyEvent;
use log::{debug, warn};
use std::{mem, os::fd::AsRawFd, ptr, sync::Arc};
use tokio::{
    io::unix::AsyncFd,
    sync::{watch, Mutex},
};

/// Decodes one ring record into a latency event.
///
/// Returns `None` for short records; malformed input drops the sample
/// rather than stalling or crashing the consumer.
pub fn decode_event(bytes: &[u8]) -> Option<LatencyEvent> {
    if bytes.len() < mem::size_of::<LatencyEvent>() {
        return None;
    }
    // repr(C) with a single u64 field; read_unaligned covers whatever
    // alignment the ring hands us.
    Some(unsafe { ptr::read_unaligned(bytes.as_ptr().cast::<LatencyEvent>()) })
}

/// Event consumer that owns the userspace end of the ring buffer.
pub struct EventConsumer {
    collector: Arc<Mutex<LatencyCollector>>,
}

impl EventConsumer {
    pub fn new(collector: Arc<Mutex<LatencyCollector>>) -> Self {
        Self { collector }
    }

    /// Runs until shutdown is signalled.
    ///
    /// A shutdown signal is a normal exit; any other polling failure is
    /// returned so the caller can log it, and the shutdown report still
    /// follows.
    pub async fn run(
        &self,
        mut events: RingBuf<MapData>,
        mut shutdown: watch::Receiver<bool>,
    ) -> Result<()> {
        let async_fd = AsyncFd::new(events.as_raw_fd())
            .context("Failed to register the ring buffer with the reactor")?;

        loop {
            tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        debug!("event consumer stopping");
                        break;
                    }
                }
                guard = async_fd.readable() => {
                    let mut guard = guard.context("Error waiting for ring buffer readability")?;

                    while let Some(record) = events.next() {
                        match decode_event(&record) {
                            Some(event) => {
                                debug!("latency sample: {} ns", event.latency_ns);
                                self.collector.lock().await.record(event.latency_ns);
                            }
                            None => {
                                warn!("dropping malformed {}-byte ring record", record.len());
                            }
                        }
                    }

                    guard.clear_ready();
                }
            }
        }

        // Final drain: samples already committed to the ring belong in the
        // report even when the signal races their arrival.
        while let Some(record) = events.next() {
            if let Some(event) = decode_event(&record) {
                self.collector.lock().await.record(event.latency_ns);
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn well_formed_record_round_trips() {
        let bytes = 1_500_000u64.to_ne_bytes();
        let event = decode_event(&bytes).unwrap();
        assert_eq!(event.latency_ns, 1_500_000);
    }

    #[test]
    fn short_record_is_rejected() {
        assert!(decode_event(&[]).is_none());
        assert!(decode_event(&[0u8; 7]).is_none());
    }

    #[test]
    fn oversized_record_uses_leading_bytes() {
        let mut bytes = [0u8; 12];
        bytes[..8].copy_from_slice(&42u64.to_ne_bytes());
        assert_eq!(decode_event(&bytes).unwrap().latency_ns, 42);
    }
}
