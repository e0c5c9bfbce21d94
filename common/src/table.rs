//! Port correlation slots
//!
//! The correlation table is a fixed array of per-port timestamp slots: the
//! kernel stage records the send timestamp when it sees a request and takes
//! it back when the matching response arrives. The backing storage is a BPF
//! array map in the kernel, so this module operates on individual
//! [`AtomicU64`] slot views rather than owning the array itself.
//!
//! Classification can run concurrently on multiple CPUs, so slot updates
//! use atomic store/swap; a plain read-modify-write could lose a pending
//! request between `record_request` and `take_response` on the same port.

use core::sync::atomic::{AtomicU64, Ordering};

/// Slot value meaning "no pending request".
pub const UNSET: u64 = 0;

/// Maps a port number to its slot index, rejecting ports beyond the table
/// capacity. Out-of-range ports are simply not tracked.
pub fn slot_index(port: u16, capacity: u32) -> Option<u32> {
    let index = u32::from(port);
    (index < capacity).then_some(index)
}

/// Records a request-direction timestamp for a port.
///
/// Unconditionally overwrites any pending timestamp: a second request on
/// the same port before its response wins (no queueing).
pub fn record_request(slot: &AtomicU64, timestamp_ns: u64) {
    slot.store(timestamp_ns, Ordering::Release);
}

/// Consumes the pending request timestamp for a port and returns the
/// elapsed latency.
///
/// Returns `None` for orphan responses (no pending request) and for clock
/// regressions. The slot is reset to unset either way; the swap makes the
/// take atomic with respect to a concurrent `record_request`.
pub fn take_response(slot: &AtomicU64, timestamp_ns: u64) -> Option<u64> {
    let pending = slot.swap(UNSET, Ordering::AcqRel);
    if pending == UNSET {
        return None;
    }
    timestamp_ns.checked_sub(pending)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::PORT_TABLE_CAPACITY;
    use std::sync::Arc;

    #[test]
    fn pairing_returns_exact_delta_and_resets_slot() {
        let slot = AtomicU64::new(UNSET);
        record_request(&slot, 1_000);
        assert_eq!(take_response(&slot, 2_500), Some(1_500));
        assert_eq!(slot.load(Ordering::Relaxed), UNSET);
    }

    #[test]
    fn orphan_response_yields_nothing() {
        let slot = AtomicU64::new(UNSET);
        assert_eq!(take_response(&slot, 2_500), None);
        // Still unset afterwards
        assert_eq!(slot.load(Ordering::Relaxed), UNSET);
    }

    #[test]
    fn second_request_overwrites_pending_timestamp() {
        let slot = AtomicU64::new(UNSET);
        record_request(&slot, 1_000);
        record_request(&slot, 4_000);
        assert_eq!(take_response(&slot, 5_000), Some(1_000));
    }

    #[test]
    fn clock_regression_drops_the_sample() {
        let slot = AtomicU64::new(UNSET);
        record_request(&slot, 5_000);
        assert_eq!(take_response(&slot, 4_000), None);
        assert_eq!(slot.load(Ordering::Relaxed), UNSET);
    }

    #[test]
    fn slot_index_respects_table_capacity() {
        assert_eq!(slot_index(0, PORT_TABLE_CAPACITY), Some(0));
        assert_eq!(slot_index(8000, PORT_TABLE_CAPACITY), Some(8000));
        assert_eq!(
            slot_index((PORT_TABLE_CAPACITY - 1) as u16, PORT_TABLE_CAPACITY),
            Some(PORT_TABLE_CAPACITY - 1)
        );
        assert_eq!(slot_index(PORT_TABLE_CAPACITY as u16, PORT_TABLE_CAPACITY), None);
        assert_eq!(slot_index(u16::MAX, PORT_TABLE_CAPACITY), None);
    }

    #[test]
    fn concurrent_record_and_take_never_corrupt_the_slot() {
        // Hammer one slot from request and response threads with timestamps
        // drawn from disjoint, ordered ranges. Every take must observe
        // either "unset" or a timestamp some recorder actually stored.
        const OPS: u64 = 10_000;
        let slot = Arc::new(AtomicU64::new(UNSET));

        let recorder = {
            let slot = Arc::clone(&slot);
            std::thread::spawn(move || {
                for ts in 1..=OPS {
                    record_request(&slot, ts);
                }
            })
        };

        let taker = {
            let slot = Arc::clone(&slot);
            std::thread::spawn(move || {
                let now = OPS + 1;
                for _ in 0..OPS {
                    if let Some(delta) = take_response(&slot, now) {
                        // Delta must correspond to a recorded timestamp.
                        assert!(delta >= 1 && delta <= OPS, "bogus delta {delta}");
                    }
                }
            })
        };

        recorder.join().unwrap();
        taker.join().unwrap();

        // The slot is still coherent after the contention.
        record_request(&slot, 100);
        assert_eq!(take_response(&slot, 250), Some(150));
    }
}
