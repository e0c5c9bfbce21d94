//! BPF map definitions for the latency probe
//!
//! Defines the maps shared between the classification stage and the
//! userspace daemon.

use aya_ebpf::{
    macros::map,
    maps::{Array, RingBuf},
};
use httplat_common::constants::{EVENT_RING_SIZE, PORT_TABLE_CAPACITY};

/// Per-port correlation slots.
///
/// Index: client-side TCP port. Value: nanosecond timestamp of the pending
/// request, 0 meaning unset. Pre-sized at load time; ports at or above the
/// capacity are never tracked.
#[map]
pub static PORT_TIMERS: Array<u64> = Array::with_max_entries(PORT_TABLE_CAPACITY, 0);

/// Bounded transport for latency events (kernel -> userspace).
///
/// Reservation failure when the ring is full drops the sample; the packet
/// path never waits for channel space.
#[map]
pub static EVENTS: RingBuf = RingBuf::with_byte_size(EVENT_RING_SIZE, 0);

/// Runtime configuration written by the loader before attach.
///
/// Index 0 holds the service port; 0 means "use the default".
#[map]
pub static CONFIG: Array<u32> = Array::with_max_entries(1, 0);
