//! Socket filter program body
//!
//! Bridges the shared classification pipeline onto the BPF skb accessors
//! and drives the correlation slots and the event ring buffer.

use aya_ebpf::{helpers::bpf_ktime_get_boot_ns, programs::SkBuffContext};
use core::sync::atomic::AtomicU64;
use httplat_common::{
    classify,
    constants::{CONFIG_SERVICE_PORT, DEFAULT_SERVICE_PORT, PORT_TABLE_CAPACITY},
    table, Frame, LatencyEvent, Verdict,
};

use crate::maps::{CONFIG, EVENTS, PORT_TIMERS};

/// [`Frame`] over the skb: every read goes through bpf_skb_load_bytes, so
/// the verifier sees a statically bounded load for each access.
struct SkbFrame<'a> {
    ctx: &'a SkBuffContext,
}

impl Frame for SkbFrame<'_> {
    fn read_at(&self, offset: usize, dst: &mut [u8]) -> Result<(), ()> {
        match self.ctx.skb.load_bytes(offset, dst) {
            Ok(len) if len == dst.len() => Ok(()),
            _ => Err(()),
        }
    }

    fn packet_type(&self) -> u32 {
        unsafe { (*self.ctx.skb.skb).pkt_type }
    }
}

/// Service port, as configured by the loader (0 in the map means unset).
#[inline(always)]
fn service_port() -> u16 {
    match CONFIG.get(CONFIG_SERVICE_PORT) {
        Some(&port) if port != 0 => port as u16,
        _ => DEFAULT_SERVICE_PORT,
    }
}

/// Atomic view of the correlation slot for `port`, or `None` when the port
/// is beyond the table capacity.
///
/// Array map values are 8-byte aligned, so reinterpreting the slot as an
/// AtomicU64 is sound; the atomic ops keep per-port updates safe when
/// packets for the same port are classified on two CPUs at once.
#[inline(always)]
fn port_slot(port: u16) -> Option<&'static AtomicU64> {
    let index = table::slot_index(port, PORT_TABLE_CAPACITY)?;
    let ptr = PORT_TIMERS.get_ptr_mut(index)?;
    Some(unsafe { &*(ptr as *const AtomicU64) })
}

pub fn try_http_latency(ctx: &SkBuffContext) -> Result<i64, i64> {
    let timestamp_ns = unsafe { bpf_ktime_get_boot_ns() };

    let frame = SkbFrame { ctx };
    match classify(&frame, service_port()) {
        Verdict::Pass => Ok(0),
        Verdict::Request { port } => {
            if let Some(slot) = port_slot(port) {
                table::record_request(slot, timestamp_ns);
            }
            Ok(i64::from(ctx.skb.len()))
        }
        Verdict::Response { port } => {
            if let Some(slot) = port_slot(port) {
                if let Some(latency_ns) = table::take_response(slot, timestamp_ns) {
                    // Ring full -> sample dropped, the packet path never waits.
                    if let Some(mut entry) = EVENTS.reserve::<LatencyEvent>(0) {
                        entry.write(LatencyEvent { latency_ns });
                        entry.submit(0);
                    }
                }
            }
            Ok(i64::from(ctx.skb.len()))
        }
    }
}
