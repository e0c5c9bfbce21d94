//! HTTP Latency Probe - Kernel Space Program
//!
//! Socket filter that passively classifies raw frames on the tapped
//! interface, pairs HTTP requests with their responses by client port, and
//! streams the measured latency deltas to userspace through a ring buffer.
//!
//! ## Architecture
//!
//! ```text
//! request frame  -> record timestamp in PORT_TIMERS slot
//!                   |
//!                   v
//! response frame -> take timestamp, compute delta, submit to EVENTS ring
//!                   |
//!                   v
//! Userspace      -> drain ring, feed streaming histogram, report
//! ```
//!
//! ## Usage
//!
//! This program must be compiled for the bpfel-unknown-none target:
//!
//! ```bash
//! cargo build --release --target=bpfel-unknown-none
//! ```
//!
//! The compiled bytecode is then loaded by the userspace daemon and
//! attached to a PF_PACKET socket bound to the tapped interface.

#![no_std]
#![no_main]

use aya_ebpf::{macros::socket_filter, programs::SkBuffContext};

mod filter;
mod maps;

/// Classify one raw frame. Runs once per arriving packet on the tapped
/// socket; never blocks and does only constant-bounded work.
#[socket_filter]
pub fn http_latency(ctx: SkBuffContext) -> i64 {
    match filter::try_http_latency(&ctx) {
        Ok(ret) => ret,
        Err(_) => 0,
    }
}

#[cfg(not(test))]
#[panic_handler]
fn panic(_info: &core::panic::PanicInfo) -> ! {
    // eBPF programs cannot panic - this should never be reached
    loop {}
}
