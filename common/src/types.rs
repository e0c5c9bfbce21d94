//! Shared data structures between kernel and userspace
//!
//! These structures must be repr(C) to ensure consistent memory layout
//! between eBPF programs and userspace code.

/// One completed request/response pairing, sent from the kernel
/// classification stage to userspace through the event ring buffer.
///
/// The record carries only the computed delta; correlation state never
/// leaves the kernel.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LatencyEvent {
    /// Measured request -> response latency (nanoseconds)
    pub latency_ns: u64,
}

// Compile-time layout check: the ring buffer record is exactly one u64.
const _: () = assert!(core::mem::size_of::<LatencyEvent>() == 8);

// Implement Aya's Pod trait for userspace usage
#[cfg(feature = "userspace")]
mod userspace_impls {
    use super::*;

    // Pod trait implementation for reading from the ring buffer in userspace
    unsafe impl aya::Pod for LatencyEvent {}
}
