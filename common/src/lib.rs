//! Shared logic for the passive HTTP latency probe
//!
//! This crate holds everything the kernel classification stage and the
//! userspace daemon must agree on: wire-compatible event types, sizing
//! constants, the frame classification pipeline, and the per-port
//! correlation slot operations.
//!
//! The classification pipeline is written as pure functions over a bounded
//! [`parser::Frame`] accessor so the exact same code runs inside the BPF
//! sandbox and on the host under test.

#![cfg_attr(not(test), no_std)]

pub mod constants;
pub mod parser;
pub mod table;
pub mod types;

// Re-export commonly used items
pub use constants::*;
pub use parser::{classify, Frame, FrameContext, SlicedFrame, Verdict};
pub use types::LatencyEvent;
