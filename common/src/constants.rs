//! Shared constants for the latency probe
//!
//! These constants are used by both the kernel and userspace programs to
//! ensure consistency in sizing and behavior.

// ============================================================================
// Link / network layer
// ============================================================================

/// Ethernet header length in bytes
pub const ETH_HLEN: usize = 14;

/// IPv4 ethertype (host byte order)
pub const ETH_P_IP: u16 = 0x0800;

/// TCP protocol number (from linux/in.h)
pub const IPPROTO_TCP: u8 = 6;

/// Minimum IPv4 header length in bytes
pub const IPV4_MIN_HDR_LEN: usize = 20;

/// "More fragments" flag in the IPv4 frag_off field
pub const IP_MF: u16 = 0x2000;

/// Fragment offset mask in the IPv4 frag_off field
pub const IP_OFFSET: u16 = 0x1FFF;

/// skb packet type for frames addressed to this host (PACKET_HOST)
pub const PACKET_HOST: u32 = 0;

// ============================================================================
// Classification
// ============================================================================

/// Number of payload bytes inspected by the protocol sniffer.
///
/// Seven bytes is enough to hold the longest recognized method token
/// ("DELETE" plus one byte); shorter payloads are rejected outright, which
/// doubles as the bounds check for the sniff load.
pub const SNIFF_LEN: usize = 7;

/// Default TCP port identifying the server side of observed connections
pub const DEFAULT_SERVICE_PORT: u16 = 8000;

/// Index of the service port in the CONFIG map
pub const CONFIG_SERVICE_PORT: u32 = 0;

// ============================================================================
// BPF map sizes
// ============================================================================

/// Number of per-port correlation slots. Ports at or above this bound are
/// not tracked.
pub const PORT_TABLE_CAPACITY: u32 = 60_999;

/// Ring buffer capacity in bytes for latency events (kernel -> userspace)
pub const EVENT_RING_SIZE: u32 = 512 * 1024;

// ============================================================================
// Histogram configuration
// ============================================================================

/// Lowest latency the histogram can record (1 ns)
pub const LOWEST_TRACKABLE_NS: u64 = 1;

/// Highest latency the histogram can record (3.6 s)
pub const HIGHEST_TRACKABLE_NS: u64 = 3_600_000_000;

/// Significant decimal digits of histogram precision
pub const SIGNIFICANT_DIGITS: u8 = 3;
