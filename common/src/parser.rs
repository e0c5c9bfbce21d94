//! Frame classification pipeline
//!
//! Parses Ethernet/IPv4/TCP headers out of a raw frame, sniffs the start of
//! the TCP payload for an HTTP request or status line, and decides which
//! direction the frame travels relative to the service port.
//!
//! Everything here is a pure, total function over the [`Frame`] accessor:
//! every load is explicitly bounded and every loop has a fixed length, so
//! the same code passes the BPF verifier in the kernel stage and runs
//! unchanged in host tests.

use crate::constants::*;

/// Bounded access to one raw frame plus its receive metadata.
///
/// Kernel side this wraps `bpf_skb_load_bytes`; host side it wraps a byte
/// slice. Reads past the end of the frame must fail, never wrap or fault.
pub trait Frame {
    /// Copies `dst.len()` bytes starting at `offset` out of the frame.
    /// Fails if any part of the range lies outside the frame.
    fn read_at(&self, offset: usize, dst: &mut [u8]) -> Result<(), ()>;

    /// The skb packet type; only [`PACKET_HOST`] frames are inspected.
    fn packet_type(&self) -> u32;

    fn read_u8(&self, offset: usize) -> Option<u8> {
        let mut buf = [0u8; 1];
        self.read_at(offset, &mut buf).ok()?;
        Some(buf[0])
    }

    fn read_u16_be(&self, offset: usize) -> Option<u16> {
        let mut buf = [0u8; 2];
        self.read_at(offset, &mut buf).ok()?;
        Some(u16::from_be_bytes(buf))
    }
}

/// Transient per-frame metadata produced by the header parser.
///
/// Lives only for the processing of a single frame.
#[derive(Clone, Copy, Debug)]
pub struct FrameContext {
    /// TCP source port (host byte order)
    pub src_port: u16,
    /// TCP destination port (host byte order)
    pub dst_port: u16,
    /// Offset of the TCP payload from the start of the frame
    pub payload_offset: usize,
    /// TCP payload length per the IP total length field
    pub payload_len: usize,
}

/// Classification outcome for one frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Verdict {
    /// Request-direction frame; `port` is the client-side port to correlate.
    Request { port: u16 },
    /// Response-direction frame; `port` is the client-side port to pair up.
    Response { port: u16 },
    /// Not eligible; no further processing.
    Pass,
}

/// Header parser: validates the frame down to the TCP payload.
///
/// Returns `None` for every ineligible frame: non-IPv4, fragmented, not
/// addressed to this host, undersized IP header, non-TCP, or a payload too
/// short for the sniffer. Rejection is a normal filter outcome, not an
/// error.
pub fn parse<F: Frame>(frame: &F) -> Option<FrameContext> {
    let ethertype = frame.read_u16_be(12)?;
    if ethertype != ETH_P_IP {
        return None;
    }

    // Fragmented payloads cannot be inspected byte-range-wise.
    let frag_off = frame.read_u16_be(ETH_HLEN + 6)?;
    if frag_off & (IP_MF | IP_OFFSET) != 0 {
        return None;
    }

    if frame.packet_type() != PACKET_HOST {
        return None;
    }

    // IPv4 header lengths are variable; low nibble of the first byte in
    // 32-bit words.
    let ip_hdr_len = usize::from(frame.read_u8(ETH_HLEN)? & 0x0f) * 4;
    if ip_hdr_len < IPV4_MIN_HDR_LEN {
        return None;
    }

    if frame.read_u8(ETH_HLEN + 9)? != IPPROTO_TCP {
        return None;
    }

    let total_len = usize::from(frame.read_u16_be(ETH_HLEN + 2)?);

    // TCP data offset: top nibble of the 13th TCP header byte, in words.
    let data_off = usize::from(frame.read_u8(ETH_HLEN + ip_hdr_len + 12)? >> 4) * 4;

    let payload_offset = ETH_HLEN + ip_hdr_len + data_off;
    let payload_len = total_len.checked_sub(ip_hdr_len + data_off)?;
    if payload_len < SNIFF_LEN {
        return None;
    }

    let src_port = frame.read_u16_be(ETH_HLEN + ip_hdr_len)?;
    let dst_port = frame.read_u16_be(ETH_HLEN + ip_hdr_len + 2)?;

    Some(FrameContext {
        src_port,
        dst_port,
        payload_offset,
        payload_len,
    })
}

/// Protocol sniffer: does this payload start like an HTTP request line or
/// status line?
///
/// A deliberate heuristic, not an HTTP parser. Methods other than the four
/// recognized ones are missed, and non-HTTP traffic starting with these
/// tokens is a false positive; both are accepted trade-offs.
pub fn looks_like_http(prefix: &[u8; SNIFF_LEN]) -> bool {
    prefix.starts_with(b"GET")
        || prefix.starts_with(b"POST")
        || prefix.starts_with(b"PUT")
        || prefix.starts_with(b"DELETE")
        || prefix.starts_with(b"HTTP")
}

/// Full classification of one frame against `service_port`.
///
/// A frame whose destination port is the service port is request-direction
/// (correlate on its source port); one whose source port is the service
/// port is response-direction (pair on its destination port). Frames
/// touching the service port on neither side pass through untouched.
pub fn classify<F: Frame>(frame: &F, service_port: u16) -> Verdict {
    let Some(ctx) = parse(frame) else {
        return Verdict::Pass;
    };

    let mut prefix = [0u8; SNIFF_LEN];
    if frame.read_at(ctx.payload_offset, &mut prefix).is_err() {
        return Verdict::Pass;
    }
    if !looks_like_http(&prefix) {
        return Verdict::Pass;
    }

    if ctx.dst_port == service_port {
        Verdict::Request { port: ctx.src_port }
    } else if ctx.src_port == service_port {
        Verdict::Response { port: ctx.dst_port }
    } else {
        Verdict::Pass
    }
}

/// Host-side [`Frame`] over a plain byte slice, used by tests and tools.
#[derive(Clone, Copy, Debug)]
pub struct SlicedFrame<'a> {
    bytes: &'a [u8],
    packet_type: u32,
}

impl<'a> SlicedFrame<'a> {
    pub fn new(bytes: &'a [u8], packet_type: u32) -> Self {
        Self { bytes, packet_type }
    }
}

impl Frame for SlicedFrame<'_> {
    fn read_at(&self, offset: usize, dst: &mut [u8]) -> Result<(), ()> {
        let end = offset.checked_add(dst.len()).ok_or(())?;
        let src = self.bytes.get(offset..end).ok_or(())?;
        dst.copy_from_slice(src);
        Ok(())
    }

    fn packet_type(&self) -> u32 {
        self.packet_type
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TCP_HDR_LEN: usize = 20;

    /// Builds a minimal Ethernet + IPv4 + TCP frame around `payload`.
    fn build_frame(src_port: u16, dst_port: u16, payload: &[u8]) -> Vec<u8> {
        let mut frame = vec![0u8; ETH_HLEN];
        frame[12..14].copy_from_slice(&ETH_P_IP.to_be_bytes());

        let total_len = (IPV4_MIN_HDR_LEN + TCP_HDR_LEN + payload.len()) as u16;
        let mut ip = [0u8; IPV4_MIN_HDR_LEN];
        ip[0] = 0x45; // version 4, ihl 5 words
        ip[2..4].copy_from_slice(&total_len.to_be_bytes());
        ip[9] = IPPROTO_TCP;
        frame.extend_from_slice(&ip);

        let mut tcp = [0u8; TCP_HDR_LEN];
        tcp[0..2].copy_from_slice(&src_port.to_be_bytes());
        tcp[2..4].copy_from_slice(&dst_port.to_be_bytes());
        tcp[12] = 5 << 4; // data offset 5 words
        frame.extend_from_slice(&tcp);

        frame.extend_from_slice(payload);
        frame
    }

    fn classify_host(bytes: &[u8]) -> Verdict {
        classify(&SlicedFrame::new(bytes, PACKET_HOST), DEFAULT_SERVICE_PORT)
    }

    #[test]
    fn request_frame_classified_by_source_port() {
        let frame = build_frame(5555, 8000, b"GET /index.html HTTP/1.1\r\n");
        assert_eq!(classify_host(&frame), Verdict::Request { port: 5555 });
    }

    #[test]
    fn response_frame_classified_by_destination_port() {
        let frame = build_frame(8000, 5555, b"HTTP/1.1 200 OK\r\n");
        assert_eq!(classify_host(&frame), Verdict::Response { port: 5555 });
    }

    #[test]
    fn all_recognized_methods_match() {
        for payload in [
            &b"GET /x HTTP/1.1"[..],
            b"POST /x HTTP/1.1",
            b"PUT /xy HTTP/1.1",
            b"DELETE / HTTP/1.1",
            b"HTTP/1.1 204 No Content",
        ] {
            let frame = build_frame(5555, 8000, payload);
            assert_eq!(classify_host(&frame), Verdict::Request { port: 5555 });
        }
    }

    #[test]
    fn unrecognized_method_passes() {
        let frame = build_frame(5555, 8000, b"OPTIONS * HTTP/1.1");
        assert_eq!(classify_host(&frame), Verdict::Pass);
    }

    #[test]
    fn frames_not_touching_service_port_pass() {
        let frame = build_frame(5555, 6666, b"GET /x HTTP/1.1");
        assert_eq!(classify_host(&frame), Verdict::Pass);
    }

    #[test]
    fn non_ipv4_ethertype_passes() {
        let mut frame = build_frame(5555, 8000, b"GET /x HTTP/1.1");
        frame[12..14].copy_from_slice(&0x86DDu16.to_be_bytes()); // IPv6
        assert_eq!(classify_host(&frame), Verdict::Pass);
    }

    #[test]
    fn fragmented_packet_passes() {
        // More-fragments flag
        let mut frame = build_frame(5555, 8000, b"GET /x HTTP/1.1");
        frame[ETH_HLEN + 6..ETH_HLEN + 8].copy_from_slice(&IP_MF.to_be_bytes());
        assert_eq!(classify_host(&frame), Verdict::Pass);

        // Nonzero fragment offset
        let mut frame = build_frame(5555, 8000, b"GET /x HTTP/1.1");
        frame[ETH_HLEN + 6..ETH_HLEN + 8].copy_from_slice(&0x0001u16.to_be_bytes());
        assert_eq!(classify_host(&frame), Verdict::Pass);
    }

    #[test]
    fn non_host_destined_frame_passes() {
        let frame = build_frame(5555, 8000, b"GET /x HTTP/1.1");
        // PACKET_OTHERHOST = 3
        let verdict = classify(&SlicedFrame::new(&frame, 3), DEFAULT_SERVICE_PORT);
        assert_eq!(verdict, Verdict::Pass);
    }

    #[test]
    fn undersized_ip_header_passes() {
        let mut frame = build_frame(5555, 8000, b"GET /x HTTP/1.1");
        frame[ETH_HLEN] = 0x44; // ihl 4 words = 16 bytes, below minimum
        assert_eq!(classify_host(&frame), Verdict::Pass);
    }

    #[test]
    fn non_tcp_protocol_passes() {
        let mut frame = build_frame(5555, 8000, b"GET /x HTTP/1.1");
        frame[ETH_HLEN + 9] = 17; // UDP
        assert_eq!(classify_host(&frame), Verdict::Pass);
    }

    #[test]
    fn short_payload_passes() {
        // Six bytes is one short of the sniff window, whatever it contains.
        let frame = build_frame(5555, 8000, b"GET /x");
        assert_eq!(classify_host(&frame), Verdict::Pass);
    }

    #[test]
    fn truncated_frame_passes() {
        // IP total length claims a payload the frame does not carry.
        let mut frame = build_frame(5555, 8000, b"GET /x HTTP/1.1");
        frame.truncate(ETH_HLEN + IPV4_MIN_HDR_LEN + TCP_HDR_LEN + 2);
        assert_eq!(classify_host(&frame), Verdict::Pass);
    }

    #[test]
    fn empty_frame_passes() {
        assert_eq!(classify_host(&[]), Verdict::Pass);
    }

    #[test]
    fn parse_reports_payload_geometry() {
        let frame = build_frame(5555, 8000, b"GET /x HTTP/1.1");
        let ctx = parse(&SlicedFrame::new(&frame, PACKET_HOST)).expect("eligible frame");
        assert_eq!(ctx.src_port, 5555);
        assert_eq!(ctx.dst_port, 8000);
        assert_eq!(ctx.payload_offset, ETH_HLEN + IPV4_MIN_HDR_LEN + TCP_HDR_LEN);
        assert_eq!(ctx.payload_len, b"GET /x HTTP/1.1".len());
    }

    #[test]
    fn service_port_on_destination_wins_when_both_match() {
        // Server talking to itself: destination side decides the direction.
        let frame = build_frame(8000, 8000, b"GET /x HTTP/1.1");
        assert_eq!(classify_host(&frame), Verdict::Request { port: 8000 });
    }
}
