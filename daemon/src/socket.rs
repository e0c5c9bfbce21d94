//! Raw packet socket setup
//!
//! The classification stage attaches to a PF_PACKET socket bound to the
//! tapped interface; the daemon never reads from this socket itself.

use anyhow::{bail, Context, Result};
use std::ffi::CString;
use std::io;
use std::mem;
use std::os::fd::{AsRawFd, FromRawFd, OwnedFd};

const ETH_P_ALL: u16 = libc::ETH_P_ALL as u16;

/// Opens a non-blocking raw packet socket bound to `interface`.
///
/// Fails fast when the interface does not exist or the process lacks
/// CAP_NET_RAW; both are fatal setup errors per the probe's error model.
pub fn open_raw_socket(interface: &str) -> Result<OwnedFd> {
    let ifname = CString::new(interface).context("interface name contains a NUL byte")?;

    let ifindex = unsafe { libc::if_nametoindex(ifname.as_ptr()) };
    if ifindex == 0 {
        bail!("interface '{interface}' not found");
    }

    let fd = unsafe {
        libc::socket(
            libc::PF_PACKET,
            libc::SOCK_RAW | libc::SOCK_NONBLOCK | libc::SOCK_CLOEXEC,
            i32::from(ETH_P_ALL.to_be()),
        )
    };
    if fd < 0 {
        return Err(io::Error::last_os_error()).context("failed to create raw packet socket");
    }
    let sock = unsafe { OwnedFd::from_raw_fd(fd) };

    let mut sll: libc::sockaddr_ll = unsafe { mem::zeroed() };
    sll.sll_family = libc::AF_PACKET as libc::sa_family_t;
    sll.sll_ifindex = ifindex as i32;
    sll.sll_protocol = ETH_P_ALL.to_be();

    let rc = unsafe {
        libc::bind(
            sock.as_raw_fd(),
            &sll as *const libc::sockaddr_ll as *const libc::sockaddr,
            mem::size_of::<libc::sockaddr_ll>() as libc::socklen_t,
        )
    };
    if rc < 0 {
        return Err(io::Error::last_os_error())
            .with_context(|| format!("failed to bind raw socket to '{interface}'"));
    }

    Ok(sock)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_interface_is_a_setup_error() {
        let err = open_raw_socket("httplat-no-such-if").unwrap_err();
        assert!(err.to_string().contains("not found"));
    }

    #[test]
    fn embedded_nul_is_rejected() {
        assert!(open_raw_socket("lo\0x").is_err());
    }
}
