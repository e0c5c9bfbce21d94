//! eBPF program loader
//!
//! Handles loading the probe object, configuring the service port, and
//! attaching the socket filter to the raw packet socket.

use anyhow::{Context, Result};
use aya::{
    maps::{Array, MapData, RingBuf},
    programs::SocketFilter,
    Ebpf,
};
use httplat_common::constants::CONFIG_SERVICE_PORT;
use log::info;
use std::os::fd::AsFd;
use std::path::PathBuf;

/// eBPF program loader and manager
pub struct ProbeLoader {
    ebpf: Ebpf,
}

impl ProbeLoader {
    /// Load the probe from a file or from embedded bytecode.
    pub fn load(path: Option<PathBuf>) -> Result<Self> {
        info!("Loading eBPF program...");

        let ebpf = if let Some(obj_path) = path {
            info!("Loading eBPF object from: {:?}", obj_path);
            let data = std::fs::read(&obj_path)
                .with_context(|| format!("Failed to read eBPF object file: {:?}", obj_path))?;
            Ebpf::load(&data).context("Failed to load eBPF program")?
        } else {
            #[cfg(feature = "embedded")]
            {
                info!("Loading embedded eBPF program...");
                let data = include_bytes!(concat!(
                    env!("CARGO_MANIFEST_DIR"),
                    "/../ebpf/target/bpfel-unknown-none/release/httplat"
                ));
                Ebpf::load(data).context("Failed to load embedded eBPF program")?
            }
            #[cfg(not(feature = "embedded"))]
            {
                anyhow::bail!(
                    "No eBPF object file provided. Use --ebpf-object or compile with 'embedded' feature"
                );
            }
        };

        info!("eBPF program loaded successfully");

        Ok(Self { ebpf })
    }

    /// Writes the service port into the CONFIG map. Must happen before the
    /// filter is attached so no frame is classified against a stale port.
    pub fn set_service_port(&mut self, port: u16) -> Result<()> {
        let mut config: Array<_, u32> = Array::try_from(
            self.ebpf
                .map_mut("CONFIG")
                .context("CONFIG map not found in eBPF object")?,
        )
        .context("CONFIG map has an unexpected type")?;

        config
            .set(CONFIG_SERVICE_PORT, u32::from(port), 0)
            .context("Failed to configure the service port")?;

        info!("  ✓ Service port set to {}", port);
        Ok(())
    }

    /// Attaches the classifier to the raw packet socket.
    pub fn attach(&mut self, sock: &impl AsFd) -> Result<()> {
        let program: &mut SocketFilter = self
            .ebpf
            .program_mut("http_latency")
            .context("http_latency program not found in eBPF object")?
            .try_into()
            .context("Failed to get http_latency as SocketFilter")?;
        program.load().context("Failed to load http_latency")?;
        program
            .attach(sock)
            .context("Failed to attach http_latency to the raw socket")?;
        info!("  ✓ Attached http_latency socket filter");
        Ok(())
    }

    /// Takes ownership of the EVENTS ring buffer for the consumer loop.
    pub fn take_events(&mut self) -> Result<RingBuf<MapData>> {
        let map = self
            .ebpf
            .take_map("EVENTS")
            .context("EVENTS map not found in eBPF object")?;

        RingBuf::try_from(map).context("Failed to create ring buffer reader from EVENTS map")
    }
}
