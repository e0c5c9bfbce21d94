//! Passive HTTP Latency Probe - Userspace Daemon
//!
//! Loads the eBPF classifier, attaches it to a raw packet socket on the
//! tapped interface, consumes latency events until interrupted, and prints
//! a percentile report on shutdown.
//!
//! ## Usage
//!
//! ```bash
//! # Tap loopback traffic to/from port 8000 until Ctrl-C
//! sudo ./httplat --ebpf-object path/to/httplat.o
//!
//! # Tap a different interface and service port
//! sudo ./httplat --iface eth0 --port 8080 --ebpf-object path/to/httplat.o
//!
//! # Also write a machine-readable summary
//! sudo ./httplat --ebpf-object path/to/httplat.o --output summary.json
//! ```

use anyhow::Result;
use clap::Parser;
use httplat::{
    collector::LatencyCollector,
    events::EventConsumer,
    exporter::{JsonExporter, LatencySummary},
    loader::ProbeLoader,
    report, socket,
};
use log::{error, info};
use std::{path::PathBuf, sync::Arc};
use tokio::{
    signal,
    signal::unix::{signal as unix_signal, SignalKind},
    sync::{watch, Mutex},
};

/// Passive request/response latency probe for HTTP-like traffic
#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct Args {
    /// Network interface to tap
    #[clap(short, long, default_value = "lo")]
    iface: String,

    /// TCP port identifying the server side of observed connections
    #[clap(short, long, default_value_t = 8000)]
    port: u16,

    /// Write a JSON summary here in addition to the stdout report
    #[clap(short, long)]
    output: Option<PathBuf>,

    /// Path to eBPF object file (if not embedded)
    #[clap(long)]
    ebpf_object: Option<PathBuf>,

    /// Verbose logging
    #[clap(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    env_logger::Builder::from_default_env()
        .filter_level(if args.verbose {
            log::LevelFilter::Debug
        } else {
            log::LevelFilter::Info
        })
        .init();

    info!("Starting passive HTTP latency probe...");
    info!("   Interface: {}", args.iface);
    info!("   Service port: {}", args.port);

    // Fatal setup path: load, configure, tap, attach.
    let mut loader = ProbeLoader::load(args.ebpf_object.clone())?;
    loader.set_service_port(args.port)?;
    let sock = socket::open_raw_socket(&args.iface)?;
    loader.attach(&sock)?;
    let events = loader.take_events()?;

    let collector = Arc::new(Mutex::new(LatencyCollector::new()?));
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let consumer = EventConsumer::new(Arc::clone(&collector));
    let consumer_task =
        tokio::spawn(async move { consumer.run(events, shutdown_rx).await });

    info!("Collecting latency samples, press Ctrl-C to stop...");

    let mut sigterm = unix_signal(SignalKind::terminate())?;
    tokio::select! {
        _ = signal::ctrl_c() => {
            info!("Interrupted, shutting down...");
        }
        _ = sigterm.recv() => {
            info!("Terminated, shutting down...");
        }
    }

    // Interruption is a shutdown request, not an error; consumer failures
    // are logged and the report still prints.
    let _ = shutdown_tx.send(true);
    match consumer_task.await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => error!("event consumer failed: {e:#}"),
        Err(e) => error!("event consumer panicked: {e}"),
    }

    let collector = collector.lock().await;
    {
        let stdout = std::io::stdout();
        report::print_report(&collector, &mut stdout.lock())?;
    }

    if let Some(path) = args.output {
        let summary = LatencySummary::from_collector(&collector);
        JsonExporter::new(path.clone(), true).export(&summary)?;
        info!("Summary written to {:?}", path);
    }

    Ok(())
}
