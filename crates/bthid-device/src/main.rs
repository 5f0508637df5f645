//! bthid-device entry point.
//!
//! ```text
//! main()
//!  └─ load_config()             -- TOML file, then CLI/env overrides
//!  └─ tracing_subscriber init   -- RUST_LOG wins over the configured level
//!  └─ signal task               -- SIGINT/SIGTERM cancel the shared token
//!  └─ bridge::serve()
//!       ├─ BluezAdvertiser      -- adapter setup + SDP profile
//!       ├─ l2cap::bind_pair()   -- control (0x11) and interrupt (0x13) PSMs
//!       └─ TransportSession     -- one host at a time until cancelled
//! ```
//!
//! Exit status is 0 after a signal-driven shutdown and non-zero if any setup
//! step fails.

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use bthid_device::infrastructure::storage::config::{load_config, AppConfig};

// ── CLI argument definitions ──────────────────────────────────────────────────

/// Presents this machine's keyboards and mice to a remote host as a
/// Bluetooth HID keyboard + mouse.
///
/// Command-line values override the configuration file.
#[derive(Debug, Parser)]
#[command(name = "bthid-device", version)]
struct Cli {
    /// Configuration file.  Defaults to `$XDG_CONFIG_HOME/bthid/config.toml`.
    #[arg(long, env = "BTHID_CONFIG")]
    config: Option<PathBuf>,

    /// Bluetooth adapter to use, e.g. `hci0`.
    #[arg(long, env = "BTHID_ADAPTER")]
    adapter: Option<String>,

    /// Motion report period in microseconds.
    #[arg(long, env = "BTHID_REPORT_INTERVAL_US")]
    report_interval_us: Option<u64>,

    /// Log level (`error`, `warn`, `info`, `debug`, `trace`).
    #[arg(long, env = "BTHID_LOG_LEVEL")]
    log_level: Option<String>,
}

impl Cli {
    /// Applies every flag that was given on top of `config`.
    fn apply_to(&self, config: &mut AppConfig) {
        if let Some(adapter) = &self.adapter {
            config.bluetooth.adapter = Some(adapter.clone());
        }
        if let Some(interval) = self.report_interval_us {
            config.scheduler.report_interval_us = interval;
        }
        if let Some(level) = &self.log_level {
            config.logging.log_level = level.clone();
        }
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

/// A current-thread runtime keeps the whole session on one control path.
#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let mut config = load_config(cli.config.as_deref()).context("loading configuration")?;
    cli.apply_to(&mut config);
    config.validate().context("validating configuration")?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.logging.log_level)),
        )
        .init();

    info!(version = env!("CARGO_PKG_VERSION"), "bthid-device starting");

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        wait_for_shutdown_signal().await;
        info!("shutdown signal received");
        trigger.cancel();
    });

    run(config, cancel).await?;

    info!("bthid-device stopped");
    Ok(())
}

#[cfg(target_os = "linux")]
async fn run(config: AppConfig, cancel: CancellationToken) -> anyhow::Result<()> {
    use std::time::Duration;

    use bthid_device::application::bridge::serve;
    use bthid_device::infrastructure::bluetooth::advertiser::BluezAdvertiser;
    use bthid_device::infrastructure::bluetooth::l2cap;
    use bthid_device::infrastructure::input_source::linux::{EvdevInputSource, EvdevSettings};
    use bthid_device::infrastructure::input_source::selector::NameHeuristic;

    let advertiser =
        BluezAdvertiser::connect(config.bluetooth.adapter.clone(), config.bluetooth.discoverable)
            .await
            .context("connecting to bluetoothd")?;

    let input = EvdevInputSource::new(
        EvdevSettings {
            input_dir: config.input.input_dir.clone(),
            devices: config.input.devices.clone(),
            grab_delay: Duration::from_millis(config.input.grab_delay_ms),
        },
        NameHeuristic::new(&config.input.keyboard_match, &config.input.mouse_match),
    );

    let record = config.service_record();
    let (control_psm, interrupt_psm) = (record.control_psm, record.interrupt_psm);
    serve(
        &advertiser,
        &record,
        || l2cap::bind_pair(control_psm, interrupt_psm),
        input,
        config.session_config(),
        cancel,
    )
    .await?;
    Ok(())
}

#[cfg(not(target_os = "linux"))]
async fn run(_config: AppConfig, _cancel: CancellationToken) -> anyhow::Result<()> {
    anyhow::bail!("bthid-device needs Linux (BlueZ and evdev)")
}

#[cfg(unix)]
async fn wait_for_shutdown_signal() {
    use tokio::signal::unix::{signal, SignalKind};

    let mut terminate = match signal(SignalKind::terminate()) {
        Ok(stream) => stream,
        Err(e) => {
            error!("failed to listen for SIGTERM: {e}");
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!("failed to listen for Ctrl+C signal: {e}");
                std::future::pending::<()>().await;
            }
            return;
        }
    };
    tokio::select! {
        result = tokio::signal::ctrl_c() => {
            if let Err(e) = result {
                error!("failed to listen for Ctrl+C signal: {e}");
                terminate.recv().await;
            }
        }
        _ = terminate.recv() => {}
    }
}

#[cfg(not(unix))]
async fn wait_for_shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("failed to listen for Ctrl+C signal: {e}");
        std::future::pending::<()>().await;
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
