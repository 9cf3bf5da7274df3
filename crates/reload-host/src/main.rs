//! Reload host entry point.
//!
//! ## Startup Sequence
//!
//! 1. Install the tracing subscriber (`RUST_LOG`, `SKIN_RELOAD_LOG_FORMAT=json`)
//! 2. Load configuration (file, then environment)
//! 3. Build the network runtime and the Ctrl+C watcher
//! 4. Seed the player table and start the reload listener
//! 5. Run the frame loop on the main thread until shutdown

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{Context, Result};
use reload_host::{FrameScheduler, HostConfig, LoadoutRefresher, PlayerTable};
use skin_reload::ReloadListener;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

const LOG_FORMAT_ENV: &str = "SKIN_RELOAD_LOG_FORMAT";

fn init_tracing() -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .context("Invalid log filter")?;

    let json = std::env::var(LOG_FORMAT_ENV).is_ok_and(|format| format == "json");
    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .with_thread_ids(true);

    let installed = if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    installed.map_err(|e| anyhow::anyhow!(e)).context("Failed to install tracing subscriber")
}

fn main() -> Result<()> {
    init_tracing()?;

    let config = HostConfig::load().context("Failed to load host configuration")?;

    let network = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .thread_name("skin-reload-net")
        .enable_all()
        .build()
        .context("Failed to build network runtime")?;

    let shutdown = Arc::new(AtomicBool::new(false));
    {
        let shutdown = Arc::clone(&shutdown);
        network.spawn(async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => info!("Received shutdown signal"),
                Err(e) => warn!(error = %e, "Ctrl+C handler unavailable; stopping"),
            }
            shutdown.store(true, Ordering::Release);
        });
    }

    let players = PlayerTable::seeded(&config.sessions);
    let mut frames = FrameScheduler::new(config.tick_interval());

    let mut listener = ReloadListener::new(config.reload.clone(), network.handle().clone())
        .context("Invalid reload listener configuration")?;
    if let Err(e) = listener.start(
        &mut frames,
        players.clone(),
        LoadoutRefresher::new(players.clone()),
    ) {
        // Fatal to the feature only; the host keeps ticking.
        error!(error = %e, "Skin reload disabled");
    }

    info!(
        tick_rate = config.tick_rate,
        players = players.len(),
        "Host is running. Press Ctrl+C to stop."
    );
    frames.run_until(&shutdown);

    listener.stop();
    network.shutdown_timeout(config.shutdown_grace);

    info!(frames = frames.frames(), "Shutdown complete");
    Ok(())
}
