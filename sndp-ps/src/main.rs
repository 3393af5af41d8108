//! Profile Scheduler (sndp-ps) - Main entry point
//!
//! Headless service applying sound profiles on their schedules: alarm
//! registry, trigger handler, schedule restore and the REST control
//! surface.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use sndp_common::db::settings;
use sndp_common::events::EventBus;
use sndp_common::{config, db, params};
use sndp_ps::alarm::AlarmService;
use sndp_ps::api;
use sndp_ps::handler::TriggerHandler;
use sndp_ps::mixer::{Mixer, SoftMixer};
use sndp_ps::scheduler::ProfileScheduler;

/// Command-line arguments for sndp-ps
#[derive(Parser, Debug)]
#[command(name = "sndp-ps")]
#[command(about = "Profile Scheduler service for SNDP")]
#[command(version)]
struct Args {
    /// Port to listen on
    #[arg(short, long, default_value = "5750", env = "SNDP_PS_PORT")]
    port: u16,

    /// Data folder containing the profile database
    #[arg(short, long, env = "SNDP_DATA")]
    data_folder: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sndp_ps=debug,sndp_common=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Parse command-line arguments
    let args = Args::parse();

    info!("Starting SNDP Profile Scheduler on port {}", args.port);

    let data_folder = config::resolve_data_folder(
        args.data_folder.as_deref().and_then(|p| p.to_str()),
        "SNDP_DATA",
    )
    .context("Failed to resolve data folder")?;
    info!("Data folder: {}", data_folder.display());

    let db = db::init_database(&config::db_path(&data_folder))
        .await
        .context("Failed to initialize database")?;

    // Load the default-profile slot before any alarm can fire.
    params::init_from_db(&db)
        .await
        .context("Failed to load global parameters")?;

    let capacity = settings::get_event_bus_capacity(&db)
        .await
        .context("Failed to load event bus capacity")?;
    let bus = EventBus::new(capacity);

    let (alarms, alarm_rx) = AlarmService::new();
    alarms.set_exact_capability(
        settings::get_exact_alarms_enabled(&db)
            .await
            .context("Failed to load exact alarm capability")?,
    );

    let mixer = Arc::new(SoftMixer::new());
    let scheduler = Arc::new(ProfileScheduler::new(
        db.clone(),
        Arc::clone(&alarms),
        bus.clone(),
    ));

    // The trigger handler owns the signal channel for the life of the
    // process.
    TriggerHandler::new(
        db.clone(),
        Arc::clone(&mixer) as Arc<dyn Mixer>,
        Arc::clone(&scheduler),
        bus.clone(),
    )
    .spawn(alarm_rx);

    // Alarm registrations don't survive restarts; replay the active ones.
    let restored = scheduler
        .restore_schedules()
        .await
        .context("Failed to restore schedules")?;
    info!("Scheduler initialized ({} schedule(s) restored)", restored);

    // Build the application router
    let app_state = api::AppState {
        db,
        scheduler,
        mixer,
        bus,
        port: args.port,
    };
    let app = api::create_router(app_state);

    let addr = SocketAddr::from(([0, 0, 0, 0], args.port));
    info!("Starting HTTP server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
