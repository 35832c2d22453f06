// Module declarations for the application's core components
pub mod channels;    // Inter-component communication channels
pub mod config;      // Configuration management
pub mod control;     // Export limit decision logic
pub mod coordinator; // Control loop orchestration
pub mod error;       // Error handling and types
pub mod filter;      // Export signal smoothing
pub mod options;     // Command line options parsing
pub mod prelude;     // Common imports and types
pub mod sma;         // SMA energy meter telegram reception
pub mod solaredge;   // SolarEdge Modbus TCP register access
pub mod utils;       // Utility functions

// Get the package version from Cargo.toml
const CARGO_PKG_VERSION: &str = env!("CARGO_PKG_VERSION");

use crate::prelude::*;
use crate::sma::meter::Meter;

/// Main application entry point
///
/// Starts the meter receiver and the control loop, then waits for the
/// shutdown signal and stops both in order.
pub async fn app(mut shutdown_rx: broadcast::Receiver<()>, config: Config) -> Result<()> {
    info!("export-limiter {} starting", CARGO_PKG_VERSION);
    config.log_summary();

    let channels = Channels::new();

    let coordinator = Coordinator::new(config.clone(), channels.clone());
    let coordinator_clone = coordinator.clone();
    let coordinator_handle = tokio::spawn(async move {
        if let Err(e) = coordinator_clone.start().await {
            error!("Coordinator task failed: {}", e);
        }
    });

    let meter = Meter::new(config.clone(), channels.clone());
    let meter_clone = meter.clone();
    let meter_handle = tokio::spawn(async move {
        if let Err(e) = meter_clone.start().await {
            error!("Meter task failed: {}", e);
        }
    });

    info!("Waiting for shutdown signal...");
    let _ = shutdown_rx.recv().await;

    info!("Shutdown signal received, stopping components...");
    meter.stop();
    coordinator.stop();

    let (meter_result, coordinator_result) = futures::join!(meter_handle, coordinator_handle);
    if let Err(e) = meter_result {
        error!("Error waiting for meter task: {}", e);
    }
    if let Err(e) = coordinator_result {
        error!("Error waiting for coordinator task: {}", e);
    }

    if let Ok(stats) = coordinator.shared_stats.lock() {
        stats.print_summary();
    }

    info!("Application shutdown complete");
    Ok(())
}
