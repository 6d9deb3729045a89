//! # Social Fabric Runtime
//!
//! Binary entry point. Connects to the event broker (fatal after the retry
//! budget), wires the services, then runs until Ctrl+C.

use service_runtime::{telemetry, Runtime, RuntimeConfig};
use tracing::{error, info};

#[tokio::main]
async fn main() {
    telemetry::init("info");

    let config = RuntimeConfig::from_env();
    let runtime = match Runtime::start(config).await {
        Ok(runtime) => runtime,
        Err(err) => {
            error!(error = %err, "Startup failed");
            std::process::exit(1);
        }
    };

    info!("Runtime is up. Press Ctrl+C to stop.");
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!(error = %err, "Failed to listen for shutdown signal");
    }

    runtime.shutdown();
}
