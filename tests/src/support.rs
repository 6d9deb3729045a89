//! Harness helpers shared by the integration suites.

use service_runtime::{Runtime, RuntimeConfig};
use std::time::Duration;
use tokio::time::timeout;

/// Poll `check` until it holds, panicking after two seconds.
pub async fn eventually(check: impl Fn() -> bool) {
    timeout(Duration::from_secs(2), async {
        while !check() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("condition not reached in time");
}

/// Start a runtime with defaults.
pub async fn runtime() -> Runtime {
    runtime_with(RuntimeConfig::default()).await
}

/// Start a runtime with the given configuration.
pub async fn runtime_with(config: RuntimeConfig) -> Runtime {
    Runtime::start(config).await.expect("runtime starts")
}
