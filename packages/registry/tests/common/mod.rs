use std::time::Duration;

use registry::{HttpRegistryClient, RegistryConfig};
use sync_core::{Backoff, RetryStrategy};
use wiremock::MockServer;

pub const INSTANCE_ID: &str = "instance-1";

/// Path of the device collection on the mock server.
pub fn devices_path() -> String {
    format!("/device_api/v1/instances/{}/devices/fcm", INSTANCE_ID)
}

/// Start a mock registry and a client pointing at it.
pub async fn setup_client() -> (MockServer, HttpRegistryClient) {
    let server = MockServer::start().await;
    let config = RegistryConfig::new(INSTANCE_ID)
        .with_base_url(format!("{}/device_api/v1", server.uri()))
        .with_sdk_version("test-sdk")
        .with_timeout(Duration::from_secs(5));
    let client = HttpRegistryClient::new(config).expect("client should build");
    (server, client)
}

/// Retry quickly so transport failures don't slow the tests down.
pub fn fast_retry() -> RetryStrategy {
    RetryStrategy::WithInfiniteExpBackOff(Backoff::new(
        Duration::from_millis(1),
        Duration::from_millis(10),
    ))
}
