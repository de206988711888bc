//! Configuration for the registry client.

use std::time::Duration;

/// Platform reported in registration metadata unless overridden.
pub const DEFAULT_PLATFORM: &str = "rust";

/// Registry client configuration.
#[derive(Debug, Clone)]
pub struct RegistryConfig {
    /// Instance the device registers under.
    pub instance_id: String,
    /// Base URL of the device API, without a trailing slash.
    pub base_url: String,
    /// Per-request timeout.
    pub timeout: Duration,
    /// SDK version reported in registration metadata.
    pub sdk_version: String,
    /// Platform reported in registration metadata.
    pub platform: String,
}

impl RegistryConfig {
    /// Create a config pointing at the hosted registry for an instance.
    pub fn new(instance_id: impl Into<String>) -> Self {
        let instance_id = instance_id.into();
        Self {
            base_url: format!(
                "https://{}.pushnotifications.pusher.com/device_api/v1",
                instance_id
            ),
            instance_id,
            timeout: Duration::from_secs(30),
            sdk_version: env!("CARGO_PKG_VERSION").to_string(),
            platform: DEFAULT_PLATFORM.to_string(),
        }
    }

    /// Point the client at a different registry host.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Set the per-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the SDK version reported on registration.
    pub fn with_sdk_version(mut self, sdk_version: impl Into<String>) -> Self {
        self.sdk_version = sdk_version.into();
        self
    }

    /// Set the platform reported on registration.
    pub fn with_platform(mut self, platform: impl Into<String>) -> Self {
        self.platform = platform.into();
        self
    }
}
