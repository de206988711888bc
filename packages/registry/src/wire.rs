//! Request and response bodies of the device API.

use serde::{Deserialize, Serialize};
use sync_core::Interests;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RegisterDeviceRequest<'a> {
    pub token: &'a str,
    pub known_previous_client_ids: &'a [String],
    pub metadata: DeviceMetadata<'a>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct DeviceMetadata<'a> {
    pub sdk_version: &'a str,
    pub platform: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RegisterDeviceResponse {
    pub id: String,
    #[serde(default)]
    pub initial_interest_set: Interests,
}

#[derive(Debug, Serialize)]
pub(crate) struct SetInterestsRequest<'a> {
    pub interests: &'a Interests,
}

#[derive(Debug, Serialize)]
pub(crate) struct UpdateTokenRequest<'a> {
    pub token: &'a str,
}

/// Error body returned by the registry.
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorResponse {
    pub error: String,
    #[serde(default)]
    pub description: Option<String>,
}

impl ErrorResponse {
    pub fn message(&self) -> String {
        match &self.description {
            Some(description) => format!("{}: {}", self.error, description),
            None => self.error.clone(),
        }
    }
}
