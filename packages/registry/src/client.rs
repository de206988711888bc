//! `reqwest`-backed implementation of [`RegistryApi`].

use reqwest::{Client, Method, StatusCode, Url};
use serde::Serialize;
use sync_core::{Interests, RegistrationResult, RegistryApi, RegistryError, RetryStrategy};
use thiserror::Error;

use crate::config::RegistryConfig;
use crate::retry::with_retry;
use crate::wire::{
    DeviceMetadata, ErrorResponse, RegisterDeviceRequest, RegisterDeviceResponse,
    SetInterestsRequest, UpdateTokenRequest,
};

/// Errors raised while building a client.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Invalid base URL '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Map a non-success HTTP status onto the registry error taxonomy.
pub fn classify_status(status: StatusCode, message: String) -> RegistryError {
    match status {
        StatusCode::BAD_REQUEST => RegistryError::BadRequest(message),
        StatusCode::NOT_FOUND => RegistryError::DeviceNotFound(message),
        _ => RegistryError::Transport(format!("{}: {}", status, message)),
    }
}

/// HTTP client for the device registry.
#[derive(Debug, Clone)]
pub struct HttpRegistryClient {
    http: Client,
    devices_url: Url,
    config: RegistryConfig,
}

impl HttpRegistryClient {
    /// Build a client from configuration.
    pub fn new(config: RegistryConfig) -> Result<Self, ClientError> {
        let http = Client::builder().timeout(config.timeout).build()?;

        let invalid = |reason: String| ClientError::InvalidBaseUrl {
            url: config.base_url.clone(),
            reason,
        };
        let mut devices_url = Url::parse(&config.base_url).map_err(|e| invalid(e.to_string()))?;
        devices_url
            .path_segments_mut()
            .map_err(|_| invalid("cannot be a base".to_string()))?
            .pop_if_empty()
            .extend(["instances", config.instance_id.as_str(), "devices", "fcm"]);

        tracing::debug!("Registry client targeting {}", devices_url);

        Ok(Self {
            http,
            devices_url,
            config,
        })
    }

    /// Configuration this client was built from.
    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    fn url(&self, segments: &[&str]) -> Url {
        let mut url = self.devices_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.extend(segments);
        }
        url
    }

    async fn send<B: Serialize + ?Sized>(
        &self,
        method: Method,
        url: Url,
        body: Option<&B>,
    ) -> Result<reqwest::Response, RegistryError> {
        let mut request = self.http.request(method, url);
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request
            .send()
            .await
            .map_err(|e| RegistryError::Transport(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let text = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorResponse>(&text)
            .map(|e| e.message())
            .unwrap_or(text);
        Err(classify_status(status, message))
    }

    async fn send_empty<B: Serialize + ?Sized>(
        &self,
        method: Method,
        url: Url,
        body: Option<&B>,
    ) -> Result<(), RegistryError> {
        self.send(method, url, body).await.map(|_| ())
    }
}

impl RegistryApi for HttpRegistryClient {
    async fn register_device(
        &self,
        token: &str,
        known_previous_device_ids: &[String],
        retry: &RetryStrategy,
    ) -> Result<RegistrationResult, RegistryError> {
        let body = RegisterDeviceRequest {
            token,
            known_previous_client_ids: known_previous_device_ids,
            metadata: DeviceMetadata {
                sdk_version: &self.config.sdk_version,
                platform: &self.config.platform,
            },
        };

        let body = &body;
        let response = with_retry(retry, "register_device", move || async move {
            let response = self
                .send(Method::POST, self.devices_url.clone(), Some(body))
                .await?;
            response
                .json::<RegisterDeviceResponse>()
                .await
                .map_err(|e| RegistryError::Transport(e.to_string()))
        })
        .await?;

        tracing::info!("Registered device {}", response.id);

        Ok(RegistrationResult {
            device_id: response.id,
            initial_interests: response.initial_interest_set,
        })
    }

    async fn set_subscriptions(
        &self,
        device_id: &str,
        interests: &Interests,
        retry: &RetryStrategy,
    ) -> Result<(), RegistryError> {
        let body = &SetInterestsRequest { interests };
        let url = &self.url(&[device_id, "interests"]);
        with_retry(retry, "set_subscriptions", move || {
            self.send_empty(Method::PUT, url.clone(), Some(body))
        })
        .await
    }

    async fn add_interest(
        &self,
        device_id: &str,
        interest: &str,
        retry: &RetryStrategy,
    ) -> Result<(), RegistryError> {
        let url = &self.url(&[device_id, "interests", interest]);
        with_retry(retry, "add_interest", move || {
            self.send_empty::<()>(Method::POST, url.clone(), None)
        })
        .await
    }

    async fn remove_interest(
        &self,
        device_id: &str,
        interest: &str,
        retry: &RetryStrategy,
    ) -> Result<(), RegistryError> {
        let url = &self.url(&[device_id, "interests", interest]);
        with_retry(retry, "remove_interest", move || {
            self.send_empty::<()>(Method::DELETE, url.clone(), None)
        })
        .await
    }

    async fn refresh_token(
        &self,
        device_id: &str,
        new_token: &str,
        retry: &RetryStrategy,
    ) -> Result<(), RegistryError> {
        let body = &UpdateTokenRequest { token: new_token };
        let url = &self.url(&[device_id, "token"]);
        with_retry(retry, "refresh_token", move || {
            self.send_empty(Method::PUT, url.clone(), Some(body))
        })
        .await
    }
}
