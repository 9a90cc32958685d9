//! Relays foot photos to an external measurement service.
//!
//! The request body is passed through untouched along with its content type.
//! The upstream status and body come back to the caller as-is.

use std::time::Duration;

use axum::body::Bytes;
use lastfit_core::config::MeasurementConfig;
use lastfit_core::errors::ApplicationError;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};

pub struct MeasurementForwarder {
    client: Client,
    endpoint: Option<String>,
    api_key: Option<SecretString>,
}

#[derive(Debug)]
pub struct UpstreamResponse {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: Bytes,
}

impl MeasurementForwarder {
    pub fn from_config(config: &MeasurementConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(Duration::from_secs(config.timeout_secs)).build()?;
        Ok(Self { client, endpoint: config.endpoint.clone(), api_key: config.api_key.clone() })
    }

    pub fn is_configured(&self) -> bool {
        self.endpoint.is_some()
    }

    pub async fn forward(
        &self,
        content_type: Option<&str>,
        body: Bytes,
    ) -> Result<UpstreamResponse, ApplicationError> {
        let Some(endpoint) = self.endpoint.as_deref() else {
            return Err(ApplicationError::Unavailable(
                "measurement endpoint is not configured".to_string(),
            ));
        };

        let mut request = self.client.post(endpoint).body(body);
        if let Some(content_type) = content_type {
            request = request.header(reqwest::header::CONTENT_TYPE, content_type);
        }
        if let Some(api_key) = &self.api_key {
            request = request.bearer_auth(api_key.expose_secret());
        }

        let response = request.send().await.map_err(|error| {
            ApplicationError::Integration(format!("measurement request failed: {error}"))
        })?;

        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        let body = response.bytes().await.map_err(|error| {
            ApplicationError::Integration(format!("measurement response could not be read: {error}"))
        })?;

        Ok(UpstreamResponse { status, content_type, body })
    }
}
