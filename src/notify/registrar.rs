use crate::models::DeviceRegistration;
use crate::{Error, Result};
use reqwest::Client;
use std::time::Duration;

const REGISTER_PATH: &str = "/register-token";
const REGISTER_TIMEOUT: Duration = Duration::from_secs(30);

/// Registers a device's push token with the backend.
pub struct DeviceRegistrar {
    client: Client,
    base_url: String,
}

impl DeviceRegistrar {
    pub fn new(base_url: String) -> Self {
        Self::new_with_client(base_url, Client::new())
    }

    pub fn new_with_client(base_url: String, client: Client) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub async fn register(&self, device_id: &str, push_token: Option<String>) -> Result<()> {
        let fcm_token = push_token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| Error::Validation("no push token available".to_string()))?;

        let registration = DeviceRegistration {
            user_id: device_id.to_string(),
            fcm_token,
            platform: std::env::consts::OS.to_string(),
        };

        let url = format!("{}{}", self.base_url, REGISTER_PATH);
        let response = self
            .client
            .post(&url)
            .timeout(REGISTER_TIMEOUT)
            .json(&registration)
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Failed to register device token: {}", e);
                Error::from_transport(e, REGISTER_TIMEOUT)
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            tracing::error!("Device registration failed (status {}): {}", status, error_text);
            return Err(Error::Api {
                status: status.as_u16(),
                message: format!("Failed to register device token: {}", error_text),
            });
        }

        tracing::info!("Device token registered for {}", device_id);
        Ok(())
    }
}
