use super::mime::{content_type_for, upload_file_name};
use super::{GenerationService, UploadRequest};
use crate::auth::TokenCache;
use crate::models::{ApiErrorBody, GeneratedImage, DEFAULT_REQUEST_TIMEOUT};
use crate::{Error, Result};
use async_trait::async_trait;
use reqwest::header::ACCEPT;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, StatusCode};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

const GENERATE_PATH: &str = "/generate";
const ERROR_BODY_PREVIEW_CHARS: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Idle,
    Authenticating,
    Uploading,
    AwaitingResponse,
    Succeeded,
    Failed,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Idle => "idle",
            Stage::Authenticating => "authenticating",
            Stage::Uploading => "uploading",
            Stage::AwaitingResponse => "awaiting response",
            Stage::Succeeded => "succeeded",
            Stage::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Authenticated multipart client for the filter backend.
pub struct UploadClient {
    client: Client,
    endpoint: String,
    tokens: Arc<TokenCache>,
    timeout: Duration,
}

impl UploadClient {
    pub fn new(base_url: String, tokens: Arc<TokenCache>) -> Self {
        Self::new_with_client(base_url, tokens, Client::new())
    }

    pub fn new_with_client(base_url: String, tokens: Arc<TokenCache>, client: Client) -> Self {
        Self {
            client,
            endpoint: format!("{}{}", base_url.trim_end_matches('/'), GENERATE_PATH),
            tokens,
            timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn build_form(
        &self,
        request: &UploadRequest,
        data: Vec<u8>,
        name_hint: Option<&str>,
    ) -> Result<Form> {
        let content_type = name_hint.map(content_type_for).unwrap_or("image/png");
        let part = Part::bytes(data)
            .file_name(upload_file_name(content_type))
            .mime_str(content_type)
            .map_err(|e| {
                Error::Validation(format!("invalid content type {}: {}", content_type, e))
            })?;

        let mut form = Form::new()
            .part("image", part)
            .text("filter", request.filter.clone());
        if let Some(push_token) = &request.push_token {
            form = form.text("fcmToken", push_token.clone());
        }
        Ok(form)
    }

    async fn send(&self, request: &UploadRequest, stage: &mut Stage) -> Result<GeneratedImage> {
        let image = request.validate()?;
        let data = image.read().await?;
        let name_hint = image.name_hint();

        *stage = Stage::Authenticating;
        tracing::debug!("generate[{}]: {}", request.filter, stage);
        let credential = self.tokens.get_token().await?;

        *stage = Stage::Uploading;
        tracing::debug!("generate[{}]: {} {} bytes", request.filter, stage, data.len());
        let form = self.build_form(request, data, name_hint.as_deref())?;

        let round_trip = async {
            let response = self
                .client
                .post(&self.endpoint)
                .bearer_auth(&credential.token)
                .header(ACCEPT, "application/json")
                .multipart(form)
                .send()
                .await?;
            *stage = Stage::AwaitingResponse;
            tracing::debug!("generate[{}]: {}", request.filter, Stage::AwaitingResponse);
            let status = response.status();
            let body = response.text().await?;
            Ok::<_, reqwest::Error>((status, body))
        };

        // Dropping the future on expiry aborts the in-flight request.
        let (status, body) = match tokio::time::timeout(self.timeout, round_trip).await {
            Ok(result) => result.map_err(|e| {
                tracing::error!("Failed to send request to filter backend: {}", e);
                Error::from_transport(e, self.timeout)
            })?,
            Err(_) => {
                tracing::warn!(
                    "Request to {} exceeded {}s deadline",
                    self.endpoint,
                    self.timeout.as_secs()
                );
                return Err(Error::Timeout(self.timeout));
            }
        };

        parse_generate_response(status, &body)
    }
}

#[async_trait]
impl GenerationService for UploadClient {
    async fn generate(&self, request: &UploadRequest) -> Result<GeneratedImage> {
        tracing::info!("Processing image with filter: {}", request.filter);

        let mut stage = Stage::Idle;
        let result = self.send(request, &mut stage).await;

        match &result {
            Ok(image) => tracing::info!(
                "generate[{}]: {} -> {}",
                request.filter,
                Stage::Succeeded,
                image.image_url
            ),
            Err(e) => tracing::warn!(
                "generate[{}]: {} while {}: {}",
                request.filter,
                Stage::Failed,
                stage,
                e
            ),
        }
        result
    }
}

/// Map a backend response to a generated image or a classified failure.
pub fn parse_generate_response(status: StatusCode, body: &str) -> Result<GeneratedImage> {
    if !status.is_success() {
        tracing::error!("Filter backend error (status {}): {}", status, body);
        return Err(Error::Api {
            status: status.as_u16(),
            message: error_message(status, body),
        });
    }

    let image: GeneratedImage = serde_json::from_str(body).map_err(|e| Error::Api {
        status: status.as_u16(),
        message: format!("malformed response: {}", e),
    })?;

    if image.image_url.trim().is_empty() {
        return Err(Error::Api {
            status: status.as_u16(),
            message: "malformed response: empty imageUrl".to_string(),
        });
    }
    Ok(image)
}

fn error_message(status: StatusCode, body: &str) -> String {
    serde_json::from_str::<ApiErrorBody>(body)
        .ok()
        .and_then(|parsed| parsed.message)
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| {
            let preview: String = body.chars().take(ERROR_BODY_PREVIEW_CHARS).collect();
            format!("API error: {}. Response: {}", status.as_u16(), preview)
        })
}
