//! Application orchestration for authenticated style-transfer uploads.

use crate::auth::{HttpTokenProvider, TokenCache};
use crate::clock::SystemClock;
use crate::models::{Config, GeneratedImage};
use crate::notify::{
    resolve_push_token, CachedPushTokenSource, DeviceRegistrar, PushTokenSource, StaticPushToken,
};
use crate::retry::RetryPolicy;
use crate::upload::{GenerationService, ImageSource, UploadClient, UploadRequest};
use crate::{Error, Result};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio_retry::RetryIf;
use tracing::{info, warn};

/// Wires the token cache, upload client and push token supplier together and
/// applies the caller-side retry policy.
pub struct App {
    tokens: Arc<TokenCache>,
    uploader: Box<dyn GenerationService>,
    push_tokens: Box<dyn PushTokenSource>,
    registrar: DeviceRegistrar,
    device_id: String,
    retry: RetryPolicy,
}

/// Injectable service bundle used to construct [`App`] in tests/harnesses.
pub struct AppServices {
    pub tokens: Arc<TokenCache>,
    pub uploader: Box<dyn GenerationService>,
    pub push_tokens: Box<dyn PushTokenSource>,
    pub registrar: DeviceRegistrar,
}

impl App {
    /// Build an app from concrete service dependencies.
    pub fn with_services(services: AppServices, device_id: String, retry: RetryPolicy) -> Self {
        Self {
            tokens: services.tokens,
            uploader: services.uploader,
            push_tokens: services.push_tokens,
            registrar: services.registrar,
            device_id,
            retry,
        }
    }

    /// Construct the production stack from configuration.
    pub fn from_config(config: &Config) -> Result<Self> {
        for (name, url) in [
            ("FILTER_API_URL", &config.api_base_url),
            ("FILTER_AUTH_URL", &config.auth_base_url),
        ] {
            reqwest::Url::parse(url).map_err(|e| {
                Error::Config(format!("{} is not a valid URL ({}): {}", name, url, e))
            })?;
        }

        // Reuse one HTTP connection pool across the auth service and backend.
        let http_client = reqwest::Client::new();

        let provider =
            HttpTokenProvider::new_with_client(config.auth_base_url.clone(), http_client.clone())
                .with_identity_token(config.identity_token.clone());
        let tokens = Arc::new(TokenCache::with_clock(
            Arc::new(provider),
            Arc::new(SystemClock),
            config.token_ttl,
        ));

        let uploader = UploadClient::new_with_client(
            config.api_base_url.clone(),
            tokens.clone(),
            http_client.clone(),
        )
        .with_timeout(config.request_timeout);
        info!("Upload endpoint: {}", uploader.endpoint());

        let push_tokens =
            CachedPushTokenSource::new(StaticPushToken::new(config.push_token.clone()));
        let registrar =
            DeviceRegistrar::new_with_client(config.api_base_url.clone(), http_client);

        Ok(Self::with_services(
            AppServices {
                tokens,
                uploader: Box::new(uploader),
                push_tokens: Box::new(push_tokens),
                registrar,
            },
            config.device_id.clone(),
            RetryPolicy::new(config.max_retries, config.retry_interval),
        ))
    }

    pub fn tokens(&self) -> &Arc<TokenCache> {
        &self.tokens
    }

    pub fn device_id(&self) -> &str {
        &self.device_id
    }

    /// Upload `image` with `filter`, retrying per the configured policy.
    pub async fn generate(
        &self,
        image: Option<ImageSource>,
        filter: &str,
    ) -> Result<GeneratedImage> {
        let request = UploadRequest::new(image, filter);
        request.validate()?;

        let push_token = resolve_push_token(self.push_tokens.as_ref()).await;
        let request = request.with_push_token(push_token);

        let attempts = AtomicUsize::new(0);
        RetryIf::spawn(
            self.retry.strategy(),
            || self.attempt(&request, &attempts),
            |e: &Error| self.retry.should_retry(e),
        )
        .await
    }

    async fn attempt(
        &self,
        request: &UploadRequest,
        attempts: &AtomicUsize,
    ) -> Result<GeneratedImage> {
        let attempt = attempts.fetch_add(1, Ordering::Relaxed) + 1;
        if attempt > 1 {
            info!(
                "[{}] Retrying generation (attempt {}/{})",
                request.filter,
                attempt,
                self.retry.max_retries + 1
            );
        }

        match self.uploader.generate(request).await {
            Err(e) if e.is_auth_rejection() => {
                warn!("[{}] Credential rejected, clearing token cache", request.filter);
                self.tokens.invalidate().await;
                Err(e)
            }
            Err(e) => {
                warn!(
                    "[{}] Generation attempt {} failed: {}",
                    request.filter, attempt, e
                );
                Err(e)
            }
            ok => ok,
        }
    }

    /// Register this device's push token with the backend.
    pub async fn register_device(&self) -> Result<()> {
        let push_token = resolve_push_token(self.push_tokens.as_ref()).await;
        self.registrar.register(&self.device_id, push_token).await
    }
}
