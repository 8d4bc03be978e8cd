use super::{token_preview, TokenProvider};
use crate::clock::{Clock, SystemClock};
use crate::models::{Credential, DEFAULT_TOKEN_TTL};
use crate::{Error, Result};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

/// Holds at most one bearer credential and refreshes it on demand.
///
/// The slot lock is held for the whole refresh, so concurrent callers that
/// miss the cache wait on the single in-flight provider call and then reuse
/// its result.
pub struct TokenCache {
    provider: Arc<dyn TokenProvider>,
    clock: Arc<dyn Clock>,
    ttl: Duration,
    slot: Mutex<Option<Credential>>,
}

impl TokenCache {
    pub fn new(provider: Arc<dyn TokenProvider>) -> Self {
        Self::with_clock(provider, Arc::new(SystemClock), DEFAULT_TOKEN_TTL)
    }

    pub fn with_clock(
        provider: Arc<dyn TokenProvider>,
        clock: Arc<dyn Clock>,
        ttl: Duration,
    ) -> Self {
        Self {
            provider,
            clock,
            ttl,
            slot: Mutex::new(None),
        }
    }

    /// Return the cached credential, fetching a new one on miss or expiry.
    pub async fn get_token(&self) -> Result<Credential> {
        let mut slot = self.slot.lock().await;
        let now = self.clock.now();

        if let Some(credential) = slot.as_ref() {
            if credential.is_valid_at(now) {
                tracing::debug!("Using cached token {}", token_preview(&credential.token));
                return Ok(credential.clone());
            }
            tracing::debug!("Cached token expired at {}", credential.expires_at);
            *slot = None;
        }

        let ttl = chrono::Duration::from_std(self.ttl)
            .map_err(|e| Error::Config(format!("token lifetime out of range: {}", e)))?;

        tracing::info!("No valid cached token, requesting a new one");
        let token = self.provider.fetch_token().await?;
        let credential = Credential::new(token, now + ttl);
        tracing::info!("Token cached until {}", credential.expires_at);

        *slot = Some(credential.clone());
        Ok(credential)
    }

    /// Drop the cached credential so the next `get_token` refetches.
    pub async fn invalidate(&self) {
        if self.slot.lock().await.take().is_some() {
            tracing::info!("Token cache cleared");
        }
    }

    /// Current credential, if any, without refreshing.
    pub async fn peek(&self) -> Option<Credential> {
        self.slot.lock().await.clone()
    }
}
