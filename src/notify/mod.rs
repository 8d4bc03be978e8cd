//! Push notification plumbing
//!
//! Supplies the optional device push token attached to uploads and registers
//! it with the backend so finished images can be announced.

pub mod mock;
pub mod registrar;

pub use mock::MockPushTokenSource;
pub use registrar::DeviceRegistrar;

use crate::Result;
use async_trait::async_trait;
use std::sync::Mutex;

#[async_trait]
pub trait PushTokenSource: Send + Sync {
    async fn push_token(&self) -> Result<Option<String>>;
}

/// A push token fixed at construction (or none at all).
#[derive(Debug, Clone, Default)]
pub struct StaticPushToken(Option<String>);

impl StaticPushToken {
    pub fn new(token: Option<String>) -> Self {
        Self(token.filter(|t| !t.is_empty()))
    }
}

#[async_trait]
impl PushTokenSource for StaticPushToken {
    async fn push_token(&self) -> Result<Option<String>> {
        Ok(self.0.clone())
    }
}

/// Remembers the last token its inner source produced and falls back to it
/// when that source fails.
pub struct CachedPushTokenSource<S> {
    inner: S,
    last: Mutex<Option<String>>,
}

impl<S: PushTokenSource> CachedPushTokenSource<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            last: Mutex::new(None),
        }
    }
}

#[async_trait]
impl<S: PushTokenSource> PushTokenSource for CachedPushTokenSource<S> {
    async fn push_token(&self) -> Result<Option<String>> {
        match self.inner.push_token().await {
            Ok(Some(token)) => {
                *self.last.lock().unwrap() = Some(token.clone());
                Ok(Some(token))
            }
            Ok(None) => Ok(None),
            Err(e) => {
                let cached = self.last.lock().unwrap().clone();
                match cached {
                    Some(token) => {
                        tracing::warn!("Push token lookup failed ({}), using cached token", e);
                        Ok(Some(token))
                    }
                    None => Err(e),
                }
            }
        }
    }
}

/// Best-effort lookup: failures are logged and treated as "no token".
pub async fn resolve_push_token(source: &dyn PushTokenSource) -> Option<String> {
    match source.push_token().await {
        Ok(token) => {
            tracing::debug!("Push token available: {}", token.is_some());
            token
        }
        Err(e) => {
            tracing::warn!("Could not get push token, continuing without it: {}", e);
            None
        }
    }
}
