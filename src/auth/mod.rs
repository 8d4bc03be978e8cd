//! Bearer credential acquisition
//!
//! A [`TokenProvider`] fetches fresh tokens from the auth service and the
//! [`TokenCache`] keeps the current one until it expires or is invalidated.

pub mod cache;
pub mod mock;
pub mod provider;

pub use cache::TokenCache;
pub use mock::MockTokenProvider;
pub use provider::HttpTokenProvider;

use crate::Result;
use async_trait::async_trait;

#[async_trait]
pub trait TokenProvider: Send + Sync {
    async fn fetch_token(&self) -> Result<String>;
}

/// Shortened form of a secret suitable for logs.
pub(crate) fn token_preview(token: &str) -> String {
    let prefix: String = token.chars().take(10).collect();
    format!("{}...", prefix)
}
