use super::{token_preview, TokenProvider};
use crate::models::TokenResponse;
use crate::{Error, Result};
use async_trait::async_trait;
use reqwest::header::ACCEPT;
use reqwest::Client;
use std::time::Duration;

const PUBLIC_TOKEN_PATH: &str = "/auth/public-token";
const TOKEN_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Fetches public bearer tokens from the auth service.
pub struct HttpTokenProvider {
    client: Client,
    base_url: String,
    identity_token: Option<String>,
}

impl HttpTokenProvider {
    pub fn new(base_url: String) -> Self {
        Self::new_with_client(base_url, Client::new())
    }

    pub fn new_with_client(base_url: String, client: Client) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            identity_token: None,
        }
    }

    /// Present an identity token to the auth service when requesting.
    pub fn with_identity_token(mut self, identity_token: Option<String>) -> Self {
        self.identity_token = identity_token;
        self
    }
}

#[async_trait]
impl TokenProvider for HttpTokenProvider {
    async fn fetch_token(&self) -> Result<String> {
        let url = format!("{}{}", self.base_url, PUBLIC_TOKEN_PATH);
        tracing::debug!("Requesting token from {}", url);

        let mut request = self
            .client
            .get(&url)
            .timeout(TOKEN_REQUEST_TIMEOUT)
            .header(ACCEPT, "application/json");
        if let Some(identity) = &self.identity_token {
            request = request.bearer_auth(identity);
        }

        let response = request.send().await.map_err(|e| {
            tracing::error!("Failed to reach auth service: {}", e);
            Error::Auth(format!("token request failed: {}", e))
        })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| Error::Auth(format!("failed to read token response: {}", e)))?;

        if !status.is_success() {
            tracing::error!("Auth service error (status {}): {}", status, body);
            return Err(Error::Auth(format!(
                "failed to get token: {} - {}",
                status.as_u16(),
                body
            )));
        }

        let parsed: TokenResponse = serde_json::from_str(&body).map_err(|e| {
            tracing::error!("Failed to parse token response: {}", e);
            Error::Auth(format!("malformed token response: {}", e))
        })?;

        if parsed.token.is_empty() {
            return Err(Error::Auth("auth service returned an empty token".to_string()));
        }

        tracing::debug!("Received token {}", token_preview(&parsed.token));
        Ok(parsed.token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_fetch_token_parses_body() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/auth/public-token"))
            .and(header("accept", "application/json"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({ "token": "abc123" })),
            )
            .expect(1)
            .mount(&server)
            .await;

        let provider = HttpTokenProvider::new(server.uri());
        assert_eq!(provider.fetch_token().await.unwrap(), "abc123");
    }

    #[tokio::test]
    async fn test_fetch_token_sends_identity_token() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/auth/public-token"))
            .and(header("authorization", "Bearer id-token"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({ "token": "t" })),
            )
            .expect(1)
            .mount(&server)
            .await;

        let provider = HttpTokenProvider::new(format!("{}/", server.uri()))
            .with_identity_token(Some("id-token".to_string()));
        assert_eq!(provider.fetch_token().await.unwrap(), "t");
    }

    #[tokio::test]
    async fn test_non_success_status_is_auth_error() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/auth/public-token"))
            .respond_with(ResponseTemplate::new(503).set_body_string("unavailable"))
            .mount(&server)
            .await;

        let provider = HttpTokenProvider::new(server.uri());
        let err = provider.fetch_token().await.unwrap_err();
        assert!(matches!(err, Error::Auth(ref m) if m.contains("503")));
    }

    #[tokio::test]
    async fn test_missing_token_field_is_auth_error() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/auth/public-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
            .mount(&server)
            .await;

        let provider = HttpTokenProvider::new(server.uri());
        assert!(matches!(
            provider.fetch_token().await.unwrap_err(),
            Error::Auth(_)
        ));
    }

    #[tokio::test]
    async fn test_unreachable_service_is_auth_error() {
        let provider = HttpTokenProvider::new("http://127.0.0.1:1".to_string());
        assert!(matches!(
            provider.fetch_token().await.unwrap_err(),
            Error::Auth(_)
        ));
    }
}
