//! Data models and structures
//!
//! Defines the credential held by the token cache, the wire payloads
//! exchanged with the filter backend and auth service, and runtime
//! configuration.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Bearer credential obtained from the token provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credential {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

impl Credential {
    pub fn new(token: String, expires_at: DateTime<Utc>) -> Self {
        Self { token, expires_at }
    }

    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }
}

/// Successful response of `POST /generate`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedImage {
    #[serde(rename = "imageUrl")]
    pub image_url: String,
}

// Auth service / backend wire models
#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    pub token: String,
}

#[derive(Debug, Deserialize)]
pub struct ApiErrorBody {
    pub message: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct DeviceRegistration {
    #[serde(rename = "userId")]
    pub user_id: String,
    #[serde(rename = "fcmToken")]
    pub fcm_token: String,
    pub platform: String,
}

pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(120);
pub const DEFAULT_TOKEN_TTL: Duration = Duration::from_secs(50 * 60);
pub const DEFAULT_MAX_RETRIES: usize = 2;
pub const DEFAULT_RETRY_INTERVAL: Duration = Duration::from_millis(2000);

// Configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub api_base_url: String,
    pub auth_base_url: String,
    pub identity_token: Option<String>,
    pub push_token: Option<String>,
    pub device_id: String,
    pub request_timeout: Duration,
    pub token_ttl: Duration,
    pub max_retries: usize,
    pub retry_interval: Duration,
}

impl Config {
    pub fn from_env() -> crate::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> crate::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let required = |key: &str| {
            non_empty(key)
                .map(|v| v.trim().trim_end_matches('/').to_string())
                .ok_or_else(|| crate::Error::Config(format!("{} not set", key)))
        };

        Ok(Self {
            api_base_url: required("FILTER_API_URL")?,
            auth_base_url: required("FILTER_AUTH_URL")?,
            identity_token: non_empty("FILTER_IDENTITY_TOKEN"),
            push_token: non_empty("FILTER_PUSH_TOKEN"),
            device_id: non_empty("FILTER_DEVICE_ID")
                .unwrap_or_else(|| uuid::Uuid::new_v4().to_string()),
            request_timeout: parse_number(&lookup, "FILTER_REQUEST_TIMEOUT_SECS")?
                .map(Duration::from_secs)
                .unwrap_or(DEFAULT_REQUEST_TIMEOUT),
            token_ttl: parse_number(&lookup, "FILTER_TOKEN_TTL_SECS")?
                .map(Duration::from_secs)
                .unwrap_or(DEFAULT_TOKEN_TTL),
            max_retries: parse_number(&lookup, "FILTER_MAX_RETRIES")?
                .map(|n| n as usize)
                .unwrap_or(DEFAULT_MAX_RETRIES),
            retry_interval: parse_number(&lookup, "FILTER_RETRY_INTERVAL_MS")?
                .map(Duration::from_millis)
                .unwrap_or(DEFAULT_RETRY_INTERVAL),
        })
    }
}

fn parse_number<F>(lookup: &F, key: &str) -> crate::Result<Option<u64>>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse::<u64>()
            .map(Some)
            .map_err(|_| {
                crate::Error::Config(format!("{} must be a whole number, got '{}'", key, raw))
            }),
        _ => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_credential_validity_is_strict() {
        let expiry = Utc.with_ymd_and_hms(2026, 1, 1, 12, 0, 0).unwrap();
        let credential = Credential::new("tok".to_string(), expiry);

        assert!(credential.is_valid_at(expiry - chrono::Duration::seconds(1)));
        assert!(!credential.is_valid_at(expiry));
        assert!(!credential.is_valid_at(expiry + chrono::Duration::seconds(1)));
    }

    #[test]
    fn test_generated_image_uses_camel_case() {
        let parsed: GeneratedImage =
            serde_json::from_str(r#"{"imageUrl":"https://x/y.png"}"#).unwrap();
        assert_eq!(parsed.image_url, "https://x/y.png");
    }

    #[test]
    fn test_device_registration_serialization() {
        let registration = DeviceRegistration {
            user_id: "device-1".to_string(),
            fcm_token: "push".to_string(),
            platform: "linux".to_string(),
        };
        let json = serde_json::to_string(&registration).unwrap();
        assert!(json.contains("\"userId\":\"device-1\""));
        assert!(json.contains("\"fcmToken\":\"push\""));
    }

    #[test]
    fn test_config_defaults() {
        let config = Config::from_lookup(lookup_from(&[
            ("FILTER_API_URL", "http://localhost:3000/"),
            ("FILTER_AUTH_URL", "http://localhost:4000"),
        ]))
        .unwrap();

        assert_eq!(config.api_base_url, "http://localhost:3000");
        assert_eq!(config.auth_base_url, "http://localhost:4000");
        assert_eq!(config.request_timeout, Duration::from_secs(120));
        assert_eq!(config.token_ttl, Duration::from_secs(3000));
        assert_eq!(config.max_retries, 2);
        assert!(config.identity_token.is_none());
        assert!(config.push_token.is_none());
        assert!(!config.device_id.is_empty());
    }

    #[test]
    fn test_config_overrides() {
        let config = Config::from_lookup(lookup_from(&[
            ("FILTER_API_URL", "http://10.0.0.5:3000"),
            ("FILTER_AUTH_URL", "http://10.0.0.5:4000"),
            ("FILTER_REQUEST_TIMEOUT_SECS", "30"),
            ("FILTER_TOKEN_TTL_SECS", "600"),
            ("FILTER_MAX_RETRIES", "0"),
            ("FILTER_DEVICE_ID", "device-42"),
            ("FILTER_PUSH_TOKEN", "  "),
        ]))
        .unwrap();

        assert_eq!(config.request_timeout, Duration::from_secs(30));
        assert_eq!(config.token_ttl, Duration::from_secs(600));
        assert_eq!(config.max_retries, 0);
        assert_eq!(config.device_id, "device-42");
        assert!(config.push_token.is_none());
    }

    #[test]
    fn test_config_requires_endpoints() {
        let err = Config::from_lookup(lookup_from(&[("FILTER_AUTH_URL", "http://a")])).unwrap_err();
        assert!(matches!(err, crate::Error::Config(ref m) if m.contains("FILTER_API_URL")));
    }

    #[test]
    fn test_config_rejects_bad_number() {
        let err = Config::from_lookup(lookup_from(&[
            ("FILTER_API_URL", "http://a"),
            ("FILTER_AUTH_URL", "http://b"),
            ("FILTER_REQUEST_TIMEOUT_SECS", "soon"),
        ]))
        .unwrap_err();
        assert!(matches!(err, crate::Error::Config(_)));
    }
}
