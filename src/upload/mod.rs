//! Style-transfer upload pipeline
//!
//! Sends a photo and a filter name to the backend's `/generate` endpoint as a
//! multipart request and returns the URL of the generated image.

pub mod client;
pub mod mime;
pub mod mock;

pub use client::UploadClient;
pub use mock::MockGenerationClient;

use crate::models::GeneratedImage;
use crate::{Error, Result};
use async_trait::async_trait;
use std::path::PathBuf;

#[async_trait]
pub trait GenerationService: Send + Sync {
    async fn generate(&self, request: &UploadRequest) -> Result<GeneratedImage>;
}

/// Where the photo to upload comes from.
#[derive(Debug, Clone)]
pub enum ImageSource {
    File(PathBuf),
    Bytes {
        data: Vec<u8>,
        file_name: Option<String>,
    },
}

impl ImageSource {
    /// Accepts plain paths and `file://` URIs.
    pub fn from_uri(uri: &str) -> Self {
        let path = uri.strip_prefix("file://").unwrap_or(uri);
        ImageSource::File(PathBuf::from(path))
    }

    pub fn bytes(data: Vec<u8>, file_name: Option<String>) -> Self {
        ImageSource::Bytes { data, file_name }
    }

    /// Name used for content-type inference.
    pub fn name_hint(&self) -> Option<String> {
        match self {
            ImageSource::File(path) => Some(path.to_string_lossy().into_owned()),
            ImageSource::Bytes { file_name, .. } => file_name.clone(),
        }
    }

    pub(crate) async fn read(&self) -> Result<Vec<u8>> {
        let data = match self {
            ImageSource::File(path) => tokio::fs::read(path).await.map_err(|e| {
                Error::Validation(format!("could not read image {}: {}", path.display(), e))
            })?,
            ImageSource::Bytes { data, .. } => data.clone(),
        };

        if data.is_empty() {
            return Err(Error::Validation("selected image is empty".to_string()));
        }
        Ok(data)
    }
}

/// One generation request; built per call and not changed once sent.
#[derive(Debug, Clone)]
pub struct UploadRequest {
    pub image: Option<ImageSource>,
    pub filter: String,
    pub push_token: Option<String>,
}

impl UploadRequest {
    pub fn new(image: Option<ImageSource>, filter: impl Into<String>) -> Self {
        Self {
            image,
            filter: filter.into(),
            push_token: None,
        }
    }

    pub fn with_push_token(mut self, push_token: Option<String>) -> Self {
        self.push_token = push_token.filter(|t| !t.is_empty());
        self
    }

    /// Checks that need no I/O.
    pub fn validate(&self) -> Result<&ImageSource> {
        let image = self
            .image
            .as_ref()
            .ok_or_else(|| Error::Validation("no image selected".to_string()))?;
        if self.filter.trim().is_empty() {
            return Err(Error::Validation("no filter selected".to_string()));
        }
        Ok(image)
    }
}
