use super::{GenerationService, UploadRequest};
use crate::models::GeneratedImage;
use crate::{Error, Result};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};

/// Scripted generation results, consumed in order; the last one repeats.
#[derive(Clone)]
pub struct MockGenerationClient {
    responses: Arc<Mutex<Vec<Result<GeneratedImage>>>>,
    requests: Arc<Mutex<Vec<UploadRequest>>>,
}

impl MockGenerationClient {
    pub fn new() -> Self {
        Self {
            responses: Arc::new(Mutex::new(Vec::new())),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn with_image_url(self, url: String) -> Self {
        self.responses
            .lock()
            .unwrap()
            .push(Ok(GeneratedImage { image_url: url }));
        self
    }

    pub fn with_error(self, error: Error) -> Self {
        self.responses.lock().unwrap().push(Err(error));
        self
    }

    pub fn get_call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<UploadRequest> {
        self.requests.lock().unwrap().clone()
    }
}

impl Default for MockGenerationClient {
    fn default() -> Self {
        Self::new()
    }
}

fn replay(result: &Result<GeneratedImage>) -> Result<GeneratedImage> {
    match result {
        Ok(image) => Ok(image.clone()),
        Err(Error::Validation(m)) => Err(Error::Validation(m.clone())),
        Err(Error::Auth(m)) => Err(Error::Auth(m.clone())),
        Err(Error::Network(m)) => Err(Error::Network(m.clone())),
        Err(Error::Timeout(d)) => Err(Error::Timeout(*d)),
        Err(Error::Api { status, message }) => Err(Error::Api {
            status: *status,
            message: message.clone(),
        }),
        Err(Error::Config(m)) => Err(Error::Config(m.clone())),
    }
}

#[async_trait]
impl GenerationService for MockGenerationClient {
    async fn generate(&self, request: &UploadRequest) -> Result<GeneratedImage> {
        request.validate()?;

        let call = {
            let mut requests = self.requests.lock().unwrap();
            requests.push(request.clone());
            requests.len()
        };

        let responses = self.responses.lock().unwrap();
        match responses.get(call - 1).or_else(|| responses.last()) {
            Some(result) => replay(result),
            None => Ok(GeneratedImage {
                image_url: format!("https://mock.invalid/{}.png", request.filter),
            }),
        }
    }
}
