use super::TokenProvider;
use crate::{Error, Result};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub struct MockTokenProvider {
    responses: Arc<Mutex<Vec<String>>>,
    call_count: Arc<Mutex<usize>>,
    delay: Option<Duration>,
    fail: bool,
}

impl MockTokenProvider {
    pub fn new() -> Self {
        Self {
            responses: Arc::new(Mutex::new(Vec::new())),
            call_count: Arc::new(Mutex::new(0)),
            delay: None,
            fail: false,
        }
    }

    pub fn with_token(self, token: String) -> Self {
        self.responses.lock().unwrap().push(token);
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn failing(mut self) -> Self {
        self.fail = true;
        self
    }

    pub fn get_call_count(&self) -> usize {
        *self.call_count.lock().unwrap()
    }
}

impl Default for MockTokenProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TokenProvider for MockTokenProvider {
    async fn fetch_token(&self) -> Result<String> {
        let count = {
            let mut count = self.call_count.lock().unwrap();
            *count += 1;
            *count
        };

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        if self.fail {
            return Err(Error::Auth("mock token provider failure".to_string()));
        }

        let responses = self.responses.lock().unwrap();
        if responses.is_empty() {
            Ok(format!("mock-token-{}", count))
        } else {
            let index = (count - 1) % responses.len();
            Ok(responses[index].clone())
        }
    }
}
