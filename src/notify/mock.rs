use super::PushTokenSource;
use crate::{Error, Result};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};

/// Yields its scripted tokens once each, then `None` (or an error when
/// `then_fail` was set).
pub struct MockPushTokenSource {
    tokens: Arc<Mutex<Vec<String>>>,
    call_count: Arc<Mutex<usize>>,
    fail_when_empty: bool,
}

impl MockPushTokenSource {
    pub fn new() -> Self {
        Self {
            tokens: Arc::new(Mutex::new(Vec::new())),
            call_count: Arc::new(Mutex::new(0)),
            fail_when_empty: false,
        }
    }

    pub fn with_token(self, token: String) -> Self {
        self.tokens.lock().unwrap().push(token);
        self
    }

    pub fn then_fail(mut self) -> Self {
        self.fail_when_empty = true;
        self
    }

    pub fn get_call_count(&self) -> usize {
        *self.call_count.lock().unwrap()
    }
}

impl Default for MockPushTokenSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PushTokenSource for MockPushTokenSource {
    async fn push_token(&self) -> Result<Option<String>> {
        *self.call_count.lock().unwrap() += 1;

        let mut tokens = self.tokens.lock().unwrap();
        if tokens.is_empty() {
            if self.fail_when_empty {
                return Err(Error::Network("push service unavailable".to_string()));
            }
            return Ok(None);
        }
        Ok(Some(tokens.remove(0)))
    }
}
