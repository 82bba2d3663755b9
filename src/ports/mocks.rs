use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use async_trait::async_trait;

use super::source::{FetchError, RawMarkup, SourcePort};

/// Scripted source that records calls and replays queued responses.
/// Once the queue is drained the fallback response is returned.
#[derive(Debug, Clone)]
pub struct ScriptedSource {
    calls: Arc<Mutex<usize>>,
    script: Arc<Mutex<VecDeque<Result<RawMarkup, FetchError>>>>,
    fallback: Arc<Mutex<Result<RawMarkup, FetchError>>>,
}

impl Default for ScriptedSource {
    fn default() -> Self {
        Self {
            calls: Arc::new(Mutex::new(0)),
            script: Arc::new(Mutex::new(VecDeque::new())),
            fallback: Arc::new(Mutex::new(Err(FetchError::Network(
                "No response configured".to_string(),
            )))),
        }
    }
}

impl ScriptedSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method to queue a successful fetch
    pub fn then_markup(self, markup: &str) -> Self {
        self.script.lock().unwrap().push_back(Ok(markup.to_string()));
        self
    }

    /// Builder method to queue a failed fetch
    pub fn then_error(self, error: FetchError) -> Self {
        self.script.lock().unwrap().push_back(Err(error));
        self
    }

    /// Builder method to set the response used after the queue is drained
    pub fn otherwise(self, response: Result<&str, FetchError>) -> Self {
        *self.fallback.lock().unwrap() = response.map(str::to_string);
        self
    }

    /// Replace the fallback response on a shared handle
    pub fn set_fallback(&self, response: Result<&str, FetchError>) {
        *self.fallback.lock().unwrap() = response.map(str::to_string);
    }

    /// Number of fetches made so far
    pub fn calls(&self) -> usize {
        *self.calls.lock().unwrap()
    }
}

#[async_trait]
impl SourcePort for ScriptedSource {
    async fn fetch(&self) -> Result<RawMarkup, FetchError> {
        *self.calls.lock().unwrap() += 1;
        let next = self.script.lock().unwrap().pop_front();
        match next {
            Some(response) => response,
            None => self.fallback.lock().unwrap().clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_scripted_source_replays_in_order() {
        let source = ScriptedSource::new()
            .then_error(FetchError::Network("down".into()))
            .then_markup("page")
            .otherwise(Ok("steady page"));

        assert!(source.fetch().await.is_err());
        assert_eq!(source.fetch().await, Ok("page".to_string()));
        assert_eq!(source.fetch().await, Ok("steady page".to_string()));
        assert_eq!(source.fetch().await, Ok("steady page".to_string()));
        assert_eq!(source.calls(), 4);
    }

    #[tokio::test]
    async fn test_shared_handle_sees_calls() {
        let source = ScriptedSource::new();
        let handle = source.clone();

        assert!(source.fetch().await.is_err());
        handle.set_fallback(Ok("recovered"));

        assert_eq!(source.fetch().await, Ok("recovered".to_string()));
        assert_eq!(handle.calls(), 2);
    }
}
