//! Mock source for testing purposes.

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use crate::models::SearchQuery;
use crate::sources::{Source, SourceError};

/// A mock source that returns a predefined efetch payload.
#[derive(Debug, Default)]
pub struct MockSource {
    payload: Mutex<Option<String>>,
    failure: Mutex<Option<String>>,
    calls: AtomicUsize,
}

impl MockSource {
    /// Create a new mock source that matches nothing.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a mock source returning `payload`.
    pub fn with_payload(payload: impl Into<String>) -> Self {
        let source = Self::new();
        source.set_payload(payload);
        source
    }

    /// Set the payload to return.
    pub fn set_payload(&self, payload: impl Into<String>) {
        let mut guard = self.payload.lock().unwrap_or_else(|e| e.into_inner());
        *guard = Some(payload.into());
    }

    /// Make every fetch fail with a network error.
    pub fn set_failure(&self, message: impl Into<String>) {
        let mut guard = self.failure.lock().unwrap_or_else(|e| e.into_inner());
        *guard = Some(message.into());
    }

    /// Clear the configured payload and failure.
    pub fn clear(&self) {
        *self.payload.lock().unwrap_or_else(|e| e.into_inner()) = None;
        *self.failure.lock().unwrap_or_else(|e| e.into_inner()) = None;
    }

    /// Number of fetches made so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Source for MockSource {
    fn id(&self) -> &str {
        "mock"
    }

    fn name(&self) -> &str {
        "Mock Source"
    }

    async fn fetch_documents(&self, _query: &SearchQuery) -> Result<String, SourceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if let Some(message) = &*self.failure.lock().unwrap_or_else(|e| e.into_inner()) {
            return Err(SourceError::Network(message.clone()));
        }
        let guard = self.payload.lock().unwrap_or_else(|e| e.into_inner());
        Ok(guard.clone().unwrap_or_default())
    }
}
