//! Mock page source for tests and offline development
//!
//! Serves canned HTML instead of hitting the live site. A queue of scripted
//! responses is consumed first; once drained, the fallback page (when set) is
//! served indefinitely.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;

use super::{PageSource, SourceError, SourceResult};

/// [`PageSource`] implementation backed by canned responses.
pub struct MockPageSource {
    responses: Mutex<VecDeque<SourceResult<String>>>,
    fallback: Option<String>,
}

impl MockPageSource {
    /// Source that serves the same page on every fetch.
    pub fn fixed(html: impl Into<String>) -> Self {
        Self {
            responses: Mutex::new(VecDeque::new()),
            fallback: Some(html.into()),
        }
    }

    /// Source that serves the scripted responses in order, then errors.
    pub fn sequence(responses: Vec<SourceResult<String>>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            fallback: None,
        }
    }

    /// Append another scripted response.
    pub fn push(&self, response: SourceResult<String>) {
        self.responses.lock().push_back(response);
    }

    /// Scripted responses not yet served.
    pub fn remaining(&self) -> usize {
        self.responses.lock().len()
    }
}

#[async_trait]
impl PageSource for MockPageSource {
    async fn fetch_page(&self) -> SourceResult<String> {
        if let Some(response) = self.responses.lock().pop_front() {
            return response;
        }
        match &self.fallback {
            Some(html) => Ok(html.clone()),
            None => Err(SourceError::Upstream("mock response queue empty".to_string())),
        }
    }

    fn describe(&self) -> String {
        "mock".to_string()
    }
}

// =============================================================================
// Tests
// =============================================================================
