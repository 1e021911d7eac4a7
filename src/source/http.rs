//! HTTP page fetcher

use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::debug;

use super::{PageSource, SourceError, SourceResult};
use crate::config::SourceSettings;

/// Fetches the price page over HTTP.
///
/// Sends a browser-like `User-Agent` (the site rejects default client
/// identities) and enforces the configured request timeout. One fetch per
/// call; retry policy stays with the caller.
pub struct HttpPageSource {
    client: Client,
    url: String,
}

impl HttpPageSource {
    /// Build a fetcher from source settings.
    pub fn from_settings(settings: &SourceSettings) -> SourceResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .user_agent(settings.user_agent.clone())
            .build()
            .map_err(|e| SourceError::Configuration(e.to_string()))?;
        Ok(Self {
            client,
            url: settings.url.clone(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl PageSource for HttpPageSource {
    async fn fetch_page(&self) -> SourceResult<String> {
        debug!(url = %self.url, "fetching source page");

        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| SourceError::Upstream(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::Status(status.as_u16()));
        }

        response
            .text()
            .await
            .map_err(|e| SourceError::Upstream(e.to_string()))
    }

    fn describe(&self) -> String {
        self.url.clone()
    }
}

// =============================================================================
// Tests
// =============================================================================
