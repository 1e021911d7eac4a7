//! Page source trait and errors

use async_trait::async_trait;
use thiserror::Error;

/// Errors from fetching the source page.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum SourceError {
    /// Network failure or timeout reaching the upstream site.
    #[error("upstream unreachable: {0}")]
    Upstream(String),

    /// Upstream answered, but with a non-success status.
    #[error("upstream returned HTTP {0}")]
    Status(u16),

    /// The fetcher itself could not be built.
    #[error("source configuration error: {0}")]
    Configuration(String),
}

/// Result type for source operations.
pub type SourceResult<T> = Result<T, SourceError>;

/// A source of raw price-page HTML.
///
/// Implementations fetch one page per call and leave retry policy to the
/// caller. The trait is object-safe so the pipeline can hold `dyn PageSource`.
#[async_trait]
pub trait PageSource: Send + Sync {
    /// Fetch the raw HTML of the price page.
    async fn fetch_page(&self) -> SourceResult<String>;

    /// Human-readable identity of this source (the URL for HTTP sources).
    fn describe(&self) -> String;
}
