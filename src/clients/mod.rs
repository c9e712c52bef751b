//! Outbound clients for the book-metadata and text-summarization services.
//!
//! Both are reached through traits so the application state can hold any
//! implementation; the production ones talk to Google Books and Gemini.
//! Failures here never fail a request: [`enrich`] logs them and returns
//! whatever it managed to collect.

mod gemini;
mod google_books;

use std::time::Duration;

use async_trait::async_trait;
use tracing::warn;

use crate::error::UpstreamError;

pub use gemini::GeminiClient;
pub use google_books::GoogleBooksClient;

/// Shown on the detail page whenever no summary could be produced.
pub const NO_SUMMARY: &str = "No summary available.";

/// Catalog metadata for one ISBN, taken from the first matching volume.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BookMetadata {
    pub average_rating: Option<f64>,
    pub ratings_count: Option<i64>,
    pub description: Option<String>,
    pub published_date: Option<String>,
    pub isbn_10: Option<String>,
    pub isbn_13: Option<String>,
}

#[async_trait]
pub trait MetadataSource: Send + Sync {
    /// `Ok(None)` when the service knows no volume for `isbn`.
    async fn lookup(&self, isbn: &str) -> Result<Option<BookMetadata>, UpstreamError>;
}

#[async_trait]
pub trait Summarizer: Send + Sync {
    /// Compresses `text` to under 50 words.
    async fn summarize(&self, text: &str) -> Result<String, UpstreamError>;
}

/// External data shown alongside a catalog entry.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Enrichment {
    pub metadata: Option<BookMetadata>,
    pub summary: Option<String>,
}

impl Enrichment {
    /// The summary, or the "No summary available." fallback.
    pub fn summary_or_default(&self) -> &str {
        self.summary.as_deref().unwrap_or(NO_SUMMARY)
    }
}

/// Fetches metadata, then summarizes its description if there is one.
///
/// Calls are sequential and neither is retried. An upstream failure degrades to
/// missing metadata or a missing summary.
pub async fn enrich(
    metadata: &dyn MetadataSource,
    summarizer: &dyn Summarizer,
    isbn: &str,
) -> Enrichment {
    let metadata = match metadata.lookup(isbn).await {
        Ok(found) => found,
        Err(e) => {
            warn!(isbn, error = %e, "metadata lookup failed");
            None
        }
    };

    let description = metadata
        .as_ref()
        .and_then(|m| m.description.as_deref())
        .filter(|d| !d.trim().is_empty());

    let summary = match description {
        Some(text) => match summarizer.summarize(text).await {
            Ok(summary) if !summary.is_empty() => Some(summary),
            Ok(_) => None,
            Err(e) => {
                warn!(isbn, error = %e, "summarization failed");
                None
            }
        },
        None => None,
    };

    Enrichment { metadata, summary }
}

pub(crate) fn http_client(timeout: Option<Duration>) -> Result<reqwest::Client, reqwest::Error> {
    let mut builder = reqwest::Client::builder();
    if let Some(timeout) = timeout {
        builder = builder.timeout(timeout);
    }
    builder.build()
}
