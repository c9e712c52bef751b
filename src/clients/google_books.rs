use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use super::{BookMetadata, MetadataSource};
use crate::error::UpstreamError;

/// Google Books volumes API client.
#[derive(Debug, Clone)]
pub struct GoogleBooksClient {
    http: reqwest::Client,
    base_url: String,
}

impl GoogleBooksClient {
    /// `base_url` is the volumes endpoint, queried as `?q=isbn:{isbn}`.
    pub fn new(http: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl MetadataSource for GoogleBooksClient {
    async fn lookup(&self, isbn: &str) -> Result<Option<BookMetadata>, UpstreamError> {
        let response = self
            .http
            .get(&self.base_url)
            .query(&[("q", format!("isbn:{isbn}"))])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(UpstreamError::Status(response.status()));
        }

        let volumes: VolumesResponse = response.json().await?;
        debug!(isbn, items = volumes.items.len(), "metadata lookup");
        Ok(volumes.into_metadata())
    }
}

#[derive(Debug, Deserialize)]
struct VolumesResponse {
    #[serde(default)]
    items: Vec<Volume>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Volume {
    volume_info: VolumeInfo,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VolumeInfo {
    average_rating: Option<f64>,
    ratings_count: Option<i64>,
    description: Option<String>,
    published_date: Option<String>,
    #[serde(default)]
    industry_identifiers: Vec<IndustryIdentifier>,
}

#[derive(Debug, Deserialize)]
struct IndustryIdentifier {
    #[serde(rename = "type")]
    kind: String,
    identifier: String,
}

impl VolumesResponse {
    fn into_metadata(self) -> Option<BookMetadata> {
        let info = self.items.into_iter().next()?.volume_info;
        let identifier = |kind: &str| {
            info.industry_identifiers
                .iter()
                .find(|id| id.kind == kind)
                .map(|id| id.identifier.clone())
        };

        Some(BookMetadata {
            isbn_10: identifier("ISBN_10"),
            isbn_13: identifier("ISBN_13"),
            average_rating: info.average_rating,
            ratings_count: info.ratings_count,
            description: info.description,
            published_date: info.published_date,
        })
    }
}
