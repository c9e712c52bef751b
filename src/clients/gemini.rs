use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::Summarizer;
use crate::error::UpstreamError;

/// Gemini `generateContent` client used to shorten book descriptions.
#[derive(Debug, Clone)]
pub struct GeminiClient {
    http: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
}

impl GeminiClient {
    /// Without an `api_key` every call fails with [`UpstreamError::NotConfigured`].
    pub fn new(
        http: reqwest::Client,
        endpoint: impl Into<String>,
        api_key: Option<String>,
    ) -> Self {
        Self {
            http,
            endpoint: endpoint.into(),
            api_key,
        }
    }
}

#[async_trait]
impl Summarizer for GeminiClient {
    async fn summarize(&self, text: &str) -> Result<String, UpstreamError> {
        let key = self.api_key.as_deref().ok_or(UpstreamError::NotConfigured)?;

        let response = self
            .http
            .post(&self.endpoint)
            .query(&[("key", key)])
            .json(&GenerateRequest::summary_of(text))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(UpstreamError::Status(response.status()));
        }

        let body: GenerateResponse = response.json().await?;
        body.first_text()
            .ok_or(UpstreamError::MalformedResponse("no candidate text"))
    }
}

#[derive(Debug, Serialize)]
struct GenerateRequest {
    contents: Vec<Content>,
}

impl GenerateRequest {
    fn summary_of(text: &str) -> Self {
        Self {
            contents: vec![Content {
                parts: vec![Part {
                    text: format!("Summarize this in under 50 words: {text}"),
                }],
            }],
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

impl GenerateResponse {
    fn first_text(self) -> Option<String> {
        let content = self.candidates.into_iter().next()?.content?;
        let text = content.parts.into_iter().next()?.text;
        Some(text.trim().to_string())
    }
}
