use std::sync::Arc;

use sea_orm::DatabaseConnection;

use crate::{
    clients::{http_client, GeminiClient, GoogleBooksClient, MetadataSource, Summarizer},
    config::Config,
};

/// Per-process handles passed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub metadata: Arc<dyn MetadataSource>,
    pub summarizer: Arc<dyn Summarizer>,
}

impl AppState {
    /// Assembles state from an open connection and the two outbound clients.
    pub fn new(
        db: DatabaseConnection,
        metadata: Arc<dyn MetadataSource>,
        summarizer: Arc<dyn Summarizer>,
    ) -> Self {
        Self {
            db,
            metadata,
            summarizer,
        }
    }

    /// Wires the Google Books and Gemini clients from `config`.
    pub fn from_config(db: DatabaseConnection, config: &Config) -> Result<Self, reqwest::Error> {
        let http = http_client(config.http_timeout)?;

        Ok(Self::new(
            db,
            Arc::new(GoogleBooksClient::new(http.clone(), &config.books_api_url)),
            Arc::new(GeminiClient::new(
                http,
                &config.gemini_api_url,
                config.gemini_api_key.clone(),
            )),
        ))
    }
}
