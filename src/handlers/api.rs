use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::{catalog, clients::enrich, error::AppError, state::AppState};

/// JSON view of a book: local catalog fields plus external metadata.
///
/// Every key is always present; all but `title` and `author` may be null.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookSummary {
    pub title: String,
    pub author: String,
    #[serde(rename = "publishedDate")]
    pub published_date: Option<String>,
    #[serde(rename = "ISBN_10")]
    pub isbn_10: Option<String>,
    #[serde(rename = "ISBN_13")]
    pub isbn_13: Option<String>,
    #[serde(rename = "reviewCount")]
    pub review_count: Option<i64>,
    #[serde(rename = "averageRating")]
    pub average_rating: Option<f64>,
    pub description: Option<String>,
    #[serde(rename = "summarizedDescription")]
    pub summarized_description: Option<String>,
}

/// No session required. Both external services are called on every request.
pub async fn book_json(
    State(state): State<AppState>,
    Path(isbn): Path<String>,
) -> Result<Response, AppError> {
    let Some(book) = catalog::find_book(&state.db, &isbn).await? else {
        return Ok((
            StatusCode::NOT_FOUND,
            Json(json!({ "error": format!("no book with isbn {isbn}") })),
        )
            .into_response());
    };

    let enrichment = enrich(state.metadata.as_ref(), state.summarizer.as_ref(), &isbn).await;
    let metadata = enrichment.metadata.unwrap_or_default();

    Ok(Json(BookSummary {
        title: book.title,
        author: book.author,
        published_date: metadata.published_date,
        isbn_10: metadata.isbn_10,
        isbn_13: metadata.isbn_13,
        review_count: metadata.ratings_count,
        average_rating: metadata.average_rating,
        description: metadata.description,
        summarized_description: enrichment.summary,
    })
    .into_response())
}
