use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Form,
};
use maud::Markup;
use serde::Deserialize;

use crate::{
    auth::SessionUser,
    catalog::{self, SearchQuery},
    clients::enrich,
    error::AppError,
    state::AppState,
    views::{self, BookPage},
};

const NO_RESULTS: &str = "No results found.";

#[derive(Debug, Deserialize)]
pub struct SearchForm {
    isbn: Option<String>,
    title: Option<String>,
    author: Option<String>,
    year: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ReviewForm {
    rating: Option<String>,
    review: Option<String>,
}

/// `GET /search`: an empty search form.
pub async fn search_form(user: SessionUser) -> Markup {
    views::search(&user, &SearchQuery::default(), None, None)
}

/// `POST /search`: runs the query and lists the matches.
pub async fn search(
    State(state): State<AppState>,
    user: SessionUser,
    Form(form): Form<SearchForm>,
) -> Result<Response, AppError> {
    let query = match SearchQuery::from_form(
        form.isbn.as_deref(),
        form.title.as_deref(),
        form.author.as_deref(),
        form.year.as_deref(),
    ) {
        Ok(query) => query,
        Err(e) if e.is_user_facing() => {
            let page = views::search(&user, &SearchQuery::default(), None, Some(&e.to_string()));
            return Ok((e.status(), page).into_response());
        }
        Err(e) => return Err(e),
    };

    let books = catalog::search_books(&state.db, &query).await?;
    Ok(views::search(&user, &query, Some(&books), None).into_response())
}

/// `GET /books/{isbn}`: the detail page.
pub async fn show_book(
    State(state): State<AppState>,
    user: SessionUser,
    Path(isbn): Path<String>,
) -> Result<Response, AppError> {
    book_page(&state, &user, &isbn, None).await
}

/// `POST /books/{isbn}`: submits a review, then renders the detail page.
pub async fn review_book(
    State(state): State<AppState>,
    user: SessionUser,
    Path(isbn): Path<String>,
    Form(form): Form<ReviewForm>,
) -> Result<Response, AppError> {
    book_page(&state, &user, &isbn, Some(form)).await
}

/// Book lookup, enrichment, optional review submission, then the full page.
///
/// A missing book stops before any external call. A second review by the same
/// user returns a reduced page with only the book and the error.
async fn book_page(
    state: &AppState,
    user: &SessionUser,
    isbn: &str,
    submission: Option<ReviewForm>,
) -> Result<Response, AppError> {
    let Some(book) = catalog::find_book(&state.db, isbn).await? else {
        let page = views::error_page(Some(user), NO_RESULTS);
        return Ok((StatusCode::NOT_FOUND, page).into_response());
    };

    let enrichment = enrich(state.metadata.as_ref(), state.summarizer.as_ref(), isbn).await;

    let mut error = None;
    if let Some(form) = submission {
        match catalog::submit_review(
            &state.db,
            user.user_id,
            &book.isbn,
            form.rating.as_deref(),
            form.review.as_deref(),
        )
        .await
        {
            Ok(()) => {}
            Err(AppError::Conflict(message)) => {
                let page = views::review_rejected(user, &book, &message);
                return Ok((StatusCode::CONFLICT, page).into_response());
            }
            Err(AppError::Validation(message)) => error = Some(message),
            Err(e) => return Err(e),
        }
    }

    let reviews = catalog::reviews_for(&state.db, &book.isbn).await?;

    Ok(views::book(BookPage {
        user,
        book: &book,
        reviews: &reviews,
        error: error.as_deref(),
        enrichment: &enrichment,
    })
    .into_response())
}
