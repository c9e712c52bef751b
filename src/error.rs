//! Error types for the web layer, the outbound API clients and startup configuration.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use sea_orm::{DbErr, SqlErr};
use thiserror::Error;
use tracing::error;

use crate::views;

/// Errors raised while handling a request.
///
/// The first five variants are expected outcomes whose message is shown to the
/// user on the originating view. Everything else becomes a generic 500 page.
#[derive(Error, Debug)]
pub enum AppError {
    /// Bad user input: password mismatch, missing review fields.
    #[error("{0}")]
    Validation(String),

    /// Duplicate username or duplicate review.
    #[error("{0}")]
    Conflict(String),

    /// Rejected credentials.
    #[error("{0}")]
    Auth(String),

    /// Missing book or user.
    #[error("{0}")]
    NotFound(String),

    /// A post-write invariant did not hold.
    #[error("{0}")]
    Internal(String),

    #[error("database error: {0}")]
    Database(#[from] DbErr),

    #[error("session error: {0}")]
    Session(#[from] tower_sessions::session::Error),
}

impl AppError {
    /// Turns a unique-key violation from an insert into [`AppError::Conflict`]
    /// carrying `message`. Other database errors pass through unchanged.
    pub fn conflict_on_duplicate(err: DbErr, message: &str) -> Self {
        match err.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(_)) => AppError::Conflict(message.into()),
            _ => AppError::Database(err),
        }
    }

    /// HTTP status used when the error is rendered.
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Auth(_) => StatusCode::UNAUTHORIZED,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Internal(_) | AppError::Database(_) | AppError::Session(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Whether the message may be rendered inline on the originating view.
    pub fn is_user_facing(&self) -> bool {
        matches!(
            self,
            AppError::Validation(_)
                | AppError::Conflict(_)
                | AppError::Auth(_)
                | AppError::NotFound(_)
        )
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        if self.is_user_facing() {
            return (status, views::error_page(None, &self.to_string())).into_response();
        }

        error!(error = %self, "request failed");
        (
            status,
            views::error_page(None, "Something went wrong. Please try again later."),
        )
            .into_response()
    }
}

/// Failure of a call to the metadata or summarization service.
///
/// Never fatal to a request: callers log it and continue with degraded data.
#[derive(Error, Debug)]
pub enum UpstreamError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("upstream returned {0}")]
    Status(reqwest::StatusCode),

    #[error("malformed upstream response: {0}")]
    MalformedResponse(&'static str),

    #[error("service is not configured")]
    NotConfigured,
}

/// Invalid or missing startup configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("{0} is not set")]
    Missing(&'static str),

    #[error("invalid {key} value {value:?}: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}
