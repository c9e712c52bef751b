//! # Bookshelf
//!
//! A small library-catalog web application built on axum, Sea-ORM and
//! `tower-sessions`. Visitors register and log in, search the book catalog,
//! open a book to read its reviews and an AI-generated summary of its
//! description, and leave one review per book.
//!
//! ## Layout
//!
//! - [`accounts`] and [`catalog`] hold the business rules and talk to the
//!   database through Sea-ORM entities in [`entity`].
//! - [`clients`] reaches the external metadata (Google Books) and
//!   summarization (Gemini) services; their failures only degrade a page.
//! - [`handlers`] and [`views`] turn those into HTTP responses.
//! - [`SeaOrmStore`] persists sessions in the same database.
//! - [`import`] loads the catalog from CSV; the `import` binary wraps it.
//!
//! ## Quick Start
//!
//! ```no_run
//! use bookshelf::{app, config::Config, migration::Migrator, session_layer, AppState, SeaOrmStore};
//! use sea_orm::Database;
//! use sea_orm_migration::MigratorTrait;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config::from_env()?;
//! let db = Database::connect(&config.database_url).await?;
//! Migrator::up(&db, None).await?;
//!
//! let store = SeaOrmStore::new(db.clone());
//! let router = app(
//!     AppState::from_config(db, &config)?,
//!     session_layer(store, config.secure_cookies, config.session_expiry),
//! );
//!
//! let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
//! axum::serve(listener, router).await?;
//! # Ok(())
//! # }
//! ```

pub mod accounts;
pub mod auth;
pub mod catalog;
pub mod clients;
pub mod config;
pub mod entity;
pub mod error;
pub mod handlers;
pub mod import;
pub mod migration;
mod session_store;
mod state;
pub mod views;

use axum::{routing::get, Router};
use tower_sessions::{Expiry, SessionManagerLayer};

pub use session_store::SeaOrmStore;
pub use state::AppState;

/// Builds the session layer used by [`app`].
pub fn session_layer(
    store: SeaOrmStore,
    secure: bool,
    expiry: time::Duration,
) -> SessionManagerLayer<SeaOrmStore> {
    SessionManagerLayer::new(store)
        .with_secure(secure)
        .with_expiry(Expiry::OnInactivity(expiry))
}

/// The complete HTTP surface of the application.
pub fn app(state: AppState, session_layer: SessionManagerLayer<SeaOrmStore>) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route(
            "/register",
            get(handlers::register_form).post(handlers::register),
        )
        .route("/login", get(handlers::login_form).post(handlers::login))
        .route("/logout", get(handlers::logout))
        .route("/search", get(handlers::search_form).post(handlers::search))
        .route(
            "/books/{isbn}",
            get(handlers::show_book).post(handlers::review_book),
        )
        .route("/api/{isbn}", get(handlers::book_json))
        .with_state(state)
        .layer(session_layer)
}
