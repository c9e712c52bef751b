//! Database entity models.
//!
//! Sea-ORM entity definitions for the four tables the application owns:
//! registered users, the book catalog, reviews of books by users, and the
//! server-side session records backing [`crate::SeaOrmStore`].

/// Registered accounts (the credential store).
pub mod user;

/// The read-only book catalog.
pub mod book;

/// One review per user per book.
pub mod review;

/// Persisted `tower-sessions` records.
pub mod session;
