//! axum request handlers, one module per area of the site.

mod account;
mod api;
mod books;

pub use account::{index, login, login_form, logout, register, register_form};
pub use api::{book_json, BookSummary};
pub use books::{review_book, search, search_form, show_book};
