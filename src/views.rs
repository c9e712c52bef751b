//! HTML pages, rendered with `maud` (all interpolated text is escaped).

use maud::{html, Markup, DOCTYPE};

use crate::{
    auth::SessionUser,
    catalog::{ReviewEntry, SearchQuery},
    clients::Enrichment,
    entity::book,
};

fn layout(title: &str, user: Option<&SessionUser>, body: Markup) -> Markup {
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="utf-8";
                title { (title) " | Bookshelf" }
            }
            body {
                nav {
                    a href="/" { "Bookshelf" }
                    @if let Some(user) = user {
                        " | " a href="/search" { "Search" }
                        " | " span { "Signed in as " (user.username) }
                        " | " a href="/logout" { "Log out" }
                    } @else {
                        " | " a href="/login" { "Log in" }
                        " | " a href="/register" { "Register" }
                    }
                }
                main { (body) }
            }
        }
    }
}

fn error_line(error: Option<&str>) -> Markup {
    html! {
        @if let Some(error) = error {
            p.error role="alert" { (error) }
        }
    }
}

/// Landing page.
pub fn index(user: Option<&SessionUser>) -> Markup {
    layout(
        "Welcome",
        user,
        html! {
            h1 { "Bookshelf" }
            p { "Search the catalog, read what others thought, and leave your own review." }
            @if user.is_some() {
                p { a href="/search" { "Start searching" } }
            } @else {
                p {
                    a href="/register" { "Create an account" }
                    " or "
                    a href="/login" { "log in" }
                    " to get started."
                }
            }
        },
    )
}

/// Registration form with an optional error line.
pub fn register(error: Option<&str>) -> Markup {
    layout(
        "Register",
        None,
        html! {
            h1 { "Register" }
            (error_line(error))
            form method="post" action="/register" {
                label { "Username " input type="text" name="username" required; }
                label { "Password " input type="password" name="password" required; }
                label { "Confirm password " input type="password" name="confirm" required; }
                button type="submit" { "Register" }
            }
        },
    )
}

/// Login form with an optional error line.
pub fn login(error: Option<&str>) -> Markup {
    layout(
        "Log in",
        None,
        html! {
            h1 { "Log in" }
            (error_line(error))
            form method="post" action="/login" {
                label { "Username " input type="text" name="username" required; }
                label { "Password " input type="password" name="password" required; }
                button type="submit" { "Log in" }
            }
        },
    )
}

/// Confirmation shown after logging out.
pub fn logged_out() -> Markup {
    layout(
        "Logged out",
        None,
        html! {
            h1 { "You have been logged out" }
            p { a href="/login" { "Log in again" } }
        },
    )
}

/// The search form, prefilled with `query`, and its results when a search ran.
pub fn search(
    user: &SessionUser,
    query: &SearchQuery,
    results: Option<&[book::Model]>,
    error: Option<&str>,
) -> Markup {
    let year = query.year.map(|y| y.to_string()).unwrap_or_default();

    layout(
        "Search",
        Some(user),
        html! {
            h1 { "Search the catalog" }
            (error_line(error))
            form method="post" action="/search" {
                label { "ISBN " input type="text" name="isbn" value=(query.isbn.as_deref().unwrap_or("")); }
                label { "Title " input type="text" name="title" value=(query.title.as_deref().unwrap_or("")); }
                label { "Author " input type="text" name="author" value=(query.author.as_deref().unwrap_or("")); }
                label { "Year " input type="text" name="year" value=(year); }
                button type="submit" { "Search" }
            }
            @if let Some(books) = results {
                @if books.is_empty() {
                    p { "No results found." }
                } @else {
                    table {
                        thead { tr { th { "ISBN" } th { "Title" } th { "Author" } th { "Year" } } }
                        tbody {
                            @for book in books {
                                tr {
                                    td { a href={ "/books/" (book.isbn) } { (book.isbn) } }
                                    td { (book.title) }
                                    td { (book.author) }
                                    td { (book.year) }
                                }
                            }
                        }
                    }
                }
            }
        },
    )
}

fn book_header(book: &book::Model) -> Markup {
    html! {
        h1 { (book.title) }
        dl {
            dt { "Author" } dd { (book.author) }
            dt { "Year" } dd { (book.year) }
            dt { "ISBN" } dd { (book.isbn) }
        }
    }
}

/// Everything the book detail page shows.
pub struct BookPage<'a> {
    pub user: &'a SessionUser,
    pub book: &'a book::Model,
    pub reviews: &'a [ReviewEntry],
    pub error: Option<&'a str>,
    pub enrichment: &'a Enrichment,
}

/// Book detail: catalog fields, external metadata, summary, reviews and the review form.
pub fn book(page: BookPage<'_>) -> Markup {
    let BookPage {
        user,
        book,
        reviews,
        error,
        enrichment,
    } = page;

    layout(
        &book.title,
        Some(user),
        html! {
            (book_header(book))
            @if let Some(metadata) = &enrichment.metadata {
                dl.metadata {
                    @if let Some(published) = &metadata.published_date {
                        dt { "Published" } dd { (published) }
                    }
                    @if let Some(rating) = metadata.average_rating {
                        dt { "Average rating" } dd { (format!("{rating:.1}")) }
                    }
                    @if let Some(count) = metadata.ratings_count {
                        dt { "Ratings" } dd { (count) }
                    }
                }
            }
            section.summary {
                h2 { "Summary" }
                p { (enrichment.summary_or_default()) }
            }
            section.reviews {
                h2 { "Reviews" }
                (error_line(error))
                @if reviews.is_empty() {
                    p { "No reviews yet." }
                }
                @for entry in reviews {
                    article.review {
                        header {
                            strong { (entry.username) }
                            " rated it " (entry.rating) "/5 on "
                            time { (entry.time_of.format("%Y-%m-%d %H:%M").to_string()) }
                        }
                        p { (entry.review) }
                    }
                }
                form method="post" action={ "/books/" (book.isbn) } {
                    label {
                        "Rating "
                        select name="rating" {
                            option value="" { "Choose" }
                            @for rating in 1..=5 {
                                option value=(rating) { (rating) }
                            }
                        }
                    }
                    label { "Review " textarea name="review" {} }
                    button type="submit" { "Submit review" }
                }
            }
        },
    )
}

/// The short page returned when a user reviews a book twice: the book and the
/// error only, without reviews or external data.
pub fn review_rejected(user: &SessionUser, book: &book::Model, error: &str) -> Markup {
    layout(
        &book.title,
        Some(user),
        html! {
            (book_header(book))
            (error_line(Some(error)))
            p { a href={ "/books/" (book.isbn) } { "Back to the book" } }
        },
    )
}

/// Standalone page for an error that has no form to return to.
pub fn error_page(user: Option<&SessionUser>, message: &str) -> Markup {
    layout(
        "Error",
        user,
        html! {
            h1 { "Error" }
            p.error { (message) }
            p { a href="/" { "Home" } }
        },
    )
}
