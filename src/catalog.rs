//! Book search, lookup and reviews.

use chrono::Utc;
use sea_orm::{
    sea_query::{BinOper, Expr, Func, SimpleExpr},
    ColumnTrait, Condition, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use tracing::{debug, info};

use crate::{
    entity::{book, review, user},
    error::AppError,
};

/// Shown when a review is posted without a rating or text.
pub const FIELDS_REQUIRED: &str = "All fields required for review";
/// Shown when a user reviews the same book twice.
pub const ONE_REVIEW_PER_BOOK: &str = "Only one review per book";
/// Shown when the rating is not a whole number from 1 to 5.
pub const RATING_OUT_OF_RANGE: &str = "Rating must be a whole number from 1 to 5";

/// Search criteria. `None` fields impose no constraint.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchQuery {
    pub isbn: Option<String>,
    pub title: Option<String>,
    pub author: Option<String>,
    pub year: Option<i32>,
}

impl SearchQuery {
    /// Builds a query from raw form input; blank fields are dropped.
    pub fn from_form(
        isbn: Option<&str>,
        title: Option<&str>,
        author: Option<&str>,
        year: Option<&str>,
    ) -> Result<Self, AppError> {
        let year = match non_blank(year) {
            Some(raw) => Some(
                raw.parse()
                    .map_err(|_| AppError::Validation("Year must be a number".into()))?,
            ),
            None => None,
        };

        Ok(Self {
            isbn: non_blank(isbn).map(str::to_owned),
            title: non_blank(title).map(str::to_owned),
            author: non_blank(author).map(str::to_owned),
            year,
        })
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Returns every book matching all supplied criteria, in storage order.
///
/// Text fields match as case-insensitive substrings, the year exactly. There is
/// no limit on the result size.
pub async fn search_books(
    db: &DatabaseConnection,
    query: &SearchQuery,
) -> Result<Vec<book::Model>, AppError> {
    let condition = Condition::all()
        .add_option(query.isbn.as_deref().map(|s| contains_ci(book::Column::Isbn, s)))
        .add_option(query.title.as_deref().map(|s| contains_ci(book::Column::Title, s)))
        .add_option(query.author.as_deref().map(|s| contains_ci(book::Column::Author, s)))
        .add_option(query.year.map(|year| book::Column::Year.eq(year)));

    let books = book::Entity::find().filter(condition).all(db).await?;
    debug!(?query, matches = books.len(), "catalog search");
    Ok(books)
}

// LOWER(column) LIKE LOWER('%fragment%') ESCAPE '\'. Both sides go through the
// same database LOWER.
fn contains_ci(column: book::Column, fragment: &str) -> SimpleExpr {
    let escaped = fragment
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    let pattern = SimpleExpr::Binary(
        Box::new(Func::lower(Expr::val(format!("%{escaped}%"))).into()),
        BinOper::Escape,
        Box::new(SimpleExpr::Constant('\\'.into())),
    );
    Expr::expr(Func::lower(Expr::col(column))).binary(BinOper::Like, pattern)
}

/// Looks a book up by its exact ISBN.
pub async fn find_book(db: &DatabaseConnection, isbn: &str) -> Result<Option<book::Model>, AppError> {
    Ok(book::Entity::find_by_id(isbn.to_owned()).one(db).await?)
}

/// A review together with the name of its author.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewEntry {
    pub username: String,
    pub rating: i32,
    pub review: String,
    pub time_of: sea_orm::prelude::DateTimeWithTimeZone,
}

/// All reviews of a book, newest first.
pub async fn reviews_for(
    db: &DatabaseConnection,
    isbn: &str,
) -> Result<Vec<ReviewEntry>, AppError> {
    let rows = review::Entity::find()
        .filter(review::Column::Isbn.eq(isbn))
        .order_by_desc(review::Column::TimeOf)
        .find_also_related(user::Entity)
        .all(db)
        .await?;

    Ok(rows
        .into_iter()
        .map(|(review, author)| ReviewEntry {
            username: author.map(|u| u.username).unwrap_or_default(),
            rating: review.rating,
            review: review.review,
            time_of: review.time_of,
        })
        .collect())
}

/// Validated review input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewDraft {
    pub rating: i32,
    pub review: String,
}

impl ReviewDraft {
    /// Both fields must be non-blank and the rating a whole number from 1 to 5.
    pub fn parse(rating: Option<&str>, review: Option<&str>) -> Result<Self, AppError> {
        let (Some(rating), Some(review)) = (non_blank(rating), non_blank(review)) else {
            return Err(AppError::Validation(FIELDS_REQUIRED.into()));
        };

        let rating = rating
            .parse::<i32>()
            .ok()
            .filter(|r| (1..=5).contains(r))
            .ok_or_else(|| AppError::Validation(RATING_OUT_OF_RANGE.into()))?;

        Ok(Self {
            rating,
            review: review.to_owned(),
        })
    }
}

/// Stores a review of `isbn` by `user_id`.
///
/// Checks run in a fixed order: missing or invalid fields are noted first, then
/// an existing review by the same user rejects the submission with
/// [`AppError::Conflict`] (taking precedence over the field error), and only if
/// neither applies is the row inserted. The existence check and the insert
/// share one transaction, which is rolled back on every rejection.
pub async fn submit_review(
    db: &DatabaseConnection,
    user_id: i32,
    isbn: &str,
    rating: Option<&str>,
    text: Option<&str>,
) -> Result<(), AppError> {
    let draft = ReviewDraft::parse(rating, text);

    let txn = db.begin().await?;

    if has_reviewed(&txn, user_id, isbn).await? {
        txn.rollback().await?;
        return Err(AppError::Conflict(ONE_REVIEW_PER_BOOK.into()));
    }

    let draft = match draft {
        Ok(draft) => draft,
        Err(e) => {
            txn.rollback().await?;
            return Err(e);
        }
    };

    let rating = draft.rating;
    if let Err(e) = insert_review(&txn, user_id, isbn, draft).await {
        txn.rollback().await?;
        return Err(e);
    }
    txn.commit().await?;

    info!(user_id, isbn, rating, "review stored");
    Ok(())
}

// The (user_id, isbn) key rejects a review that raced past `has_reviewed`.
async fn insert_review<C>(
    db: &C,
    user_id: i32,
    isbn: &str,
    draft: ReviewDraft,
) -> Result<(), AppError>
where
    C: ConnectionTrait,
{
    let new_review = review::ActiveModel {
        user_id: Set(user_id),
        isbn: Set(isbn.to_owned()),
        rating: Set(draft.rating),
        review: Set(draft.review),
        time_of: Set(Utc::now().into()),
    };
    review::Entity::insert(new_review)
        .exec_without_returning(db)
        .await
        .map(|_| ())
        .map_err(|e| AppError::conflict_on_duplicate(e, ONE_REVIEW_PER_BOOK))
}

async fn has_reviewed<C>(db: &C, user_id: i32, isbn: &str) -> Result<bool, AppError>
where
    C: ConnectionTrait,
{
    Ok(review::Entity::find_by_id((user_id, isbn.to_owned()))
        .one(db)
        .await?
        .is_some())
}

#[cfg(test)]
mod tests {
    use sea_orm::PaginatorTrait;

    use super::*;
    use crate::{
        accounts,
        testing::{seed_books, test_db},
    };

    async fn review_count(db: &DatabaseConnection, isbn: &str) -> u64 {
        review::Entity::find()
            .filter(review::Column::Isbn.eq(isbn))
            .count(db)
            .await
            .unwrap()
    }

    fn isbns(books: &[book::Model]) -> Vec<&str> {
        books.iter().map(|b| b.isbn.as_str()).collect()
    }

    #[tokio::test]
    async fn blank_search_returns_every_book() {
        let db = test_db().await;
        seed_books(&db).await;

        let query = SearchQuery::from_form(Some(""), Some("  "), None, Some("")).unwrap();
        let books = search_books(&db, &query).await.unwrap();

        assert_eq!(query, SearchQuery::default());
        assert_eq!(books.len(), 3);
    }

    #[tokio::test]
    async fn text_fields_match_case_insensitive_substrings() {
        let db = test_db().await;
        seed_books(&db).await;

        let query = SearchQuery {
            title: Some("DUNE".into()),
            ..Default::default()
        };
        let books = search_books(&db, &query).await.unwrap();
        assert_eq!(isbns(&books), vec!["0000000001"]);

        let query = SearchQuery {
            author: Some("le guin".into()),
            ..Default::default()
        };
        let books = search_books(&db, &query).await.unwrap();
        assert_eq!(isbns(&books), vec!["0000000002", "0000000003"]);

        let query = SearchQuery {
            isbn: Some("0003".into()),
            ..Default::default()
        };
        let books = search_books(&db, &query).await.unwrap();
        assert_eq!(isbns(&books), vec!["0000000003"]);
    }

    #[tokio::test]
    async fn year_matches_exactly_and_combines_with_text() {
        let db = test_db().await;
        seed_books(&db).await;

        let query = SearchQuery::from_form(None, None, None, Some("1969")).unwrap();
        let books = search_books(&db, &query).await.unwrap();
        assert_eq!(isbns(&books), vec!["0000000002"]);

        let query = SearchQuery {
            author: Some("guin".into()),
            year: Some(1965),
            ..Default::default()
        };
        assert!(search_books(&db, &query).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn like_wildcards_in_input_are_literal() {
        let db = test_db().await;
        seed_books(&db).await;

        let query = SearchQuery {
            title: Some("%".into()),
            ..Default::default()
        };
        assert!(search_books(&db, &query).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn accented_text_matches_itself() {
        let db = test_db().await;
        book::Entity::insert(book::ActiveModel {
            isbn: Set("0000000004".into()),
            title: Set("Émile, ou De l'éducation".into()),
            author: Set("Jean-Jacques Rousseau".into()),
            year: Set(1762),
        })
        .exec_without_returning(&db)
        .await
        .unwrap();

        for fragment in ["Émile", "ÉMILE", "éducation", "l'éDUCATION"] {
            let query = SearchQuery {
                title: Some(fragment.into()),
                ..Default::default()
            };
            let books = search_books(&db, &query).await.unwrap();
            assert_eq!(isbns(&books), vec!["0000000004"], "{fragment}");
        }
    }

    #[test]
    fn non_numeric_year_is_a_validation_error() {
        let err = SearchQuery::from_form(None, None, None, Some("nineteen")).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn draft_requires_both_fields_and_a_sane_rating() {
        assert_eq!(
            ReviewDraft::parse(Some("5"), Some("Great book")).unwrap(),
            ReviewDraft {
                rating: 5,
                review: "Great book".into()
            }
        );
        assert!(matches!(
            ReviewDraft::parse(None, Some("text")),
            Err(AppError::Validation(ref m)) if m == FIELDS_REQUIRED
        ));
        assert!(matches!(
            ReviewDraft::parse(Some("4"), Some("   ")),
            Err(AppError::Validation(ref m)) if m == FIELDS_REQUIRED
        ));
        assert!(matches!(
            ReviewDraft::parse(Some("9"), Some("text")),
            Err(AppError::Validation(ref m)) if m == RATING_OUT_OF_RANGE
        ));
    }

    #[tokio::test]
    async fn second_review_by_the_same_user_is_rejected() {
        let db = test_db().await;
        seed_books(&db).await;
        let alice = accounts::register(&db, "alice", "pw", "pw").await.unwrap();

        submit_review(&db, alice.user_id, "0000000001", Some("5"), Some("Great book"))
            .await
            .unwrap();
        let err = submit_review(&db, alice.user_id, "0000000001", Some("1"), Some("Changed my mind"))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Conflict(ref m) if m == ONE_REVIEW_PER_BOOK));
        assert_eq!(review_count(&db, "0000000001").await, 1);
        let reviews = reviews_for(&db, "0000000001").await.unwrap();
        assert_eq!(reviews[0].rating, 5);
        assert_eq!(reviews[0].review, "Great book");
    }

    #[tokio::test]
    async fn key_violation_on_insert_reads_as_duplicate_review() {
        let db = test_db().await;
        seed_books(&db).await;
        let alice = accounts::register(&db, "alice", "pw", "pw").await.unwrap();
        submit_review(&db, alice.user_id, "0000000001", Some("5"), Some("Great book"))
            .await
            .unwrap();

        let draft = ReviewDraft::parse(Some("1"), Some("again")).unwrap();
        let err = insert_review(&db, alice.user_id, "0000000001", draft)
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Conflict(ref m) if m == ONE_REVIEW_PER_BOOK));
        assert_eq!(review_count(&db, "0000000001").await, 1);
    }

    #[tokio::test]
    async fn duplicate_check_wins_over_missing_fields() {
        let db = test_db().await;
        seed_books(&db).await;
        let alice = accounts::register(&db, "alice", "pw", "pw").await.unwrap();
        submit_review(&db, alice.user_id, "0000000001", Some("3"), Some("Fine"))
            .await
            .unwrap();

        let err = submit_review(&db, alice.user_id, "0000000001", None, None)
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn missing_fields_insert_nothing() {
        let db = test_db().await;
        seed_books(&db).await;
        let alice = accounts::register(&db, "alice", "pw", "pw").await.unwrap();

        let err = submit_review(&db, alice.user_id, "0000000001", Some("4"), None)
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Validation(ref m) if m == FIELDS_REQUIRED));
        assert_eq!(review_count(&db, "0000000001").await, 0);
    }

    #[tokio::test]
    async fn reviews_are_listed_newest_first_with_usernames() {
        let db = test_db().await;
        seed_books(&db).await;
        let alice = accounts::register(&db, "alice", "pw", "pw").await.unwrap();
        let bob = accounts::register(&db, "bob", "pw", "pw").await.unwrap();

        submit_review(&db, alice.user_id, "0000000002", Some("4"), Some("first"))
            .await
            .unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        submit_review(&db, bob.user_id, "0000000002", Some("2"), Some("second"))
            .await
            .unwrap();

        let reviews = reviews_for(&db, "0000000002").await.unwrap();
        let names: Vec<_> = reviews.iter().map(|r| r.username.as_str()).collect();
        assert_eq!(names, vec!["bob", "alice"]);
        assert!(reviews_for(&db, "0000000001").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn find_book_by_isbn() {
        let db = test_db().await;
        seed_books(&db).await;

        let book = find_book(&db, "0000000001").await.unwrap().unwrap();
        assert_eq!(book.title, "Dune");
        assert!(find_book(&db, "9999999999").await.unwrap().is_none());
    }
}
