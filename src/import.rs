//! Bulk loading of the `books` table from CSV.
//!
//! The file has a header row followed by `isbn,title,author,year` records,
//! matched by position. All rows go in under one transaction: a file either
//! loads completely or not at all.

use std::io::Read;

use sea_orm::{DatabaseConnection, DbErr, EntityTrait, TransactionTrait};
use thiserror::Error;
use tracing::debug;

use crate::entity::book;

/// Rows per `INSERT`, kept well under the bind-parameter limits of both backends.
const BATCH_SIZE: usize = 500;

/// Failure to read the file or to store its rows.
#[derive(Error, Debug)]
pub enum ImportError {
    #[error("unreadable CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("database error: {0}")]
    Database(#[from] DbErr),
}

/// Parses every record of `source`, skipping the header row.
pub fn read_books<R: Read>(source: R) -> Result<Vec<book::Model>, ImportError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(source);

    let mut books = Vec::new();
    for record in reader.deserialize::<(String, String, String, i32)>() {
        let (isbn, title, author, year) = record?;
        books.push(book::Model {
            isbn,
            title,
            author,
            year,
        });
    }
    Ok(books)
}

/// Inserts `books` in one transaction and returns how many were written.
pub async fn import_books(
    db: &DatabaseConnection,
    books: Vec<book::Model>,
) -> Result<usize, ImportError> {
    let txn = db.begin().await?;

    for batch in books.chunks(BATCH_SIZE) {
        let rows = batch.iter().cloned().map(book::ActiveModel::from);
        if let Err(e) = book::Entity::insert_many(rows)
            .exec_without_returning(&txn)
            .await
        {
            txn.rollback().await?;
            return Err(e.into());
        }
        debug!(rows = batch.len(), "book batch inserted");
    }

    txn.commit().await?;
    Ok(books.len())
}

#[cfg(test)]
mod tests {
    use sea_orm::PaginatorTrait;

    use super::*;
    use crate::{
        catalog::{search_books, SearchQuery},
        testing::{seed_books, test_db},
    };

    const CSV: &str = "isbn,title,author,year\n\
        0380795272,Krondor: The Betrayal,Raymond E. Feist,1998\n\
        1416949658, The Dark Is Rising ,Susan Cooper,1973\n\
        0553803700,\"I, Robot\",Isaac Asimov,1950\n";

    #[test]
    fn records_map_to_books_by_position() {
        let books = read_books(CSV.as_bytes()).unwrap();

        assert_eq!(books.len(), 3);
        assert_eq!(
            books[1],
            book::Model {
                isbn: "1416949658".into(),
                title: "The Dark Is Rising".into(),
                author: "Susan Cooper".into(),
                year: 1973,
            }
        );
        assert_eq!(books[2].title, "I, Robot");
    }

    #[test]
    fn non_numeric_year_fails_the_file() {
        let csv = "isbn,title,author,year\n0000000009,Untitled,Anon,unknown\n";
        assert!(matches!(read_books(csv.as_bytes()), Err(ImportError::Csv(_))));
    }

    #[tokio::test]
    async fn imported_books_are_searchable() {
        let db = test_db().await;

        let count = import_books(&db, read_books(CSV.as_bytes()).unwrap())
            .await
            .unwrap();

        assert_eq!(count, 3);
        let query = SearchQuery {
            author: Some("asimov".into()),
            ..Default::default()
        };
        let found = search_books(&db, &query).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].isbn, "0553803700");
    }

    #[tokio::test]
    async fn a_conflicting_row_rolls_back_the_whole_file() {
        let db = test_db().await;
        seed_books(&db).await;
        let csv = "isbn,title,author,year\n\
            0000000010,New Book,Someone,2001\n\
            0000000001,Dune,Frank Herbert,1965\n";

        let err = import_books(&db, read_books(csv.as_bytes()).unwrap())
            .await
            .unwrap_err();

        assert!(matches!(err, ImportError::Database(_)));
        assert_eq!(book::Entity::find().count(&db).await.unwrap(), 3);
    }
}
