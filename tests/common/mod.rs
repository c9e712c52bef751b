#![allow(dead_code)]

use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{
        header::{CONTENT_TYPE, COOKIE, LOCATION, SET_COOKIE},
        Request, StatusCode,
    },
    Router,
};
use bookshelf::{
    app,
    clients::{BookMetadata, MetadataSource, Summarizer},
    entity::{book, review},
    error::UpstreamError,
    migration::Migrator,
    session_layer, AppState, SeaOrmStore,
};
use http_body_util::BodyExt;
use sea_orm::{
    ColumnTrait, ConnectOptions, Database, DatabaseConnection, EntityTrait, PaginatorTrait,
    QueryFilter, Set,
};
use sea_orm_migration::MigratorTrait;
use tower::ServiceExt;

#[derive(Default)]
pub struct FakeMetadata {
    pub result: Option<BookMetadata>,
    pub calls: AtomicUsize,
}

#[async_trait]
impl MetadataSource for FakeMetadata {
    async fn lookup(&self, _isbn: &str) -> Result<Option<BookMetadata>, UpstreamError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.result.clone())
    }
}

#[derive(Default)]
pub struct FakeSummarizer {
    pub calls: AtomicUsize,
}

#[async_trait]
impl Summarizer for FakeSummarizer {
    async fn summarize(&self, text: &str) -> Result<String, UpstreamError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(format!("Summary of: {text}"))
    }
}

pub fn described(description: &str) -> BookMetadata {
    BookMetadata {
        average_rating: Some(4.2),
        ratings_count: Some(321),
        description: Some(description.to_string()),
        published_date: Some("1965-08-01".to_string()),
        isbn_10: Some("0441013597".to_string()),
        isbn_13: Some("9780441013593".to_string()),
    }
}

pub struct TestResponse {
    pub status: StatusCode,
    pub location: Option<String>,
    pub body: String,
}

/// The full application over a fresh in-memory database, acting as one browser.
pub struct TestApp {
    pub db: DatabaseConnection,
    pub metadata: Arc<FakeMetadata>,
    pub summarizer: Arc<FakeSummarizer>,
    router: Router,
    cookie: Option<String>,
}

impl TestApp {
    pub async fn new() -> Self {
        Self::with_metadata(None).await
    }

    pub async fn with_metadata(result: Option<BookMetadata>) -> Self {
        let mut opt = ConnectOptions::new("sqlite::memory:");
        opt.max_connections(1).min_connections(1).sqlx_logging(false);
        let db = Database::connect(opt).await.unwrap();
        Migrator::up(&db, None).await.unwrap();
        seed_books(&db).await;

        let metadata = Arc::new(FakeMetadata {
            result,
            ..Default::default()
        });
        let summarizer = Arc::new(FakeSummarizer::default());

        let state = AppState::new(db.clone(), metadata.clone(), summarizer.clone());
        let store = SeaOrmStore::new(db.clone());
        let router = app(state, session_layer(store, false, time::Duration::hours(1)));

        Self {
            db,
            metadata,
            summarizer,
            router,
            cookie: None,
        }
    }

    /// Same application and database, but a browser without cookies.
    pub fn new_browser(&self) -> Self {
        Self {
            db: self.db.clone(),
            metadata: self.metadata.clone(),
            summarizer: self.summarizer.clone(),
            router: self.router.clone(),
            cookie: None,
        }
    }

    pub async fn get(&mut self, uri: &str) -> TestResponse {
        let request = self.request("GET", uri).body(Body::empty()).unwrap();
        self.send(request).await
    }

    pub async fn post_form(&mut self, uri: &str, form: &str) -> TestResponse {
        let request = self
            .request("POST", uri)
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(form.to_string()))
            .unwrap();
        self.send(request).await
    }

    pub async fn register(&mut self, username: &str, password: &str) -> TestResponse {
        let form = format!("username={username}&password={password}&confirm={password}");
        self.post_form("/register", &form).await
    }

    pub fn metadata_calls(&self) -> usize {
        self.metadata.calls.load(Ordering::SeqCst)
    }

    pub fn summarizer_calls(&self) -> usize {
        self.summarizer.calls.load(Ordering::SeqCst)
    }

    pub async fn review_count(&self, isbn: &str) -> u64 {
        review::Entity::find()
            .filter(review::Column::Isbn.eq(isbn))
            .count(&self.db)
            .await
            .unwrap()
    }

    fn request(&self, method: &str, uri: &str) -> axum::http::request::Builder {
        let builder = Request::builder().method(method).uri(uri);
        match &self.cookie {
            Some(cookie) => builder.header(COOKIE, cookie),
            None => builder,
        }
    }

    async fn send(&mut self, request: Request<Body>) -> TestResponse {
        let response = self.router.clone().oneshot(request).await.unwrap();

        if let Some(set_cookie) = response.headers().get(SET_COOKIE) {
            let set_cookie = set_cookie.to_str().unwrap();
            let pair = set_cookie.split(';').next().unwrap_or_default().trim();
            let removed = set_cookie.contains("Max-Age=0") || pair.ends_with('=');
            self.cookie = (!removed).then(|| pair.to_string());
        }

        let status = response.status();
        let location = response
            .headers()
            .get(LOCATION)
            .map(|v| v.to_str().unwrap().to_string());
        let bytes = response.into_body().collect().await.unwrap().to_bytes();

        TestResponse {
            status,
            location,
            body: String::from_utf8(bytes.to_vec()).unwrap(),
        }
    }
}

async fn seed_books(db: &DatabaseConnection) {
    let books = [
        ("0000000001", "Dune", "Frank Herbert", 1965),
        ("0000000002", "The Left Hand of Darkness", "Ursula K. Le Guin", 1969),
        ("0000000003", "The Dispossessed", "Ursula K. Le Guin", 1974),
    ];
    book::Entity::insert_many(books.map(|(isbn, title, author, year)| book::ActiveModel {
        isbn: Set(isbn.into()),
        title: Set(title.into()),
        author: Set(author.into()),
        year: Set(year),
    }))
    .exec_without_returning(db)
    .await
    .unwrap();
}
