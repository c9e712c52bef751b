use std::{fs::File, path::PathBuf};

use bookshelf::{config::Config, import, migration::Migrator};
use clap::Parser;
use sea_orm::Database;
use sea_orm_migration::MigratorTrait;
use tracing::{info, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Load books into the catalog from a CSV file with an
/// `isbn,title,author,year` header row.
#[derive(Parser, Debug)]
#[command(name = "import", version, about)]
struct Args {
    /// CSV file to read.
    #[arg(default_value = "books.csv")]
    file: PathBuf,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env().add_directive(Level::INFO.into()))
        .init();

    let args = Args::parse();
    let config = Config::from_env()?;

    let db = Database::connect(&config.database_url).await?;
    Migrator::up(&db, None).await?;

    let books = import::read_books(File::open(&args.file)?)?;
    let count = import::import_books(&db, books).await?;

    info!(count, file = %args.file.display(), "books imported");
    Ok(())
}
