//! sqlite_tour - walk through every binding mode against a small library database

use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;
use sqlite_tour::library::{library_schema, Author, Book, Member};
use sqlite_tour::{Executor, InArg, Params, SqliteConfig, Store};
use std::fmt::Debug;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "sqlite_tour")]
#[command(about = "Walk through SQLite parameter binding against a library database", long_about = None)]
struct Cli {
    /// Database file (created if missing)
    #[arg(short, long, default_value = "sqlite_tour.db")]
    database: PathBuf,

    /// Delete the database file first so the walkthrough starts from empty tables
    #[arg(long)]
    reset: bool,

    /// Print records as JSON instead of their debug form
    #[arg(long)]
    json: bool,
}

const RULE: &str = "-------------------------------------------------";

struct Output {
    json: bool,
}

impl Output {
    fn show<T: Debug + Serialize>(&self, label: &str, value: &T) -> Result<()> {
        if self.json {
            println!("{label}: {}", serde_json::to_string(value)?);
        } else {
            println!("{label}: {value:?}");
        }
        Ok(())
    }
}

fn main() -> Result<()> {
    // Logs go to stderr; stdout is the walkthrough itself
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if cli.reset && cli.database.exists() {
        std::fs::remove_file(&cli.database)
            .with_context(|| format!("failed to remove {}", cli.database.display()))?;
    }

    let config = SqliteConfig::new(cli.database.to_string_lossy(), library_schema());
    let mut store = Store::open(config).context("failed to open the library database")?;
    run(&mut store, &Output { json: cli.json })?;
    store.close()?;
    Ok(())
}

fn run(store: &mut Store, out: &Output) -> Result<()> {
    let rowling = store.exec(
        "INSERT INTO authors (name, email) VALUES (?1, ?2)",
        &["J.K. Rowling".into(), "jk.rowling@codeheim.io".into()],
    )?;

    // Commit only once every statement in the group has succeeded; an early
    // return drops the transaction and rolls it back.
    let tx = store.begin()?;
    let martin = tx.exec(
        "INSERT INTO authors (name, email) VALUES (?1, ?2)",
        &["George R.R. Martin".into(), "george.martin@codeheim.io".into()],
    )?;
    tx.exec(
        "INSERT INTO books (title, author_id, published_year, genre) VALUES (?1, ?2, ?3, ?4)",
        &[
            "Harry Potter".into(),
            rowling.last_insert_id.into(),
            1997.into(),
            "Fantasy".into(),
        ],
    )?;
    tx.exec(
        "INSERT INTO books (title, author_id, published_year, genre) VALUES (?1, ?2, ?3, ?4)",
        &[
            "Game of Thrones".into(),
            martin.last_insert_id.into(),
            1996.into(),
            "Fantasy".into(),
        ],
    )?;
    tx.exec(
        "INSERT INTO members (name, email) VALUES (?1, ?2)",
        &["John Doe".into(), "john.doe@example.com".into()],
    )?;
    tx.commit()?;

    let authors: Vec<Author> = store.select("SELECT * FROM authors", &[])?;
    out.show("Authors", &authors)?;
    println!("{RULE}");

    let book: Book = store.get(
        "SELECT * FROM books WHERE title = ?1",
        &["Harry Potter".into()],
    )?;
    out.show("Book Details", &book)?;
    println!("{RULE}");

    let mut by_id = store.prepare(&store.rebind("SELECT * FROM authors WHERE id = ?"))?;
    let author: Author = by_id.query_row(&[rowling.last_insert_id.into()])?;
    out.show("Author from Prepared Query", &author)?;
    println!("{RULE}");

    let ids = [rowling.last_insert_id, martin.last_insert_id];
    let (sql, args) = store.in_query(
        "SELECT * FROM authors WHERE id IN (?);",
        &[InArg::list(ids)],
    )?;
    let mut in_clause = store.prepare(&sql)?;
    for author in in_clause.query::<Author>(&args)? {
        out.show("Author from IN Clause", &author?)?;
    }
    println!("{RULE}");

    let filter = Book {
        author_id: Some(rowling.last_insert_id),
        ..Book::default()
    };
    let mut by_author = store.prepare_named("SELECT * FROM books WHERE author_id=:author_id")?;
    for book in by_author.query::<Book, _>(&filter)? {
        out.show("Book from Named Query (Struct)", &book?)?;
    }
    println!("{RULE}");

    let by_name = Params::new().with_value("name", "J.K. Rowling");
    let named: Vec<Author> = store.named_select("SELECT * FROM authors WHERE name=:name", &by_name)?;
    for author in &named {
        out.show("Author from Named Query (Map)", author)?;
    }
    println!("{RULE}");

    let update = Params::new()
        .with_value("email", "new.email@example.com")
        .with_value("id", rowling.last_insert_id);
    let result = store.named_exec("UPDATE authors SET email=:email WHERE id=:id", &update)?;
    println!("Rows Updated: {}", result.rows_affected);
    println!("{RULE}");

    let members = [
        Member::new("Alice", "alice@example.com"),
        Member::new("Bob", "bob@example.com"),
        Member::new("Charlie", "charlie@example.com"),
    ];
    store.named_exec_batch(
        "INSERT INTO members (name, email) VALUES (:name, :email)",
        &members,
    )?;
    let all_members: Vec<Member> = store.select("SELECT * FROM members ORDER BY join_date", &[])?;
    out.show("Members", &all_members)?;
    println!("{RULE}");

    let result = store.exec(
        &store.rebind("DELETE FROM members WHERE email = ?"),
        &["john.doe@example.com".into()],
    )?;
    println!("Member deleted: {result}");

    Ok(())
}
