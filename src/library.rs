//! The lending-library records used by the walkthrough.

use crate::record;
use crate::sqlite::{
    ColumnConstraint, ColumnDefinition, DataType, DefaultValue, ForeignKey, IndexDefinition,
    Schema, TableDefinition,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct Author {
    pub id: i64,
    pub name: String,
    pub email: String,
}

record!(Author {
    id => "id",
    name => "name",
    email => "email",
});

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct Book {
    pub id: i64,
    pub title: String,
    pub author_id: Option<i64>,
    pub published_year: Option<i64>,
    pub genre: Option<String>,
}

record!(Book {
    id => "id",
    title => "title",
    author_id => "author_id",
    published_year => "published_year",
    genre => "genre",
});

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct Member {
    pub id: i64,
    pub name: String,
    pub email: String,
    /// `YYYY-MM-DD`; filled in by the store when inserted without one
    pub join_date: String,
}

impl Member {
    /// A member not yet saved; id and join date come from the store
    pub fn new(name: &str, email: &str) -> Self {
        Self {
            name: name.to_string(),
            email: email.to_string(),
            ..Self::default()
        }
    }
}

record!(Member {
    id => "id",
    name => "name",
    email => "email",
    join_date => "join_date",
});

fn id_column() -> ColumnDefinition {
    ColumnDefinition::new("id", DataType::Integer)
        .with_constraint(ColumnConstraint::PrimaryKey)
        .with_constraint(ColumnConstraint::AutoIncrement)
}

fn required(name: &str) -> ColumnDefinition {
    ColumnDefinition::new(name, DataType::Text).with_constraint(ColumnConstraint::NotNull)
}

fn unique_email() -> ColumnDefinition {
    required("email").with_constraint(ColumnConstraint::Unique)
}

/// authors, books and members
pub fn library_schema() -> Schema {
    let authors = TableDefinition::new("authors")
        .with_column(id_column())
        .with_column(required("name"))
        .with_column(unique_email());

    let books = TableDefinition::new("books")
        .with_column(id_column())
        .with_column(required("title"))
        .with_column(ColumnDefinition::new("author_id", DataType::Integer))
        .with_column(ColumnDefinition::new("published_year", DataType::Integer))
        .with_column(ColumnDefinition::new("genre", DataType::Text))
        .with_foreign_key(ForeignKey::new("author_id", "authors", "id"))
        .with_index(IndexDefinition::new("idx_books_author_id", &["author_id"]));

    let members = TableDefinition::new("members")
        .with_column(id_column())
        .with_column(required("name"))
        .with_column(unique_email())
        .with_column(required("join_date").with_default(DefaultValue::CurrentDate));

    Schema::new()
        .add_table(authors)
        .add_table(books)
        .add_table(members)
}
