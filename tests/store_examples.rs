// Integration tests for the store
//
// These run the library schema against real SQLite databases: in-memory for
// single-connection behaviour, temp files where two connections must see the
// same data.

use sqlite_tour::library::{library_schema, Author, Book, Member};
use sqlite_tour::{
    BindStyle, Error, Executor, InArg, Params, Result, SqliteConfig, Store, Value,
};
use std::collections::HashMap;
use tempfile::NamedTempFile;

// Helper function to create an in-memory database for testing
fn create_test_db() -> Result<Store> {
    Store::open(SqliteConfig::in_memory(library_schema()))
}

// Helper function to open a second store on a temporary file
fn create_temp_db() -> Result<(Store, NamedTempFile)> {
    let temp_file = NamedTempFile::new().unwrap();
    let path = temp_file.path().to_str().unwrap().to_string();
    let store = Store::open(SqliteConfig::new(path, library_schema()))?;
    Ok((store, temp_file))
}

fn reopen(temp_file: &NamedTempFile) -> Result<Store> {
    let path = temp_file.path().to_str().unwrap().to_string();
    Store::open(SqliteConfig::new(path, library_schema()))
}

fn insert_author(store: &impl Executor, name: &str, email: &str) -> Result<i64> {
    let result = store.exec(
        "INSERT INTO authors (name, email) VALUES (?1, ?2)",
        &[name.into(), email.into()],
    )?;
    Ok(result.last_insert_id)
}

fn count(store: &impl Executor, table: &str) -> Result<i64> {
    store.get(&format!("SELECT count(*) FROM {table}"), &[])
}

#[test]
fn test_insert_then_get_round_trip() {
    test_insert_then_get_round_trip_impl().unwrap();
}

fn test_insert_then_get_round_trip_impl() -> Result<()> {
    let store = create_test_db()?;
    let author_id = insert_author(&store, "J.K. Rowling", "jk.rowling@codeheim.io")?;

    let result = store.exec(
        "INSERT INTO books (title, author_id, published_year, genre) VALUES (?1, ?2, ?3, ?4)",
        &["Harry Potter".into(), author_id.into(), 1997.into(), Value::Null],
    )?;
    assert_eq!(result.rows_affected, 1);

    let book: Book = store.get("SELECT * FROM books WHERE id = ?1", &[result.last_insert_id.into()])?;
    assert_eq!(
        book,
        Book {
            id: result.last_insert_id,
            title: "Harry Potter".to_string(),
            author_id: Some(author_id),
            published_year: Some(1997),
            genre: None,
        }
    );

    let author: Author = store.get("SELECT * FROM authors WHERE id = ?1", &[author_id.into()])?;
    assert_eq!(author.name, "J.K. Rowling");
    assert_eq!(author.email, "jk.rowling@codeheim.io");
    Ok(())
}

#[test]
fn test_positional_arity_is_checked() {
    let store = create_test_db().unwrap();
    let err = store
        .exec(
            "INSERT INTO authors (name, email) VALUES (?1, ?2)",
            &["Only Name".into()],
        )
        .unwrap_err();
    assert!(matches!(err, Error::Arity { expected: 2, actual: 1 }));

    let err = store
        .get::<Author>("SELECT * FROM authors WHERE id = ?", &[1.into(), 2.into()])
        .unwrap_err();
    assert!(matches!(err, Error::Arity { expected: 1, actual: 2 }));
    assert_eq!(count(&store, "authors").unwrap(), 0);
}

#[test]
fn test_point_lookup_without_match() {
    test_point_lookup_without_match_impl().unwrap();
}

fn test_point_lookup_without_match_impl() -> Result<()> {
    let store = create_test_db()?;
    let err = store
        .get::<Author>("SELECT * FROM authors WHERE id = ?1", &[42.into()])
        .unwrap_err();
    assert!(matches!(err, Error::NotFound));

    let missing: Option<Author> =
        store.get_optional("SELECT * FROM authors WHERE id = ?1", &[42.into()])?;
    assert!(missing.is_none());
    Ok(())
}

#[test]
fn test_decode_failure_names_the_record() {
    let store = create_test_db().unwrap();
    insert_author(&store, "J.K. Rowling", "jk.rowling@codeheim.io").unwrap();

    let err = store
        .select::<Author>("SELECT id, name FROM authors", &[])
        .unwrap_err();
    match err {
        Error::Decode { record, .. } => assert!(record.ends_with("Author")),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn test_cursor_is_lazy_and_forward_only() {
    test_cursor_is_lazy_and_forward_only_impl().unwrap();
}

fn test_cursor_is_lazy_and_forward_only_impl() -> Result<()> {
    let store = create_test_db()?;
    for (name, email) in [("A", "a@example.com"), ("B", "b@example.com")] {
        insert_author(&store, name, email)?;
    }

    let mut statement = store.prepare("SELECT * FROM authors ORDER BY id")?;
    let mut cursor = statement.query::<Author>(&[])?;
    assert_eq!(cursor.next().transpose()?.map(|a| a.name), Some("A".to_string()));
    assert_eq!(cursor.next().transpose()?.map(|a| a.name), Some("B".to_string()));
    assert!(cursor.next().is_none());
    assert!(cursor.next().is_none());
    Ok(())
}

#[test]
fn test_in_clause_expansion() {
    test_in_clause_expansion_impl().unwrap();
}

fn test_in_clause_expansion_impl() -> Result<()> {
    let store = create_test_db()?;
    let first = insert_author(&store, "J.K. Rowling", "jk.rowling@codeheim.io")?;
    let second = insert_author(&store, "George R.R. Martin", "george.martin@codeheim.io")?;
    insert_author(&store, "Terry Pratchett", "terry@example.com")?;

    let (sql, args) = store.in_query(
        "SELECT * FROM authors WHERE id IN (?) ORDER BY id",
        &[InArg::list([first, second])],
    )?;
    assert_eq!(sql, "SELECT * FROM authors WHERE id IN (?1, ?2) ORDER BY id");
    assert_eq!(args.len(), 2);

    let authors: Vec<Author> = store.select(&sql, &args)?;
    let ids: Vec<i64> = authors.iter().map(|a| a.id).collect();
    assert_eq!(ids, vec![first, second]);

    let err = store
        .select_in::<Author>("SELECT * FROM authors WHERE id IN (?)", &[InArg::List(Vec::new())])
        .unwrap_err();
    assert!(matches!(err, Error::EmptyList { position: 1 }));
    Ok(())
}

#[test]
fn test_rebind_styles_all_run_on_sqlite() {
    for style in [
        BindStyle::Question,
        BindStyle::Numbered,
        BindStyle::Dollar,
        BindStyle::At,
    ] {
        let store =
            Store::open(SqliteConfig::in_memory(library_schema()).with_bind_style(style)).unwrap();
        insert_author(&store, "J.K. Rowling", "jk.rowling@codeheim.io").unwrap();
        let authors: Vec<Author> = store
            .select_in(
                "SELECT * FROM authors WHERE name = ? AND id IN (?)",
                &[InArg::scalar("J.K. Rowling"), InArg::list([1, 2, 3])],
            )
            .unwrap();
        assert_eq!(authors.len(), 1, "style {style:?}");
    }
}

#[test]
fn test_named_query_from_record() {
    test_named_query_from_record_impl().unwrap();
}

fn test_named_query_from_record_impl() -> Result<()> {
    let store = create_test_db()?;
    let author_id = insert_author(&store, "J.K. Rowling", "jk.rowling@codeheim.io")?;
    for title in ["Philosopher's Stone", "Chamber of Secrets"] {
        store.exec(
            "INSERT INTO books (title, author_id) VALUES (?1, ?2)",
            &[title.into(), author_id.into()],
        )?;
    }

    let filter = Book {
        author_id: Some(author_id),
        ..Book::default()
    };
    let mut statement = store.prepare_named("SELECT * FROM books WHERE author_id=:author_id")?;
    assert_eq!(statement.names(), ["author_id"]);
    let books = statement
        .query::<Book, _>(&filter)?
        .collect::<Result<Vec<_>>>()?;
    assert_eq!(books.len(), 2);
    assert!(books.iter().all(|b| b.author_id == Some(author_id)));
    Ok(())
}

#[test]
fn test_named_query_from_map() {
    test_named_query_from_map_impl().unwrap();
}

fn test_named_query_from_map_impl() -> Result<()> {
    let store = create_test_db()?;
    insert_author(&store, "J.K. Rowling", "jk.rowling@codeheim.io")?;

    // Extra entries the template never mentions are ignored
    let params = Params::new()
        .with_value("name", "J.K. Rowling")
        .with_value("nickname", "Jo");
    let authors: Vec<Author> =
        store.named_select("SELECT * FROM authors WHERE name=:name", &params)?;
    assert_eq!(authors.len(), 1);

    let mut map = HashMap::new();
    map.insert("email".to_string(), Value::from("jk.rowling@codeheim.io"));
    let rows: Vec<HashMap<String, Value>> = store.named_select(
        "SELECT name, email FROM authors WHERE email=:email",
        &map,
    )?;
    assert_eq!(rows[0]["name"], Value::Text("J.K. Rowling".to_string()));
    Ok(())
}

#[test]
fn test_named_binding_requires_every_name() {
    let store = create_test_db().unwrap();
    insert_author(&store, "J.K. Rowling", "jk.rowling@codeheim.io").unwrap();

    let params = Params::new().with_value("email", "new.email@example.com");
    let err = store
        .named_exec("UPDATE authors SET email=:email WHERE id=:id", &params)
        .unwrap_err();
    assert!(matches!(err, Error::UnboundName { ref name } if name == "id"));

    let err = store
        .named_select::<Author, _>("SELECT * FROM authors WHERE email=:email", &Book::default())
        .unwrap_err();
    assert!(matches!(err, Error::UnboundName { ref name } if name == "email"));
}

#[test]
fn test_named_update_reports_rows_affected() {
    test_named_update_reports_rows_affected_impl().unwrap();
}

fn test_named_update_reports_rows_affected_impl() -> Result<()> {
    let store = create_test_db()?;
    let author_id = insert_author(&store, "J.K. Rowling", "jk.rowling@codeheim.io")?;
    let update = "UPDATE authors SET email=:email WHERE id=:id";

    let params = Params::new()
        .with_value("email", "new.email@example.com")
        .with_value("id", author_id);
    assert_eq!(store.named_exec(update, &params)?.rows_affected, 1);

    let params = Params::new()
        .with_value("email", "nobody@example.com")
        .with_value("id", author_id + 100);
    assert_eq!(store.named_exec(update, &params)?.rows_affected, 0);

    let author: Author = store.get("SELECT * FROM authors WHERE id = ?1", &[author_id.into()])?;
    assert_eq!(author.email, "new.email@example.com");
    Ok(())
}

#[test]
fn test_duplicate_email_is_rejected() {
    test_duplicate_email_is_rejected_impl().unwrap();
}

fn test_duplicate_email_is_rejected_impl() -> Result<()> {
    let store = create_test_db()?;
    insert_author(&store, "J.K. Rowling", "jk.rowling@codeheim.io")?;
    let err = insert_author(&store, "Robert Galbraith", "jk.rowling@codeheim.io").unwrap_err();
    assert!(matches!(err, Error::Constraint { .. }));

    let authors: Vec<Author> = store.select("SELECT * FROM authors", &[])?;
    assert_eq!(authors.len(), 1);
    assert_eq!(authors[0].name, "J.K. Rowling");

    store.named_exec(
        "INSERT INTO members (name, email) VALUES (:name, :email)",
        &Member::new("John Doe", "john.doe@example.com"),
    )?;
    let err = store
        .named_exec(
            "INSERT INTO members (name, email) VALUES (:name, :email)",
            &Member::new("Johnny", "john.doe@example.com"),
        )
        .unwrap_err();
    assert!(matches!(err, Error::Constraint { .. }));
    assert_eq!(count(&store, "members")?, 1);
    Ok(())
}

#[test]
fn test_book_must_reference_existing_author() {
    let store = create_test_db().unwrap();
    let err = store
        .exec(
            "INSERT INTO books (title, author_id) VALUES (?1, ?2)",
            &["Orphan".into(), 99.into()],
        )
        .unwrap_err();
    assert!(matches!(err, Error::Constraint { .. }));

    // An unset author is allowed
    store
        .exec(
            "INSERT INTO books (title, author_id) VALUES (?1, ?2)",
            &["Anonymous".into(), Value::Null],
        )
        .unwrap();
}

#[test]
fn test_batch_insert_members() {
    test_batch_insert_members_impl().unwrap();
}

fn test_batch_insert_members_impl() -> Result<()> {
    let store = create_test_db()?;
    store.exec(
        "INSERT INTO members (name, email, join_date) VALUES (?1, ?2, ?3)",
        &["John Doe".into(), "john.doe@example.com".into(), "2000-01-01".into()],
    )?;

    let members = [
        Member::new("Alice", "alice@example.com"),
        Member::new("Bob", "bob@example.com"),
        Member::new("Charlie", "charlie@example.com"),
    ];
    let result = store.named_exec_batch(
        "INSERT INTO members (name, email) VALUES (:name, :email)",
        &members,
    )?;
    assert_eq!(result.rows_affected, 3);

    let today: String = store.get("SELECT date('now')", &[])?;
    let all: Vec<Member> = store.select("SELECT * FROM members ORDER BY join_date, id", &[])?;
    let names: Vec<&str> = all.iter().map(|m| m.name.as_str()).collect();
    assert_eq!(names, vec!["John Doe", "Alice", "Bob", "Charlie"]);
    assert!(all[1..].iter().all(|m| m.join_date == today));
    Ok(())
}

#[test]
fn test_batch_stops_at_first_failure() {
    test_batch_stops_at_first_failure_impl().unwrap();
}

fn test_batch_stops_at_first_failure_impl() -> Result<()> {
    let mut store = create_test_db()?;
    let template = "INSERT INTO members (name, email) VALUES (:name, :email)";
    let members = [
        Member::new("Alice", "alice@example.com"),
        Member::new("Alice Again", "alice@example.com"),
        Member::new("Bob", "bob@example.com"),
    ];

    // Outside a transaction the records before the failure stay applied
    assert!(store.named_exec_batch(template, &members).is_err());
    assert_eq!(count(&store, "members")?, 1);

    // Inside one, abandoning it undoes the whole batch
    store.exec("DELETE FROM members", &[])?;
    {
        let tx = store.begin()?;
        assert!(tx.named_exec_batch(template, &members).is_err());
    }
    assert_eq!(count(&store, "members")?, 0);

    let empty: [Member; 0] = [];
    assert_eq!(store.named_exec_batch(template, &empty)?.rows_affected, 0);
    Ok(())
}

#[test]
fn test_transaction_visibility() {
    test_transaction_visibility_impl().unwrap();
}

fn test_transaction_visibility_impl() -> Result<()> {
    let (mut writer, temp_file) = create_temp_db()?;
    let reader = reopen(&temp_file)?;
    let lookup = "SELECT * FROM authors WHERE email = ?1";
    let email: Value = "george.martin@codeheim.io".into();

    let tx = writer.begin()?;
    insert_author(&tx, "George R.R. Martin", "george.martin@codeheim.io")?;
    // Visible inside the transaction, not outside it
    assert!(tx.get_optional::<Author>(lookup, &[email.clone()])?.is_some());
    assert!(reader.get_optional::<Author>(lookup, &[email.clone()])?.is_none());

    tx.commit()?;
    let author: Author = reader.get(lookup, &[email])?;
    assert_eq!(author.name, "George R.R. Martin");
    Ok(())
}

#[test]
fn test_rolled_back_transaction_leaves_nothing() {
    test_rolled_back_transaction_leaves_nothing_impl().unwrap();
}

fn test_rolled_back_transaction_leaves_nothing_impl() -> Result<()> {
    let mut store = create_test_db()?;

    let tx = store.begin()?;
    insert_author(&tx, "George R.R. Martin", "george.martin@codeheim.io")?;
    tx.rollback()?;
    assert_eq!(count(&store, "authors")?, 0);

    // Dropping without commit behaves the same
    {
        let tx = store.begin()?;
        insert_author(&tx, "George R.R. Martin", "george.martin@codeheim.io")?;
    }
    assert_eq!(count(&store, "authors")?, 0);
    Ok(())
}

#[test]
fn test_delete_member_by_email() {
    test_delete_member_by_email_impl().unwrap();
}

fn test_delete_member_by_email_impl() -> Result<()> {
    let store = create_test_db()?;
    store.named_exec_batch(
        "INSERT INTO members (name, email) VALUES (:name, :email)",
        &[
            Member::new("John Doe", "john.doe@example.com"),
            Member::new("Alice", "alice@example.com"),
        ],
    )?;

    let delete = store.rebind("DELETE FROM members WHERE email = ?");
    let result = store.exec(&delete, &["john.doe@example.com".into()])?;
    assert_eq!(result.rows_affected, 1);
    let result = store.exec(&delete, &["john.doe@example.com".into()])?;
    assert_eq!(result.rows_affected, 0);

    let remaining: Vec<Member> = store.select("SELECT * FROM members", &[])?;
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].name, "Alice");
    Ok(())
}

#[test]
fn test_schema_is_guarded_on_reopen() {
    let (store, temp_file) = create_temp_db().unwrap();
    insert_author(&store, "J.K. Rowling", "jk.rowling@codeheim.io").unwrap();
    store.close().unwrap();

    // Guarded: reopening keeps the data
    let store = reopen(&temp_file).unwrap();
    assert_eq!(count(&store, "authors").unwrap(), 1);
    store.close().unwrap();

    // Unguarded: re-creating the tables fails on the first one
    let path = temp_file.path().to_str().unwrap().to_string();
    let err = Store::open(SqliteConfig::new(path, library_schema()).with_guard_schema(false))
        .unwrap_err();
    assert!(matches!(err, Error::Schema { ref table, .. } if table == "authors"));
}

#[test]
fn test_open_reports_connection_error() {
    let err = Store::open(SqliteConfig::new(
        "/nonexistent-dir/for/sure/library.db",
        library_schema(),
    ))
    .unwrap_err();
    assert!(matches!(err, Error::Connection { .. }));
}
