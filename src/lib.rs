//! SQLite parameter binding, transactions and batch execution.
//!
//! # Intention
//!
//! - Show every way a statement template can receive its arguments:
//!   positional, IN-list expansion, named from a map, named from a record,
//!   and named over a batch of records.
//! - Keep the store an explicit object with an open/close lifecycle.
//!
//! # Architectural Boundaries
//!
//! - `binding` only rewrites SQL text and resolves names; it never touches a connection.
//! - `sqlite` owns the connection and the schema; `executor` owns running statements.
//! - The library records in `library` are data, not behaviour.

pub mod binding;
pub mod error;
pub mod executor;
pub mod library;
pub mod rows;
pub mod sqlite;
pub mod transaction;

pub use binding::{BindStyle, InArg, NamedArgs, NamedQuery};
pub use error::{Error, Result};
pub use executor::{ExecResult, Executor, NamedStatement, Statement};
pub use rows::{FromRow, RowCursor};
pub use sqlite::{Params, SqliteConfig, Store, Value};
pub use transaction::Tx;

#[doc(hidden)]
pub use rusqlite;
