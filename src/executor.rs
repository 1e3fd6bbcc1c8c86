//! Statement execution shared by the store and its transactions.

use crate::binding::{self, BindStyle, InArg, NamedArgs, NamedQuery};
use crate::error::{Error, Result};
use crate::rows::{FromRow, RowCursor};
use crate::sqlite::Value;
use rusqlite::{params_from_iter, CachedStatement, Connection};
use serde::Serialize;
use std::fmt;
use tracing::debug;

/// Outcome of a mutation
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ExecResult {
    pub rows_affected: usize,
    /// Rowid of the most recent successful insert on this connection
    pub last_insert_id: i64,
}

impl fmt::Display for ExecResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "rows affected: {}, last insert id: {}",
            self.rows_affected, self.last_insert_id
        )
    }
}

/// A prepared statement bound to positional arguments.
///
/// Statements come from the connection's statement cache, so preparing the
/// same SQL twice reuses the compiled form.
pub struct Statement<'conn> {
    connection: &'conn Connection,
    inner: CachedStatement<'conn>,
}

impl<'conn> Statement<'conn> {
    /// Number of parameters the statement expects
    pub fn parameter_count(&self) -> usize {
        self.inner.parameter_count()
    }

    fn check_arity(&self, args: &[Value]) -> Result<()> {
        let expected = self.parameter_count();
        if expected != args.len() {
            return Err(Error::Arity {
                expected,
                actual: args.len(),
            });
        }
        Ok(())
    }

    pub fn execute(&mut self, args: &[Value]) -> Result<ExecResult> {
        self.check_arity(args)?;
        let rows_affected = self.inner.execute(params_from_iter(args))?;
        Ok(ExecResult {
            rows_affected,
            last_insert_id: self.connection.last_insert_rowid(),
        })
    }

    /// Start the query and return a lazy cursor over its rows
    pub fn query<T: FromRow>(&mut self, args: &[Value]) -> Result<RowCursor<'_, T>> {
        self.check_arity(args)?;
        let rows = self.inner.query(params_from_iter(args))?;
        Ok(RowCursor::new(rows))
    }

    /// First row, or [`Error::NotFound`] when there is none
    pub fn query_row<T: FromRow>(&mut self, args: &[Value]) -> Result<T> {
        self.query_optional(args)?.ok_or(Error::NotFound)
    }

    pub fn query_optional<T: FromRow>(&mut self, args: &[Value]) -> Result<Option<T>> {
        self.query::<T>(args)?.next().transpose()
    }
}

/// A prepared statement whose parameters are bound by name
pub struct NamedStatement<'conn> {
    query: NamedQuery,
    statement: Statement<'conn>,
}

impl<'conn> NamedStatement<'conn> {
    pub fn names(&self) -> &[String] {
        self.query.names()
    }

    pub fn execute<S: NamedArgs + ?Sized>(&mut self, source: &S) -> Result<ExecResult> {
        let args = self.query.bind(source)?;
        self.statement.execute(&args)
    }

    pub fn query<T: FromRow, S: NamedArgs + ?Sized>(
        &mut self,
        source: &S,
    ) -> Result<RowCursor<'_, T>> {
        let args = self.query.bind(source)?;
        self.statement.query(&args)
    }
}

/// Query and mutation surface shared by [`Store`](crate::Store) and
/// [`Tx`](crate::Tx).
///
/// Implementors only supply the connection and their marker style.
pub trait Executor {
    fn connection(&self) -> &Connection;

    fn bind_style(&self) -> BindStyle;

    /// Rewrite bare `?` markers into this store's style
    fn rebind(&self, sql: &str) -> String {
        binding::rebind(self.bind_style(), sql)
    }

    fn prepare(&self, sql: &str) -> Result<Statement<'_>> {
        let connection = self.connection();
        let inner = connection.prepare_cached(sql)?;
        Ok(Statement { connection, inner })
    }

    fn prepare_named(&self, template: &str) -> Result<NamedStatement<'_>> {
        let query = NamedQuery::compile(template, self.bind_style());
        let statement = self.prepare(query.sql())?;
        Ok(NamedStatement { query, statement })
    }

    /// Run a mutation with positional arguments
    fn exec(&self, sql: &str, args: &[Value]) -> Result<ExecResult> {
        debug!(%sql, args = args.len(), "exec");
        self.prepare(sql)?.execute(args)
    }

    /// Exactly one record; [`Error::NotFound`] when nothing matches
    fn get<T: FromRow>(&self, sql: &str, args: &[Value]) -> Result<T> {
        debug!(%sql, args = args.len(), "get");
        self.prepare(sql)?.query_row(args)
    }

    fn get_optional<T: FromRow>(&self, sql: &str, args: &[Value]) -> Result<Option<T>> {
        debug!(%sql, args = args.len(), "get_optional");
        self.prepare(sql)?.query_optional(args)
    }

    /// All matching records, stopping at the first row that fails to decode
    fn select<T: FromRow>(&self, sql: &str, args: &[Value]) -> Result<Vec<T>> {
        debug!(%sql, args = args.len(), "select");
        let mut statement = self.prepare(sql)?;
        let rows: Result<Vec<T>> = statement.query::<T>(args)?.collect();
        rows
    }

    /// Expand list arguments and rebind; run the result with [`Executor::prepare`]
    fn in_query(&self, template: &str, args: &[InArg]) -> Result<(String, Vec<Value>)> {
        let (sql, values) = binding::expand_in(template, args)?;
        Ok((self.rebind(&sql), values))
    }

    fn select_in<T: FromRow>(&self, template: &str, args: &[InArg]) -> Result<Vec<T>> {
        let (sql, values) = self.in_query(template, args)?;
        self.select(&sql, &values)
    }

    fn named_exec<S: NamedArgs + ?Sized>(&self, template: &str, source: &S) -> Result<ExecResult> {
        debug!(%template, "named_exec");
        self.prepare_named(template)?.execute(source)
    }

    fn named_select<T: FromRow, S: NamedArgs + ?Sized>(
        &self,
        template: &str,
        source: &S,
    ) -> Result<Vec<T>> {
        debug!(%template, "named_select");
        let mut statement = self.prepare_named(template)?;
        let rows: Result<Vec<T>> = statement.query::<T, S>(source)?.collect();
        rows
    }

    /// Execute `template` once per record.
    ///
    /// Stops at the first failing record. Records before it stay applied
    /// unless the batch runs inside a [`Tx`](crate::Tx) that is then dropped.
    fn named_exec_batch<S: NamedArgs>(&self, template: &str, records: &[S]) -> Result<ExecResult> {
        let mut statement = self.prepare_named(template)?;
        let mut total = ExecResult::default();
        for record in records {
            let result = statement.execute(record)?;
            total.rows_affected += result.rows_affected;
            total.last_insert_id = result.last_insert_id;
        }
        debug!(%template, records = records.len(), rows = total.rows_affected, "named_exec_batch");
        Ok(total)
    }
}
