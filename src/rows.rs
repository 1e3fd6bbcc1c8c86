//! Decoding result rows into Rust values.

use crate::error::{Error, Result};
use crate::sqlite::Value;
use std::collections::HashMap;
use std::marker::PhantomData;

/// A type that can be built from one result row
pub trait FromRow: Sized {
    fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self>;
}

impl FromRow for i64 {
    fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        row.get(0)
    }
}

impl FromRow for String {
    fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        row.get(0)
    }
}

impl FromRow for Value {
    fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        row.get(0)
    }
}

/// Every column, keyed by its result name
impl FromRow for HashMap<String, Value> {
    fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        let statement = row.as_ref();
        let mut map = HashMap::with_capacity(statement.column_count());
        for index in 0..statement.column_count() {
            let name = statement.column_name(index)?;
            map.insert(name.to_string(), row.get(index)?);
        }
        Ok(map)
    }
}

/// Forward-only cursor over a running query.
///
/// Rows are fetched and decoded one at a time as the cursor advances. Once it
/// returns `None` it stays exhausted. A row that fails to decode yields
/// [`Error::Decode`] and the cursor can still be advanced past it.
pub struct RowCursor<'stmt, T> {
    rows: rusqlite::Rows<'stmt>,
    _record: PhantomData<fn() -> T>,
}

impl<'stmt, T> RowCursor<'stmt, T> {
    pub(crate) fn new(rows: rusqlite::Rows<'stmt>) -> Self {
        Self {
            rows,
            _record: PhantomData,
        }
    }
}

impl<T: FromRow> Iterator for RowCursor<'_, T> {
    type Item = Result<T>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.rows.next() {
            Ok(Some(row)) => Some(T::from_row(row).map_err(Error::decode::<T>)),
            Ok(None) => None,
            Err(err) => Some(Err(err.into())),
        }
    }
}

/// Declare how a struct maps to columns and named parameters.
///
/// Each `field => "column"` pair is used both ways: decoding reads the
/// column by name into the field, and named binding resolves `:column` to
/// the field's current value. Every field of the struct must be listed.
///
/// ```
/// use sqlite_tour::record;
///
/// #[derive(Debug, Default)]
/// struct Tag {
///     id: i64,
///     label: Option<String>,
/// }
///
/// record!(Tag {
///     id => "id",
///     label => "label",
/// });
/// ```
#[macro_export]
macro_rules! record {
    ($ty:ty { $($field:ident => $column:literal),+ $(,)? }) => {
        impl $crate::rows::FromRow for $ty {
            fn from_row(row: &$crate::rusqlite::Row<'_>) -> $crate::rusqlite::Result<Self> {
                Ok(Self {
                    $($field: row.get($column)?,)+
                })
            }
        }

        impl $crate::binding::NamedArgs for $ty {
            fn arg(&self, name: &str) -> Option<$crate::sqlite::Value> {
                match name {
                    $($column => Some($crate::sqlite::Value::from(self.$field.clone())),)+
                    _ => None,
                }
            }
        }
    };
}
