use crate::binding::BindStyle;
use crate::error::Result;
use crate::executor::Executor;
use rusqlite::{Connection, Transaction};
use tracing::debug;

/// A transaction on the store's connection.
///
/// Statements run through it are visible to other connections only after
/// [`Tx::commit`]. Dropping the handle without committing rolls back.
pub struct Tx<'conn> {
    inner: Transaction<'conn>,
    bind_style: BindStyle,
}

impl<'conn> Tx<'conn> {
    pub(crate) fn new(inner: Transaction<'conn>, bind_style: BindStyle) -> Self {
        Self { inner, bind_style }
    }

    pub fn commit(self) -> Result<()> {
        self.inner.commit()?;
        debug!("transaction committed");
        Ok(())
    }

    pub fn rollback(self) -> Result<()> {
        self.inner.rollback()?;
        debug!("transaction rolled back");
        Ok(())
    }
}

impl Executor for Tx<'_> {
    fn connection(&self) -> &Connection {
        &self.inner
    }

    fn bind_style(&self) -> BindStyle {
        self.bind_style
    }
}
