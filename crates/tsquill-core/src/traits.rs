//! Collaborator traits at the seam between tsquill and the host application.
//!
//! tsquill never owns a database connection or a record lifecycle. The host
//! implements [`SearchStore`] over whatever driver it uses, and invokes the
//! [`SaveCallback`] tsquill hands it whenever a record is inserted or
//! updated.

use async_trait::async_trait;

use crate::value::{Row, SqlValue};
use crate::Result;

/// A single-record UPDATE that stores a generated vector value.
///
/// `expression` is SQL produced by tsquill's expression builder (never user
/// input); the store splices it into
/// `UPDATE <table> SET <column> = <expression> WHERE <primary_key_column> = $1
/// RETURNING <primary_key_column>` and binds `primary_key`.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnUpdate {
    /// Table holding the record.
    pub table: String,
    /// Name of the primary-key column.
    pub primary_key_column: String,
    /// Primary-key value of the record.
    pub primary_key: SqlValue,
    /// Column receiving the value.
    pub column: String,
    /// SQL expression computing the value.
    pub expression: String,
}

impl ColumnUpdate {
    /// Render the UPDATE statement with `$1` as the primary-key placeholder.
    ///
    /// The statement returns the key of each updated row, so running it
    /// through [`SearchStore::execute`] yields one row per affected record.
    pub fn to_sql(&self) -> String {
        format!(
            "UPDATE {table} SET {column} = {expr} WHERE {table}.{pk} = $1 RETURNING {table}.{pk}",
            table = self.table,
            column = self.column,
            expr = self.expression,
            pk = self.primary_key_column,
        )
    }
}

/// Persistence collaborator used by configuration, synchronization and
/// search.
///
/// Implementations must report every driver failure (including statement
/// timeouts) as an error; tsquill propagates them unchanged and never
/// retries.
///
/// # Thread Safety
///
/// The trait requires `Send + Sync` so a single store can be shared behind
/// an `Arc` by the synchronizer and the executor.
#[async_trait]
pub trait SearchStore: Send + Sync {
    /// Whether `table` has a column named `column`.
    async fn column_exists(&self, table: &str, column: &str) -> Result<bool>;

    /// Run a statement with positional `$n` parameters and return its rows.
    ///
    /// Statements without a result set return an empty vector.
    async fn execute(&self, sql: &str, params: &[SqlValue]) -> Result<Vec<Row>>;

    /// Run a single-record UPDATE and return the number of affected rows.
    ///
    /// The default implementation runs [`ColumnUpdate::to_sql`] through
    /// [`execute`](Self::execute) and counts the returned keys.
    async fn update_column(&self, update: &ColumnUpdate) -> Result<u64> {
        let rows = self
            .execute(&update.to_sql(), std::slice::from_ref(&update.primary_key))
            .await?;
        Ok(rows.len() as u64)
    }

    /// The store name for diagnostics.
    fn name(&self) -> &str;
}

/// Hook the host record lifecycle calls after a record is saved.
///
/// Returns the number of vectors that were refreshed for the record.
#[async_trait]
pub trait SaveCallback: Send + Sync {
    /// Notify tsquill that `primary_key` of `entity` was inserted or updated.
    async fn after_save(&self, entity: &str, primary_key: &SqlValue) -> Result<usize>;
}
