//! Mock search store for testing.

use async_trait::async_trait;
use std::collections::{HashSet, VecDeque};
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::traits::{ColumnUpdate, SearchStore};
use crate::value::{Row, SqlValue};
use crate::{Error, Result};

/// A statement recorded by [`MockSearchStore`].
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedStatement {
    /// SQL text as issued.
    pub sql: String,
    /// Bound parameters, in placeholder order.
    pub params: Vec<SqlValue>,
}

enum Canned {
    Rows(Vec<Row>),
    Fail(String),
    Timeout(String),
}

#[derive(Default)]
struct MockState {
    canned: VecDeque<Canned>,
    statements: Vec<RecordedStatement>,
    updates: Vec<ColumnUpdate>,
}

/// In-memory [`SearchStore`] that records every call and replays canned
/// responses.
///
/// Column existence is answered from a fixed schema declared with
/// [`with_table`](Self::with_table). Each `execute` or `update_column` call
/// pops the next canned response (rows, failure or timeout); when none is
/// queued the call succeeds with no rows. `update_column` reports one
/// affected row unless the key was declared absent with
/// [`with_missing_key`](Self::with_missing_key).
///
/// Clones share recorded state.
#[derive(Clone, Default)]
pub struct MockSearchStore {
    columns: Arc<HashSet<(String, String)>>,
    missing_keys: Arc<Vec<SqlValue>>,
    state: Arc<Mutex<MockState>>,
}

impl MockSearchStore {
    /// Create a store with an empty schema.
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a table and its columns.
    pub fn with_table(mut self, table: &str, columns: &[&str]) -> Self {
        let schema = Arc::make_mut(&mut self.columns);
        for column in columns {
            schema.insert((table.to_string(), column.to_string()));
        }
        self
    }

    /// Declare a primary key with no row behind it.
    pub fn with_missing_key(mut self, key: impl Into<SqlValue>) -> Self {
        Arc::make_mut(&mut self.missing_keys).push(key.into());
        self
    }

    /// Queue rows for the next call.
    pub async fn push_rows(&self, rows: Vec<Row>) {
        self.state.lock().await.canned.push_back(Canned::Rows(rows));
    }

    /// Make the next call fail with a store error.
    pub async fn fail_next(&self, message: impl Into<String>) {
        self.state
            .lock()
            .await
            .canned
            .push_back(Canned::Fail(message.into()));
    }

    /// Make the next call fail with a store timeout.
    pub async fn timeout_next(&self, message: impl Into<String>) {
        self.state
            .lock()
            .await
            .canned
            .push_back(Canned::Timeout(message.into()));
    }

    /// Statements issued through `execute`, oldest first.
    pub async fn statements(&self) -> Vec<RecordedStatement> {
        self.state.lock().await.statements.clone()
    }

    /// Updates issued through `update_column`, oldest first.
    pub async fn updates(&self) -> Vec<ColumnUpdate> {
        self.state.lock().await.updates.clone()
    }

    /// Forget recorded calls and queued responses.
    pub async fn reset(&self) {
        *self.state.lock().await = MockState::default();
    }

    fn replay(canned: Option<Canned>) -> Result<Vec<Row>> {
        match canned {
            None => Ok(Vec::new()),
            Some(Canned::Rows(rows)) => Ok(rows),
            Some(Canned::Fail(msg)) => Err(Error::store(msg)),
            Some(Canned::Timeout(msg)) => Err(Error::timeout(msg)),
        }
    }
}

#[async_trait]
impl SearchStore for MockSearchStore {
    async fn column_exists(&self, table: &str, column: &str) -> Result<bool> {
        Ok(self
            .columns
            .contains(&(table.to_string(), column.to_string())))
    }

    async fn execute(&self, sql: &str, params: &[SqlValue]) -> Result<Vec<Row>> {
        let mut state = self.state.lock().await;
        state.statements.push(RecordedStatement {
            sql: sql.to_string(),
            params: params.to_vec(),
        });
        let canned = state.canned.pop_front();
        Self::replay(canned)
    }

    async fn update_column(&self, update: &ColumnUpdate) -> Result<u64> {
        let mut state = self.state.lock().await;
        state.updates.push(update.clone());
        let canned = state.canned.pop_front();
        let affected = u64::from(!self.missing_keys.contains(&update.primary_key));
        Self::replay(canned).map(|_| affected)
    }

    fn name(&self) -> &str {
        "mock"
    }
}
