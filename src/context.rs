//! Application-scoped context shared across request handlers.

use std::sync::Arc;

use crate::store::ReviewStore;

/// Names of the reviews table and its rating-ordered local secondary index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewTable {
    pub table_name: String,
    pub rating_index: String,
}

impl ReviewTable {
    pub fn new(table_name: impl Into<String>, rating_index: impl Into<String>) -> Self {
        Self {
            table_name: table_name.into(),
            rating_index: rating_index.into(),
        }
    }
}

/// Holds the store handle and table layout. Built once per process and never mutated.
#[derive(Clone)]
pub struct AppContext {
    store: Arc<dyn ReviewStore>,
    table: ReviewTable,
}

impl AppContext {
    pub fn new(store: Arc<dyn ReviewStore>, table: ReviewTable) -> Self {
        Self { store, table }
    }

    /// Borrow the review store.
    pub fn store(&self) -> &dyn ReviewStore {
        self.store.as_ref()
    }

    pub fn table(&self) -> &ReviewTable {
        &self.table
    }

    /// Name of the DynamoDB table the handlers operate on.
    pub fn table_name(&self) -> &str {
        &self.table.table_name
    }
}
