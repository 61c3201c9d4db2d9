//! The hosted backend as seen from this crate: filtered table reads and
//! single-row writes, user lookup, and blob storage.

mod memory;
mod rest;

pub use memory::{MemoryBackend, ReadGate};
pub use rest::RestBackend;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Result;

/// A raw backend row. Column names are backend names, not model names.
pub type Row = serde_json::Map<String, Value>;

#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    Eq(String, Value),
    In(String, Vec<Value>),
}

impl Filter {
    pub fn eq(column: &str, value: impl Into<Value>) -> Self {
        Filter::Eq(column.to_string(), value.into())
    }

    pub fn is_in<V: Into<Value>>(column: &str, values: impl IntoIterator<Item = V>) -> Self {
        Filter::In(
            column.to_string(),
            values.into_iter().map(Into::into).collect(),
        )
    }

    pub fn column(&self) -> &str {
        match self {
            Filter::Eq(column, _) | Filter::In(column, _) => column,
        }
    }

    pub fn matches(&self, row: &Row) -> bool {
        match self {
            Filter::Eq(column, value) => row.get(column).is_some_and(|v| values_equal(v, value)),
            Filter::In(column, values) => row
                .get(column)
                .is_some_and(|v| values.iter().any(|candidate| values_equal(v, candidate))),
        }
    }
}

/// Numbers compare by value so `1` and `1.0` match, everything else structurally.
fn values_equal(a: &Value, b: &Value) -> bool {
    match (a.as_f64(), b.as_f64()) {
        (Some(x), Some(y)) => x == y,
        _ => a == b,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    pub column: String,
    pub ascending: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Select {
    pub table: String,
    pub columns: Vec<String>,
    pub filters: Vec<Filter>,
    pub order: Option<Order>,
    pub limit: Option<usize>,
}

impl Select {
    pub fn table(table: &str) -> Self {
        Self {
            table: table.to_string(),
            columns: Vec::new(),
            filters: Vec::new(),
            order: None,
            limit: None,
        }
    }

    pub fn columns(mut self, columns: &[&str]) -> Self {
        self.columns = columns.iter().map(|c| c.to_string()).collect();
        self
    }

    pub fn filter(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn eq(self, column: &str, value: impl Into<Value>) -> Self {
        self.filter(Filter::eq(column, value))
    }

    pub fn order_by(mut self, column: &str, ascending: bool) -> Self {
        self.order = Some(Order {
            column: column.to_string(),
            ascending,
        });
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: String,
    pub email: Option<String>,
}

#[async_trait]
pub trait RemoteBackend: Send + Sync {
    async fn select(&self, query: &Select) -> Result<Vec<Row>>;

    async fn insert(&self, table: &str, row: Row) -> Result<()>;

    /// Apply `patch` to every row matching `filters`, returning the updated rows.
    async fn update(&self, table: &str, filters: &[Filter], patch: Row) -> Result<Vec<Row>>;

    /// Insert `row`, or merge its columns into the row whose `on_conflict`
    /// column holds the same value.
    async fn upsert(&self, table: &str, row: Row, on_conflict: &str) -> Result<()>;

    async fn delete(&self, table: &str, filters: &[Filter]) -> Result<()>;

    /// Resolve an access token to its user; `None` when the token has no session.
    async fn get_user(&self, access_token: &str) -> Result<Option<AuthUser>>;

    async fn delete_user(&self, user_id: &str) -> Result<()>;

    async fn upload(&self, bucket: &str, path: &str, bytes: Vec<u8>, content_type: &str)
        -> Result<()>;

    fn public_url(&self, bucket: &str, path: &str) -> String;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(value: Value) -> Row {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn eq_filter_matches_numbers_by_value() {
        let r = row(json!({"id": 1, "name": "Mathematics"}));
        assert!(Filter::eq("id", 1).matches(&r));
        assert!(Filter::eq("id", 1.0).matches(&r));
        assert!(!Filter::eq("id", 2).matches(&r));
        assert!(!Filter::eq("missing", 1).matches(&r));
    }

    #[test]
    fn in_filter_matches_any_member() {
        let r = row(json!({"quiz_id": 7}));
        assert!(Filter::is_in("quiz_id", [3, 7]).matches(&r));
        assert!(!Filter::is_in("quiz_id", Vec::<i64>::new()).matches(&r));
    }
}
