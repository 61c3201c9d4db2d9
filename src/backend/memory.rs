use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::{OwnedRwLockWriteGuard, RwLock};

use super::{AuthUser, Filter, RemoteBackend, Row, Select};
use crate::error::{AppError, Result};

const PUBLIC_URL_BASE: &str = "memory://storage";

#[derive(Default)]
struct State {
    tables: HashMap<String, Vec<Row>>,
    next_id: i64,
    sessions: HashMap<String, AuthUser>,
    users: HashSet<String>,
    blobs: HashMap<String, Vec<u8>>,
    failing_tables: HashSet<String>,
    fail_uploads: bool,
    fail_user_deletes: bool,
}

/// Holds every read on a `MemoryBackend` until dropped.
pub struct ReadGate {
    _guard: OwnedRwLockWriteGuard<()>,
}

/// In-process backend with the same contract as the hosted one. Rows get
/// integer ids when inserted without one.
#[derive(Clone, Default)]
pub struct MemoryBackend {
    state: Arc<Mutex<State>>,
    gate: Arc<RwLock<()>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, State>> {
        self.state
            .lock()
            .map_err(|_| AppError::Other(anyhow::anyhow!("memory backend lock poisoned")))
    }

    fn check_table(state: &State, table: &str) -> Result<()> {
        if state.failing_tables.contains(table) {
            return Err(AppError::Backend {
                status: 503,
                message: format!("table {} unavailable", table),
            });
        }
        Ok(())
    }

    fn assign_id(state: &mut State, row: &mut Row) {
        if !row.contains_key("id") {
            state.next_id += 1;
            row.insert("id".to_string(), Value::from(state.next_id));
        }
    }

    /// Insert a row directly, bypassing failure injection. Returns the row's id.
    pub fn seed(&self, table: &str, value: Value) -> Value {
        let Value::Object(mut row) = value else {
            tracing::warn!("Ignoring non-object seed row for {}", table);
            return Value::Null;
        };
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        Self::assign_id(&mut state, &mut row);
        let id = row.get("id").cloned().unwrap_or(Value::Null);
        state.tables.entry(table.to_string()).or_default().push(row);
        id
    }

    /// Register a user and make `access_token` resolve to them.
    pub fn sign_in(&self, access_token: &str, user: AuthUser) {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state.users.insert(user.id.clone());
        state.sessions.insert(access_token.to_string(), user);
    }

    pub fn rows(&self, table: &str) -> Vec<Row> {
        let state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state.tables.get(table).cloned().unwrap_or_default()
    }

    pub fn user_exists(&self, user_id: &str) -> bool {
        let state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state.users.contains(user_id)
    }

    pub fn blob(&self, bucket: &str, path: &str) -> Option<Vec<u8>> {
        let state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state.blobs.get(&format!("{}/{}", bucket, path)).cloned()
    }

    pub fn fail_table(&self, table: &str, failing: bool) {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        if failing {
            state.failing_tables.insert(table.to_string());
        } else {
            state.failing_tables.remove(table);
        }
    }

    pub fn fail_uploads(&self, failing: bool) {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state.fail_uploads = failing;
    }

    pub fn fail_user_deletes(&self, failing: bool) {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state.fail_user_deletes = failing;
    }

    /// Block reads until the returned gate is dropped.
    pub async fn hold_reads(&self) -> ReadGate {
        ReadGate {
            _guard: Arc::clone(&self.gate).write_owned().await,
        }
    }
}

/// Numbers, then strings, then anything else; missing and null sort last.
fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    fn rank(v: Option<&Value>) -> u8 {
        match v {
            Some(Value::Number(_)) => 0,
            Some(Value::String(_)) => 1,
            Some(Value::Null) | None => 3,
            Some(_) => 2,
        }
    }
    match (a, b) {
        (Some(Value::Number(x)), Some(Value::Number(y))) => {
            let (x, y) = (x.as_f64().unwrap_or(0.0), y.as_f64().unwrap_or(0.0));
            x.total_cmp(&y)
        }
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        _ => rank(a).cmp(&rank(b)),
    }
}

fn project(row: &Row, columns: &[String]) -> Row {
    if columns.is_empty() {
        return row.clone();
    }
    columns
        .iter()
        .filter_map(|c| row.get(c).map(|v| (c.clone(), v.clone())))
        .collect()
}

#[async_trait]
impl RemoteBackend for MemoryBackend {
    async fn select(&self, query: &Select) -> Result<Vec<Row>> {
        let _open = self.gate.read().await;
        let state = self.lock()?;
        Self::check_table(&state, &query.table)?;

        let mut rows: Vec<&Row> = state
            .tables
            .get(&query.table)
            .map(|rows| {
                rows.iter()
                    .filter(|row| query.filters.iter().all(|f| f.matches(row)))
                    .collect()
            })
            .unwrap_or_default();

        if let Some(order) = &query.order {
            rows.sort_by(|a, b| {
                let ord = compare_values(a.get(&order.column), b.get(&order.column));
                if order.ascending {
                    ord
                } else {
                    ord.reverse()
                }
            });
        }

        let limit = query.limit.unwrap_or(usize::MAX);
        Ok(rows
            .into_iter()
            .take(limit)
            .map(|row| project(row, &query.columns))
            .collect())
    }

    async fn insert(&self, table: &str, mut row: Row) -> Result<()> {
        let mut state = self.lock()?;
        Self::check_table(&state, table)?;
        Self::assign_id(&mut state, &mut row);
        state.tables.entry(table.to_string()).or_default().push(row);
        Ok(())
    }

    async fn update(&self, table: &str, filters: &[Filter], patch: Row) -> Result<Vec<Row>> {
        let mut state = self.lock()?;
        Self::check_table(&state, table)?;

        let mut updated = Vec::new();
        if let Some(rows) = state.tables.get_mut(table) {
            for row in rows.iter_mut().filter(|row| filters.iter().all(|f| f.matches(row))) {
                for (key, value) in &patch {
                    row.insert(key.clone(), value.clone());
                }
                updated.push(row.clone());
            }
        }
        Ok(updated)
    }

    async fn upsert(&self, table: &str, row: Row, on_conflict: &str) -> Result<()> {
        let mut state = self.lock()?;
        Self::check_table(&state, table)?;

        let key = row.get(on_conflict).cloned().ok_or_else(|| AppError::Backend {
            status: 400,
            message: format!("upsert row is missing conflict column {}", on_conflict),
        })?;
        let conflict = Filter::Eq(on_conflict.to_string(), key);

        let rows = state.tables.entry(table.to_string()).or_default();
        if let Some(existing) = rows.iter_mut().find(|r| conflict.matches(r)) {
            for (column, value) in row {
                existing.insert(column, value);
            }
            return Ok(());
        }

        let mut row = row;
        Self::assign_id(&mut state, &mut row);
        state.tables.entry(table.to_string()).or_default().push(row);
        Ok(())
    }

    async fn delete(&self, table: &str, filters: &[Filter]) -> Result<()> {
        let mut state = self.lock()?;
        Self::check_table(&state, table)?;
        if let Some(rows) = state.tables.get_mut(table) {
            rows.retain(|row| !filters.iter().all(|f| f.matches(row)));
        }
        Ok(())
    }

    async fn get_user(&self, access_token: &str) -> Result<Option<AuthUser>> {
        let state = self.lock()?;
        Ok(state
            .sessions
            .get(access_token)
            .filter(|user| state.users.contains(&user.id))
            .cloned())
    }

    async fn delete_user(&self, user_id: &str) -> Result<()> {
        let mut state = self.lock()?;
        if state.fail_user_deletes {
            return Err(AppError::Auth(format!("could not delete user {}", user_id)));
        }
        if !state.users.remove(user_id) {
            return Err(AppError::NotFound);
        }
        Ok(())
    }

    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        bytes: Vec<u8>,
        _content_type: &str,
    ) -> Result<()> {
        let mut state = self.lock()?;
        if state.fail_uploads {
            return Err(AppError::Storage(format!("upload of {} rejected", path)));
        }
        let key = format!("{}/{}", bucket, path);
        if state.blobs.contains_key(&key) {
            return Err(AppError::Storage(format!("{} already exists", key)));
        }
        state.blobs.insert(key, bytes);
        Ok(())
    }

    fn public_url(&self, bucket: &str, path: &str) -> String {
        format!("{}/{}/{}", PUBLIC_URL_BASE, bucket, path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn select_orders_limits_and_projects() {
        let backend = MemoryBackend::new();
        backend.seed("attempts", json!({"user_id": "u", "completed": "2024-01-01T00:00:00Z"}));
        backend.seed("attempts", json!({"user_id": "u", "completed": "2024-03-01T00:00:00Z"}));
        backend.seed("attempts", json!({"user_id": "v", "completed": "2024-05-01T00:00:00Z"}));

        let rows = backend
            .select(
                &Select::table("attempts")
                    .columns(&["completed"])
                    .eq("user_id", "u")
                    .order_by("completed", false)
                    .limit(1),
            )
            .await
            .unwrap();

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get("completed"), Some(&json!("2024-03-01T00:00:00Z")));
        assert!(rows[0].get("user_id").is_none());
    }

    #[tokio::test]
    async fn upsert_merges_into_existing_row() {
        let backend = MemoryBackend::new();
        let first = json!({"user_id": "u", "a": 1, "b": 2});
        let second = json!({"user_id": "u", "b": 3});

        backend
            .upsert("settings", first.as_object().cloned().unwrap(), "user_id")
            .await
            .unwrap();
        backend
            .upsert("settings", second.as_object().cloned().unwrap(), "user_id")
            .await
            .unwrap();

        let rows = backend.rows("settings");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get("a"), Some(&json!(1)));
        assert_eq!(rows[0].get("b"), Some(&json!(3)));
    }

    #[tokio::test]
    async fn failing_table_rejects_reads() {
        let backend = MemoryBackend::new();
        backend.fail_table("subjects", true);
        let result = backend.select(&Select::table("subjects")).await;
        assert!(matches!(result, Err(AppError::Backend { status: 503, .. })));
    }
}
