use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use url::Url;

use super::{AuthUser, Filter, RemoteBackend, Row, Select};
use crate::config::Config;
use crate::error::{AppError, Result};

const REST_PATH: &str = "rest/v1";
const AUTH_PATH: &str = "auth/v1";
const STORAGE_PATH: &str = "storage/v1";

#[derive(Debug, Deserialize)]
struct UserResponse {
    id: String,
    email: Option<String>,
}

/// Talks to the hosted backend over its REST surface: table rows through
/// PostgREST, identities through the auth API, blobs through storage.
pub struct RestBackend {
    client: Client,
    base_url: Url,
    anon_key: Option<String>,
    service_role_key: Option<String>,
    access_token: Option<String>,
}

impl RestBackend {
    pub fn new(config: &Config) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent("study-dashboard/1.0")
            .build()?;

        // Trailing slash so `join` appends instead of replacing the last segment.
        let mut base = config.backend_url.trim_end_matches('/').to_string();
        base.push('/');
        let base_url = Url::parse(&base)?;

        Ok(Self {
            client,
            base_url,
            anon_key: config.anon_key.clone(),
            service_role_key: config.service_role_key.clone(),
            access_token: config.access_token.clone(),
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        Ok(self.base_url.join(path)?)
    }

    fn table_url(&self, table: &str) -> Result<Url> {
        self.endpoint(&format!("{}/{}", REST_PATH, urlencoding::encode(table)))
    }

    /// Attach the project key and the caller's bearer token (user session
    /// first, then the anon key).
    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        let request = match &self.anon_key {
            Some(key) => request.header("apikey", key),
            None => request,
        };
        match self.access_token.as_ref().or(self.anon_key.as_ref()) {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn check(response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let message = response.text().await.unwrap_or_default();
        tracing::debug!("Backend request failed: {} {}", status, message);
        Err(AppError::Backend {
            status: status.as_u16(),
            message,
        })
    }
}

/// Render a value the way PostgREST expects it inside a filter operand.
fn filter_operand(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => "null".to_string(),
        other => other.to_string(),
    }
}

fn list_operand(value: &Value) -> String {
    let raw = filter_operand(value);
    if raw.contains([',', '(', ')', '"']) {
        format!("\"{}\"", raw.replace('"', "\\\""))
    } else {
        raw
    }
}

fn filter_pair(filter: &Filter) -> (String, String) {
    match filter {
        Filter::Eq(column, value) => (column.clone(), format!("eq.{}", filter_operand(value))),
        Filter::In(column, values) => {
            let members: Vec<String> = values.iter().map(list_operand).collect();
            (column.clone(), format!("in.({})", members.join(",")))
        }
    }
}

/// Build the PostgREST query string for a read.
pub(crate) fn select_url(mut url: Url, query: &Select) -> Url {
    {
        let mut pairs = url.query_pairs_mut();
        let columns = if query.columns.is_empty() {
            "*".to_string()
        } else {
            query.columns.join(",")
        };
        pairs.append_pair("select", &columns);
        for filter in &query.filters {
            let (column, operand) = filter_pair(filter);
            pairs.append_pair(&column, &operand);
        }
        if let Some(order) = &query.order {
            let direction = if order.ascending { "asc" } else { "desc" };
            pairs.append_pair("order", &format!("{}.{}", order.column, direction));
        }
        if let Some(limit) = query.limit {
            pairs.append_pair("limit", &limit.to_string());
        }
    }
    url
}

fn filtered_url(mut url: Url, filters: &[Filter]) -> Url {
    {
        let mut pairs = url.query_pairs_mut();
        for filter in filters {
            let (column, operand) = filter_pair(filter);
            pairs.append_pair(&column, &operand);
        }
    }
    url
}

fn encode_object_path(path: &str) -> String {
    path.split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

#[async_trait]
impl RemoteBackend for RestBackend {
    async fn select(&self, query: &Select) -> Result<Vec<Row>> {
        let url = select_url(self.table_url(&query.table)?, query);
        tracing::debug!("select {} ({} filters)", query.table, query.filters.len());

        let response = self.authorize(self.client.get(url)).send().await?;
        let rows: Vec<Row> = Self::check(response).await?.json().await?;
        Ok(rows)
    }

    async fn insert(&self, table: &str, row: Row) -> Result<()> {
        tracing::debug!("insert into {}", table);
        let response = self
            .authorize(self.client.post(self.table_url(table)?))
            .header("Prefer", "return=minimal")
            .json(&row)
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }

    async fn update(&self, table: &str, filters: &[Filter], patch: Row) -> Result<Vec<Row>> {
        tracing::debug!("update {} ({} filters)", table, filters.len());
        let url = filtered_url(self.table_url(table)?, filters);
        let response = self
            .authorize(self.client.patch(url))
            .header("Prefer", "return=representation")
            .json(&patch)
            .send()
            .await?;
        let rows: Vec<Row> = Self::check(response).await?.json().await?;
        Ok(rows)
    }

    async fn upsert(&self, table: &str, row: Row, on_conflict: &str) -> Result<()> {
        tracing::debug!("upsert into {} on {}", table, on_conflict);
        let mut url = self.table_url(table)?;
        url.query_pairs_mut().append_pair("on_conflict", on_conflict);
        let response = self
            .authorize(self.client.post(url))
            .header("Prefer", "resolution=merge-duplicates,return=minimal")
            .json(&row)
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }

    async fn delete(&self, table: &str, filters: &[Filter]) -> Result<()> {
        tracing::debug!("delete from {} ({} filters)", table, filters.len());
        let url = filtered_url(self.table_url(table)?, filters);
        let response = self.authorize(self.client.delete(url)).send().await?;
        Self::check(response).await?;
        Ok(())
    }

    async fn get_user(&self, access_token: &str) -> Result<Option<AuthUser>> {
        let url = self.endpoint(&format!("{}/user", AUTH_PATH))?;
        let mut request = self.client.get(url).bearer_auth(access_token);
        if let Some(key) = &self.anon_key {
            request = request.header("apikey", key);
        }
        let response = request.send().await?;

        if matches!(
            response.status(),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN
        ) {
            return Ok(None);
        }

        let user: UserResponse = Self::check(response).await?.json().await?;
        Ok(Some(AuthUser {
            id: user.id,
            email: user.email,
        }))
    }

    async fn delete_user(&self, user_id: &str) -> Result<()> {
        let Some(service_key) = &self.service_role_key else {
            return Err(AppError::Auth(
                "service role key is required to delete users".to_string(),
            ));
        };

        let url = self.endpoint(&format!(
            "{}/admin/users/{}",
            AUTH_PATH,
            urlencoding::encode(user_id)
        ))?;
        let response = self
            .client
            .delete(url)
            .header("apikey", service_key)
            .bearer_auth(service_key)
            .send()
            .await?;

        Self::check(response)
            .await
            .map_err(|e| AppError::Auth(e.to_string()))?;
        Ok(())
    }

    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<()> {
        let url = self.endpoint(&format!(
            "{}/object/{}/{}",
            STORAGE_PATH,
            urlencoding::encode(bucket),
            encode_object_path(path)
        ))?;
        tracing::debug!("upload {} bytes to {}/{}", bytes.len(), bucket, path);

        let response = self
            .authorize(self.client.post(url))
            .header("content-type", content_type)
            .body(bytes)
            .send()
            .await?;

        Self::check(response)
            .await
            .map_err(|e| AppError::Storage(e.to_string()))?;
        Ok(())
    }

    fn public_url(&self, bucket: &str, path: &str) -> String {
        format!(
            "{}{}/object/public/{}/{}",
            self.base_url,
            STORAGE_PATH,
            urlencoding::encode(bucket),
            encode_object_path(path)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn backend() -> RestBackend {
        let config = Config {
            backend_url: "https://project.supabase.co/".to_string(),
            anon_key: Some("anon".to_string()),
            ..Config::default()
        };
        RestBackend::new(&config).unwrap()
    }

    #[test]
    fn select_url_encodes_filters_order_and_limit() {
        let backend = backend();
        let query = Select::table("quiz_attempts")
            .columns(&["id", "score"])
            .eq("user_id", "abc")
            .filter(Filter::is_in("quiz_id", [1, 2]))
            .order_by("completed", false)
            .limit(5);

        let url = select_url(backend.table_url("quiz_attempts").unwrap(), &query);
        let pairs: Vec<(String, String)> = url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();

        assert_eq!(url.path(), "/rest/v1/quiz_attempts");
        assert_eq!(
            pairs,
            vec![
                ("select".to_string(), "id,score".to_string()),
                ("user_id".to_string(), "eq.abc".to_string()),
                ("quiz_id".to_string(), "in.(1,2)".to_string()),
                ("order".to_string(), "completed.desc".to_string()),
                ("limit".to_string(), "5".to_string()),
            ]
        );
    }

    #[test]
    fn list_members_with_commas_are_quoted() {
        assert_eq!(list_operand(&Value::from("a,b")), "\"a,b\"");
        assert_eq!(list_operand(&Value::from(3)), "3");
    }

    #[test]
    fn public_url_points_at_public_object_path() {
        let backend = backend();
        assert_eq!(
            backend.public_url("avatars", "avatars/u1-abc.png"),
            "https://project.supabase.co/storage/v1/object/public/avatars/avatars/u1-abc.png"
        );
    }
}
