//! HTTP client for the hosted platform.
//!
//! Endpoint layout:
//!
//! | Capability | Method | Path                                        |
//! |------------|--------|---------------------------------------------|
//! | rows       | *      | `/rest/v1/{table}?col=eq.value&order=...`   |
//! | storage    | POST   | `/storage/v1/object/{bucket}/{path}`        |
//! | sign URL   | POST   | `/storage/v1/object/sign/{bucket}/{path}`   |
//! | functions  | POST   | `/functions/v1/{name}`                      |
//! | sign-in    | POST   | `/auth/v1/token?grant_type=password`        |
//! | sign-out   | POST   | `/auth/v1/logout`                           |

use async_trait::async_trait;
use serde::Deserialize;

use crate::client::{AuthSession, PlatformClient, RowQuery};
use crate::config::PlatformConfig;
use crate::error::PlatformError;

/// `reqwest`-backed [`PlatformClient`].
pub struct RestPlatform {
    client: reqwest::Client,
    base_url: String,
    anon_key: String,
    service_key: String,
}

#[derive(Debug, Deserialize)]
struct SignedUrlResponse {
    #[serde(rename = "signedURL")]
    signed_url: String,
}

impl RestPlatform {
    /// Build a client for `base_url` (no trailing slash).
    pub fn new(base_url: String, anon_key: String, service_key: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url,
            anon_key,
            service_key,
        }
    }

    /// Build from config; `None` when no platform URL is configured.
    pub fn from_config(config: &PlatformConfig) -> Option<Self> {
        let url = config.url.clone()?;
        Some(Self::new(
            url,
            config.anon_key.clone(),
            config.service_key.clone(),
        ))
    }

    fn rest_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }

    /// Attach the API key and service bearer token.
    fn authorized(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        builder
            .header("apikey", &self.anon_key)
            .bearer_auth(&self.service_key)
    }

    /// Query-string pairs for a row query (`col=eq.value`, `order=col.desc`).
    fn query_pairs(query: &RowQuery, with_paging: bool) -> Vec<(String, String)> {
        let mut pairs: Vec<(String, String)> = query
            .filters
            .iter()
            .map(|(column, value)| (column.clone(), format!("eq.{}", filter_value(value))))
            .collect();

        if with_paging {
            if let Some((column, order)) = &query.order {
                pairs.push(("order".into(), format!("{}.{}", column, order.as_str())));
            }
            if let Some(limit) = query.limit {
                pairs.push(("limit".into(), limit.to_string()));
            }
            if let Some(offset) = query.offset {
                pairs.push(("offset".into(), offset.to_string()));
            }
        }
        pairs
    }

    // ---- private helpers ----

    /// Return the response unchanged on 2xx, otherwise an
    /// [`PlatformError::Api`] carrying status and body text.
    async fn ensure_success(
        response: reqwest::Response,
    ) -> Result<reqwest::Response, PlatformError> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(PlatformError::Api {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    async fn parse_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, PlatformError> {
        let response = Self::ensure_success(response).await?;
        Ok(response.json::<T>().await?)
    }

    async fn check_status(response: reqwest::Response) -> Result<(), PlatformError> {
        Self::ensure_success(response).await?;
        Ok(())
    }
}

/// Render a JSON filter value the way PostgREST expects it in a URL.
fn filter_value(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Null => "null".to_string(),
        other => other.to_string(),
    }
}

#[async_trait]
impl PlatformClient for RestPlatform {
    async fn insert(
        &self,
        table: &str,
        row: serde_json::Value,
    ) -> Result<serde_json::Value, PlatformError> {
        let response = self
            .authorized(self.client.post(self.rest_url(table)))
            .header("Prefer", "return=representation")
            .json(&row)
            .send()
            .await?;

        let mut rows: Vec<serde_json::Value> = Self::parse_response(response).await?;
        if rows.is_empty() {
            return Err(PlatformError::Decode(format!(
                "insert into {table} returned no rows"
            )));
        }
        Ok(rows.swap_remove(0))
    }

    async fn select(
        &self,
        table: &str,
        query: &RowQuery,
    ) -> Result<Vec<serde_json::Value>, PlatformError> {
        let mut pairs = vec![("select".to_string(), "*".to_string())];
        pairs.extend(Self::query_pairs(query, true));

        let response = self
            .authorized(self.client.get(self.rest_url(table)))
            .query(&pairs)
            .send()
            .await?;

        Self::parse_response(response).await
    }

    async fn update(
        &self,
        table: &str,
        query: &RowQuery,
        patch: serde_json::Value,
    ) -> Result<Vec<serde_json::Value>, PlatformError> {
        let response = self
            .authorized(self.client.patch(self.rest_url(table)))
            .query(&Self::query_pairs(query, false))
            .header("Prefer", "return=representation")
            .json(&patch)
            .send()
            .await?;

        Self::parse_response(response).await
    }

    async fn delete(&self, table: &str, query: &RowQuery) -> Result<usize, PlatformError> {
        let response = self
            .authorized(self.client.delete(self.rest_url(table)))
            .query(&Self::query_pairs(query, false))
            .header("Prefer", "return=representation")
            .send()
            .await?;

        let rows: Vec<serde_json::Value> = Self::parse_response(response).await?;
        Ok(rows.len())
    }

    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<String, PlatformError> {
        let response = self
            .authorized(
                self.client
                    .post(format!("{}/storage/v1/object/{}/{}", self.base_url, bucket, path)),
            )
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .header("x-upsert", "false")
            .body(bytes)
            .send()
            .await?;

        Self::check_status(response).await?;
        Ok(path.to_string())
    }

    async fn signed_url(
        &self,
        bucket: &str,
        path: &str,
        expires_in_secs: u64,
    ) -> Result<String, PlatformError> {
        let response = self
            .authorized(self.client.post(format!(
                "{}/storage/v1/object/sign/{}/{}",
                self.base_url, bucket, path
            )))
            .json(&serde_json::json!({ "expiresIn": expires_in_secs }))
            .send()
            .await?;

        let signed: SignedUrlResponse = Self::parse_response(response).await?;
        Ok(format!("{}/storage/v1{}", self.base_url, signed.signed_url))
    }

    async fn invoke(
        &self,
        function: &str,
        body: serde_json::Value,
    ) -> Result<serde_json::Value, PlatformError> {
        let response = self
            .authorized(
                self.client
                    .post(format!("{}/functions/v1/{}", self.base_url, function)),
            )
            .json(&body)
            .send()
            .await?;

        let response = Self::ensure_success(response).await?;
        let text = response.text().await?;
        if text.trim().is_empty() {
            return Ok(serde_json::Value::Null);
        }
        Ok(serde_json::from_str(&text)?)
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession, PlatformError> {
        let response = self
            .client
            .post(format!("{}/auth/v1/token", self.base_url))
            .query(&[("grant_type", "password")])
            .header("apikey", &self.anon_key)
            .json(&serde_json::json!({ "email": email, "password": password }))
            .send()
            .await?;

        match Self::parse_response::<AuthSession>(response).await {
            Err(PlatformError::Api {
                status: 400 | 401,
                body,
            }) => Err(PlatformError::Auth(body)),
            other => other,
        }
    }

    async fn sign_out(&self, access_token: &str) -> Result<(), PlatformError> {
        let response = self
            .client
            .post(format!("{}/auth/v1/logout", self.base_url))
            .header("apikey", &self.anon_key)
            .bearer_auth(access_token)
            .send()
            .await?;

        Self::check_status(response).await
    }
}
