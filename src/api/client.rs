//! HTTP client for the remote admin API

use super::query::CollectionFilter;
use super::traits::AdminApi;
use crate::dispatch::{EntityAction, EntityKind};
use crate::remote::{compute_total_pages, Envelope, Page, RemoteError};
use async_trait::async_trait;
use reqwest::{RequestBuilder, Response, StatusCode};
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

/// Reqwest-backed [`AdminApi`] implementation
///
/// List endpoints are `GET /<collection>`; actions are
/// `POST /<collection>/<id>/approve`, `POST /<collection>/<id>/reject`,
/// and `DELETE /<collection>/<id>`. Per-entity list envelopes are
/// normalized to `Page<Value>` here so nothing above this boundary sees
/// the wire's field-naming quirks.
pub struct HttpAdminClient {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl HttpAdminClient {
    pub fn new(
        base_url: &str,
        timeout: Duration,
        token: Option<String>,
    ) -> Result<Self, RemoteError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// Parse a response body as the standard envelope
    ///
    /// A non-2xx status with a parseable envelope passes through as that
    /// envelope (the server's `success: false` report); a non-2xx with no
    /// parseable body is a transport error.
    async fn read_envelope(response: Response) -> Result<Envelope<Value>, RemoteError> {
        let status = response.status();
        let body = response.text().await?;
        match serde_json::from_str::<Envelope<Value>>(&body) {
            Ok(envelope) => Ok(envelope),
            Err(_) if !status.is_success() => Err(status_error(status)),
            Err(err) => Err(RemoteError::transport(format!(
                "unparsable response body: {err}"
            ))),
        }
    }
}

fn status_error(status: StatusCode) -> RemoteError {
    RemoteError::transport(format!("request failed with status {status}"))
}

#[async_trait]
impl AdminApi for HttpAdminClient {
    async fn list(
        &self,
        kind: EntityKind,
        filter: &CollectionFilter,
        page: u32,
        per_page: u32,
    ) -> Result<Envelope<Page<Value>>, RemoteError> {
        let url = self.url(kind.collection_path());
        debug!(kind = %kind, url = %url, page, "fetching collection page");
        let response = self
            .authorized(self.client.get(&url))
            .query(&filter.to_query_pairs(page, effective_limit(per_page)))
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        let value: Value = match serde_json::from_str(&body) {
            Ok(value) => value,
            Err(_) if !status.is_success() => return Err(status_error(status)),
            Err(err) => {
                return Err(RemoteError::transport(format!(
                    "unparsable response body: {err}"
                )))
            }
        };
        Ok(normalize_list(kind, &value, page, per_page))
    }

    async fn approve(
        &self,
        kind: EntityKind,
        id: &str,
    ) -> Result<Envelope<Value>, RemoteError> {
        let url = self.url(&format!("{}/{}/approve", kind.collection_path(), id));
        debug!(kind = %kind, id = %id, "approving entity");
        let response = self.authorized(self.client.post(&url)).send().await?;
        Self::read_envelope(response).await
    }

    async fn reject(
        &self,
        kind: EntityKind,
        id: &str,
        reason: Option<&str>,
    ) -> Result<Envelope<Value>, RemoteError> {
        let url = self.url(&format!("{}/{}/reject", kind.collection_path(), id));
        debug!(kind = %kind, id = %id, "rejecting entity");
        let mut body = serde_json::Map::new();
        if let Some(reason) = reason {
            body.insert("reason".to_string(), Value::String(reason.to_string()));
        }
        let response = self
            .authorized(self.client.post(&url))
            .json(&Value::Object(body))
            .send()
            .await?;
        Self::read_envelope(response).await
    }

    async fn delete(
        &self,
        kind: EntityKind,
        id: &str,
    ) -> Result<Envelope<Value>, RemoteError> {
        let url = self.url(&format!("{}/{}", kind.collection_path(), id));
        debug!(kind = %kind, id = %id, "deleting entity");
        let response = self.authorized(self.client.delete(&url)).send().await?;
        Self::read_envelope(response).await
    }

    fn supports(&self, kind: EntityKind, action: EntityAction) -> bool {
        super::traits::default_capabilities(kind, action)
    }
}

fn effective_limit(per_page: u32) -> u32 {
    // The server treats limit=0 as "no limit"; never ask for that
    per_page.max(1)
}

/// Normalize the per-entity list envelopes into a single page shape
///
/// Observed variants:
/// - `{ "success": true, "agents": { "data": [...], "totalAgents": 12, "currentPage": 1, "totalPages": 2 } }`
/// - `{ "success": true, "users": [...], "totalUsers": 3 }`
/// - `{ "success": true, "inspections": [...] }`
/// - `{ "success": false, "error": "..." }`
pub(crate) fn normalize_list(
    kind: EntityKind,
    value: &Value,
    requested_page: u32,
    per_page: u32,
) -> Envelope<Page<Value>> {
    let success = value
        .get("success")
        .and_then(Value::as_bool)
        .unwrap_or(true);
    if !success {
        return Envelope {
            success: false,
            data: None,
            error: value
                .get("error")
                .and_then(Value::as_str)
                .map(str::to_string),
            message: value
                .get("message")
                .and_then(Value::as_str)
                .map(str::to_string),
        };
    }

    // The collection may live under its own name, a generic field, or
    // directly wrap items in an object with a `data` array.
    let container = [kind.collection_path(), "users", "data", "items"]
        .iter()
        .find_map(|field| value.get(*field));

    let (items, scope) = match container {
        Some(Value::Array(items)) => (items.clone(), value),
        Some(inner @ Value::Object(_)) => {
            let items = inner
                .get("data")
                .or_else(|| inner.get("items"))
                .and_then(Value::as_array)
                .cloned()
                .unwrap_or_default();
            (items, inner)
        }
        _ => (Vec::new(), value),
    };

    let total = find_total(scope)
        .or_else(|| find_total(value))
        .unwrap_or(items.len() as u64);
    let current_page = scope
        .get("currentPage")
        .or_else(|| value.get("currentPage"))
        .and_then(Value::as_u64)
        .map(|p| p as u32)
        .unwrap_or(requested_page);
    let total_pages = scope
        .get("totalPages")
        .or_else(|| value.get("totalPages"))
        .and_then(Value::as_u64)
        .map(|p| p as u32)
        .unwrap_or_else(|| compute_total_pages(total, per_page));

    Envelope {
        success: true,
        data: Some(Page {
            items,
            current_page,
            per_page,
            total,
            total_pages,
        }),
        error: None,
        message: value
            .get("message")
            .and_then(Value::as_str)
            .map(str::to_string),
    }
}

/// First numeric `total*` field other than `totalPages`
fn find_total(value: &Value) -> Option<u64> {
    let object = value.as_object()?;
    if let Some(total) = object.get("total").and_then(Value::as_u64) {
        return Some(total);
    }
    object
        .iter()
        .filter(|(key, _)| key.starts_with("total") && *key != "totalPages")
        .find_map(|(_, v)| v.as_u64())
}
