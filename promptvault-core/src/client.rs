//! # HTTP Client
//!
//! [`HttpPromptApi`] is the [`PromptApi`] implementation that talks to the Prompt Vault
//! REST service:
//!
//! | operation    | request                              |
//! |--------------|--------------------------------------|
//! | `search`     | `GET /api/prompts?query=&tags=...`   |
//! | `get_by_id`  | `GET /api/prompts/{id}`              |
//! | `create`     | `POST /api/prompts`                  |
//! | `update`     | `PUT /api/prompts/{id}`              |
//! | `delete`     | `DELETE /api/prompts/{id}`           |
//! | `list_tags`  | `GET /api/prompts/tags/all`          |
//!
//! Every request is bounded by a timeout (10 seconds unless configured otherwise).
//! Nothing is retried here; failures go straight back to the caller.

use crate::error::{Result, VaultError};
use crate::prompt::{Prompt, PromptDraft, PromptId, PromptPage};
use crate::query::SearchParams;
use crate::registry::PromptApi;
use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;

pub const DEFAULT_API_URL: &str = "http://localhost:8000";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

const PROMPTS_PATH: &str = "/api/prompts";
const TAGS_PATH: &str = "/api/prompts/tags/all";

pub struct HttpPromptApi {
    client: Client,
    base_url: String,
    timeout: Duration,
}

impl HttpPromptApi {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        Self::with_timeout(base_url, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| VaultError::network(format!("failed to build HTTP client: {}", e)))?;
        let base_url = base_url.into().trim_end_matches('/').to_string();

        Ok(Self {
            client,
            base_url,
            timeout,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn prompt_url(&self, id: &PromptId) -> String {
        format!("{}{}/{}", self.base_url, PROMPTS_PATH, id)
    }

    fn request(&self, method: Method, url: &str) -> RequestBuilder {
        tracing::debug!(method = %method, url = %url, "Making request");
        self.client.request(method, url)
    }

    /// Sends the request and turns anything but a 2xx into a [`VaultError`].
    ///
    /// `id` is the prompt the request is about, if any; a 404 for a specific prompt
    /// becomes `NotFound`, while a 404 for a collection endpoint stays a server error.
    async fn send(&self, request: RequestBuilder, id: Option<&PromptId>) -> Result<Response> {
        let response = request.send().await.map_err(|e| self.transport_error(e))?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                tracing::debug!(status = status.as_u16(), error = %e, "Failed to read error body");
                String::new()
            }
        };
        let err = error_from_response(status, &body, id);
        tracing::warn!(status = status.as_u16(), error = %err, "Response error");
        Err(err)
    }

    async fn decode<T: DeserializeOwned>(&self, response: Response, context: &str) -> Result<T> {
        let bytes = response.bytes().await.map_err(|e| self.transport_error(e))?;
        serde_json::from_slice(&bytes).map_err(|e| VaultError::decode(context, e.to_string()))
    }

    fn transport_error(&self, err: reqwest::Error) -> VaultError {
        if err.is_timeout() {
            VaultError::Timeout {
                timeout: self.timeout,
            }
        } else {
            VaultError::network(err.to_string())
        }
    }
}

#[async_trait]
impl PromptApi for HttpPromptApi {
    async fn search(&self, params: &SearchParams) -> Result<PromptPage> {
        let url = format!("{}{}", self.base_url, PROMPTS_PATH);
        let request = self.request(Method::GET, &url).query(&params.to_query_pairs());
        let response = self.send(request, None).await?;
        self.decode(response, "search results").await
    }

    async fn get_by_id(&self, id: &PromptId) -> Result<Prompt> {
        let request = self.request(Method::GET, &self.prompt_url(id));
        let response = self.send(request, Some(id)).await?;
        self.decode(response, "prompt").await
    }

    async fn create(&self, draft: &PromptDraft) -> Result<Prompt> {
        let url = format!("{}{}", self.base_url, PROMPTS_PATH);
        let request = self.request(Method::POST, &url).json(draft);
        let response = self.send(request, None).await?;
        let prompt: Prompt = self.decode(response, "created prompt").await?;
        tracing::info!(id = %prompt.id, "Created prompt");
        Ok(prompt)
    }

    async fn update(&self, id: &PromptId, draft: &PromptDraft) -> Result<Prompt> {
        let request = self.request(Method::PUT, &self.prompt_url(id)).json(draft);
        let response = self.send(request, Some(id)).await?;
        let prompt: Prompt = self.decode(response, "updated prompt").await?;
        tracing::info!(id = %prompt.id, "Updated prompt");
        Ok(prompt)
    }

    async fn delete(&self, id: &PromptId) -> Result<()> {
        let request = self.request(Method::DELETE, &self.prompt_url(id));
        self.send(request, Some(id)).await?;
        tracing::info!(id = %id, "Deleted prompt");
        Ok(())
    }

    async fn list_tags(&self) -> Result<Vec<String>> {
        let url = format!("{}{}", self.base_url, TAGS_PATH);
        let request = self.request(Method::GET, &url);
        let response = self.send(request, None).await?;
        self.decode(response, "tag list").await
    }
}

/// Maps a non-2xx response onto the error taxonomy.
///
/// The service reports problems as `{"detail": "..."}`, or for rejected payloads as
/// `{"detail": [{"loc": ["body", "title"], "msg": "..."}]}`.
fn error_from_response(status: StatusCode, body: &str, id: Option<&PromptId>) -> VaultError {
    let detail = serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|mut v| v.get_mut("detail").map(Value::take));

    match (status, id) {
        (StatusCode::NOT_FOUND, Some(id)) => return VaultError::not_found(id),
        (StatusCode::UNPROCESSABLE_ENTITY, _) => {
            if let Some((field, message)) = detail.as_ref().and_then(first_validation_issue) {
                return VaultError::validation(field, message);
            }
        }
        _ => {}
    }

    let message = match detail {
        Some(Value::String(s)) => s,
        Some(other) => first_validation_issue(&other)
            .map(|(_, msg)| msg)
            .unwrap_or_else(|| other.to_string()),
        None if !body.trim().is_empty() => body.trim().to_string(),
        None => status.canonical_reason().unwrap_or("Unknown error").to_string(),
    };

    if status == StatusCode::UNPROCESSABLE_ENTITY {
        return VaultError::validation("body", message);
    }
    VaultError::server(status.as_u16(), message)
}

fn first_validation_issue(detail: &Value) -> Option<(String, String)> {
    let issue = detail.as_array()?.first()?;
    let message = issue.get("msg")?.as_str()?.to_string();
    let field = issue
        .get("loc")
        .and_then(Value::as_array)
        .and_then(|loc| loc.last())
        .map(|last| match last {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        })
        .unwrap_or_else(|| "body".to_string());
    Some((field, message))
}
