//! Outbound request gateway for the Blocks platform API.
//!
//! Builds each request from the method, URL and session headers, dispatches
//! it once (no retries, no backoff) and normalizes the outcome: non-2xx
//! becomes a [`RemoteHttpError`](crate::error::ErrorCode::RemoteHttpError)
//! carrying the raw body, transport failures become
//! [`TransportError`](crate::error::ErrorCode::TransportError), and 2xx
//! bodies are parsed as JSON with a raw-text fallback.

use crate::config::ApiConfig;
use crate::error::{ToolError, ToolResult};
use crate::session::SessionStore;
use reqwest::RequestBuilder;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

pub struct ApiGateway {
    client: reqwest::Client,
    session: Arc<SessionStore>,
}

impl ApiGateway {
    pub fn new(config: &ApiConfig, session: Arc<SessionStore>) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self { client, session })
    }

    /// GET with query parameters, bearer headers applied.
    pub async fn get(&self, operation: &str, url: &str, query: &[(&str, String)]) -> ToolResult<Value> {
        let mut builder = self.client.get(url);
        if !query.is_empty() {
            builder = builder.query(query);
        }
        builder = apply_headers(builder, self.session.bearer_headers());
        self.dispatch(operation, builder).await
    }

    /// POST with a JSON body, bearer headers applied.
    pub async fn post_json(&self, operation: &str, url: &str, body: &Value) -> ToolResult<Value> {
        let builder = apply_headers(self.client.post(url), self.session.bearer_headers()).json(body);
        self.dispatch(operation, builder).await
    }

    /// POST with a form-encoded body. Used only by the token endpoint; the
    /// default `content-type` header is dropped so reqwest can set the
    /// form-urlencoded one, and no bearer entry is attached.
    pub async fn post_form(
        &self,
        operation: &str,
        url: &str,
        form: &[(&str, &str)],
    ) -> ToolResult<Value> {
        let headers = self
            .session
            .default_headers()
            .into_iter()
            .filter(|(name, _)| *name != "content-type");
        let builder = headers
            .fold(self.client.post(url), |b, (name, value)| b.header(name, value))
            .form(form);
        self.dispatch(operation, builder).await
    }

    /// Single attempt: send, then map status and body into the result shape.
    async fn dispatch(&self, operation: &str, builder: RequestBuilder) -> ToolResult<Value> {
        let response = builder
            .send()
            .await
            .map_err(|e| ToolError::transport(operation, e))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ToolError::transport(operation, e))?;

        if !status.is_success() {
            return Err(ToolError::remote_http(operation, status.as_u16(), body));
        }

        // Some endpoints answer 200 with plain text; keep it as-is.
        Ok(serde_json::from_str(&body).unwrap_or(Value::String(body)))
    }
}

fn apply_headers(
    builder: RequestBuilder,
    headers: Vec<(&'static str, String)>,
) -> RequestBuilder {
    headers
        .into_iter()
        .fold(builder, |b, (name, value)| b.header(name, value))
}
