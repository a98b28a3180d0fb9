//! Structured error types for tool responses.

use serde::Serialize;
use thiserror::Error;

/// Error codes for programmatic error handling.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Precondition errors
    AuthenticationRequired,
    MissingContext,
    MissingRequiredField,
    InvalidFieldValue,

    // Remote API errors
    TransportError,
    RemoteHttpError,
    RemoteLogicalFailure,

    // Internal errors
    LocalError,
    UnknownTool,
}

/// Structured error for tool responses.
///
/// Serialized at the server edge as the `"error"` variant of the response
/// envelope. `details` carries the raw remote response body when one exists.
#[derive(Debug, Serialize, Error)]
#[error("{message}")]
pub struct ToolError {
    pub code: ErrorCode,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ToolError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<serde_json::Value>) -> Self {
        self.details = Some(details.into());
        self
    }

    // Convenience constructors

    /// Fixed message every tool returns when no valid session exists.
    pub fn authentication_required() -> Self {
        Self::new(
            ErrorCode::AuthenticationRequired,
            "Authentication required. Please login first using the login tool.",
        )
    }

    /// Fixed message when no tenant can be resolved from arguments or context.
    pub fn missing_context() -> Self {
        Self::new(
            ErrorCode::MissingContext,
            "No project key provided and no tenant ID in global state. \
             Please run get_projects or provide project_key.",
        )
    }

    pub fn missing_field(field: &str) -> Self {
        Self::new(
            ErrorCode::MissingRequiredField,
            format!("{} is required", field),
        )
    }

    /// Transport-level failure (connection refused, timeout, malformed body).
    pub fn transport(operation: &str, err: impl std::fmt::Display) -> Self {
        Self::new(
            ErrorCode::TransportError,
            format!("Error during {}: {}", operation, err),
        )
    }

    /// Non-2xx remote response; `body` is the raw response text.
    pub fn remote_http(operation: &str, status: u16, body: String) -> Self {
        Self::new(
            ErrorCode::RemoteHttpError,
            format!("HTTP error during {}: {}", operation, status),
        )
        .with_details(body)
    }

    /// 2xx response whose own success flag reports failure.
    pub fn remote_failure(message: impl Into<String>, response: serde_json::Value) -> Self {
        Self::new(ErrorCode::RemoteLogicalFailure, message).with_details(response)
    }

    pub fn unknown_tool(name: &str) -> Self {
        Self::new(ErrorCode::UnknownTool, format!("Unknown tool: {}", name))
    }
}

/// Result type for tool operations.
pub type ToolResult<T> = std::result::Result<T, ToolError>;
