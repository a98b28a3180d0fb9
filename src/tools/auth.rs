//! Login and session/context inspection tools.

use super::{ToolContext, ToolHandler, get_string, make_tool};
use crate::error::{ToolError, ToolResult};
use serde_json::{Value, json};
use rmcp::model::Tool;

/// Fallback token lifetime when the token endpoint omits `expires_in`.
const DEFAULT_EXPIRES_IN_SECS: i64 = 8000;

pub fn get_tools() -> Vec<Tool> {
    vec![
        make_tool(
            "login",
            "Authenticate with the Selise Blocks API and retrieve access tokens. \
             Must be called before any project, schema, CAPTCHA or IAM tool.",
            json!({
                "username": {
                    "type": "string",
                    "description": "Email address for login"
                },
                "password": {
                    "type": "string",
                    "description": "Password for login"
                }
            }),
            vec!["username", "password"],
        ),
        make_tool(
            "get_auth_status",
            "Check current authentication status and token validity.",
            json!({}),
            vec![],
        ),
        make_tool(
            "get_global_state",
            "Get the current global state including authentication and the active project context.",
            json!({}),
            vec![],
        ),
    ]
}

/// The only tool exempt from the authentication precondition.
pub async fn login(h: &ToolHandler, args: Value, ctx: &ToolContext) -> ToolResult<Value> {
    let username = get_string(&args, "username").ok_or_else(|| ToolError::missing_field("username"))?;
    let password = get_string(&args, "password").ok_or_else(|| ToolError::missing_field("password"))?;

    // The token endpoint takes form-encoded credentials, not JSON.
    let form = [
        ("grant_type", "password"),
        ("username", username.as_str()),
        ("password", password.as_str()),
    ];
    let login_data = h
        .gateway
        .post_form("login", &h.api.login_url(), &form)
        .await?;

    let Some(access_token) = login_data
        .get("access_token")
        .and_then(Value::as_str)
        .filter(|t| !t.is_empty())
    else {
        return Err(ToolError::remote_failure(
            "Login failed. No access token received.",
            login_data,
        ));
    };

    let refresh_token = login_data
        .get("refresh_token")
        .and_then(Value::as_str)
        .map(String::from);
    let expires_in = login_data
        .get("expires_in")
        .and_then(Value::as_i64)
        .unwrap_or(DEFAULT_EXPIRES_IN_SECS);
    let token_type = login_data
        .get("token_type")
        .and_then(Value::as_str)
        .unwrap_or("bearer")
        .to_string();

    let has_refresh_token = refresh_token.is_some();
    let expires_at = h.session.record_login(
        access_token.to_string(),
        refresh_token,
        token_type.clone(),
        expires_in,
    );
    ctx.logger.info(&format!("Login successful for {}", username));

    Ok(json!({
        "message": format!("Login successful for {}", username),
        "token_info": {
            "token_type": token_type,
            "expires_in": expires_in,
            "expires_at": expires_at.to_rfc3339(),
            "has_refresh_token": has_refresh_token,
        }
    }))
}

/// Report session validity without touching the network.
pub fn get_auth_status(h: &ToolHandler) -> ToolResult<Value> {
    let status = if !h.session.has_token() {
        json!({
            "authenticated": false,
            "message": "No authentication token available",
        })
    } else if h.session.is_valid() {
        json!({
            "authenticated": true,
            "message": "Authentication token is valid",
            "token_type": h.session.token_type(),
            "expires_at": h.session.expires_at().map(|t| t.to_rfc3339()),
            "has_refresh_token": h.session.has_refresh_token(),
        })
    } else {
        json!({
            "authenticated": false,
            "message": "Authentication token has expired",
            "expired_at": h.session.expires_at().map(|t| t.to_rfc3339()),
        })
    };
    Ok(status)
}

pub fn get_global_state(h: &ToolHandler) -> ToolResult<Value> {
    Ok(json!({
        "message": "Current global state",
        "auth_state": {
            "authenticated": h.session.is_valid(),
            "token_type": h.session.token_type(),
            "expires_at": h.session.expires_at().map(|t| t.to_rfc3339()),
        },
        "app_state": h.context.snapshot(),
    }))
}
