//! Authentication configuration tools (social login activation).

use super::{ToolContext, ToolHandler, get_i64, get_string, get_string_array, make_tool};
use crate::error::ToolResult;
use rmcp::model::Tool;
use serde_json::{Value, json};

pub fn get_tools() -> Vec<Tool> {
    vec![
        make_tool(
            "get_authentication_config",
            "Get the current authentication configuration for a project.",
            json!({
                "project_key": {
                    "type": "string",
                    "description": "Project key / tenant ID (falls back to the active project context)"
                }
            }),
            vec![],
        ),
        make_tool(
            "activate_social_login",
            "Activate social login for a project by updating its authentication configuration.",
            json!({
                "project_key": {
                    "type": "string",
                    "description": "Project key / tenant ID (falls back to the active project context)"
                },
                "item_id": {
                    "type": "string",
                    "description": "Configuration item ID (default: '682c40c3872fab1bc2cc8988')"
                },
                "refresh_token_minutes": {
                    "type": "integer",
                    "description": "Refresh token validity in minutes (default: 300)"
                },
                "access_token_minutes": {
                    "type": "integer",
                    "description": "Access token validity in minutes (default: 15)"
                },
                "remember_me_minutes": {
                    "type": "integer",
                    "description": "Remember-me refresh token validity in minutes (default: 43200)"
                },
                "allowed_grant_types": {
                    "type": "array",
                    "description": "Allowed grant types (default: password, refresh_token, mfa_code, social)",
                    "items": { "type": "string" }
                },
                "wrong_attempts_lock": {
                    "type": "integer",
                    "description": "Wrong attempts before account lock (default: 5)"
                },
                "lock_duration_minutes": {
                    "type": "integer",
                    "description": "Account lock duration in minutes (default: 5)"
                }
            }),
            vec![],
        ),
    ]
}

async fn fetch_auth_config(h: &ToolHandler, project_key: &str) -> ToolResult<Value> {
    let query = [("ProjectKey", project_key.to_string())];
    h.gateway
        .get(
            "getting authentication config",
            &h.api.auth_config_get_url(),
            &query,
        )
        .await
}

pub async fn get_authentication_config(h: &ToolHandler, args: Value) -> ToolResult<Value> {
    h.require_auth()?;
    let project_key = h.resolve_project_key(&args)?;
    let configuration = fetch_auth_config(h, &project_key).await?;

    Ok(json!({
        "message": format!(
            "Authentication configuration retrieved successfully for project {}",
            project_key
        ),
        "project_key": project_key,
        "configuration": configuration,
    }))
}

pub async fn activate_social_login(
    h: &ToolHandler,
    args: Value,
    ctx: &ToolContext,
) -> ToolResult<Value> {
    h.require_auth()?;
    let project_key = h.resolve_project_key(&args)?;

    let item_id =
        get_string(&args, "item_id").unwrap_or_else(|| "682c40c3872fab1bc2cc8988".to_string());
    let refresh_token_minutes = get_i64(&args, "refresh_token_minutes").unwrap_or(300);
    let access_token_minutes = get_i64(&args, "access_token_minutes").unwrap_or(15);
    let remember_me_minutes = get_i64(&args, "remember_me_minutes").unwrap_or(43200);
    let allowed_grant_types = get_string_array(&args, "allowed_grant_types").unwrap_or_else(|| {
        vec![
            "password".to_string(),
            "refresh_token".to_string(),
            "mfa_code".to_string(),
            "social".to_string(),
        ]
    });
    let wrong_attempts_lock = get_i64(&args, "wrong_attempts_lock").unwrap_or(5);
    let lock_duration_minutes = get_i64(&args, "lock_duration_minutes").unwrap_or(5);

    let payload = json!({
        "itemId": item_id,
        "refreshTokenValidForNumberMinutes": refresh_token_minutes,
        "accessTokenValidForNumberMinutes": access_token_minutes,
        "rememberMeRefreshTokenValidForNumberMinutes": remember_me_minutes,
        "allowedGrantTypes": allowed_grant_types,
        "getNumberOfWrongAttemptsToLockTheAccount": wrong_attempts_lock,
        "accountLockDurationInMinutes": lock_duration_minutes,
        "projectKey": project_key,
    });
    let response = h
        .gateway
        .post_json(
            "social login activation",
            &h.api.auth_config_update_url(),
            &payload,
        )
        .await?;

    // Confirmation read-back; failure is reported inline rather than failing
    // the activation.
    let updated_configuration = match fetch_auth_config(h, &project_key).await {
        Ok(config) => config,
        Err(err) => {
            ctx.logger
                .warning(&format!("Could not fetch updated config: {}", err));
            Value::String(format!("Could not fetch updated config: {}", err))
        }
    };

    Ok(json!({
        "message": format!("Social login activated successfully for project {}", project_key),
        "config_details": {
            "item_id": item_id,
            "project_key": project_key,
            "allowed_grant_types": allowed_grant_types,
            "refresh_token_minutes": refresh_token_minutes,
            "access_token_minutes": access_token_minutes,
            "remember_me_minutes": remember_me_minutes,
        },
        "response": response,
        "updated_configuration": updated_configuration,
    }))
}
