//! CAPTCHA provider configuration tools.

use super::{ToolContext, ToolHandler, get_bool, get_string, make_tool};
use crate::error::{ErrorCode, ToolError, ToolResult};
use rmcp::model::Tool;
use serde_json::{Value, json};

pub fn get_tools() -> Vec<Tool> {
    vec![
        make_tool(
            "save_captcha_config",
            "Save a CAPTCHA configuration (Google reCAPTCHA or hCaptcha) for a project.",
            json!({
                "provider": {
                    "type": "string",
                    "description": "CAPTCHA provider: 'recaptcha' or 'hcaptcha'"
                },
                "site_key": {
                    "type": "string",
                    "description": "Site key from the CAPTCHA provider"
                },
                "secret_key": {
                    "type": "string",
                    "description": "Secret key from the CAPTCHA provider"
                },
                "is_enable": {
                    "type": "boolean",
                    "description": "Enable the configuration immediately (default: false)"
                },
                "project_key": {
                    "type": "string",
                    "description": "Project key / tenant ID (falls back to the active project context)"
                }
            }),
            vec!["provider", "site_key", "secret_key"],
        ),
        make_tool(
            "list_captcha_configs",
            "List all CAPTCHA configurations for a project.",
            json!({
                "project_key": {
                    "type": "string",
                    "description": "Project key / tenant ID (falls back to the active project context)"
                }
            }),
            vec![],
        ),
        make_tool(
            "update_captcha_status",
            "Enable or disable an existing CAPTCHA configuration.",
            json!({
                "item_id": {
                    "type": "string",
                    "description": "Item ID of the CAPTCHA configuration"
                },
                "is_enable": {
                    "type": "boolean",
                    "description": "Whether the configuration should be enabled"
                },
                "project_key": {
                    "type": "string",
                    "description": "Project key / tenant ID (falls back to the active project context)"
                }
            }),
            vec!["item_id", "is_enable"],
        ),
    ]
}

/// Site key echo for result payloads: first 20 characters, not bytes, so a
/// key with multibyte characters cannot split a character mid-sequence.
fn truncated_site_key(site_key: &str) -> String {
    if site_key.chars().count() > 20 {
        let head: String = site_key.chars().take(20).collect();
        format!("{}...", head)
    } else {
        site_key.to_string()
    }
}

async fn fetch_captcha_configs(h: &ToolHandler, project_key: &str) -> ToolResult<Value> {
    let query = [("ProjectKey", project_key.to_string())];
    h.gateway
        .get("listing CAPTCHA configs", &h.api.captcha_list_url(), &query)
        .await
}

pub async fn save_captcha_config(
    h: &ToolHandler,
    args: Value,
    ctx: &ToolContext,
) -> ToolResult<Value> {
    h.require_auth()?;
    let provider =
        get_string(&args, "provider").ok_or_else(|| ToolError::missing_field("provider"))?;
    let site_key =
        get_string(&args, "site_key").ok_or_else(|| ToolError::missing_field("site_key"))?;
    let secret_key =
        get_string(&args, "secret_key").ok_or_else(|| ToolError::missing_field("secret_key"))?;
    let is_enable = get_bool(&args, "is_enable").unwrap_or(false);
    let project_key = h.resolve_project_key(&args)?;

    let provider = provider.to_lowercase();
    if provider != "recaptcha" && provider != "hcaptcha" {
        return Err(ToolError::new(
            ErrorCode::InvalidFieldValue,
            "Invalid provider. Must be 'recaptcha' for Google reCAPTCHA or 'hcaptcha' for hCaptcha.",
        ));
    }

    let payload = json!({
        "projectKey": project_key,
        "isEnable": is_enable,
        "provider": provider,
        "captchaKey": site_key,
        "captchaSecret": secret_key,
        "captchaGenerator": "",
    });
    let response = h
        .gateway
        .post_json("saving CAPTCHA config", &h.api.captcha_save_url(), &payload)
        .await?;

    if !response.get("isSuccess").and_then(Value::as_bool).unwrap_or(false) {
        return Err(ToolError::remote_failure(
            "Failed to save CAPTCHA configuration",
            response,
        ));
    }

    let provider_label = match provider.as_str() {
        "recaptcha" => "Recaptcha",
        _ => "Hcaptcha",
    };
    let truncated_key = truncated_site_key(&site_key);

    let updated_configurations = match fetch_captcha_configs(h, &project_key).await {
        Ok(configs) => configs,
        Err(err) => {
            ctx.logger
                .warning(&format!("Could not fetch updated CAPTCHA configs: {}", err));
            json!([])
        }
    };

    Ok(json!({
        "message": format!("{} CAPTCHA configuration saved successfully", provider_label),
        "config_details": {
            "provider": provider,
            "project_key": project_key,
            "is_enabled": is_enable,
            "site_key": truncated_key,
        },
        "response": response,
        "updated_configurations": updated_configurations,
    }))
}

pub async fn list_captcha_configs(h: &ToolHandler, args: Value) -> ToolResult<Value> {
    h.require_auth()?;
    let project_key = h.resolve_project_key(&args)?;

    let data = fetch_captcha_configs(h, &project_key).await?;
    let configurations = data
        .get("configurations")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default();

    let summary: Vec<Value> = configurations
        .iter()
        .map(|config| {
            let enabled = config.get("isEnable").and_then(Value::as_bool).unwrap_or(false);
            json!({
                "provider": config.get("provider").cloned().unwrap_or(Value::Null),
                "status": if enabled { "Enabled" } else { "Disabled" },
                "item_id": config.get("itemId").cloned().unwrap_or(Value::Null),
                "created_date": config.get("createdDate").cloned().unwrap_or(Value::Null),
            })
        })
        .collect();

    Ok(json!({
        "message": format!("Found {} CAPTCHA configuration(s)", configurations.len()),
        "project_key": project_key,
        "configurations": configurations,
        "summary": summary,
    }))
}

pub async fn update_captcha_status(
    h: &ToolHandler,
    args: Value,
    ctx: &ToolContext,
) -> ToolResult<Value> {
    h.require_auth()?;
    let item_id = get_string(&args, "item_id").ok_or_else(|| ToolError::missing_field("item_id"))?;
    let is_enable =
        get_bool(&args, "is_enable").ok_or_else(|| ToolError::missing_field("is_enable"))?;
    let project_key = h.resolve_project_key(&args)?;

    let payload = json!({
        "projectKey": project_key,
        "isEnable": is_enable,
        "itemId": item_id,
    });
    let response = h
        .gateway
        .post_json(
            "updating CAPTCHA status",
            &h.api.captcha_update_status_url(),
            &payload,
        )
        .await?;

    if !response.get("isSuccess").and_then(Value::as_bool).unwrap_or(false) {
        return Err(ToolError::remote_failure(
            "Failed to update CAPTCHA configuration status",
            response,
        ));
    }

    let updated_configurations = match fetch_captcha_configs(h, &project_key).await {
        Ok(configs) => configs,
        Err(err) => {
            ctx.logger
                .warning(&format!("Could not fetch updated CAPTCHA configs: {}", err));
            json!([])
        }
    };

    Ok(json!({
        "message": format!(
            "CAPTCHA configuration {} successfully",
            if is_enable { "enabled" } else { "disabled" }
        ),
        "config_details": {
            "item_id": item_id,
            "project_key": project_key,
            "is_enabled": is_enable,
        },
        "response": response,
        "updated_configurations": updated_configurations,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_site_key_is_echoed_unchanged() {
        assert_eq!(truncated_site_key("abc"), "abc");
        assert_eq!(truncated_site_key(&"k".repeat(20)), "k".repeat(20));
    }

    #[test]
    fn long_site_key_is_cut_to_twenty_characters() {
        let key = "k".repeat(25);
        assert_eq!(truncated_site_key(&key), format!("{}...", "k".repeat(20)));
    }

    #[test]
    fn multibyte_site_key_truncates_on_character_boundaries() {
        // 11 chars but 21 bytes; a byte-offset slice at 20 would land inside
        // the final 'α'.
        let key = format!("a{}", "α".repeat(10));
        assert_eq!(truncated_site_key(&key), key);

        let long = "α".repeat(24);
        assert_eq!(truncated_site_key(&long), format!("{}...", "α".repeat(20)));
    }
}
