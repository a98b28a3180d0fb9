//! MCP tool implementations.

pub mod auth;
pub mod auth_config;
pub mod blocks_cli;
pub mod captcha;
pub mod iam;
pub mod projects;
pub mod schemas;

use crate::config::ApiConfig;
use crate::context::ProjectContext;
use crate::error::{ToolError, ToolResult};
use crate::gateway::ApiGateway;
use crate::logging::Logger;
use crate::session::SessionStore;
use rmcp::model::Tool;
use serde_json::Value;
use std::sync::Arc;

/// Per-request context passed to all tools.
#[derive(Clone)]
pub struct ToolContext {
    /// Unified logger for this request.
    pub logger: Logger,
}

impl ToolContext {
    pub fn new(logger: Logger) -> Self {
        Self { logger }
    }
}

/// Tool handler that processes MCP tool calls.
///
/// Holds the two injectable singleton stores and the request gateway; every
/// tool reads and mutates shared state through these references only.
pub struct ToolHandler {
    pub session: Arc<SessionStore>,
    pub context: Arc<ProjectContext>,
    pub gateway: Arc<ApiGateway>,
    pub api: Arc<ApiConfig>,
}

impl ToolHandler {
    pub fn new(
        session: Arc<SessionStore>,
        context: Arc<ProjectContext>,
        gateway: Arc<ApiGateway>,
        api: Arc<ApiConfig>,
    ) -> Self {
        Self {
            session,
            context,
            gateway,
            api,
        }
    }

    /// Get all available tools.
    pub fn get_tools(&self) -> Vec<Tool> {
        let mut tools = Vec::new();

        // Session and context tools
        tools.extend(auth::get_tools());

        // Project tools
        tools.extend(projects::get_tools());

        // Schema tools
        tools.extend(schemas::get_tools());

        // Authentication configuration tools
        tools.extend(auth_config::get_tools());

        // CAPTCHA tools
        tools.extend(captcha::get_tools());

        // IAM tools
        tools.extend(iam::get_tools());

        // Blocks CLI tools
        tools.extend(blocks_cli::get_tools());

        tools
    }

    /// Call a tool by name.
    pub async fn call_tool(&self, name: &str, args: Value, ctx: &ToolContext) -> ToolResult<Value> {
        match name {
            // Session and context tools
            "login" => auth::login(self, args, ctx).await,
            "get_auth_status" => auth::get_auth_status(self),
            "get_global_state" => auth::get_global_state(self),

            // Project tools
            "get_projects" => projects::get_projects(self, args, ctx).await,
            "create_project" => projects::create_project(self, args, ctx).await,
            "set_application_domain" => projects::set_application_domain(self, args),

            // Schema tools
            "create_schema" => schemas::create_schema(self, args, ctx).await,
            "list_schemas" => schemas::list_schemas(self, args).await,
            "get_schema" => schemas::get_schema(self, args).await,
            "update_schema_fields" => schemas::update_schema_fields(self, args).await,
            "finalize_schema" => schemas::finalize_schema(self, args).await,

            // Authentication configuration tools
            "get_authentication_config" => auth_config::get_authentication_config(self, args).await,
            "activate_social_login" => auth_config::activate_social_login(self, args, ctx).await,

            // CAPTCHA tools
            "save_captcha_config" => captcha::save_captcha_config(self, args, ctx).await,
            "list_captcha_configs" => captcha::list_captcha_configs(self, args).await,
            "update_captcha_status" => captcha::update_captcha_status(self, args, ctx).await,

            // IAM tools
            "list_roles" => iam::list_roles(self, args).await,
            "create_role" => iam::create_role(self, args, ctx).await,
            "list_permissions" => iam::list_permissions(self, args).await,
            "create_permission" => iam::create_permission(self, args, ctx).await,
            "update_permission" => iam::update_permission(self, args, ctx).await,
            "get_resource_groups" => iam::get_resource_groups(self, args).await,

            // Blocks CLI tools
            "check_blocks_cli" => blocks_cli::check_blocks_cli().await,
            "install_blocks_cli" => blocks_cli::install_blocks_cli().await,
            "create_local_repository" => blocks_cli::create_local_repository(self, args).await,

            _ => Err(ToolError::unknown_tool(name)),
        }
    }

    /// Authentication precondition shared by every tenant-scoped tool.
    pub fn require_auth(&self) -> ToolResult<()> {
        if self.session.is_valid() {
            Ok(())
        } else {
            Err(ToolError::authentication_required())
        }
    }

    /// Resolve the effective project key: explicit argument, else context.
    pub fn resolve_project_key(&self, args: &Value) -> ToolResult<String> {
        let explicit = get_string(args, "project_key").unwrap_or_default();
        self.context.require_tenant(&explicit)
    }
}

/// Render a successful tool result as the pretty-printed response envelope.
///
/// A `status` key already present in the result (e.g. `"not_installed"`) is
/// preserved; otherwise `"success"` is inserted.
pub fn render_success(mut result: Value) -> String {
    if let Some(obj) = result.as_object_mut() {
        obj.entry("status".to_string())
            .or_insert_with(|| Value::String("success".to_string()));
    }
    serde_json::to_string_pretty(&result).unwrap_or_else(|_| result.to_string())
}

/// Render a tool error as the pretty-printed response envelope.
pub fn render_error(err: &ToolError) -> String {
    let mut body = serde_json::to_value(err).unwrap_or_else(|_| {
        serde_json::json!({ "message": err.to_string() })
    });
    if let Some(obj) = body.as_object_mut() {
        obj.insert("status".to_string(), Value::String("error".to_string()));
    }
    serde_json::to_string_pretty(&body).unwrap_or_else(|_| body.to_string())
}

/// Helper to create a tool definition.
pub fn make_tool(name: &str, description: &str, properties: Value, required: Vec<&str>) -> Tool {
    let input_schema = rmcp::model::JsonObject::from_iter([
        ("type".to_string(), serde_json::json!("object")),
        ("properties".to_string(), properties),
        ("required".to_string(), serde_json::json!(required)),
    ]);

    Tool::new(name.to_string(), description.to_string(), input_schema)
}

/// Helper to get a string from arguments.
pub fn get_string(args: &Value, key: &str) -> Option<String> {
    args.get(key).and_then(|v| v.as_str().map(String::from))
}

/// Helper to get an i64 from arguments.
pub fn get_i64(args: &Value, key: &str) -> Option<i64> {
    args.get(key).and_then(|v| v.as_i64())
}

/// Helper to get a bool from arguments.
pub fn get_bool(args: &Value, key: &str) -> Option<bool> {
    args.get(key).and_then(|v| v.as_bool())
}

/// Helper to get an arbitrary JSON array from arguments.
pub fn get_array(args: &Value, key: &str) -> Option<Vec<Value>> {
    args.get(key).and_then(|v| v.as_array().cloned())
}

/// Helper to get a string array from arguments.
pub fn get_string_array(args: &Value, key: &str) -> Option<Vec<String>> {
    args.get(key).and_then(|v| {
        v.as_array().map(|arr| {
            arr.iter()
                .filter_map(|v| v.as_str().map(String::from))
                .collect()
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn success_envelope_inserts_status() {
        let rendered = render_success(json!({ "message": "ok" }));
        let v: Value = serde_json::from_str(&rendered).unwrap();
        assert_eq!(v["status"], "success");
        assert_eq!(v["message"], "ok");
    }

    #[test]
    fn success_envelope_keeps_existing_status() {
        let rendered = render_success(json!({ "status": "not_installed", "message": "m" }));
        let v: Value = serde_json::from_str(&rendered).unwrap();
        assert_eq!(v["status"], "not_installed");
    }

    #[test]
    fn error_envelope_carries_code_and_details() {
        let err = ToolError::remote_http("login", 401, "denied".into());
        let v: Value = serde_json::from_str(&render_error(&err)).unwrap();
        assert_eq!(v["status"], "error");
        assert_eq!(v["code"], "REMOTE_HTTP_ERROR");
        assert_eq!(v["details"], "denied");
        assert!(v["message"].as_str().unwrap().contains("401"));
    }
}
