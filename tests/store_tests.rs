//! Integration tests for the session and context stores as seen through the
//! tool handler, without touching the network.

use blocks_cloud_mcp::config::Config;
use blocks_cloud_mcp::context::ProjectContext;
use blocks_cloud_mcp::error::ErrorCode;
use blocks_cloud_mcp::gateway::ApiGateway;
use blocks_cloud_mcp::logging::Logger;
use blocks_cloud_mcp::session::SessionStore;
use blocks_cloud_mcp::tools::{ToolContext, ToolHandler, render_error, render_success};
use chrono::{Duration, Utc};
use serde_json::{Value, json};
use std::sync::Arc;

/// Build a handler wired to the default (public cloud) config. No test here
/// sends a request, so the remote endpoint is never reached.
fn setup_handler() -> ToolHandler {
    let config = Config::default();
    let api = Arc::new(config.api.clone());
    let session = Arc::new(SessionStore::new(
        api.expiry_margin_secs,
        api.base_headers(),
    ));
    let context = Arc::new(ProjectContext::new());
    let gateway = Arc::new(
        ApiGateway::new(&api, Arc::clone(&session)).expect("client should build"),
    );
    ToolHandler::new(session, context, gateway, api)
}

fn test_ctx() -> ToolContext {
    ToolContext::new(Logger::new())
}

#[tokio::test]
async fn tenant_scoped_tool_requires_login_first() {
    let h = setup_handler();
    let err = h
        .call_tool("get_projects", json!({}), &test_ctx())
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::AuthenticationRequired);
    assert_eq!(
        err.message,
        "Authentication required. Please login first using the login tool."
    );
}

#[tokio::test]
async fn tenant_scoped_tool_fails_without_context_before_any_network_call() {
    let h = setup_handler();
    h.session
        .record_login("tok".into(), None, "bearer".into(), 8000);

    let err = h
        .call_tool("list_schemas", json!({}), &test_ctx())
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::MissingContext);
    assert!(err.message.contains("get_projects"));
}

#[tokio::test]
async fn explicit_project_key_bypasses_stored_context() {
    let h = setup_handler();
    assert_eq!(
        h.resolve_project_key(&json!({ "project_key": "T-explicit" }))
            .unwrap(),
        "T-explicit"
    );

    h.context
        .pin(Some("https://d".into()), Some("T-stored".into()), None);
    assert_eq!(h.resolve_project_key(&json!({})).unwrap(), "T-stored");
    assert_eq!(
        h.resolve_project_key(&json!({ "project_key": "T-explicit" }))
            .unwrap(),
        "T-explicit"
    );
}

#[tokio::test]
async fn auth_status_reflects_session_lifecycle() {
    let h = setup_handler();

    let status = h
        .call_tool("get_auth_status", json!({}), &test_ctx())
        .await
        .unwrap();
    assert_eq!(status["authenticated"], false);
    assert_eq!(status["message"], "No authentication token available");

    h.session
        .record_login("tok".into(), Some("r".into()), "bearer".into(), 8000);
    let status = h
        .call_tool("get_auth_status", json!({}), &test_ctx())
        .await
        .unwrap();
    assert_eq!(status["authenticated"], true);
    assert_eq!(status["message"], "Authentication token is valid");
    assert_eq!(status["has_refresh_token"], true);

    // Rewind the login so the token is stale but still recorded.
    let past = Utc::now() - Duration::seconds(10_000);
    h.session
        .record_login_at(past, "tok".into(), None, "bearer".into(), 8000);
    let status = h
        .call_tool("get_auth_status", json!({}), &test_ctx())
        .await
        .unwrap();
    assert_eq!(status["authenticated"], false);
    assert_eq!(status["message"], "Authentication token has expired");
    assert!(status["expired_at"].is_string());
}

#[tokio::test]
async fn set_application_domain_pins_context_unconditionally() {
    let h = setup_handler();
    h.context.update_if_unset_or_matching(
        "https://old.example.com",
        Some("T-old"),
        Some("old-project"),
    );

    let result = h
        .call_tool(
            "set_application_domain",
            json!({
                "domain": "https://new.example.com",
                "tenant_id": "T-new",
                "project_name": "new-project"
            }),
            &test_ctx(),
        )
        .await
        .unwrap();

    assert_eq!(
        result["message"],
        "Application domain and tenant ID set successfully"
    );
    assert_eq!(
        result["global_state"]["application_domain"],
        "https://new.example.com"
    );
    assert_eq!(result["global_state"]["tenant_id"], "T-new");
    assert_eq!(h.context.project_name().as_deref(), Some("new-project"));
}

#[tokio::test]
async fn global_state_combines_auth_and_context() {
    let h = setup_handler();
    h.session
        .record_login("tok".into(), None, "bearer".into(), 8000);
    h.context
        .pin(Some("https://d.example.com".into()), Some("T1".into()), Some("p1".into()));

    let state = h
        .call_tool("get_global_state", json!({}), &test_ctx())
        .await
        .unwrap();
    assert_eq!(state["auth_state"]["authenticated"], true);
    assert_eq!(state["app_state"]["application_domain"], "https://d.example.com");
    assert_eq!(state["app_state"]["tenant_id"], "T1");
    assert_eq!(state["app_state"]["project_name"], "p1");
}

#[tokio::test]
async fn unknown_tool_name_is_rejected() {
    let h = setup_handler();
    let err = h
        .call_tool("does_not_exist", json!({}), &test_ctx())
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::UnknownTool);
}

#[test]
fn every_registered_tool_has_an_object_schema() {
    let h = setup_handler();
    let tools = h.get_tools();
    assert_eq!(tools.len(), 25);
    for tool in &tools {
        assert_eq!(
            tool.input_schema.get("type").and_then(Value::as_str),
            Some("object"),
            "tool {} schema is not an object",
            tool.name
        );
    }
}

#[test]
fn envelopes_wrap_results_and_errors() {
    let ok: Value = serde_json::from_str(&render_success(json!({ "message": "done" }))).unwrap();
    assert_eq!(ok["status"], "success");

    let err = blocks_cloud_mcp::error::ToolError::missing_context();
    let rendered: Value = serde_json::from_str(&render_error(&err)).unwrap();
    assert_eq!(rendered["status"], "error");
    assert_eq!(rendered["code"], "MISSING_CONTEXT");
}
