//! Integration tests for the request gateway against a loopback mock of the
//! Blocks platform API.

use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::{Form, Json, Router};
use blocks_cloud_mcp::config::Config;
use blocks_cloud_mcp::context::ProjectContext;
use blocks_cloud_mcp::error::ErrorCode;
use blocks_cloud_mcp::gateway::ApiGateway;
use blocks_cloud_mcp::logging::Logger;
use blocks_cloud_mcp::session::SessionStore;
use blocks_cloud_mcp::tools::{ToolContext, ToolHandler};
use serde_json::{Value, json};
use std::collections::HashMap;
use std::sync::Arc;

/// Serve `app` on an ephemeral loopback port, returning its base URL.
async fn spawn_api(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind loopback");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("mock api serve");
    });
    format!("http://{}", addr)
}

fn setup_handler(base_url: String) -> ToolHandler {
    let mut config = Config::default();
    config.api.base_url = base_url;
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
async fn login_round_trip_records_session() {
    let app = Router::new().route(
        "/authentication/v1/OAuth/Token",
        post(|Form(form): Form<HashMap<String, String>>| async move {
            assert_eq!(form.get("grant_type").map(String::as_str), Some("password"));
            assert_eq!(form.get("username").map(String::as_str), Some("a@b.com"));
            Json(json!({
                "access_token": "tok-123",
                "refresh_token": "ref-456",
                "token_type": "bearer",
                "expires_in": 8000,
            }))
        }),
    );
    let h = setup_handler(spawn_api(app).await);

    let result = h
        .call_tool(
            "login",
            json!({ "username": "a@b.com", "password": "secret" }),
            &test_ctx(),
        )
        .await
        .unwrap();

    assert_eq!(result["message"], "Login successful for a@b.com");
    assert_eq!(result["token_info"]["token_type"], "bearer");
    assert_eq!(result["token_info"]["expires_in"], 8000);
    assert_eq!(result["token_info"]["has_refresh_token"], true);
    assert!(h.session.is_valid());
}

#[tokio::test]
async fn login_without_access_token_is_a_logical_failure() {
    let app = Router::new().route(
        "/authentication/v1/OAuth/Token",
        post(|| async { Json(json!({ "error": "invalid_grant" })) }),
    );
    let h = setup_handler(spawn_api(app).await);

    let err = h
        .call_tool(
            "login",
            json!({ "username": "a@b.com", "password": "wrong" }),
            &test_ctx(),
        )
        .await
        .unwrap_err();

    assert_eq!(err.code, ErrorCode::RemoteLogicalFailure);
    assert_eq!(err.message, "Login failed. No access token received.");
    assert_eq!(err.details, Some(json!({ "error": "invalid_grant" })));
    assert!(!h.session.is_valid());
}

#[tokio::test]
async fn non_2xx_maps_to_http_error_with_raw_body() {
    let app = Router::new().route(
        "/graphql/v1/schemas",
        get(|| async { (StatusCode::FORBIDDEN, "tenant suspended") }),
    );
    let h = setup_handler(spawn_api(app).await);
    h.session
        .record_login("tok".into(), None, "bearer".into(), 8000);

    let err = h
        .call_tool(
            "list_schemas",
            json!({ "project_key": "T1" }),
            &test_ctx(),
        )
        .await
        .unwrap_err();

    assert_eq!(err.code, ErrorCode::RemoteHttpError);
    assert_eq!(err.message, "HTTP error during schema listing: 403");
    assert_eq!(err.details, Some(json!("tenant suspended")));
}

#[tokio::test]
async fn unreachable_endpoint_maps_to_transport_error() {
    // Bind then drop a listener so the port is very likely closed.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let h = setup_handler(format!("http://{}", addr));
    h.session
        .record_login("tok".into(), None, "bearer".into(), 8000);

    let err = h
        .call_tool(
            "list_schemas",
            json!({ "project_key": "T1" }),
            &test_ctx(),
        )
        .await
        .unwrap_err();

    assert_eq!(err.code, ErrorCode::TransportError);
    assert!(err.message.starts_with("Error during schema listing:"));
}

#[tokio::test]
async fn requests_carry_bearer_and_blocks_headers() {
    let app = Router::new().route(
        "/graphql/v1/schemas",
        get(|headers: HeaderMap| async move {
            Json(json!({
                "authorization": headers
                    .get("authorization")
                    .and_then(|v| v.to_str().ok()),
                "x_blocks_key": headers
                    .get("x-blocks-key")
                    .and_then(|v| v.to_str().ok()),
            }))
        }),
    );
    let h = setup_handler(spawn_api(app).await);
    h.session
        .record_login("tok-xyz".into(), None, "bearer".into(), 8000);

    let result = h
        .call_tool(
            "list_schemas",
            json!({ "project_key": "T1" }),
            &test_ctx(),
        )
        .await
        .unwrap();

    let echoed = &result["schemas"];
    assert_eq!(echoed["authorization"], "Bearer tok-xyz");
    assert_eq!(echoed["x_blocks_key"], h.api.blocks_key);
}

#[tokio::test]
async fn plain_text_success_body_is_kept_verbatim() {
    let app = Router::new()
        .route(
            "/graphql/v1/schemas/info",
            post(|| async { "Schema created" }),
        )
        .route(
            "/graphql/v1/schemas",
            get(|| async { Json(json!([{ "schemaName": "order" }])) }),
        );
    let h = setup_handler(spawn_api(app).await);
    h.session
        .record_login("tok".into(), None, "bearer".into(), 8000);

    let result = h
        .call_tool(
            "create_schema",
            json!({ "schema_name": "order", "project_key": "T1" }),
            &test_ctx(),
        )
        .await
        .unwrap();

    assert_eq!(result["message"], "Schema 'order' created successfully");
    assert_eq!(result["schema_details"]["collection_name"], "orders");
    assert_eq!(result["response"], "Schema created");
    assert_eq!(result["updated_schemas_list"], json!([{ "schemaName": "order" }]));
}

#[tokio::test]
async fn failed_schema_confirmation_degrades_to_soft_error_field() {
    // Creation succeeds; the follow-up listing is broken.
    let app = Router::new()
        .route(
            "/graphql/v1/schemas/info",
            post(|| async { "Schema created" }),
        )
        .route(
            "/graphql/v1/schemas",
            get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "listing down") }),
        );
    let h = setup_handler(spawn_api(app).await);
    h.session
        .record_login("tok".into(), None, "bearer".into(), 8000);

    let result = h
        .call_tool(
            "create_schema",
            json!({ "schema_name": "order", "project_key": "T1" }),
            &test_ctx(),
        )
        .await
        .unwrap();

    assert_eq!(result["message"], "Schema 'order' created successfully");
    assert!(result.get("updated_schemas_list").is_none());
    let note = result["schemas_list_error"].as_str().unwrap();
    assert!(note.starts_with("Could not fetch updated schema list:"));
    assert!(note.contains("500"));
}

#[tokio::test]
async fn failed_role_confirmation_degrades_to_empty_listing() {
    let app = Router::new()
        .route(
            "/iam/v1/Resource/CreateRole",
            post(|| async { Json(json!({ "isSuccess": true, "itemId": "R1" })) }),
        )
        .route(
            "/iam/v1/Resource/GetRoles",
            post(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "listing down") }),
        );
    let h = setup_handler(spawn_api(app).await);
    h.session
        .record_login("tok".into(), None, "bearer".into(), 8000);

    let result = h
        .call_tool(
            "create_role",
            json!({
                "name": "Admin",
                "description": "admin role",
                "slug": "admin",
                "project_key": "T1"
            }),
            &test_ctx(),
        )
        .await
        .unwrap();

    assert_eq!(result["message"], "Role 'Admin' created successfully");
    assert_eq!(result["role_details"]["item_id"], "R1");
    assert_eq!(result["updated_roles"], json!([]));
}

#[tokio::test]
async fn multibyte_site_key_is_echoed_without_panicking() {
    let app = Router::new()
        .route(
            "/captcha/v1/Configuration/Save",
            post(|| async { Json(json!({ "isSuccess": true })) }),
        )
        .route(
            "/captcha/v1/Configuration/Gets",
            get(|| async { Json(json!({ "configurations": [] })) }),
        );
    let h = setup_handler(spawn_api(app).await);
    h.session
        .record_login("tok".into(), None, "bearer".into(), 8000);

    // 25 characters, with a multibyte character straddling byte offset 20.
    let site_key = format!("a{}", "α".repeat(24));
    let result = h
        .call_tool(
            "save_captcha_config",
            json!({
                "provider": "recaptcha",
                "site_key": site_key,
                "secret_key": "s3cret",
                "project_key": "T1"
            }),
            &test_ctx(),
        )
        .await
        .unwrap();

    assert_eq!(
        result["message"],
        "Recaptcha CAPTCHA configuration saved successfully"
    );
    let expected = format!("a{}...", "α".repeat(19));
    assert_eq!(result["config_details"]["site_key"], expected);
}

#[tokio::test]
async fn mutation_with_false_success_flag_is_an_error() {
    let app = Router::new().route(
        "/iam/v1/Resource/CreateRole",
        post(|| async { Json(json!({ "isSuccess": false, "errors": ["slug taken"] })) }),
    );
    let h = setup_handler(spawn_api(app).await);
    h.session
        .record_login("tok".into(), None, "bearer".into(), 8000);

    let err = h
        .call_tool(
            "create_role",
            json!({
                "name": "Admin",
                "description": "admin role",
                "slug": "admin",
                "project_key": "T1"
            }),
            &test_ctx(),
        )
        .await
        .unwrap_err();

    assert_eq!(err.code, ErrorCode::RemoteLogicalFailure);
    assert_eq!(err.message, "Failed to create role");
    assert_eq!(
        err.details,
        Some(json!({ "isSuccess": false, "errors": ["slug taken"] }))
    );
}

#[tokio::test]
async fn create_project_with_unresolvable_tenant_still_succeeds() {
    // The create answers with a group id, but the follow-up listing does not
    // contain the new project yet.
    let app = Router::new()
        .route(
            "/identifier/v1/Project/Create",
            post(|| async { Json(json!({ "tenantGroupId": "G9" })) }),
        )
        .route(
            "/identifier/v1/Project/Gets",
            get(|| async { Json(json!([])) }),
        );
    let h = setup_handler(spawn_api(app).await);
    h.session
        .record_login("tok".into(), None, "bearer".into(), 8000);

    let result = h
        .call_tool(
            "create_project",
            json!({
                "project_name": "fresh",
                "repo_name": "me/fresh",
                "repo_link": "https://github.com/me/fresh"
            }),
            &test_ctx(),
        )
        .await
        .unwrap();

    assert_eq!(result["message"], "Project 'fresh' created successfully");
    assert_eq!(result["project_details"]["tenantGroupId"], "G9");
    assert!(result["project_details"]["tenantId"].is_null());
    assert_eq!(
        result["project_details"]["application_domain"],
        "https://dev-fresh-placeholder.seliseblocks.com"
    );

    // Creation pins the context even without a resolved tenant.
    assert_eq!(h.context.project_name().as_deref(), Some("fresh"));
    assert_eq!(
        h.context.application_domain().as_deref(),
        Some("https://dev-fresh-placeholder.seliseblocks.com")
    );
    assert_eq!(h.context.tenant_id(), None);
}

#[tokio::test]
async fn project_listing_feeds_the_context_store() {
    let app = Router::new().route(
        "/identifier/v1/Project/Gets",
        get(|| async {
            Json(json!([{
                "tenantGroupId": "G1",
                "projects": [{
                    "name": "shop",
                    "tenantId": "T-shop",
                    "itemId": "I1",
                    "applicationDomain": "https://shop.example.com",
                }]
            }]))
        }),
    );
    let h = setup_handler(spawn_api(app).await);
    h.session
        .record_login("tok".into(), None, "bearer".into(), 8000);

    let result = h
        .call_tool("get_projects", json!({}), &test_ctx())
        .await
        .unwrap();

    assert_eq!(result["message"], "Projects retrieved successfully");
    let projects = result["projects"].as_array().unwrap();
    assert_eq!(projects.len(), 1);
    assert_eq!(projects[0]["project_name"], "shop");
    assert_eq!(
        projects[0]["application_contexts"][0]["domain"],
        "https://shop.example.com"
    );

    // First sighting populated the context.
    assert_eq!(
        h.context.application_domain().as_deref(),
        Some("https://shop.example.com")
    );
    assert_eq!(h.context.tenant_id().as_deref(), Some("T-shop"));
    assert_eq!(
        result["global_state"]["tenant_id"],
        Value::String("T-shop".into())
    );
}
