//! GraphQL schema administration tools.

use super::{ToolContext, ToolHandler, get_array, get_bool, get_i64, get_string, make_tool};
use crate::error::{ToolError, ToolResult};
use rmcp::model::Tool;
use serde_json::{Value, json};

/// Collection names are the pluralised schema name.
pub fn derive_collection_name(schema_name: &str) -> String {
    format!("{}s", schema_name)
}

pub fn get_tools() -> Vec<Tool> {
    vec![
        make_tool(
            "create_schema",
            "Create a new GraphQL schema in Selise Cloud. The collection name is \
             derived from the schema name automatically.",
            json!({
                "schema_name": {
                    "type": "string",
                    "description": "Name of the schema to create"
                },
                "project_key": {
                    "type": "string",
                    "description": "Project key / tenant ID (falls back to the active project context)"
                }
            }),
            vec!["schema_name"],
        ),
        make_tool(
            "list_schemas",
            "List GraphQL schemas for a project with pagination and sorting.",
            json!({
                "project_key": {
                    "type": "string",
                    "description": "Project key / tenant ID (falls back to the active project context)"
                },
                "keyword": {
                    "type": "string",
                    "description": "Search keyword to filter schemas (optional)"
                },
                "page_size": {
                    "type": "integer",
                    "description": "Number of schemas per page (default: 100)"
                },
                "page_number": {
                    "type": "integer",
                    "description": "Page number (default: 1)"
                },
                "sort_descending": {
                    "type": "boolean",
                    "description": "Sort in descending order (default: true)"
                },
                "sort_by": {
                    "type": "string",
                    "description": "Field to sort by (default: 'CreatedDate')"
                }
            }),
            vec![],
        ),
        make_tool(
            "get_schema",
            "Get detailed information about a specific schema, including its fields.",
            json!({
                "schema_id": {
                    "type": "string",
                    "description": "Schema definition item ID"
                },
                "project_key": {
                    "type": "string",
                    "description": "Project key / tenant ID (falls back to the active project context)"
                }
            }),
            vec!["schema_id"],
        ),
        make_tool(
            "update_schema_fields",
            "Add or update fields on an existing schema.",
            json!({
                "schema_id": {
                    "type": "string",
                    "description": "Schema definition item ID"
                },
                "fields": {
                    "type": "array",
                    "description": "Field definitions, e.g. [{\"fieldName\": \"Price\", \"fieldType\": \"Int\"}]",
                    "items": { "type": "object" }
                },
                "project_key": {
                    "type": "string",
                    "description": "Project key / tenant ID (falls back to the active project context)"
                }
            }),
            vec!["schema_id", "fields"],
        ),
        make_tool(
            "finalize_schema",
            "Finalize a schema so it becomes queryable through GraphQL.",
            json!({
                "schema_id": {
                    "type": "string",
                    "description": "Schema definition item ID"
                },
                "project_key": {
                    "type": "string",
                    "description": "Project key / tenant ID (falls back to the active project context)"
                }
            }),
            vec!["schema_id"],
        ),
    ]
}

pub async fn create_schema(h: &ToolHandler, args: Value, ctx: &ToolContext) -> ToolResult<Value> {
    h.require_auth()?;
    let schema_name =
        get_string(&args, "schema_name").ok_or_else(|| ToolError::missing_field("schema_name"))?;
    let project_key = h.resolve_project_key(&args)?;
    let collection_name = derive_collection_name(&schema_name);

    let payload = json!({
        "schemaName": schema_name,
        "collectionName": collection_name,
        "schemaType": 1,
        "projectKey": project_key,
    });
    let response = h
        .gateway
        .post_json("schema creation", &h.api.schema_create_url(), &payload)
        .await?;

    let mut result = json!({
        "message": format!("Schema '{}' created successfully", schema_name),
        "schema_details": {
            "schema_name": schema_name,
            "collection_name": collection_name,
            "schema_type": 1,
            "project_key": project_key,
        },
        "response": response,
    });

    // Confirmation fetch; a failure here degrades to a note, not an error.
    match fetch_schemas(h, &project_key, "", 100, 1, true, "CreatedDate").await {
        Ok(schemas) => {
            result["updated_schemas_list"] = schemas;
        }
        Err(err) => {
            ctx.logger
                .warning(&format!("Could not fetch updated schema list: {}", err));
            result["schemas_list_error"] =
                Value::String(format!("Could not fetch updated schema list: {}", err));
        }
    }

    Ok(result)
}

/// Shared listing request used by `list_schemas` and post-creation checks.
async fn fetch_schemas(
    h: &ToolHandler,
    project_key: &str,
    keyword: &str,
    page_size: i64,
    page_number: i64,
    sort_descending: bool,
    sort_by: &str,
) -> ToolResult<Value> {
    let query = [
        ("Keyword", keyword.to_string()),
        ("PageSize", page_size.to_string()),
        ("PageNumber", page_number.to_string()),
        ("SortDescending", sort_descending.to_string()),
        ("SortBy", sort_by.to_string()),
        ("ProjectKey", project_key.to_string()),
    ];
    h.gateway
        .get("schema listing", &h.api.schema_list_url(), &query)
        .await
}

pub async fn list_schemas(h: &ToolHandler, args: Value) -> ToolResult<Value> {
    h.require_auth()?;
    let project_key = h.resolve_project_key(&args)?;
    let keyword = get_string(&args, "keyword").unwrap_or_default();
    let page_size = get_i64(&args, "page_size").unwrap_or(100);
    let page_number = get_i64(&args, "page_number").unwrap_or(1);
    let sort_descending = get_bool(&args, "sort_descending").unwrap_or(true);
    let sort_by = get_string(&args, "sort_by").unwrap_or_else(|| "CreatedDate".to_string());

    let schemas = fetch_schemas(
        h,
        &project_key,
        &keyword,
        page_size,
        page_number,
        sort_descending,
        &sort_by,
    )
    .await?;

    Ok(json!({
        "message": "Schemas retrieved successfully",
        "project_key": project_key,
        "schemas": schemas,
    }))
}

pub async fn get_schema(h: &ToolHandler, args: Value) -> ToolResult<Value> {
    h.require_auth()?;
    let schema_id =
        get_string(&args, "schema_id").ok_or_else(|| ToolError::missing_field("schema_id"))?;
    // A project context must be active even though the endpoint keys on the
    // schema id alone.
    h.resolve_project_key(&args)?;

    let schema = h
        .gateway
        .get("getting schema", &h.api.schema_get_url(&schema_id), &[])
        .await?;

    Ok(json!({
        "message": format!("Schema {} retrieved successfully", schema_id),
        "schema": schema,
    }))
}

pub async fn update_schema_fields(h: &ToolHandler, args: Value) -> ToolResult<Value> {
    h.require_auth()?;
    let schema_id =
        get_string(&args, "schema_id").ok_or_else(|| ToolError::missing_field("schema_id"))?;
    let fields = get_array(&args, "fields").ok_or_else(|| ToolError::missing_field("fields"))?;
    h.resolve_project_key(&args)?;

    let payload = json!({
        "fields": fields,
        "schemaDefinitionItemId": schema_id,
        "deletableFieldNames": [],
    });
    let response = h
        .gateway
        .post_json("updating schema fields", &h.api.schema_fields_url(), &payload)
        .await?;

    Ok(json!({
        "message": format!("Schema {} fields updated successfully", schema_id),
        "schema_id": schema_id,
        "updated_fields": fields,
        "response": response,
    }))
}

pub async fn finalize_schema(h: &ToolHandler, args: Value) -> ToolResult<Value> {
    h.require_auth()?;
    let schema_id =
        get_string(&args, "schema_id").ok_or_else(|| ToolError::missing_field("schema_id"))?;
    h.resolve_project_key(&args)?;

    let response = h
        .gateway
        .get("finalizing schema", &h.api.schema_get_url(&schema_id), &[])
        .await?;

    Ok(json!({
        "message": format!("Schema {} finalized successfully", schema_id),
        "response": response,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collection_name_is_pluralised() {
        assert_eq!(derive_collection_name("order"), "orders");
        assert_eq!(derive_collection_name("Product"), "Products");
    }
}
