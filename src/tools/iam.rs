//! IAM role and permission administration tools.

use super::{ToolContext, ToolHandler, get_bool, get_i64, get_string, get_string_array, make_tool};
use crate::error::{ToolError, ToolResult};
use rmcp::model::Tool;
use serde_json::{Value, json};

pub fn get_tools() -> Vec<Tool> {
    vec![
        make_tool(
            "list_roles",
            "List IAM roles for a project with pagination and search.",
            json!({
                "project_key": {
                    "type": "string",
                    "description": "Project key / tenant ID (falls back to the active project context)"
                },
                "page": {
                    "type": "integer",
                    "description": "Page number (default: 0)"
                },
                "page_size": {
                    "type": "integer",
                    "description": "Number of roles per page (default: 10)"
                },
                "search": {
                    "type": "string",
                    "description": "Search filter (default: '')"
                },
                "sort_by": {
                    "type": "string",
                    "description": "Property to sort by (default: 'Name')"
                },
                "sort_descending": {
                    "type": "boolean",
                    "description": "Sort in descending order (default: false)"
                }
            }),
            vec![],
        ),
        make_tool(
            "create_role",
            "Create a new IAM role in a project.",
            json!({
                "name": {
                    "type": "string",
                    "description": "Display name of the role"
                },
                "description": {
                    "type": "string",
                    "description": "Description of the role"
                },
                "slug": {
                    "type": "string",
                    "description": "Unique slug identifier for the role"
                },
                "project_key": {
                    "type": "string",
                    "description": "Project key / tenant ID (falls back to the active project context)"
                }
            }),
            vec!["name", "description", "slug"],
        ),
        make_tool(
            "list_permissions",
            "List IAM permissions for a project with pagination and filtering.",
            json!({
                "project_key": {
                    "type": "string",
                    "description": "Project key / tenant ID (falls back to the active project context)"
                },
                "page": {
                    "type": "integer",
                    "description": "Page number (default: 0)"
                },
                "page_size": {
                    "type": "integer",
                    "description": "Number of permissions per page (default: 10)"
                },
                "search": {
                    "type": "string",
                    "description": "Search filter (default: '')"
                },
                "is_built_in": {
                    "type": "string",
                    "description": "Filter by built-in flag: 'true', 'false' or '' for all (default: '')"
                },
                "resource_group": {
                    "type": "string",
                    "description": "Filter by resource group (default: '')"
                },
                "sort_by": {
                    "type": "string",
                    "description": "Property to sort by (default: 'Name')"
                },
                "sort_descending": {
                    "type": "boolean",
                    "description": "Sort in descending order (default: false)"
                }
            }),
            vec![],
        ),
        make_tool(
            "create_permission",
            "Create a new IAM permission in a project.",
            json!({
                "name": {
                    "type": "string",
                    "description": "Name of the permission"
                },
                "description": {
                    "type": "string",
                    "description": "Description of the permission"
                },
                "resource": {
                    "type": "string",
                    "description": "Resource the permission applies to"
                },
                "resource_group": {
                    "type": "string",
                    "description": "Resource group the permission belongs to"
                },
                "tags": {
                    "type": "string",
                    "description": "Comma-separated tags for the permission"
                },
                "permission_type": {
                    "type": "integer",
                    "description": "Permission type (default: 3)"
                },
                "dependent_permissions": {
                    "type": "array",
                    "description": "Slugs of permissions this one depends on (default: [])",
                    "items": { "type": "string" }
                },
                "is_built_in": {
                    "type": "boolean",
                    "description": "Whether this is a built-in permission (default: false)"
                },
                "project_key": {
                    "type": "string",
                    "description": "Project key / tenant ID (falls back to the active project context)"
                }
            }),
            vec!["name", "description", "resource", "resource_group", "tags"],
        ),
        make_tool(
            "update_permission",
            "Update an existing IAM permission.",
            json!({
                "item_id": {
                    "type": "string",
                    "description": "Item ID of the permission to update"
                },
                "name": {
                    "type": "string",
                    "description": "Name of the permission"
                },
                "description": {
                    "type": "string",
                    "description": "Description of the permission"
                },
                "resource": {
                    "type": "string",
                    "description": "Resource the permission applies to"
                },
                "resource_group": {
                    "type": "string",
                    "description": "Resource group the permission belongs to"
                },
                "tags": {
                    "type": "string",
                    "description": "Comma-separated tags for the permission"
                },
                "permission_type": {
                    "type": "integer",
                    "description": "Permission type (default: 3)"
                },
                "dependent_permissions": {
                    "type": "array",
                    "description": "Slugs of permissions this one depends on (default: [])",
                    "items": { "type": "string" }
                },
                "is_built_in": {
                    "type": "boolean",
                    "description": "Whether this is a built-in permission (default: false)"
                },
                "project_key": {
                    "type": "string",
                    "description": "Project key / tenant ID (falls back to the active project context)"
                }
            }),
            vec!["item_id", "name", "description", "resource", "resource_group", "tags"],
        ),
        make_tool(
            "get_resource_groups",
            "Get the resource groups available in a project, with permission counts.",
            json!({
                "project_key": {
                    "type": "string",
                    "description": "Project key / tenant ID (falls back to the active project context)"
                }
            }),
            vec![],
        ),
    ]
}

async fn fetch_roles(h: &ToolHandler, project_key: &str) -> ToolResult<Value> {
    let payload = json!({
        "projectKey": project_key,
        "page": 0,
        "pageSize": 10,
        "filter": { "search": "" },
        "sort": { "property": "Name", "isDescending": false },
    });
    h.gateway
        .post_json("listing roles", &h.api.iam_get_roles_url(), &payload)
        .await
}

pub async fn list_roles(h: &ToolHandler, args: Value) -> ToolResult<Value> {
    h.require_auth()?;
    let project_key = h.resolve_project_key(&args)?;
    let page = get_i64(&args, "page").unwrap_or(0);
    let page_size = get_i64(&args, "page_size").unwrap_or(10);
    let search = get_string(&args, "search").unwrap_or_default();
    let sort_by = get_string(&args, "sort_by").unwrap_or_else(|| "Name".to_string());
    let sort_descending = get_bool(&args, "sort_descending").unwrap_or(false);

    let payload = json!({
        "projectKey": project_key,
        "page": page,
        "pageSize": page_size,
        "filter": { "search": search },
        "sort": { "property": sort_by, "isDescending": sort_descending },
    });
    let data = h
        .gateway
        .post_json("listing roles", &h.api.iam_get_roles_url(), &payload)
        .await?;

    let roles = data
        .get("data")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default();
    let total_count = data
        .get("totalCount")
        .and_then(Value::as_i64)
        .unwrap_or(roles.len() as i64);

    let summary: Vec<Value> = roles
        .iter()
        .map(|role| {
            let permissions_count = role
                .get("permissions")
                .and_then(Value::as_array)
                .map(Vec::len)
                .unwrap_or(0);
            json!({
                "name": role.get("name").cloned().unwrap_or(Value::Null),
                "slug": role.get("slug").cloned().unwrap_or(Value::Null),
                "description": role.get("description").cloned().unwrap_or(Value::Null),
                "permissions_count": permissions_count,
                "item_id": role.get("itemId").cloned().unwrap_or(Value::Null),
                "created_date": role.get("createdDate").cloned().unwrap_or(Value::Null),
            })
        })
        .collect();

    Ok(json!({
        "message": format!("Found {} role(s) (total: {})", roles.len(), total_count),
        "project_key": project_key,
        "total_count": total_count,
        "roles": roles,
        "summary": summary,
    }))
}

pub async fn create_role(h: &ToolHandler, args: Value, ctx: &ToolContext) -> ToolResult<Value> {
    h.require_auth()?;
    let name = get_string(&args, "name").ok_or_else(|| ToolError::missing_field("name"))?;
    let description =
        get_string(&args, "description").ok_or_else(|| ToolError::missing_field("description"))?;
    let slug = get_string(&args, "slug").ok_or_else(|| ToolError::missing_field("slug"))?;
    let project_key = h.resolve_project_key(&args)?;

    let payload = json!({
        "name": name,
        "description": description,
        "slug": slug,
        "projectKey": project_key,
    });
    let response = h
        .gateway
        .post_json("creating role", &h.api.iam_create_role_url(), &payload)
        .await?;

    if !response.get("isSuccess").and_then(Value::as_bool).unwrap_or(false) {
        return Err(ToolError::remote_failure("Failed to create role", response));
    }

    let updated_roles = match fetch_roles(h, &project_key).await {
        Ok(data) => data.get("data").cloned().unwrap_or_else(|| json!([])),
        Err(err) => {
            ctx.logger
                .warning(&format!("Could not fetch updated roles: {}", err));
            json!([])
        }
    };

    Ok(json!({
        "message": format!("Role '{}' created successfully", name),
        "role_details": {
            "name": name,
            "description": description,
            "slug": slug,
            "project_key": project_key,
            "item_id": response.get("itemId").cloned().unwrap_or(Value::Null),
        },
        "response": response,
        "updated_roles": updated_roles,
    }))
}

async fn fetch_permissions(h: &ToolHandler, project_key: &str) -> ToolResult<Value> {
    let payload = json!({
        "page": 0,
        "pageSize": 10,
        "projectKey": project_key,
        "roles": [],
        "sort": { "property": "Name", "isDescending": false },
        "filter": { "search": "", "isBuiltIn": "", "resourceGroup": "" },
    });
    h.gateway
        .post_json("listing permissions", &h.api.iam_get_permissions_url(), &payload)
        .await
}

pub async fn list_permissions(h: &ToolHandler, args: Value) -> ToolResult<Value> {
    h.require_auth()?;
    let project_key = h.resolve_project_key(&args)?;
    let page = get_i64(&args, "page").unwrap_or(0);
    let page_size = get_i64(&args, "page_size").unwrap_or(10);
    let search = get_string(&args, "search").unwrap_or_default();
    let is_built_in = get_string(&args, "is_built_in").unwrap_or_default();
    let resource_group = get_string(&args, "resource_group").unwrap_or_default();
    let sort_by = get_string(&args, "sort_by").unwrap_or_else(|| "Name".to_string());
    let sort_descending = get_bool(&args, "sort_descending").unwrap_or(false);

    let payload = json!({
        "page": page,
        "pageSize": page_size,
        "projectKey": project_key,
        "roles": [],
        "sort": { "property": sort_by, "isDescending": sort_descending },
        "filter": {
            "search": search,
            "isBuiltIn": is_built_in,
            "resourceGroup": resource_group,
        },
    });
    let data = h
        .gateway
        .post_json("listing permissions", &h.api.iam_get_permissions_url(), &payload)
        .await?;

    let permissions = data
        .get("data")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default();
    let total_count = data
        .get("totalCount")
        .and_then(Value::as_i64)
        .unwrap_or(permissions.len() as i64);

    let summary: Vec<Value> = permissions
        .iter()
        .map(|permission| {
            json!({
                "name": permission.get("name").cloned().unwrap_or(Value::Null),
                "resource": permission.get("resource").cloned().unwrap_or(Value::Null),
                "resource_group": permission.get("resourceGroup").cloned().unwrap_or(Value::Null),
                "type": permission.get("type").cloned().unwrap_or(Value::Null),
                "tags": permission.get("tags").cloned().unwrap_or(Value::Null),
                "is_built_in": permission.get("isBuiltIn").cloned().unwrap_or(Value::Null),
                "item_id": permission.get("itemId").cloned().unwrap_or(Value::Null),
                "created_date": permission.get("createdDate").cloned().unwrap_or(Value::Null),
            })
        })
        .collect();

    Ok(json!({
        "message": format!(
            "Found {} permission(s) (total: {})",
            permissions.len(),
            total_count
        ),
        "project_key": project_key,
        "total_count": total_count,
        "permissions": permissions,
        "summary": summary,
    }))
}

struct PermissionFields {
    name: String,
    description: String,
    resource: String,
    resource_group: String,
    tags: String,
    permission_type: i64,
    dependent_permissions: Vec<String>,
    is_built_in: bool,
}

fn permission_fields(args: &Value) -> ToolResult<PermissionFields> {
    Ok(PermissionFields {
        name: get_string(args, "name").ok_or_else(|| ToolError::missing_field("name"))?,
        description: get_string(args, "description")
            .ok_or_else(|| ToolError::missing_field("description"))?,
        resource: get_string(args, "resource")
            .ok_or_else(|| ToolError::missing_field("resource"))?,
        resource_group: get_string(args, "resource_group")
            .ok_or_else(|| ToolError::missing_field("resource_group"))?,
        tags: get_string(args, "tags").ok_or_else(|| ToolError::missing_field("tags"))?,
        permission_type: get_i64(args, "permission_type").unwrap_or(3),
        dependent_permissions: get_string_array(args, "dependent_permissions").unwrap_or_default(),
        is_built_in: get_bool(args, "is_built_in").unwrap_or(false),
    })
}

pub async fn create_permission(
    h: &ToolHandler,
    args: Value,
    ctx: &ToolContext,
) -> ToolResult<Value> {
    h.require_auth()?;
    let fields = permission_fields(&args)?;
    let project_key = h.resolve_project_key(&args)?;

    let payload = json!({
        "name": fields.name,
        "type": fields.permission_type,
        "resource": fields.resource,
        "resourceGroup": fields.resource_group,
        "tags": fields.tags,
        "description": fields.description,
        "dependentPermissions": fields.dependent_permissions,
        "projectKey": project_key,
        "isBuiltIn": fields.is_built_in,
    });
    let response = h
        .gateway
        .post_json("creating permission", &h.api.iam_create_permission_url(), &payload)
        .await?;

    if !response.get("isSuccess").and_then(Value::as_bool).unwrap_or(false) {
        return Err(ToolError::remote_failure(
            "Failed to create permission",
            response,
        ));
    }

    let updated_permissions = match fetch_permissions(h, &project_key).await {
        Ok(data) => data.get("data").cloned().unwrap_or_else(|| json!([])),
        Err(err) => {
            ctx.logger
                .warning(&format!("Could not fetch updated permissions: {}", err));
            json!([])
        }
    };

    Ok(json!({
        "message": format!("Permission '{}' created successfully", fields.name),
        "permission_details": {
            "name": fields.name,
            "description": fields.description,
            "resource": fields.resource,
            "resource_group": fields.resource_group,
            "tags": fields.tags,
            "type": fields.permission_type,
            "is_built_in": fields.is_built_in,
            "project_key": project_key,
            "item_id": response.get("itemId").cloned().unwrap_or(Value::Null),
        },
        "response": response,
        "updated_permissions": updated_permissions,
    }))
}

pub async fn update_permission(
    h: &ToolHandler,
    args: Value,
    ctx: &ToolContext,
) -> ToolResult<Value> {
    h.require_auth()?;
    let item_id = get_string(&args, "item_id").ok_or_else(|| ToolError::missing_field("item_id"))?;
    let fields = permission_fields(&args)?;
    let project_key = h.resolve_project_key(&args)?;

    let payload = json!({
        "itemId": item_id,
        "name": fields.name,
        "type": fields.permission_type,
        "resource": fields.resource,
        "resourceGroup": fields.resource_group,
        "tags": fields.tags,
        "description": fields.description,
        "dependentPermissions": fields.dependent_permissions,
        "projectKey": project_key,
        "isBuiltIn": fields.is_built_in,
    });
    let response = h
        .gateway
        .post_json("updating permission", &h.api.iam_update_permission_url(), &payload)
        .await?;

    if !response.get("isSuccess").and_then(Value::as_bool).unwrap_or(false) {
        return Err(ToolError::remote_failure(
            "Failed to update permission",
            response,
        ));
    }

    let updated_permissions = match fetch_permissions(h, &project_key).await {
        Ok(data) => data.get("data").cloned().unwrap_or_else(|| json!([])),
        Err(err) => {
            ctx.logger
                .warning(&format!("Could not fetch updated permissions: {}", err));
            json!([])
        }
    };

    Ok(json!({
        "message": format!("Permission '{}' updated successfully", fields.name),
        "permission_details": {
            "item_id": item_id,
            "name": fields.name,
            "description": fields.description,
            "resource": fields.resource,
            "resource_group": fields.resource_group,
            "tags": fields.tags,
            "type": fields.permission_type,
            "is_built_in": fields.is_built_in,
            "project_key": project_key,
        },
        "response": response,
        "updated_permissions": updated_permissions,
    }))
}

pub async fn get_resource_groups(h: &ToolHandler, args: Value) -> ToolResult<Value> {
    h.require_auth()?;
    let project_key = h.resolve_project_key(&args)?;

    let query = [("ProjectKey", project_key.to_string())];
    let data = h
        .gateway
        .get("getting resource groups", &h.api.iam_get_resource_groups_url(), &query)
        .await?;

    let groups = data.as_array().cloned().unwrap_or_default();
    let summary: Vec<Value> = groups
        .iter()
        .map(|group| {
            json!({
                "resource_group": group.get("resourceGroup").cloned().unwrap_or(Value::Null),
                "count": group.get("count").cloned().unwrap_or(Value::Null),
            })
        })
        .collect();

    Ok(json!({
        "message": format!("Found {} resource group(s)", groups.len()),
        "project_key": project_key,
        "resource_groups": groups,
        "summary": summary,
    }))
}
