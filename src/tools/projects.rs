//! Project listing, creation and manual context override tools.

use super::{ToolContext, ToolHandler, get_bool, get_i64, get_string, make_tool};
use crate::domain::{placeholder_domain, resolve_project_domain};
use crate::error::{ToolError, ToolResult};
use rmcp::model::Tool;
use serde_json::{Value, json};

pub fn get_tools() -> Vec<Tool> {
    vec![
        make_tool(
            "get_projects",
            "Get projects from the Selise Blocks API and extract application domains. \
             Discovered domains refresh the active project context.",
            json!({
                "tenant_group_id": {
                    "type": "string",
                    "description": "Tenant group ID to filter projects (optional)"
                },
                "page": {
                    "type": "integer",
                    "description": "Page number for pagination (default: 0)"
                },
                "page_size": {
                    "type": "integer",
                    "description": "Number of items per page (default: 100)"
                }
            }),
            vec![],
        ),
        make_tool(
            "create_project",
            "Create a new project in Selise Cloud and pin the active context to it.",
            json!({
                "project_name": {
                    "type": "string",
                    "description": "Name of the project to create"
                },
                "repo_name": {
                    "type": "string",
                    "description": "Repository name (e.g. 'username/repo')"
                },
                "repo_link": {
                    "type": "string",
                    "description": "Full GitHub repository URL"
                },
                "repo_id": {
                    "type": "string",
                    "description": "Repository ID from the Git provider (default: 'Any')"
                },
                "is_production": {
                    "type": "boolean",
                    "description": "Whether this is a production environment (default: false)"
                }
            }),
            vec!["project_name", "repo_name", "repo_link"],
        ),
        make_tool(
            "set_application_domain",
            "Manually set the application domain and tenant ID for the active project, \
             bypassing all inference.",
            json!({
                "domain": {
                    "type": "string",
                    "description": "Application domain URL"
                },
                "tenant_id": {
                    "type": "string",
                    "description": "Tenant ID for the project"
                },
                "project_name": {
                    "type": "string",
                    "description": "Project name (optional)"
                }
            }),
            vec!["domain", "tenant_id"],
        ),
    ]
}

pub async fn get_projects(h: &ToolHandler, args: Value, ctx: &ToolContext) -> ToolResult<Value> {
    h.require_auth()?;

    let tenant_group_id = get_string(&args, "tenant_group_id").unwrap_or_default();
    let page = get_i64(&args, "page").unwrap_or(0);
    let page_size = get_i64(&args, "page_size").unwrap_or(100);

    let mut query = vec![
        ("page", page.to_string()),
        ("pageSize", page_size.to_string()),
    ];
    if !tenant_group_id.is_empty() {
        query.push(("tenantGroupId", tenant_group_id));
    }

    let groups = h
        .gateway
        .get("project retrieval", &h.api.project_list_url(), &query)
        .await?;

    let mut extracted = Vec::new();
    let empty = Vec::new();
    for group in groups.as_array().unwrap_or(&empty) {
        let group_id = group.get("tenantGroupId").cloned().unwrap_or(Value::Null);
        for project in group
            .get("projects")
            .and_then(Value::as_array)
            .unwrap_or(&empty)
        {
            let name = project.get("name").and_then(Value::as_str);
            let tenant_id = project.get("tenantId").and_then(Value::as_str);
            let domain = resolve_project_domain(&h.gateway, &h.api, project).await;

            let contexts = match &domain {
                Some(domain) => {
                    let environment = project
                        .get("environment")
                        .and_then(Value::as_str)
                        .unwrap_or("dev");
                    let cookie_domain = project
                        .get("cookieDomain")
                        .and_then(Value::as_str)
                        .unwrap_or(&h.api.cookie_domain);
                    json!([{
                        "environment": environment,
                        "domain": domain,
                        "cookie_domain": cookie_domain,
                    }])
                }
                None => json!([]),
            };

            if let Some(ref domain) = domain {
                let updated = h.context.update_if_unset_or_matching(domain, tenant_id, name);
                if updated {
                    ctx.logger.debug(&format!(
                        "Context updated from project listing: {} -> {}",
                        name.unwrap_or("?"),
                        domain
                    ));
                }
            }

            extracted.push(json!({
                "project_name": name,
                "tenant_id": tenant_id,
                "tenant_group_id": group_id,
                "item_id": project.get("itemId").cloned().unwrap_or(Value::Null),
                "application_contexts": contexts,
            }));
        }
    }

    Ok(json!({
        "message": "Projects retrieved successfully",
        "projects": extracted,
        "global_state": h.context.snapshot(),
    }))
}

pub async fn create_project(h: &ToolHandler, args: Value, ctx: &ToolContext) -> ToolResult<Value> {
    h.require_auth()?;

    let project_name =
        get_string(&args, "project_name").ok_or_else(|| ToolError::missing_field("project_name"))?;
    let repo_name =
        get_string(&args, "repo_name").ok_or_else(|| ToolError::missing_field("repo_name"))?;
    let repo_link =
        get_string(&args, "repo_link").ok_or_else(|| ToolError::missing_field("repo_link"))?;
    let repo_id = get_string(&args, "repo_id").unwrap_or_else(|| "Any".to_string());
    let is_production = get_bool(&args, "is_production").unwrap_or(false);

    let placeholder = placeholder_domain(&project_name, &h.api.cookie_domain);
    let create_payload = json!({
        "name": project_name,
        "isAcceptBlocksTerms": true,
        "isUseBlocksExclusively": true,
        "isProduction": is_production,
        "resources": [{
            "name": repo_name,
            "link": repo_link,
            "resourceId": repo_id,
        }],
        "applicationContexts": [{
            "environment": "dev",
            "domain": placeholder,
            "cookieDomain": h.api.cookie_domain,
        }],
    });

    let create_data = h
        .gateway
        .post_json("project creation", &h.api.project_create_url(), &create_payload)
        .await?;

    let Some(tenant_group_id) = create_data
        .get("tenantGroupId")
        .and_then(Value::as_str)
        .filter(|id| !id.is_empty())
        .map(String::from)
    else {
        return Err(ToolError::remote_failure(
            "Project creation failed. No tenantGroupId received.",
            create_data,
        ));
    };

    // The create response does not carry the concrete tenant; search a fresh
    // listing of the new group for a name match.
    let (tenant_id, listed_domain) =
        lookup_created_project(h, &tenant_group_id, &project_name, ctx).await;
    let application_domain = listed_domain.unwrap_or(placeholder);

    // Creation is authoritative: pin the context even if a project was
    // already active, and even when the tenant could not be resolved yet.
    h.context.pin(
        Some(application_domain.clone()),
        tenant_id.clone(),
        Some(project_name.clone()),
    );

    Ok(json!({
        "message": format!("Project '{}' created successfully", project_name),
        "project_details": {
            "name": project_name,
            "tenantGroupId": tenant_group_id,
            "tenantId": tenant_id,
            "application_domain": application_domain,
            "repository": {
                "name": repo_name,
                "link": repo_link,
                "id": repo_id,
            },
            "is_production": is_production,
        }
    }))
}

/// Resolve the tenant id and real domain of a just-created project from the
/// listing endpoint. Failures here never fail the creation itself.
async fn lookup_created_project(
    h: &ToolHandler,
    tenant_group_id: &str,
    project_name: &str,
    ctx: &ToolContext,
) -> (Option<String>, Option<String>) {
    let query = [
        ("page", "0".to_string()),
        ("pageSize", "100".to_string()),
        ("tenantGroupId", tenant_group_id.to_string()),
    ];
    let groups = match h
        .gateway
        .get("project lookup", &h.api.project_list_url(), &query)
        .await
    {
        Ok(groups) => groups,
        Err(err) => {
            ctx.logger.warning(&format!(
                "Could not resolve tenant for new project '{}': {}",
                project_name, err
            ));
            return (None, None);
        }
    };

    let Some(project) = find_project_by_name(&groups, project_name) else {
        return (None, None);
    };

    let tenant_id = project
        .get("tenantId")
        .and_then(Value::as_str)
        .filter(|id| !id.is_empty())
        .map(String::from);
    let domain = resolve_project_domain(&h.gateway, &h.api, project).await;
    (tenant_id, domain)
}

fn find_project_by_name<'a>(groups: &'a Value, name: &str) -> Option<&'a Value> {
    groups.as_array()?.iter().find_map(|group| {
        group
            .get("projects")?
            .as_array()?
            .iter()
            .find(|p| p.get("name").and_then(Value::as_str) == Some(name))
    })
}

pub fn set_application_domain(h: &ToolHandler, args: Value) -> ToolResult<Value> {
    let domain = get_string(&args, "domain").ok_or_else(|| ToolError::missing_field("domain"))?;
    let tenant_id =
        get_string(&args, "tenant_id").ok_or_else(|| ToolError::missing_field("tenant_id"))?;
    let project_name = get_string(&args, "project_name").filter(|n| !n.is_empty());

    h.context.pin(Some(domain), Some(tenant_id), project_name);

    Ok(json!({
        "message": "Application domain and tenant ID set successfully",
        "global_state": h.context.snapshot(),
    }))
}
