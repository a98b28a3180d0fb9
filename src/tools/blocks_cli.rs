//! Blocks CLI tools: detection, installation and local repository scaffolding.

use super::{ToolHandler, get_bool, get_string, make_tool};
use crate::error::{ErrorCode, ToolError, ToolResult};
use crate::shell::run_shell;
use rmcp::model::Tool;
use serde_json::{Value, json};

pub fn get_tools() -> Vec<Tool> {
    vec![
        make_tool(
            "check_blocks_cli",
            "Check whether the Blocks CLI is installed and report its version.",
            json!({}),
            vec![],
        ),
        make_tool(
            "install_blocks_cli",
            "Install the Blocks CLI globally via npm.",
            json!({}),
            vec![],
        ),
        make_tool(
            "create_local_repository",
            "Create a local repository with the Blocks CLI, wired to the active \
             project's tenant and application domain.",
            json!({
                "repository_name": {
                    "type": "string",
                    "description": "Name for the local repository (defaults to the active project name)"
                },
                "template": {
                    "type": "string",
                    "description": "Project template (default: 'web')"
                },
                "use_cli": {
                    "type": "boolean",
                    "description": "Pass --cli to scaffold a CLI-enabled project (default: true)"
                }
            }),
            vec![],
        ),
    ]
}

pub async fn check_blocks_cli() -> ToolResult<Value> {
    let out = run_shell("blocks --version").await;
    if out.success {
        Ok(json!({
            "message": "Blocks CLI is installed and available",
            "version": out.stdout,
        }))
    } else {
        // Not-installed is an answer, not an error; the status key here
        // survives envelope rendering.
        Ok(json!({
            "status": "not_installed",
            "message": "Blocks CLI is not installed",
            "error": out.stderr,
        }))
    }
}

pub async fn install_blocks_cli() -> ToolResult<Value> {
    let install = run_shell("npm install -g @seliseblocks/cli").await;
    if !install.success {
        return Err(
            ToolError::new(ErrorCode::LocalError, "Failed to install Blocks CLI").with_details(
                json!({
                    "error": install.stderr,
                    "output": install.stdout,
                }),
            ),
        );
    }

    let verify = run_shell("blocks --version").await;
    let version = if verify.success && !verify.stdout.is_empty() {
        verify.stdout
    } else {
        "Unknown".to_string()
    };

    Ok(json!({
        "message": "Blocks CLI installed successfully",
        "installation_output": install.stdout,
        "version": version,
    }))
}

pub async fn create_local_repository(h: &ToolHandler, args: Value) -> ToolResult<Value> {
    let (tenant_id, application_domain) =
        match (h.context.tenant_id(), h.context.application_domain()) {
            (Some(tenant), Some(domain)) => (tenant, domain),
            _ => {
                return Err(ToolError::new(
                    ErrorCode::MissingContext,
                    "Missing tenant ID or application domain. \
                     Please run get_projects or set_application_domain first.",
                ));
            }
        };

    let repository_name = get_string(&args, "repository_name")
        .filter(|n| !n.is_empty())
        .or_else(|| h.context.project_name())
        .unwrap_or_else(|| "selise-repository".to_string());
    let template = get_string(&args, "template").unwrap_or_else(|| "web".to_string());
    let use_cli = get_bool(&args, "use_cli").unwrap_or(true);

    let check = run_shell("blocks --version").await;
    if !check.success {
        return Err(ToolError::new(
            ErrorCode::LocalError,
            "Blocks CLI is not installed. Please run install_blocks_cli first.",
        )
        .with_details(json!({ "error": check.stderr })));
    }

    let cli_flag = if use_cli { " --cli" } else { "" };
    let command = format!(
        "blocks new {} {}{} --blocks-key {} --app-domain {}",
        template, repository_name, cli_flag, tenant_id, application_domain
    );
    let out = run_shell(&command).await;

    if out.success {
        Ok(json!({
            "message": format!("Local repository '{}' created successfully", repository_name),
            "command_used": command,
            "output": out.stdout,
            "tenant_id": tenant_id,
            "application_domain": application_domain,
        }))
    } else {
        Err(
            ToolError::new(ErrorCode::LocalError, "Failed to create local repository")
                .with_details(json!({
                    "command_used": command,
                    "error": out.stderr,
                    "output": out.stdout,
                })),
        )
    }
}
