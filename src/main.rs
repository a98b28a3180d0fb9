//! Blocks Cloud MCP Server
//!
//! A Rust MCP server exposing Selise Blocks cloud administration
//! (projects, schemas, CAPTCHA, IAM, Blocks CLI) as agent tools.

use anyhow::Result;
use blocks_cloud_mcp::config::Config;
use blocks_cloud_mcp::context::ProjectContext;
use blocks_cloud_mcp::gateway::ApiGateway;
use blocks_cloud_mcp::logging::{LogLevelFilter, Logger};
use blocks_cloud_mcp::session::SessionStore;
use blocks_cloud_mcp::tools::{ToolContext, ToolHandler, render_error, render_success};
use clap::Parser;
use rmcp::{
    ErrorData, RoleServer, ServerHandler, ServiceExt,
    model::{
        CallToolRequestParams, CallToolResult, Content, InitializeResult, ListToolsResult,
        PaginatedRequestParams, ServerCapabilities,
    },
    service::RequestContext,
    transport::io::stdio,
};
use serde_json::Value;
use std::fs::OpenOptions;
use std::sync::Arc;
use tracing::{Level, debug, warn};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "blocks-cloud-mcp", version, about = "Selise Blocks cloud MCP server")]
struct Cli {
    /// Path to the configuration file (default: blocks-mcp.yaml if present)
    #[arg(short, long)]
    config: Option<String>,

    /// Enable debug-level logging
    #[arg(short, long)]
    verbose: bool,

    /// Log destination: 0/off, 1/stdout, 2/stderr, or a filename
    #[arg(long, default_value = "2")]
    log: String,
}

const INSTRUCTIONS: &str = "\
Selise Blocks cloud administration. Start with login(username, password), then \
get_projects() to discover tenants and application domains. Project-scoped tools \
fall back to the active project context when project_key is omitted.";

/// MCP server handler.
#[derive(Clone)]
struct BlocksCloudServer {
    tool_handler: Arc<ToolHandler>,
    /// Atomic level filter for logging (client can adjust via logging/setLevel).
    level_filter: Arc<LogLevelFilter>,
}

impl ServerHandler for BlocksCloudServer {
    fn get_info(&self) -> InitializeResult {
        InitializeResult {
            protocol_version: Default::default(),
            server_info: rmcp::model::Implementation {
                name: "blocks-cloud-mcp".into(),
                version: env!("CARGO_PKG_VERSION").into(),
                ..Default::default()
            },
            capabilities: ServerCapabilities {
                tools: Some(rmcp::model::ToolsCapability::default()),
                logging: Some(Default::default()),
                ..Default::default()
            },
            instructions: Some(INSTRUCTIONS.to_string()),
        }
    }

    async fn set_level(
        &self,
        request: rmcp::model::SetLevelRequestParams,
        _context: RequestContext<RoleServer>,
    ) -> std::result::Result<(), ErrorData> {
        self.level_filter.set(request.level);
        tracing::info!(level = ?request.level, "Logging level updated via MCP");
        Ok(())
    }

    async fn list_tools(
        &self,
        _request: Option<PaginatedRequestParams>,
        _context: RequestContext<RoleServer>,
    ) -> std::result::Result<ListToolsResult, ErrorData> {
        Ok(ListToolsResult {
            tools: self.tool_handler.get_tools(),
            next_cursor: None,
            meta: None,
        })
    }

    async fn call_tool(
        &self,
        request: CallToolRequestParams,
        context: RequestContext<RoleServer>,
    ) -> std::result::Result<CallToolResult, ErrorData> {
        let tool_name = request.name.clone();
        let start = std::time::Instant::now();

        // Create logger for this request
        let logger = Logger::new()
            .with_peer(context.peer.clone())
            .with_level_filter(Arc::clone(&self.level_filter))
            .with_name(format!("tool:{}", tool_name));
        let tool_ctx = ToolContext::new(logger);

        let args = Value::Object(request.arguments.unwrap_or_default());
        match self.tool_handler.call_tool(&tool_name, args, &tool_ctx).await {
            Ok(result) => {
                let elapsed = start.elapsed();
                debug!(tool = %tool_name, duration_ms = elapsed.as_millis() as u64, "Tool call succeeded");
                Ok(CallToolResult {
                    content: vec![Content::text(render_success(result))],
                    is_error: None,
                    meta: None,
                    structured_content: None,
                })
            }
            Err(err) => {
                let elapsed = start.elapsed();
                warn!(
                    tool = %tool_name,
                    error_code = ?err.code,
                    error_message = %err.message,
                    duration_ms = elapsed.as_millis() as u64,
                    "Tool call failed"
                );
                Ok(CallToolResult {
                    content: vec![Content::text(render_error(&err))],
                    is_error: Some(true),
                    meta: None,
                    structured_content: None,
                })
            }
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on --log option
    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    match cli.log.as_str() {
        "0" | "off" => {
            // No logging
        }
        "1" | "stdout" => {
            let subscriber = FmtSubscriber::builder()
                .with_max_level(level)
                .with_writer(std::io::stdout)
                .finish();
            tracing::subscriber::set_global_default(subscriber)?;
        }
        "2" | "stderr" => {
            let subscriber = FmtSubscriber::builder()
                .with_max_level(level)
                .with_writer(std::io::stderr)
                .finish();
            tracing::subscriber::set_global_default(subscriber)?;
        }
        filename => {
            // Log to file (append mode)
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(filename)?;
            let subscriber = FmtSubscriber::builder()
                .with_max_level(level)
                .with_writer(file)
                .with_ansi(false)
                .finish();
            tracing::subscriber::set_global_default(subscriber)?;
        }
    }

    let config = match &cli.config {
        Some(path) => {
            let mut config = Config::load(path)?;
            config.apply_env_overrides();
            config
        }
        None => Config::load_or_default(),
    };

    tracing::info!(
        "Starting Blocks Cloud MCP Server v{}",
        env!("CARGO_PKG_VERSION")
    );
    tracing::info!("API base: {}", config.api.base_url);

    let api = Arc::new(config.api.clone());
    let session = Arc::new(SessionStore::new(
        api.expiry_margin_secs,
        api.base_headers(),
    ));
    let context = Arc::new(ProjectContext::new());
    let gateway = Arc::new(ApiGateway::new(&api, Arc::clone(&session))?);

    let tool_handler = Arc::new(ToolHandler::new(session, context, gateway, api));
    let server = BlocksCloudServer {
        tool_handler,
        level_filter: Arc::new(LogLevelFilter::default()),
    };

    // Run the stdio server
    tracing::info!("Server ready, listening on stdio");
    let transport = stdio();
    let service = server.serve(transport).await?;
    service.waiting().await?;

    Ok(())
}
