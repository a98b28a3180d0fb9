//! Configuration loading and management.
//!
//! Defaults target the public Selise Blocks cloud; a yaml file or environment
//! variables can point the server at another deployment of the same API.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Server configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,
}

/// Remote API endpoint configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL of the Blocks platform API.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Value for the `x-blocks-key` header sent on every request.
    #[serde(default = "default_blocks_key")]
    pub blocks_key: String,

    /// Origin of the cloud console, used for the `Origin`/`Referer` headers.
    #[serde(default = "default_console_origin")]
    pub console_origin: String,

    /// Cookie domain used when synthesizing placeholder application domains.
    #[serde(default = "default_cookie_domain")]
    pub cookie_domain: String,

    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Seconds subtracted from the token's reported lifetime so validity
    /// checks fail before an in-flight request can expire mid-call.
    #[serde(default = "default_expiry_margin_secs")]
    pub expiry_margin_secs: i64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            blocks_key: default_blocks_key(),
            console_origin: default_console_origin(),
            cookie_domain: default_cookie_domain(),
            timeout_secs: default_timeout_secs(),
            expiry_margin_secs: default_expiry_margin_secs(),
        }
    }
}

fn default_base_url() -> String {
    "https://api.seliseblocks.com".to_string()
}

fn default_blocks_key() -> String {
    "d7e5554c758541db8a18694b64ef423d".to_string()
}

fn default_console_origin() -> String {
    "https://cloud.seliseblocks.com".to_string()
}

fn default_cookie_domain() -> String {
    "seliseblocks.com".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_expiry_margin_secs() -> i64 {
    300 // 5 minutes
}

impl ApiConfig {
    /// Baseline header set carried by every outbound request.
    ///
    /// The upstream API gates requests on browser-shaped headers, so the set
    /// mirrors what the cloud console itself sends.
    pub fn base_headers(&self) -> Vec<(&'static str, String)> {
        vec![
            ("x-blocks-key", self.blocks_key.clone()),
            ("origin", self.console_origin.clone()),
            ("referer", format!("{}/", self.console_origin)),
            ("accept", "application/json".to_string()),
            ("accept-language", "en-US,en;q=0.9".to_string()),
            ("content-type", "application/json".to_string()),
            ("dnt", "1".to_string()),
            ("priority", "u=1, i".to_string()),
            (
                "sec-ch-ua",
                "\"Chromium\";v=\"139\", \"Not;A=Brand\";v=\"99\"".to_string(),
            ),
            ("sec-ch-ua-mobile", "?1".to_string()),
            ("sec-ch-ua-platform", "\"Android\"".to_string()),
            ("sec-fetch-dest", "empty".to_string()),
            ("sec-fetch-mode", "cors".to_string()),
            ("sec-fetch-site", "same-site".to_string()),
            (
                "user-agent",
                "Mozilla/5.0 (Linux; Android 6.0; Nexus 5 Build/MRA58N) \
                 AppleWebKit/537.36 (KHTML, like Gecko) Chrome/139.0.0.0 \
                 Mobile Safari/537.36"
                    .to_string(),
            ),
        ]
    }

    // Endpoint groups, derived from the base URL.

    pub fn login_url(&self) -> String {
        format!("{}/authentication/v1/OAuth/Token", self.base_url)
    }

    pub fn project_create_url(&self) -> String {
        format!("{}/identifier/v1/Project/Create", self.base_url)
    }

    pub fn project_list_url(&self) -> String {
        format!("{}/identifier/v1/Project/Gets", self.base_url)
    }

    pub fn project_detail_url(&self) -> String {
        format!("{}/identifier/v1/Project/Get", self.base_url)
    }

    pub fn schema_create_url(&self) -> String {
        format!("{}/graphql/v1/schemas/info", self.base_url)
    }

    pub fn schema_list_url(&self) -> String {
        format!("{}/graphql/v1/schemas", self.base_url)
    }

    pub fn schema_get_url(&self, schema_id: &str) -> String {
        format!("{}/graphql/v1/schemas/{}", self.base_url, schema_id)
    }

    pub fn schema_fields_url(&self) -> String {
        format!("{}/graphql/v1/schemas/fields", self.base_url)
    }

    pub fn auth_config_get_url(&self) -> String {
        format!("{}/authentication/v1/Configuration/Get", self.base_url)
    }

    pub fn auth_config_update_url(&self) -> String {
        format!("{}/authentication/v1/Configuration/Update", self.base_url)
    }

    pub fn captcha_save_url(&self) -> String {
        format!("{}/captcha/v1/Configuration/Save", self.base_url)
    }

    pub fn captcha_list_url(&self) -> String {
        format!("{}/captcha/v1/Configuration/Gets", self.base_url)
    }

    pub fn captcha_update_status_url(&self) -> String {
        format!("{}/captcha/v1/Configuration/UpdateStatus", self.base_url)
    }

    pub fn iam_get_roles_url(&self) -> String {
        format!("{}/iam/v1/Resource/GetRoles", self.base_url)
    }

    pub fn iam_create_role_url(&self) -> String {
        format!("{}/iam/v1/Resource/CreateRole", self.base_url)
    }

    pub fn iam_get_permissions_url(&self) -> String {
        format!("{}/iam/v1/Resource/GetPermissions", self.base_url)
    }

    pub fn iam_create_permission_url(&self) -> String {
        format!("{}/iam/v1/Resource/CreatePermission", self.base_url)
    }

    pub fn iam_update_permission_url(&self) -> String {
        format!("{}/iam/v1/Resource/UpdatePermission", self.base_url)
    }

    pub fn iam_get_resource_groups_url(&self) -> String {
        format!("{}/iam/v1/Resource/GetResourceGroups", self.base_url)
    }
}

impl Config {
    /// Load configuration from file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Load configuration from the default location or return defaults,
    /// then apply environment variable overrides.
    pub fn load_or_default() -> Self {
        let mut config = Self::load("blocks-mcp.yaml").unwrap_or_default();
        config.apply_env_overrides();
        config
    }

    /// Apply environment variable overrides on top of the loaded values.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(base) = std::env::var("BLOCKS_MCP_API_BASE") {
            self.api.base_url = base.trim_end_matches('/').to_string();
        }
        if let Ok(key) = std::env::var("BLOCKS_MCP_API_KEY") {
            self.api.blocks_key = key;
        }
        if let Ok(origin) = std::env::var("BLOCKS_MCP_CONSOLE_ORIGIN") {
            self.api.console_origin = origin;
        }
        if let Ok(timeout) = std::env::var("BLOCKS_MCP_TIMEOUT_SECS")
            && let Ok(timeout) = timeout.parse()
        {
            self.api.timeout_secs = timeout;
        }
    }
}
