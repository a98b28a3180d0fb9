//! Application domain resolution for project records.
//!
//! The listing endpoint is inconsistent about where a project's reachable
//! domain lives, so resolution walks an explicit ordered list of strategies,
//! first success wins:
//!
//! 1. an `applicationDomain` field already on the record,
//! 2. a detail lookup via the record's `itemId` (preferring the `dev`
//!    environment, then the first available domain, then a synthesized
//!    placeholder),
//! 3. the first domain inside an already-expanded `applicationContexts` list.

use crate::config::ApiConfig;
use crate::error::ToolResult;
use crate::gateway::ApiGateway;
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DomainStrategy {
    RecordField,
    DetailLookup,
    ExpandedContexts,
}

/// Resolution order. Kept as data so the fallback sequence stays visible
/// and testable instead of buried in nested conditionals.
pub const FALLBACK_ORDER: [DomainStrategy; 3] = [
    DomainStrategy::RecordField,
    DomainStrategy::DetailLookup,
    DomainStrategy::ExpandedContexts,
];

/// Resolve the reachable domain for one project record from a listing.
pub async fn resolve_project_domain(
    gateway: &ApiGateway,
    config: &ApiConfig,
    project: &Value,
) -> Option<String> {
    for strategy in FALLBACK_ORDER {
        if let Some(domain) = strategy.try_resolve(gateway, config, project).await {
            return Some(domain);
        }
    }
    None
}

impl DomainStrategy {
    async fn try_resolve(
        self,
        gateway: &ApiGateway,
        config: &ApiConfig,
        project: &Value,
    ) -> Option<String> {
        match self {
            DomainStrategy::RecordField => non_empty_str(project.get("applicationDomain")),
            DomainStrategy::DetailLookup => {
                let item_id = non_empty_str(project.get("itemId"))?;
                let name = non_empty_str(project.get("name"))
                    .unwrap_or_else(|| "unknown".to_string());
                match fetch_detail_domain(gateway, config, &item_id).await {
                    Ok(Some(domain)) => Some(domain),
                    // Detail record exists but carries no usable domain, or
                    // the lookup failed: synthesize a placeholder rather than
                    // dropping the project from the context flow.
                    Ok(None) => Some(placeholder_domain(&name, &config.cookie_domain)),
                    Err(err) => {
                        tracing::warn!(
                            item_id = %item_id,
                            error = %err,
                            "Project detail lookup failed; using placeholder domain"
                        );
                        Some(placeholder_domain(&name, &config.cookie_domain))
                    }
                }
            }
            DomainStrategy::ExpandedContexts => {
                domain_from_contexts(project.get("applicationContexts"))
            }
        }
    }
}

/// Fetch a project's detail record and extract its domain.
async fn fetch_detail_domain(
    gateway: &ApiGateway,
    config: &ApiConfig,
    item_id: &str,
) -> ToolResult<Option<String>> {
    let detail = gateway
        .get(
            "project detail lookup",
            &config.project_detail_url(),
            &[("id", item_id.to_string())],
        )
        .await?;
    Ok(domain_from_contexts(detail.get("applicationContexts")))
}

/// Pick a domain from an `applicationContexts` array: the `dev` environment
/// entry if present, else the first entry with a domain at all.
pub fn domain_from_contexts(contexts: Option<&Value>) -> Option<String> {
    let contexts = contexts?.as_array()?;
    let dev = contexts
        .iter()
        .find(|c| c.get("environment").and_then(Value::as_str) == Some("dev"))
        .and_then(|c| non_empty_str(c.get("domain")));
    dev.or_else(|| {
        contexts
            .iter()
            .find_map(|c| non_empty_str(c.get("domain")))
    })
}

/// Synthesized last-resort domain for a project with no resolvable one.
pub fn placeholder_domain(project_name: &str, cookie_domain: &str) -> String {
    format!("https://dev-{}-placeholder.{}", project_name, cookie_domain)
}

fn non_empty_str(value: Option<&Value>) -> Option<String> {
    value
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(String::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn placeholder_has_expected_shape() {
        assert_eq!(
            placeholder_domain("shop", "seliseblocks.com"),
            "https://dev-shop-placeholder.seliseblocks.com"
        );
    }

    #[test]
    fn contexts_prefer_dev_environment() {
        let contexts = json!([
            { "environment": "prod", "domain": "https://prod.example.com" },
            { "environment": "dev", "domain": "https://dev.example.com" },
        ]);
        assert_eq!(
            domain_from_contexts(Some(&contexts)).as_deref(),
            Some("https://dev.example.com")
        );
    }

    #[test]
    fn contexts_fall_back_to_first_domain() {
        let contexts = json!([
            { "environment": "stage" },
            { "environment": "prod", "domain": "https://prod.example.com" },
        ]);
        assert_eq!(
            domain_from_contexts(Some(&contexts)).as_deref(),
            Some("https://prod.example.com")
        );
    }

    #[test]
    fn empty_or_missing_contexts_yield_none() {
        assert_eq!(domain_from_contexts(None), None);
        assert_eq!(domain_from_contexts(Some(&json!([]))), None);
        assert_eq!(domain_from_contexts(Some(&json!({"not": "array"}))), None);
    }

    #[test]
    fn fallback_order_is_record_field_first() {
        assert_eq!(
            FALLBACK_ORDER,
            [
                DomainStrategy::RecordField,
                DomainStrategy::DetailLookup,
                DomainStrategy::ExpandedContexts,
            ]
        );
    }
}
