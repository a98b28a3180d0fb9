//! Active project context store.
//!
//! Best-effort tracking of "which project are we operating on", so callers
//! can omit a project key on most tools. Identity facts are discovered
//! opportunistically by listing operations and pinned authoritatively by
//! project creation or the manual override tool.

use crate::error::{ToolError, ToolResult};
use serde_json::{Value, json};
use std::sync::Mutex;

#[derive(Debug, Clone, Default)]
struct ContextState {
    application_domain: Option<String>,
    tenant_id: Option<String>,
    project_name: Option<String>,
}

/// Injectable singleton holding the active tenant/project identity.
///
/// Updates follow "first writer wins, unless the name matches": once a
/// project has been pinned, later enumerations of other projects must not
/// silently steal the active context.
#[derive(Default)]
pub struct ProjectContext {
    state: Mutex<ContextState>,
}

impl ProjectContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Unconditional overwrite of all three fields (context pinning).
    ///
    /// Used by the manual override tool and by flows that just
    /// authoritatively resolved project identity, e.g. project creation.
    pub fn pin(
        &self,
        domain: Option<String>,
        tenant_id: Option<String>,
        project_name: Option<String>,
    ) {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        *state = ContextState {
            application_domain: domain,
            tenant_id,
            project_name,
        };
    }

    /// Conditional update for domains discovered incidentally by listings.
    ///
    /// Overwrites only if no domain is currently stored, or `project_name`
    /// equals the stored name (a repeated sighting of the pinned project's
    /// own domain refreshes it). Returns whether the context changed.
    pub fn update_if_unset_or_matching(
        &self,
        domain: &str,
        tenant_id: Option<&str>,
        project_name: Option<&str>,
    ) -> bool {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        let name_matches = match (project_name, &state.project_name) {
            (Some(candidate), Some(stored)) => candidate == stored,
            _ => false,
        };
        if state.application_domain.is_none() || name_matches {
            state.application_domain = Some(domain.to_string());
            state.tenant_id = tenant_id.map(String::from);
            state.project_name = project_name.map(String::from);
            true
        } else {
            false
        }
    }

    /// Resolve the effective tenant for a tenant-scoped tool.
    ///
    /// An explicit non-empty key always wins; otherwise the stored tenant is
    /// used; otherwise the call fails before any network attempt.
    pub fn require_tenant(&self, explicit: &str) -> ToolResult<String> {
        if !explicit.is_empty() {
            return Ok(explicit.to_string());
        }
        let state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state
            .tenant_id
            .clone()
            .ok_or_else(ToolError::missing_context)
    }

    pub fn application_domain(&self) -> Option<String> {
        let state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state.application_domain.clone()
    }

    pub fn tenant_id(&self) -> Option<String> {
        let state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state.tenant_id.clone()
    }

    pub fn project_name(&self) -> Option<String> {
        let state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state.project_name.clone()
    }

    /// Snapshot of the stored triple, as reported in tool results.
    pub fn snapshot(&self) -> Value {
        let state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        json!({
            "application_domain": state.application_domain,
            "tenant_id": state.tenant_id,
            "project_name": state.project_name,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;

    #[test]
    fn require_tenant_prefers_explicit_key() {
        let ctx = ProjectContext::new();
        ctx.pin(None, Some("T1".into()), None);
        assert_eq!(ctx.require_tenant("explicit").unwrap(), "explicit");
        assert_eq!(ctx.require_tenant("").unwrap(), "T1");
    }

    #[test]
    fn require_tenant_without_context_is_an_error() {
        let ctx = ProjectContext::new();
        let err = ctx.require_tenant("").unwrap_err();
        assert_eq!(err.code, ErrorCode::MissingContext);
    }

    #[test]
    fn first_sighting_wins() {
        let ctx = ProjectContext::new();
        assert!(ctx.update_if_unset_or_matching("D1", Some("T1"), Some("P1")));
        assert_eq!(ctx.application_domain().as_deref(), Some("D1"));
        assert_eq!(ctx.tenant_id().as_deref(), Some("T1"));
    }

    #[test]
    fn later_sighting_of_other_project_does_not_steal_context() {
        let ctx = ProjectContext::new();
        ctx.update_if_unset_or_matching("D1", Some("T1"), Some("P1"));
        assert!(!ctx.update_if_unset_or_matching("D2", Some("T2"), Some("P2")));
        assert_eq!(ctx.application_domain().as_deref(), Some("D1"));
        assert_eq!(ctx.project_name().as_deref(), Some("P1"));
    }

    #[test]
    fn matching_name_refreshes_domain() {
        let ctx = ProjectContext::new();
        ctx.update_if_unset_or_matching("D1", Some("T1"), Some("P1"));
        assert!(ctx.update_if_unset_or_matching("D2", Some("T1"), Some("P1")));
        assert_eq!(ctx.application_domain().as_deref(), Some("D2"));
    }

    #[test]
    fn pin_overwrites_unconditionally() {
        let ctx = ProjectContext::new();
        ctx.update_if_unset_or_matching("D1", Some("T1"), Some("P1"));
        ctx.pin(Some("D9".into()), None, Some("P9".into()));
        assert_eq!(ctx.application_domain().as_deref(), Some("D9"));
        assert_eq!(ctx.tenant_id(), None);
        assert_eq!(ctx.project_name().as_deref(), Some("P9"));
    }

    #[test]
    fn snapshot_reports_nulls_when_empty() {
        let ctx = ProjectContext::new();
        let snap = ctx.snapshot();
        assert!(snap["application_domain"].is_null());
        assert!(snap["tenant_id"].is_null());
        assert!(snap["project_name"].is_null());
    }
}
