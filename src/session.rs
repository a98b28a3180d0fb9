//! Process-wide authentication session store.
//!
//! Single source of truth for "are we authenticated, and with what". The
//! store never performs I/O and never fails; tools that require
//! authentication must check [`SessionStore::is_valid`] themselves before
//! touching the network.

use chrono::{DateTime, Duration, Utc};
use std::sync::Mutex;

/// The recorded bearer credential and its validity window.
#[derive(Debug, Clone)]
struct SessionState {
    access_token: Option<String>,
    refresh_token: Option<String>,
    expires_at: Option<DateTime<Utc>>,
    token_type: String,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            access_token: None,
            refresh_token: None,
            expires_at: None,
            token_type: "bearer".to_string(),
        }
    }
}

/// Injectable singleton holding the bearer session.
///
/// Interior mutability via `Mutex`; concurrent tool invocations may
/// interleave reads and writes without cross-call coordination. A token is
/// never cleared once recorded, it only goes stale past `expires_at`.
pub struct SessionStore {
    state: Mutex<SessionState>,
    /// Seconds shaved off the token's reported lifetime.
    expiry_margin: Duration,
    /// Shared default header set layered under the bearer entry.
    default_headers: Vec<(&'static str, String)>,
}

impl SessionStore {
    pub fn new(expiry_margin_secs: i64, default_headers: Vec<(&'static str, String)>) -> Self {
        Self {
            state: Mutex::new(SessionState::default()),
            expiry_margin: Duration::seconds(expiry_margin_secs),
            default_headers,
        }
    }

    /// Fully replace the session after a successful login.
    ///
    /// Returns the computed expiry instant for reporting back to the caller.
    pub fn record_login(
        &self,
        access_token: String,
        refresh_token: Option<String>,
        token_type: String,
        expires_in_secs: i64,
    ) -> DateTime<Utc> {
        self.record_login_at(Utc::now(), access_token, refresh_token, token_type, expires_in_secs)
    }

    /// Clock-injectable variant of [`record_login`](Self::record_login).
    ///
    /// `expires_at = now + expires_in_secs - margin`, so validity checks fail
    /// slightly early rather than risk a request expiring mid-flight.
    pub fn record_login_at(
        &self,
        now: DateTime<Utc>,
        access_token: String,
        refresh_token: Option<String>,
        token_type: String,
        expires_in_secs: i64,
    ) -> DateTime<Utc> {
        let expires_at = now + Duration::seconds(expires_in_secs) - self.expiry_margin;
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        *state = SessionState {
            access_token: Some(access_token),
            refresh_token,
            expires_at: Some(expires_at),
            token_type,
        };
        expires_at
    }

    /// `false` if no token recorded, else `now < expires_at`.
    pub fn is_valid(&self) -> bool {
        self.is_valid_at(Utc::now())
    }

    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        let state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        match (&state.access_token, state.expires_at) {
            (Some(_), Some(expires_at)) => now < expires_at,
            _ => false,
        }
    }

    /// Whether a token was ever recorded, regardless of expiry.
    pub fn has_token(&self) -> bool {
        let state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state.access_token.is_some()
    }

    pub fn has_refresh_token(&self) -> bool {
        let state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state.refresh_token.is_some()
    }

    pub fn token_type(&self) -> String {
        let state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state.token_type.clone()
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        let state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state.expires_at
    }

    /// The shared default header set, without any bearer entry.
    pub fn default_headers(&self) -> Vec<(&'static str, String)> {
        self.default_headers.clone()
    }

    /// The shared default header set plus `Authorization: Bearer <token>`
    /// when a token is present, unchanged otherwise.
    pub fn bearer_headers(&self) -> Vec<(&'static str, String)> {
        let mut headers = self.default_headers.clone();
        let state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(ref token) = state.access_token {
            headers.push(("authorization", format!("Bearer {}", token)));
        }
        headers
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> SessionStore {
        SessionStore::new(300, vec![("x-blocks-key", "key".to_string())])
    }

    #[test]
    fn invalid_before_any_login() {
        let s = store();
        assert!(!s.is_valid());
        assert!(!s.has_token());
        assert_eq!(s.token_type(), "bearer");
    }

    #[test]
    fn expiry_is_login_time_plus_lifetime_minus_margin() {
        let s = store();
        let t0 = Utc::now();
        let expires_at =
            s.record_login_at(t0, "tok".into(), None, "bearer".into(), 8000);
        assert_eq!(expires_at, t0 + Duration::seconds(7700));

        assert!(s.is_valid_at(t0));
        assert!(s.is_valid_at(t0 + Duration::seconds(7699)));
        assert!(!s.is_valid_at(t0 + Duration::seconds(7700)));
        assert!(!s.is_valid_at(t0 + Duration::seconds(8000)));
    }

    #[test]
    fn expired_token_is_retained_but_invalid() {
        let s = store();
        let t0 = Utc::now() - Duration::seconds(10_000);
        s.record_login_at(t0, "tok".into(), None, "bearer".into(), 8000);

        assert!(!s.is_valid());
        assert!(s.has_token());
        // Expired token still rides along on headers; validity gating is the
        // caller's job.
        let headers = s.bearer_headers();
        assert!(headers.iter().any(|(k, v)| *k == "authorization" && v == "Bearer tok"));
    }

    #[test]
    fn login_fully_replaces_prior_session() {
        let s = store();
        let t0 = Utc::now();
        s.record_login_at(t0, "first".into(), Some("r1".into()), "bearer".into(), 8000);
        s.record_login_at(t0, "second".into(), None, "Bearer".into(), 4000);

        assert!(!s.has_refresh_token());
        assert_eq!(s.token_type(), "Bearer");
        assert_eq!(s.expires_at(), Some(t0 + Duration::seconds(3700)));
    }

    #[test]
    fn bearer_headers_without_token_equal_defaults() {
        let s = store();
        assert_eq!(s.bearer_headers(), s.default_headers());
    }
}
