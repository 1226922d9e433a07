use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Session file name in the data directory
const SESSION_FILE: &str = "session.json";

/// The single authenticated session record issued by the backend.
///
/// Only `access_token` matters to the client; everything else the server
/// sends alongside it (user id, refresh token, messages) is kept so the
/// blob written to disk round-trips unchanged. No expiry is tracked
/// locally - an expired token is only discovered when the server rejects it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    /// Any other server-issued claims, preserved as-is.
    #[serde(flatten)]
    pub claims: serde_json::Map<String, serde_json::Value>,
}

impl Session {
    /// Build a session carrying only an access token (used in tests and
    /// when merging refresh responses).
    pub fn with_token(access_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token: None,
            user_id: None,
            claims: serde_json::Map::new(),
        }
    }
}

/// File-backed store for the process-wide session record.
///
/// Cheap to clone - it is just the storage path. There is one logical
/// writer per refresh cycle, so no locking happens here; the API client's
/// refresh gate provides the only coordination needed.
#[derive(Debug, Clone)]
pub struct SessionStore {
    dir: PathBuf,
}

impl SessionStore {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    /// Overwrite the persisted session unconditionally.
    pub fn save(&self, session: &Session) -> Result<()> {
        let path = self.session_path();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(session)?;
        std::fs::write(&path, contents).context("Failed to write session file")?;
        debug!(?path, "Session saved");
        Ok(())
    }

    /// Return the persisted session, or None if there is none or it cannot
    /// be parsed. No shape validation beyond deserialization.
    pub fn current(&self) -> Option<Session> {
        let path = self.session_path();
        let contents = std::fs::read_to_string(&path).ok()?;
        serde_json::from_str(&contents).ok()
    }

    /// Remove the persisted session.
    pub fn clear(&self) -> Result<()> {
        let path = self.session_path();
        if path.exists() {
            std::fs::remove_file(&path).context("Failed to remove session file")?;
            debug!(?path, "Session cleared");
        }
        Ok(())
    }

    /// True iff a session exists and carries a non-empty access token.
    pub fn is_authenticated(&self) -> bool {
        self.current()
            .map(|s| !s.access_token.is_empty())
            .unwrap_or(false)
    }

    /// The bearer token to attach to outbound requests, if any.
    pub fn access_token(&self) -> Option<String> {
        self.current()
            .map(|s| s.access_token)
            .filter(|t| !t.is_empty())
    }

    fn session_path(&self) -> PathBuf {
        self.dir.join(SESSION_FILE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> (tempfile::TempDir, SessionStore) {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = SessionStore::new(dir.path().to_path_buf());
        (dir, store)
    }

    #[test]
    fn test_save_and_current_roundtrip() {
        let (_dir, store) = store();
        assert!(store.current().is_none());

        let mut session = Session::with_token("abc123");
        session.user_id = Some("42".to_string());
        store.save(&session).unwrap();

        let loaded = store.current().expect("session present");
        assert_eq!(loaded.access_token, "abc123");
        assert_eq!(loaded.user_id.as_deref(), Some("42"));
    }

    #[test]
    fn test_save_overwrites_unconditionally() {
        let (_dir, store) = store();
        store.save(&Session::with_token("first")).unwrap();
        store.save(&Session::with_token("second")).unwrap();
        assert_eq!(store.current().unwrap().access_token, "second");
    }

    #[test]
    fn test_clear_removes_session() {
        let (_dir, store) = store();
        store.save(&Session::with_token("abc")).unwrap();
        store.clear().unwrap();
        assert!(store.current().is_none());
        // Clearing an already-empty store is fine
        store.clear().unwrap();
    }

    #[test]
    fn test_is_authenticated_requires_nonempty_token() {
        let (_dir, store) = store();
        assert!(!store.is_authenticated());

        store.save(&Session::with_token("")).unwrap();
        assert!(!store.is_authenticated());
        assert!(store.access_token().is_none());

        store.save(&Session::with_token("tok")).unwrap();
        assert!(store.is_authenticated());
        assert_eq!(store.access_token().as_deref(), Some("tok"));
    }

    #[test]
    fn test_unknown_claims_roundtrip() {
        let (_dir, store) = store();
        let raw = r#"{"access_token":"t","message":"Login successful","ttl":900}"#;
        let session: Session = serde_json::from_str(raw).unwrap();
        store.save(&session).unwrap();

        let loaded = store.current().unwrap();
        assert_eq!(loaded.claims.get("message").and_then(|v| v.as_str()), Some("Login successful"));
        assert_eq!(loaded.claims.get("ttl").and_then(|v| v.as_i64()), Some(900));
    }
}
