//! Durable session storage
//!
//! Persists the session as three string-valued entries (`accessToken`,
//! `refreshToken`, `user` — the user value is itself a serialized profile
//! record) in a single JSON file. All writes use atomic temp-file + rename
//! so a crash mid-write never leaves a partial session on disk. A tokio
//! Mutex serializes operations from concurrent request flows.
//!
//! The store is the single source of truth for session data. Reads go to
//! disk on every call so externally removed entries are observed; a load
//! that finds an inconsistent or unparseable session self-heals by
//! clearing all entries and reporting no session.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::types::{Session, UserProfile};

const ACCESS_TOKEN_KEY: &str = "accessToken";
const REFRESH_TOKEN_KEY: &str = "refreshToken";
const USER_KEY: &str = "user";

/// File-backed session store.
///
/// Construction does no I/O; the file appears on the first write. Every
/// transition (save, token rotation, profile update, clear) rewrites the
/// whole entry set in one atomic operation, so other callers see either
/// the complete old session or the complete new one.
pub struct SessionStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl SessionStore {
    /// Create a store backed by the given file path.
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            lock: Mutex::new(()),
        }
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Atomically persist the whole session: access token, refresh token,
    /// and serialized user profile as one write.
    pub async fn save(&self, session: &Session) -> Result<()> {
        let _guard = self.lock.lock().await;
        let user_json = serde_json::to_string(&session.user)
            .map_err(|e| Error::SessionEncode(format!("serializing user profile: {e}")))?;

        let mut entries = HashMap::new();
        entries.insert(ACCESS_TOKEN_KEY.to_owned(), session.access_token.clone());
        entries.insert(REFRESH_TOKEN_KEY.to_owned(), session.refresh_token.clone());
        entries.insert(USER_KEY.to_owned(), user_json);

        write_atomic(&self.path, &entries).await?;
        debug!(path = %self.path.display(), "session saved");
        Ok(())
    }

    /// Load the current session if present and internally consistent.
    ///
    /// Returns `None` when no session is stored. If the entries are
    /// partially present, or the user record fails to parse, the store
    /// self-heals by clearing everything before returning `None` — parse
    /// problems never surface to callers.
    pub async fn load(&self) -> Option<Session> {
        let _guard = self.lock.lock().await;

        let entries = match read_entries(&self.path).await {
            Ok(Some(entries)) => entries,
            Ok(None) => return None,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "unreadable session file, clearing");
                self.clear_locked().await;
                return None;
            }
        };

        if entries.is_empty() {
            return None;
        }

        let (Some(access), Some(refresh), Some(user_raw)) = (
            entries.get(ACCESS_TOKEN_KEY),
            entries.get(REFRESH_TOKEN_KEY),
            entries.get(USER_KEY),
        ) else {
            warn!(path = %self.path.display(), "incomplete session entries, clearing");
            self.clear_locked().await;
            return None;
        };

        match serde_json::from_str::<UserProfile>(user_raw) {
            Ok(user) => Some(Session {
                access_token: access.clone(),
                refresh_token: refresh.clone(),
                user,
            }),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "stored user record does not parse, clearing");
                self.clear_locked().await;
                None
            }
        }
    }

    /// Remove all entries unconditionally. Idempotent.
    pub async fn clear(&self) -> Result<()> {
        let _guard = self.lock.lock().await;
        write_atomic(&self.path, &HashMap::new()).await?;
        debug!(path = %self.path.display(), "session cleared");
        Ok(())
    }

    /// Rotate the token pair after a refresh, preserving the stored user.
    ///
    /// Errors if no complete session exists — rotating tokens into an
    /// empty store would persist a partial session.
    pub async fn update_tokens(&self, access: &str, refresh: &str) -> Result<()> {
        let _guard = self.lock.lock().await;
        let mut entries = self.read_existing("token rotation").await?;
        entries.insert(ACCESS_TOKEN_KEY.to_owned(), access.to_owned());
        entries.insert(REFRESH_TOKEN_KEY.to_owned(), refresh.to_owned());
        write_atomic(&self.path, &entries).await?;
        debug!(path = %self.path.display(), "token pair rotated");
        Ok(())
    }

    /// Persist a profile update into the existing session without
    /// altering tokens. Errors if no complete session exists.
    pub async fn update_user(&self, user: &UserProfile) -> Result<()> {
        let _guard = self.lock.lock().await;
        let mut entries = self.read_existing("profile update").await?;
        let user_json = serde_json::to_string(user)
            .map_err(|e| Error::SessionEncode(format!("serializing user profile: {e}")))?;
        entries.insert(USER_KEY.to_owned(), user_json);
        write_atomic(&self.path, &entries).await?;
        debug!(path = %self.path.display(), user_id = %user.id, "stored profile updated");
        Ok(())
    }

    /// Read the entry map, requiring all three entries to be present.
    /// Caller must hold the lock.
    async fn read_existing(&self, context: &str) -> Result<HashMap<String, String>> {
        let entries = read_entries(&self.path)
            .await
            .map_err(|e| Error::Io(format!("reading session file: {e}")))?
            .unwrap_or_default();

        let complete = entries.contains_key(ACCESS_TOKEN_KEY)
            && entries.contains_key(REFRESH_TOKEN_KEY)
            && entries.contains_key(USER_KEY);
        if !complete {
            return Err(Error::NoSession(format!(
                "{context} requires an existing session"
            )));
        }
        Ok(entries)
    }

    /// Clear while already holding the lock; failures are logged, not
    /// surfaced (load() must never return an error).
    async fn clear_locked(&self) {
        if let Err(e) = write_atomic(&self.path, &HashMap::new()).await {
            warn!(path = %self.path.display(), error = %e, "failed to clear session file");
        }
    }
}

/// Read the raw entry map. `Ok(None)` means the file does not exist.
async fn read_entries(path: &Path) -> std::result::Result<Option<HashMap<String, String>>, String> {
    if !path.exists() {
        return Ok(None);
    }
    let contents = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| format!("reading session file: {e}"))?;
    let entries: HashMap<String, String> =
        serde_json::from_str(&contents).map_err(|e| format!("parsing session file: {e}"))?;
    Ok(Some(entries))
}

/// Write the entry map to the file atomically.
///
/// Writes to a temporary file in the same directory, then renames it over
/// the target. This prevents a crash mid-write from leaving a torn
/// session. Sets file permissions to 0600 (owner read/write only) since
/// the file contains token material.
async fn write_atomic(path: &Path, entries: &HashMap<String, String>) -> Result<()> {
    let json = serde_json::to_string_pretty(entries)
        .map_err(|e| Error::SessionEncode(format!("serializing session entries: {e}")))?;

    let dir = path
        .parent()
        .ok_or_else(|| Error::Io("session path has no parent directory".into()))?;

    let tmp_path = dir.join(format!(".session.tmp.{}", std::process::id()));

    tokio::fs::write(&tmp_path, json.as_bytes())
        .await
        .map_err(|e| Error::Io(format!("writing temp session file: {e}")))?;

    // Set 0600 permissions (unix only)
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let perms = std::fs::Permissions::from_mode(0o600);
        tokio::fs::set_permissions(&tmp_path, perms)
            .await
            .map_err(|e| Error::Io(format!("setting session file permissions: {e}")))?;
    }

    tokio::fs::rename(&tmp_path, path)
        .await
        .map_err(|e| Error::Io(format!("renaming temp session file: {e}")))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Role;

    fn test_user(id: &str) -> UserProfile {
        UserProfile {
            id: id.into(),
            email: format!("{id}@b.com"),
            full_name: "Ada Byron".into(),
            phone: None,
            company: None,
            role: Role::User,
            active: true,
            email_verified: true,
            profile_image_url: None,
            created_at: "2026-01-15T09:30:00Z".into(),
            last_login_at: None,
        }
    }

    fn test_session(suffix: &str) -> Session {
        Session {
            access_token: format!("at_{suffix}"),
            refresh_token: format!("rt_{suffix}"),
            user: test_user("u1"),
        }
    }

    async fn raw_entries(path: &Path) -> HashMap<String, String> {
        let contents = tokio::fs::read_to_string(path).await.unwrap();
        serde_json::from_str(&contents).unwrap()
    }

    #[tokio::test]
    async fn save_then_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::new(dir.path().join("session.json"));

        store.save(&test_session("1")).await.unwrap();

        let loaded = store.load().await.unwrap();
        assert_eq!(loaded.access_token, "at_1");
        assert_eq!(loaded.refresh_token, "rt_1");
        assert_eq!(loaded.user.id, "u1");
    }

    #[tokio::test]
    async fn load_without_file_returns_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::new(dir.path().join("session.json"));
        assert!(store.load().await.is_none());
        // No file must be created by a pure read
        assert!(!dir.path().join("session.json").exists());
    }

    #[tokio::test]
    async fn save_overwrites_previous_session() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::new(dir.path().join("session.json"));

        store.save(&test_session("old")).await.unwrap();
        store.save(&test_session("new")).await.unwrap();

        let loaded = store.load().await.unwrap();
        assert_eq!(loaded.access_token, "at_new");
        assert_eq!(loaded.refresh_token, "rt_new");
    }

    #[tokio::test]
    async fn clear_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::new(dir.path().join("session.json"));

        store.save(&test_session("1")).await.unwrap();
        store.clear().await.unwrap();
        assert!(store.load().await.is_none());

        // Second clear must also succeed and leave the store empty
        store.clear().await.unwrap();
        assert!(store.load().await.is_none());
    }

    #[tokio::test]
    async fn clear_without_prior_save_succeeds() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::new(dir.path().join("session.json"));
        store.clear().await.unwrap();
        assert!(store.load().await.is_none());
    }

    #[tokio::test]
    async fn external_deletion_of_one_entry_clears_the_rest() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        let store = SessionStore::new(path.clone());

        store.save(&test_session("1")).await.unwrap();

        // Simulate another process removing the refresh token entry
        let mut entries = raw_entries(&path).await;
        entries.remove("refreshToken");
        tokio::fs::write(&path, serde_json::to_string(&entries).unwrap())
            .await
            .unwrap();

        assert!(store.load().await.is_none());

        // Self-heal: the surviving entries must be gone too
        let healed = raw_entries(&path).await;
        assert!(healed.is_empty(), "expected empty entries, got {healed:?}");
    }

    #[tokio::test]
    async fn corrupt_user_entry_self_heals() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        let store = SessionStore::new(path.clone());

        store.save(&test_session("1")).await.unwrap();

        let mut entries = raw_entries(&path).await;
        entries.insert("user".into(), "{not valid json".into());
        tokio::fs::write(&path, serde_json::to_string(&entries).unwrap())
            .await
            .unwrap();

        assert!(store.load().await.is_none());
        assert!(raw_entries(&path).await.is_empty());
    }

    #[tokio::test]
    async fn corrupt_file_self_heals() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        let store = SessionStore::new(path.clone());

        tokio::fs::write(&path, "not valid {{{{ json").await.unwrap();

        assert!(store.load().await.is_none());
        // A later load sees a cleanly cleared store
        assert!(store.load().await.is_none());
        assert!(raw_entries(&path).await.is_empty());
    }

    #[tokio::test]
    async fn update_tokens_rotates_pair_and_preserves_user() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::new(dir.path().join("session.json"));

        store.save(&test_session("1")).await.unwrap();
        store.update_tokens("at_2", "rt_2").await.unwrap();

        let loaded = store.load().await.unwrap();
        assert_eq!(loaded.access_token, "at_2");
        assert_eq!(loaded.refresh_token, "rt_2");
        assert_eq!(loaded.user.id, "u1");
    }

    #[tokio::test]
    async fn update_tokens_without_session_errors() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::new(dir.path().join("session.json"));

        let result = store.update_tokens("at_2", "rt_2").await;
        assert!(matches!(result, Err(Error::NoSession(_))));
        // The failed rotation must not have written a partial session
        assert!(store.load().await.is_none());
    }

    #[tokio::test]
    async fn update_user_preserves_tokens() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::new(dir.path().join("session.json"));

        store.save(&test_session("1")).await.unwrap();

        let mut updated = test_user("u1");
        updated.full_name = "Ada King".into();
        updated.company = Some("Analytical Engines Ltd".into());
        store.update_user(&updated).await.unwrap();

        let loaded = store.load().await.unwrap();
        assert_eq!(loaded.access_token, "at_1");
        assert_eq!(loaded.refresh_token, "rt_1");
        assert_eq!(loaded.user.full_name, "Ada King");
        assert_eq!(loaded.user.company.as_deref(), Some("Analytical Engines Ltd"));
    }

    #[tokio::test]
    async fn update_user_without_session_errors() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::new(dir.path().join("session.json"));

        let result = store.update_user(&test_user("u1")).await;
        assert!(matches!(result, Err(Error::NoSession(_))));
    }

    #[tokio::test]
    async fn user_entry_is_stored_as_serialized_string() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        let store = SessionStore::new(path.clone());

        store.save(&test_session("1")).await.unwrap();

        // Three string-valued entries, the user one holding nested JSON
        let entries = raw_entries(&path).await;
        assert_eq!(entries.len(), 3);
        let user: UserProfile = serde_json::from_str(&entries["user"]).unwrap();
        assert_eq!(user.email, "u1@b.com");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn file_permissions_are_0600() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        let store = SessionStore::new(path.clone());

        store.save(&test_session("1")).await.unwrap();

        let metadata = tokio::fs::metadata(&path).await.unwrap();
        let mode = metadata.permissions().mode() & 0o777;
        assert_eq!(mode, 0o600, "session file must be 0600, got {mode:o}");
    }

    #[tokio::test]
    async fn concurrent_saves_dont_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        let store = std::sync::Arc::new(SessionStore::new(path.clone()));

        let mut handles = vec![];
        for i in 0..10 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store.save(&test_session(&i.to_string())).await.unwrap();
            }));
        }
        for h in handles {
            h.await.unwrap();
        }

        // Whichever save landed last, the file must hold one complete session
        let loaded = store.load().await.unwrap();
        assert!(loaded.access_token.starts_with("at_"));
        assert!(loaded.refresh_token.starts_with("rt_"));
        assert_eq!(raw_entries(&path).await.len(), 3);
    }
}
