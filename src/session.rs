//! Session persistence.
//!
//! The logged-in [`SessionUser`] is stored verbatim as JSON so a later run
//! can pick it up without logging in again.

use crate::error::{Result, YuyuError};
use crate::social::types::SessionUser;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use tracing::{debug, info};

/// Where the session survives between runs.
pub trait SessionStore: Send + Sync {
    /// Returns the stored session, `None` if there is none.
    fn load(&self) -> Result<Option<SessionUser>>;

    fn save(&self, session: &SessionUser) -> Result<()>;

    /// Removes the stored session. Clearing an empty store is not an error.
    fn clear(&self) -> Result<()>;
}

/// JSON file store.
#[derive(Debug, Clone)]
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SessionStore for FileSessionStore {
    fn load(&self) -> Result<Option<SessionUser>> {
        let data = match fs::read(&self.path) {
            Ok(data) => data,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("No stored session at {:?}", self.path);
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };

        let session: SessionUser = serde_json::from_slice(&data)
            .map_err(|e| YuyuError::session(format!("Corrupt session record: {}", e)))?;
        debug!("Loaded session for user {}", session.user_id);
        Ok(Some(session))
    }

    fn save(&self, session: &SessionUser) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            if !parent.exists() {
                fs::create_dir_all(parent).map_err(|e| {
                    YuyuError::session(format!("Failed to create session directory: {}", e))
                })?;
                info!("Created session directory: {:?}", parent);
            }
        }

        let data = serde_json::to_vec_pretty(session)?;
        fs::write(&self.path, data)?;
        debug!("Saved session for user {}", session.user_id);
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => {
                debug!("Removed session file {:?}", self.path);
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// In-process store, for tests and embedding.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    session: Mutex<Option<SessionUser>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_session(session: SessionUser) -> Self {
        Self {
            session: Mutex::new(Some(session)),
        }
    }
}

impl SessionStore for MemorySessionStore {
    fn load(&self) -> Result<Option<SessionUser>> {
        Ok(self
            .session
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone())
    }

    fn save(&self, session: &SessionUser) -> Result<()> {
        *self.session.lock().unwrap_or_else(PoisonError::into_inner) = Some(session.clone());
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        *self.session.lock().unwrap_or_else(PoisonError::into_inner) = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sample() -> SessionUser {
        SessionUser {
            user_id: 7,
            username: "amy".to_string(),
            token: "tok-7".to_string(),
            avatar: "data:image/png;base64,AAAA".to_string(),
        }
    }

    #[test]
    fn test_file_round_trip_is_verbatim() {
        let dir = TempDir::new().unwrap();
        let store = FileSessionStore::new(dir.path().join("nested").join("yuyu_user.json"));

        assert_eq!(store.load().unwrap(), None);
        store.save(&sample()).unwrap();
        assert_eq!(store.load().unwrap(), Some(sample()));

        store.clear().unwrap();
        assert_eq!(store.load().unwrap(), None);
        // Clearing twice is fine.
        store.clear().unwrap();
    }

    #[test]
    fn test_corrupt_file_is_session_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("yuyu_user.json");
        fs::write(&path, b"{not json").unwrap();

        let store = FileSessionStore::new(&path);
        assert!(matches!(store.load(), Err(YuyuError::Session(_))));
    }

    #[test]
    fn test_missing_optional_fields_default() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("yuyu_user.json");
        fs::write(&path, br#"{"user_id":3,"token":"t"}"#).unwrap();

        let session = FileSessionStore::new(&path).load().unwrap().unwrap();
        assert_eq!(session.user_id, 3);
        assert!(session.username.is_empty());
        assert!(session.avatar.is_empty());
    }

    #[test]
    fn test_memory_store() {
        let store = MemorySessionStore::new();
        assert_eq!(store.load().unwrap(), None);
        store.save(&sample()).unwrap();
        assert_eq!(store.load().unwrap(), Some(sample()));
        store.clear().unwrap();
        assert_eq!(store.load().unwrap(), None);
    }
}
