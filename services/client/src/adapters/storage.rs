//! services/client/src/adapters/storage.rs
//!
//! File-backed implementation of the `KeyValueStorage` port. Each key is one
//! small file in the session directory, so the token and the identity record
//! can be lost or corrupted independently.

use docdesk_core::ports::{KeyValueStorage, PortError, PortResult};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    /// The directory is created on first write.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn entry_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.entry"))
    }
}

fn storage_error(action: &str, path: &Path, err: io::Error) -> PortError {
    PortError::Storage(format!("failed to {action} {}: {err}", path.display()))
}

impl KeyValueStorage for FileStorage {
    fn get(&self, key: &str) -> PortResult<Option<String>> {
        let path = self.entry_path(key);
        match fs::read_to_string(&path) {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(storage_error("read", &path, e)),
        }
    }

    fn set(&self, key: &str, value: &str) -> PortResult<()> {
        fs::create_dir_all(&self.dir).map_err(|e| storage_error("create", &self.dir, e))?;
        let final_path = self.entry_path(key);
        let tmp_path = self.dir.join(format!("{key}.entry.tmp"));

        fs::write(&tmp_path, value).map_err(|e| storage_error("write", &tmp_path, e))?;
        match fs::rename(&tmp_path, &final_path) {
            Ok(()) => Ok(()),
            Err(rename_err) => {
                // Some platforms refuse to rename over an existing file.
                if final_path.exists() {
                    fs::remove_file(&final_path)
                        .map_err(|e| storage_error("replace", &final_path, e))?;
                    fs::rename(&tmp_path, &final_path)
                        .map_err(|e| storage_error("replace", &final_path, e))
                } else {
                    Err(storage_error("replace", &final_path, rename_err))
                }
            }
        }
    }

    fn remove(&self, key: &str) -> PortResult<()> {
        let path = self.entry_path(key);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(storage_error("remove", &path, e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docdesk_core::domain::Identity;
    use docdesk_core::session::{SessionStore, IDENTITY_KEY, TOKEN_KEY};
    use std::sync::Arc;

    #[test]
    fn set_get_remove_roundtrip_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path().join("nested"));

        assert_eq!(storage.get("token").unwrap(), None);
        storage.set("token", "abc").unwrap();
        storage.set("token", "def").unwrap();
        assert_eq!(storage.get("token").unwrap().as_deref(), Some("def"));

        storage.remove("token").unwrap();
        storage.remove("token").unwrap();
        assert_eq!(storage.get("token").unwrap(), None);
    }

    #[test]
    fn session_persists_across_store_instances() {
        let dir = tempfile::tempdir().unwrap();
        let identity = Identity {
            id: 3,
            username: "grace".to_string(),
            email: "grace@example.com".to_string(),
        };
        SessionStore::new(Arc::new(FileStorage::new(dir.path())))
            .establish("persisted".to_string(), identity.clone())
            .unwrap();

        let restored = SessionStore::new(Arc::new(FileStorage::new(dir.path())))
            .restore()
            .expect("session on disk");

        assert_eq!(restored.credential, "persisted");
        assert_eq!(restored.identity, identity);
    }

    #[test]
    fn corrupt_identity_file_is_removed_on_restore() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path());
        storage.set(TOKEN_KEY, "token").unwrap();
        storage.set(IDENTITY_KEY, "{\"id\": \"not a number\"").unwrap();

        let store = SessionStore::new(Arc::new(storage.clone()));

        assert!(store.restore().is_none());
        assert!(!dir.path().join("token.entry").exists());
        assert!(!dir.path().join("user.entry").exists());
    }
}
