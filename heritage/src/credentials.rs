use crate::ports::CredentialStore;
use parking_lot::RwLock;
use shared::Result;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Token held in memory only; lost with the process
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    token: RwLock<Option<String>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            token: RwLock::new(Some(token.into())),
        }
    }

    pub fn set_token(&self, token: impl Into<String>) {
        *self.token.write() = Some(token.into());
    }

    pub fn clear(&self) {
        *self.token.write() = None;
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn token(&self) -> Option<String> {
        self.token.read().clone()
    }
}

/// Token persisted in a file so it survives restarts.
/// The file holds the bare token; surrounding whitespace is ignored.
#[derive(Debug)]
pub struct FileCredentialStore {
    path: PathBuf,
    token: RwLock<Option<String>>,
}

impl FileCredentialStore {
    /// Open the store, loading the token if the file exists
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let store = Self {
            path: path.as_ref().to_path_buf(),
            token: RwLock::new(None),
        };
        store.reload()?;
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Re-read the file, picking up tokens written by another process
    pub fn reload(&self) -> Result<()> {
        let token = match std::fs::read_to_string(&self.path) {
            Ok(contents) => {
                let trimmed = contents.trim();
                (!trimmed.is_empty()).then(|| trimmed.to_string())
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => None,
            Err(err) => return Err(err.into()),
        };
        debug!(
            "Loaded credential from {} (present: {})",
            self.path.display(),
            token.is_some()
        );
        *self.token.write() = token;
        Ok(())
    }

    pub fn store(&self, token: &str) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, token)?;
        *self.token.write() = Some(token.to_string());
        info!("Stored credential at {}", self.path.display());
        Ok(())
    }

    pub fn clear(&self) -> Result<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => {}
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
            Err(err) => return Err(err.into()),
        }
        *self.token.write() = None;
        Ok(())
    }
}

impl CredentialStore for FileCredentialStore {
    fn token(&self) -> Option<String> {
        self.token.read().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_store() {
        let store = MemoryCredentialStore::new();
        assert_eq!(store.token(), None);

        store.set_token("abc");
        assert_eq!(store.token(), Some("abc".to_string()));

        store.clear();
        assert_eq!(store.token(), None);
    }

    #[test]
    fn test_file_store_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileCredentialStore::open(dir.path().join("token")).unwrap();
        assert_eq!(store.token(), None);
    }

    #[test]
    fn test_file_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("token");

        let store = FileCredentialStore::open(&path).unwrap();
        store.store("tok-123").unwrap();
        assert_eq!(store.token(), Some("tok-123".to_string()));

        let reopened = FileCredentialStore::open(&path).unwrap();
        assert_eq!(reopened.token(), Some("tok-123".to_string()));

        reopened.clear().unwrap();
        assert_eq!(reopened.token(), None);
        assert!(!path.exists());
    }

    #[test]
    fn test_file_store_trims_and_reloads() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("token");
        std::fs::write(&path, "  spaced-token\n").unwrap();

        let store = FileCredentialStore::open(&path).unwrap();
        assert_eq!(store.token(), Some("spaced-token".to_string()));

        std::fs::write(&path, "rotated").unwrap();
        store.reload().unwrap();
        assert_eq!(store.token(), Some("rotated".to_string()));
    }
}
