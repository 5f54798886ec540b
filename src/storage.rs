//! Durable key/value storage for the client's session.

use crate::User;
use std::{
    collections::BTreeMap,
    fmt::Debug,
    fs,
    io,
    path::{Path, PathBuf},
    sync::RwLock,
};

/// The key the raw session token is stored under.
pub const TOKEN_KEY: &str = "token";
/// The key the JSON-encoded [`User`] is stored under.
pub const USER_KEY: &str = "user";

/// Somewhere string values can be persisted across restarts.
pub trait Storage: Debug + Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// Errors that may occur while persisting state.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Unable to access \"{}\"", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        error: io::Error,
    },
    #[error("Unable to encode or decode the stored state")]
    Serialization(#[from] serde_json::Error),
}

/// Get the token from storage, treating an empty string as missing.
pub fn load_token(storage: &dyn Storage) -> Option<String> {
    storage.get(TOKEN_KEY).filter(|token| !token.is_empty())
}

/// Get the cached user profile, if there is one and it can be decoded.
pub fn load_user(storage: &dyn Storage) -> Option<User> {
    let raw = storage.get(USER_KEY)?;

    match serde_json::from_str(&raw) {
        Ok(user) => Some(user),
        Err(e) => {
            log::warn!("Ignoring a malformed cached user: {}", e);
            None
        },
    }
}

pub fn save_session(
    storage: &dyn Storage,
    token: &str,
    user: &User,
) -> Result<(), StorageError> {
    storage.set(TOKEN_KEY, token)?;
    save_user(storage, user)
}

pub fn save_user(storage: &dyn Storage, user: &User) -> Result<(), StorageError> {
    let raw = serde_json::to_string(user)?;
    storage.set(USER_KEY, &raw)
}

/// Remove the token and cached user, logging (rather than returning) any
/// failures so callers can always finish clearing their own state.
pub fn clear_session(storage: &dyn Storage) {
    for key in &[TOKEN_KEY, USER_KEY] {
        if let Err(e) = storage.remove(key) {
            log::error!("Unable to remove \"{}\" from storage: {}", key, e);
        }
    }
}

/// A [`Storage`] which only lives as long as the process.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    values: RwLock<BTreeMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self { MemoryStorage::default() }
}

impl Storage for MemoryStorage {
    fn get(&self, key: &str) -> Option<String> {
        read(&self.values).get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        write(&self.values).insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        write(&self.values).remove(key);
        Ok(())
    }
}

/// A [`Storage`] backed by a JSON file, rewritten on every change.
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    values: RwLock<BTreeMap<String, String>>,
}

impl FileStorage {
    /// Open (or lazily create) the storage file at `path`.
    pub fn open<P: Into<PathBuf>>(path: P) -> Result<Self, StorageError> {
        let path = path.into();

        let values = match fs::read_to_string(&path) {
            Ok(raw) if raw.trim().is_empty() => BTreeMap::new(),
            Ok(raw) => serde_json::from_str(&raw)?,
            Err(e) if e.kind() == io::ErrorKind::NotFound => BTreeMap::new(),
            Err(error) => return Err(StorageError::Io { path, error }),
        };

        log::debug!("Loaded {} stored values from {}", values.len(), path.display());

        Ok(FileStorage {
            path,
            values: RwLock::new(values),
        })
    }

    pub fn path(&self) -> &Path { &self.path }

    fn flush(&self, values: &BTreeMap<String, String>) -> Result<(), StorageError> {
        let io_error = |error: io::Error| StorageError::Io {
            path: self.path.clone(),
            error,
        };

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(io_error)?;
            }
        }

        let raw = serde_json::to_string_pretty(values)?;
        fs::write(&self.path, raw).map_err(io_error)
    }
}

impl Storage for FileStorage {
    fn get(&self, key: &str) -> Option<String> {
        read(&self.values).get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut values = write(&self.values);
        values.insert(key.to_string(), value.to_string());
        self.flush(&values)
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let mut values = write(&self.values);
        if values.remove(key).is_some() {
            self.flush(&values)?;
        }
        Ok(())
    }
}

// A panic while holding the lock can't leave a map half-updated, so a
// poisoned lock is still safe to use.
fn read<T>(lock: &RwLock<T>) -> std::sync::RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(|e| e.into_inner())
}

fn write<T>(lock: &RwLock<T>) -> std::sync::RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(|e| e.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user() -> User {
        User {
            email: String::from("jane@example.com"),
            name: String::from("Jane Doe"),
        }
    }

    #[test]
    fn memory_storage_set_get_remove() {
        let storage = MemoryStorage::new();

        storage.set(TOKEN_KEY, "abc").unwrap();
        assert_eq!(storage.get(TOKEN_KEY), Some(String::from("abc")));

        storage.remove(TOKEN_KEY).unwrap();
        assert_eq!(storage.get(TOKEN_KEY), None);
    }

    #[test]
    fn empty_tokens_count_as_missing() {
        let storage = MemoryStorage::new();
        storage.set(TOKEN_KEY, "").unwrap();

        assert_eq!(load_token(&storage), None);
    }

    #[test]
    fn malformed_users_are_ignored() {
        let storage = MemoryStorage::new();
        storage.set(USER_KEY, "{not json").unwrap();

        assert_eq!(load_user(&storage), None);
    }

    #[test]
    fn save_and_clear_a_session() {
        let storage = MemoryStorage::new();

        save_session(&storage, "abc", &user()).unwrap();
        assert_eq!(load_token(&storage), Some(String::from("abc")));
        assert_eq!(load_user(&storage), Some(user()));

        clear_session(&storage);
        assert_eq!(load_token(&storage), None);
        assert_eq!(load_user(&storage), None);
    }

    #[test]
    fn file_storage_survives_a_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("session.json");

        {
            let storage = FileStorage::open(&path).unwrap();
            save_session(&storage, "persisted", &user()).unwrap();
        }

        let reopened = FileStorage::open(&path).unwrap();
        assert_eq!(load_token(&reopened), Some(String::from("persisted")));
        assert_eq!(load_user(&reopened), Some(user()));
    }

    #[test]
    fn file_storage_starts_empty_when_missing() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::open(dir.path().join("missing.json")).unwrap();

        assert_eq!(storage.get(TOKEN_KEY), None);
        assert!(!storage.path().exists());
    }

    #[test]
    fn file_storage_rejects_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        std::fs::write(&path, "definitely not json").unwrap();

        let got = FileStorage::open(&path);

        assert!(matches!(got, Err(StorageError::Serialization(_))));
    }
}
