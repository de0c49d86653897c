use std::fmt::{Display, Formatter};
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;

use tracing::{debug, warn};

use crate::entry::State;

pub const STATE_KEY: &str = "state";

#[derive(Debug)]
pub enum StorageError {
    Io(std::io::Error),
    JsonDecode(serde_json::Error),
    JsonEncode(serde_json::Error),
}

impl Display for StorageError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageError::Io(err) => write!(f, "io error: {err}"),
            StorageError::JsonDecode(err) => write!(f, "failed to parse stored state: {err}"),
            StorageError::JsonEncode(err) => write!(f, "failed to encode state: {err}"),
        }
    }
}

impl std::error::Error for StorageError {}

/// String key-value store the state is persisted into.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove(&mut self, key: &str) -> Result<(), StorageError>;
}

/// One `<key>.json` file per key inside a directory.
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(content) => Ok(Some(content)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(StorageError::Io(err)),
        }
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        fs::create_dir_all(&self.dir).map_err(StorageError::Io)?;

        // Readers only ever see a complete payload.
        let path = self.path_for(key);
        let staging = path.with_extension("json.tmp");
        fs::write(&staging, value).map_err(StorageError::Io)?;
        fs::rename(&staging, &path).map_err(StorageError::Io)
    }

    fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        match fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(StorageError::Io(err)),
        }
    }
}

#[cfg(test)]
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: std::collections::HashMap<String, String>,
}

#[cfg(test)]
impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.values.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        self.values.remove(key);
        Ok(())
    }
}

pub fn load_state(store: &dyn KeyValueStore) -> Result<State, StorageError> {
    let raw = match store.get(STATE_KEY)? {
        Some(raw) if !raw.trim().is_empty() => raw,
        _ => {
            debug!("no stored state, starting empty");
            return Ok(State::default());
        }
    };

    let state: State = serde_json::from_str(&raw).map_err(StorageError::JsonDecode)?;
    if let Err(err) = state.check_invariants() {
        warn!(%err, "stored entry log is inconsistent, keeping it as is");
    }
    debug!(entries = state.entries.len(), "loaded state");
    Ok(state)
}

pub fn save_state(store: &mut dyn KeyValueStore, state: &State) -> Result<(), StorageError> {
    let encoded = serde_json::to_string(state).map_err(StorageError::JsonEncode)?;
    store.set(STATE_KEY, &encoded)
}

/// Wipes the stored state and hands back the default one.
pub fn clear_state(store: &mut dyn KeyValueStore) -> Result<State, StorageError> {
    store.remove(STATE_KEY)?;
    load_state(store)
}
