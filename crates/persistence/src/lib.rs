#![deny(warnings)]

//! Persistence layer: the economy state as one JSON blob under a fixed key.
//!
//! Stores are opaque key-value maps. Loading never fails: a missing,
//! unreadable, or malformed blob yields a fresh state, and a blank save
//! (no coins, no plants, no animals) gets the starting grant back.

pub mod sqlite;

pub use sqlite::{default_sqlite_url, SqliteStore};

use sim_core::{validate_state, EconomyState, STARTING_CURRENCY};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("database error: {0}")]
    Db(#[from] sqlx::Error),
    #[error("invalid storage key `{0}`")]
    InvalidKey(String),
}

/// Blocking key-value store.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn put(&mut self, key: &str, value: &str) -> Result<(), StoreError>;
}

/// In-memory store, mostly for tests and embedding.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.entries.get(key).cloned())
    }

    fn put(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// One `<key>.json` file per key inside a directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    /// Default save directory for local play.
    pub fn default_dir() -> &'static str {
        "./saves"
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, StoreError> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(StoreError::InvalidKey(key.to_string()));
        }
        Ok(self.dir.join(format!("{key}.json")))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let path = self.path_for(key)?;
        match fs::read_to_string(&path) {
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn put(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        let path = self.path_for(key)?;
        fs::create_dir_all(&self.dir)?;
        // Write-then-rename so a crash never leaves a truncated save.
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, value)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }
}

/// Serialize the whole state.
pub fn encode_state(state: &EconomyState) -> Result<String, StoreError> {
    Ok(serde_json::to_string(state)?)
}

/// Restore the starting grant on a blank save.
pub fn recover_blank(mut state: EconomyState) -> EconomyState {
    if state.is_blank() {
        info!(currency = STARTING_CURRENCY, "blank save, restoring starting currency");
        state.currency = STARTING_CURRENCY;
    }
    state
}

/// Decode a saved blob; anything malformed becomes a fresh state.
pub fn decode_state(blob: &str) -> EconomyState {
    let state: EconomyState = match serde_json::from_str(blob) {
        Ok(state) => state,
        Err(e) => {
            warn!(error = %e, "unreadable save, starting fresh");
            return EconomyState::default();
        }
    };
    if let Err(e) = validate_state(&state) {
        warn!(error = %e, "invalid save, starting fresh");
        return EconomyState::default();
    }
    recover_blank(state)
}

/// Load the state under `key`; never fails.
pub fn load_state<S: KeyValueStore + ?Sized>(store: &S, key: &str) -> EconomyState {
    match store.get(key) {
        Ok(Some(blob)) => decode_state(&blob),
        Ok(None) => EconomyState::default(),
        Err(e) => {
            warn!(error = %e, key, "load failed, starting fresh");
            EconomyState::default()
        }
    }
}

/// Save the state under `key`.
pub fn save_state<S: KeyValueStore + ?Sized>(
    store: &mut S,
    key: &str,
    state: &EconomyState,
) -> Result<(), StoreError> {
    store.put(key, &encode_state(state)?)
}
