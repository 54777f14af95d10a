use std::{collections::HashMap, fs, io, path::PathBuf};

use serde::{Serialize, de::DeserializeOwned};
use tracing::{debug, info, warn};

use crate::error::AppResult;
use crate::models::ScheduleState;
use crate::reducer::{Action, reduce};
use crate::tasks::DailyTasks;

/// Synchronous key-value storage holding the serialized state document.
pub trait StorageBackend {
    fn get(&self, key: &str) -> AppResult<Option<String>>;
    fn set(&mut self, key: &str, value: &str) -> AppResult<()>;
}

// One `<key>.json` file per key inside `dir`.
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl StorageBackend for FileStorage {
    fn get(&self, key: &str) -> AppResult<Option<String>> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(text) => Ok(Some(text)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    // Write to a temp file then rename, so a crash never leaves half a document.
    fn set(&mut self, key: &str, value: &str) -> AppResult<()> {
        let path = self.path_for(key);
        let tmp_path = path.with_extension("json.tmp");

        fs::create_dir_all(&self.dir)?;
        fs::write(&tmp_path, value)?;
        fs::rename(&tmp_path, &path)?;
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    entries: HashMap<String, String>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StorageBackend for MemoryStorage {
    fn get(&self, key: &str) -> AppResult<Option<String>> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> AppResult<()> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// A persisted document and the intents that change it.
pub trait Document: Default + Serialize + DeserializeOwned {
    type Action;

    // Used in log lines.
    const LABEL: &'static str;

    fn apply(&self, action: Self::Action) -> Self;
    fn action_name(action: &Self::Action) -> &'static str;
}

impl Document for ScheduleState {
    type Action = Action;

    const LABEL: &'static str = "schedule";

    fn apply(&self, action: Action) -> Self {
        reduce(self, action)
    }

    fn action_name(action: &Action) -> &'static str {
        action.name()
    }
}

// Load the document under `key`.
// Missing, unreadable or corrupt documents yield the default value.
pub fn load_document<D: Document, B: StorageBackend>(backend: &B, key: &str) -> D {
    let text = match backend.get(key) {
        Ok(Some(text)) => text,
        Ok(None) => {
            info!(key, document = D::LABEL, "nothing saved yet, starting empty");
            return D::default();
        }
        Err(err) => {
            warn!(key, document = D::LABEL, error = %err, "failed to read saved document, starting empty");
            return D::default();
        }
    };

    match serde_json::from_str::<D>(&text) {
        Ok(doc) => {
            debug!(key, document = D::LABEL, "loaded document");
            doc
        }
        Err(err) => {
            warn!(key, document = D::LABEL, error = %err, "saved document is malformed, starting empty");
            D::default()
        }
    }
}

pub fn save_document<D: Document, B: StorageBackend>(backend: &mut B, key: &str, doc: &D) -> AppResult<()> {
    let text = serde_json::to_string(doc)?;
    backend.set(key, &text)
}

pub fn load_state<B: StorageBackend>(backend: &B, key: &str) -> ScheduleState {
    load_document(backend, key)
}

pub fn save_state<B: StorageBackend>(backend: &mut B, key: &str, state: &ScheduleState) -> AppResult<()> {
    save_document(backend, key, state)
}

/// Outcome of writing the state after a mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Persistence {
    Saved,
    // In-memory state is current; the write is retried on the next mutation.
    Deferred { reason: String },
}

impl Persistence {
    pub fn is_saved(&self) -> bool {
        matches!(self, Persistence::Saved)
    }
}

/// Owns one document and its backend; the only place mutations happen.
#[derive(Debug)]
pub struct Store<D, B> {
    state: D,
    backend: B,
    key: String,
    dirty: bool,
}

pub type ScheduleStore<B> = Store<ScheduleState, B>;
pub type TaskStore<B> = Store<DailyTasks, B>;

impl<D: Document, B: StorageBackend> Store<D, B> {
    pub fn open(backend: B, key: impl Into<String>) -> Self {
        let key = key.into();
        let state = load_document(&backend, &key);
        Self {
            state,
            backend,
            key,
            dirty: false,
        }
    }

    pub fn state(&self) -> &D {
        &self.state
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    // True while the last write failed and has not been retried successfully.
    pub fn has_unsaved_changes(&self) -> bool {
        self.dirty
    }

    pub fn dispatch(&mut self, action: D::Action) -> Persistence {
        let name = D::action_name(&action);
        self.state = self.state.apply(action);
        debug!(document = D::LABEL, action = name, "applied action");
        self.flush()
    }

    // Write the whole document; failures are reported, never raised.
    pub fn flush(&mut self) -> Persistence {
        match save_document(&mut self.backend, &self.key, &self.state) {
            Ok(()) => {
                if self.dirty {
                    info!(key = %self.key, "pending changes saved");
                }
                self.dirty = false;
                Persistence::Saved
            }
            Err(err) => {
                warn!(key = %self.key, error = %err, "failed to save, keeping changes in memory");
                self.dirty = true;
                Persistence::Deferred {
                    reason: err.to_string(),
                }
            }
        }
    }
}
