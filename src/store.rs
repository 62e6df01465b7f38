//! Key/value persistence for calculator inputs between sessions.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::io;
use std::path::PathBuf;
use std::sync::RwLock;

use serde_json::Value;
use thiserror::Error;

use crate::forms::SalaryForm;

pub const SALARY_INPUTS_KEY: &str = "salaryInputs";

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("IO error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("store file {} is not valid JSON: {source}", path.display())]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("store lock poisoned")]
    Poisoned,
}

pub type Result<T> = std::result::Result<T, StoreError>;

pub trait InputStore {
    fn load(&self, key: &str) -> Result<Option<Value>>;
    fn save(&self, key: &str, value: Value) -> Result<()>;
}

/// Process-local store; nothing survives the process.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl InputStore for MemoryStore {
    fn load(&self, key: &str) -> Result<Option<Value>> {
        let entries = self.entries.read().map_err(|_| StoreError::Poisoned)?;
        Ok(entries.get(key).cloned())
    }

    fn save(&self, key: &str, value: Value) -> Result<()> {
        let mut entries = self.entries.write().map_err(|_| StoreError::Poisoned)?;
        entries.insert(key.to_string(), value);
        Ok(())
    }
}

/// One JSON object on disk, keyed like browser local storage. Writes go to a sibling
/// temp file that is then renamed over the target, so readers never see a torn file.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn read_all(&self) -> Result<BTreeMap<String, Value>> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(source) => {
                return Err(StoreError::Io {
                    path: self.path.clone(),
                    source,
                });
            }
        };
        if raw.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        serde_json::from_str(&raw).map_err(|source| StoreError::Corrupt {
            path: self.path.clone(),
            source,
        })
    }

    fn write_all(&self, entries: &BTreeMap<String, Value>) -> Result<()> {
        let io_err = |source| StoreError::Io {
            path: self.path.clone(),
            source,
        };
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(io_err)?;
        }
        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        let body = serde_json::to_string_pretty(entries)?;
        fs::write(&tmp, body).map_err(io_err)?;
        fs::rename(&tmp, &self.path).map_err(io_err)
    }
}

impl InputStore for JsonFileStore {
    fn load(&self, key: &str) -> Result<Option<Value>> {
        Ok(self.read_all()?.remove(key))
    }

    fn save(&self, key: &str, value: Value) -> Result<()> {
        let mut entries = self.read_all()?;
        entries.insert(key.to_string(), value);
        self.write_all(&entries)
    }
}

pub fn save_salary_form(store: &dyn InputStore, form: &SalaryForm) -> Result<()> {
    store.save(SALARY_INPUTS_KEY, serde_json::to_value(form)?)
}

/// A stored value that no longer matches the form shape is treated as absent.
pub fn load_salary_form(store: &dyn InputStore) -> Result<Option<SalaryForm>> {
    let Some(value) = store.load(SALARY_INPUTS_KEY)? else {
        return Ok(None);
    };
    match serde_json::from_value(value) {
        Ok(form) => Ok(Some(form)),
        Err(err) => {
            tracing::warn!(error = %err, "ignoring unreadable saved salary inputs");
            Ok(None)
        }
    }
}
