use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use tracing::{debug, warn};

use crate::item::Item;

pub const SELECTION_KEY: &str = "selectedData";
const STORE_VERSION: u32 = 1;

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("failed to read selection store at {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write selection store at {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to serialize selection: {0}")]
    Serialize(#[source] serde_json::Error),
    #[error("failed to format store timestamp: {0}")]
    Timestamp(#[source] time::error::Format),
}

pub trait SelectionStore: Send + Sync {
    /// `Ok(None)` covers both "never saved" and "saved value is unreadable".
    fn load(&self) -> Result<Option<Item>, PersistError>;
    fn save(&self, item: &Item) -> Result<(), PersistError>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreEntry {
    pub value: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct StoreFile {
    version: u32,
    #[serde(default)]
    entries: BTreeMap<String, StoreEntry>,
}

impl Default for StoreFile {
    fn default() -> Self {
        Self {
            version: STORE_VERSION,
            entries: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct FileSelectionStore {
    path: PathBuf,
}

impl FileSelectionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn entry(&self, key: &str) -> Result<Option<StoreEntry>, PersistError> {
        Ok(self
            .read_file()?
            .and_then(|mut file| file.entries.remove(key)))
    }

    fn read_file(&self) -> Result<Option<StoreFile>, PersistError> {
        if !self.path.exists() {
            return Ok(None);
        }

        let raw = fs::read_to_string(&self.path).map_err(|source| PersistError::Read {
            path: self.path.clone(),
            source,
        })?;

        match serde_json::from_str::<StoreFile>(&raw) {
            Ok(file) if file.version == STORE_VERSION => Ok(Some(file)),
            Ok(file) => {
                warn!(
                    path = %self.path.display(),
                    version = file.version,
                    "ignoring selection store with unsupported version"
                );
                Ok(None)
            }
            Err(error) => {
                warn!(path = %self.path.display(), %error, "ignoring unreadable selection store");
                Ok(None)
            }
        }
    }

    fn write_file(&self, file: &StoreFile) -> Result<(), PersistError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|source| PersistError::Write {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let serialized = serde_json::to_string_pretty(file).map_err(PersistError::Serialize)?;
        let temp_path = self.path.with_extension("json.tmp");

        fs::write(&temp_path, serialized).map_err(|source| PersistError::Write {
            path: temp_path.clone(),
            source,
        })?;

        fs::rename(&temp_path, &self.path).map_err(|source| PersistError::Write {
            path: self.path.clone(),
            source,
        })
    }
}

impl SelectionStore for FileSelectionStore {
    fn load(&self) -> Result<Option<Item>, PersistError> {
        let Some(entry) = self.entry(SELECTION_KEY)? else {
            return Ok(None);
        };

        match serde_json::from_str::<Item>(&entry.value) {
            Ok(item) => Ok(Some(item)),
            Err(error) => {
                warn!(%error, "stored selection is not a valid post");
                Ok(None)
            }
        }
    }

    fn save(&self, item: &Item) -> Result<(), PersistError> {
        let mut file = self.read_file()?.unwrap_or_default();
        let value = serde_json::to_string(item).map_err(PersistError::Serialize)?;
        let updated_at = OffsetDateTime::now_utc()
            .format(&Rfc3339)
            .map_err(PersistError::Timestamp)?;

        file.entries
            .insert(SELECTION_KEY.to_string(), StoreEntry { value, updated_at });
        self.write_file(&file)?;

        debug!(id = item.id, path = %self.path.display(), "saved selection");
        Ok(())
    }
}
