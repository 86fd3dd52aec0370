use std::path::PathBuf;

use anyhow::{Context, Result};
use postpick_core::config::PostpickConfig;
use postpick_core::item::Item;
use postpick_core::store::{FileSelectionStore, SELECTION_KEY, SelectionStore};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionReport {
    pub store_path: PathBuf,
    pub item: Option<Item>,
    pub updated_at: Option<String>,
}

impl SelectionReport {
    pub fn from_config(config: &PostpickConfig) -> Result<Self> {
        let store_path = config
            .store_path()
            .context("failed to resolve selection store path")?;
        Self::from_store(&FileSelectionStore::new(store_path))
    }

    pub fn from_store(store: &FileSelectionStore) -> Result<Self> {
        let item = store.load().with_context(|| {
            format!(
                "failed to load saved selection from {}",
                store.path().display()
            )
        })?;
        let updated_at = match item {
            Some(_) => store
                .entry(SELECTION_KEY)
                .context("failed to read selection timestamp")?
                .map(|entry| entry.updated_at),
            None => None,
        };

        Ok(Self {
            store_path: store.path().to_path_buf(),
            item,
            updated_at,
        })
    }
}
