pub mod controller;
pub mod save;
mod show;
pub mod startup;

use std::sync::Arc;

use anyhow::{Context, Result, anyhow};
use postpick_core::config::{PostpickConfig, load_config_or_default, resolve_config_path};
use postpick_core::source::{HttpListSource, ListSource};
use postpick_core::store::{FileSelectionStore, SelectionStore};

pub use controller::{ControllerState, PendingSave, Picker, SelectionController, SelectionState};
pub use save::{SaveEvent, SaveLoader, ThreadSaveLoader};
pub use show::SelectionReport;
pub use startup::{StartupEvent, StartupLoader, StartupOutcome, ThreadStartupLoader};

pub struct App {
    source: Arc<dyn ListSource>,
    store: Arc<dyn SelectionStore>,
}

impl App {
    pub fn new(source: Arc<dyn ListSource>, store: Arc<dyn SelectionStore>) -> Self {
        Self { source, store }
    }

    pub fn from_config(config: &PostpickConfig) -> Result<Self> {
        let source = HttpListSource::new(config.source.endpoint.clone())
            .context("failed to prepare posts client")?;
        let store_path = config
            .store_path()
            .context("failed to resolve selection store path")?;

        Ok(Self::new(
            Arc::new(source),
            Arc::new(FileSelectionStore::new(store_path)),
        ))
    }

    pub fn startup_loader(&self) -> ThreadStartupLoader {
        ThreadStartupLoader::new(Arc::clone(&self.source), Arc::clone(&self.store))
    }

    pub fn save_loader(&self) -> ThreadSaveLoader {
        ThreadSaveLoader::new(Arc::clone(&self.store))
    }
}

pub fn ensure_config_ready() -> Result<PostpickConfig> {
    let config_path = resolve_config_path().context("failed to resolve config path")?;

    load_config_or_default(&config_path).map_err(|error| {
        anyhow!(
            "invalid config at {}: {error}\nFix the config and retry, or remove it to use defaults.",
            config_path.display()
        )
    })
}
