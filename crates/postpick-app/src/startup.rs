use std::sync::Arc;
use std::sync::mpsc::{self, Receiver};

use postpick_core::item::Item;
use postpick_core::source::{FetchError, ListSource};
use postpick_core::store::{PersistError, SelectionStore};
use tracing::{debug, warn};

/// Both startup reads, joined. The lookup result is advisory; the fetch
/// result is what populates the browsable list.
#[derive(Debug)]
pub struct StartupOutcome {
    pub prior: Result<Option<Item>, PersistError>,
    pub fetched: Result<Vec<Item>, FetchError>,
}

#[derive(Debug)]
pub enum StartupEvent {
    Done { token: u64, outcome: StartupOutcome },
}

pub trait StartupLoader: Send + Sync {
    fn spawn_startup(&self, token: u64) -> Receiver<StartupEvent>;
}

pub fn run_startup(source: &dyn ListSource, store: &dyn SelectionStore) -> StartupOutcome {
    std::thread::scope(|scope| {
        let lookup = scope.spawn(|| store.load());
        let fetched = source.fetch_all();
        let prior = lookup.join().unwrap_or_else(|_| {
            warn!("selection lookup worker panicked; starting unselected");
            Ok(None)
        });

        StartupOutcome { prior, fetched }
    })
}

pub struct ThreadStartupLoader {
    source: Arc<dyn ListSource>,
    store: Arc<dyn SelectionStore>,
}

impl ThreadStartupLoader {
    pub fn new(source: Arc<dyn ListSource>, store: Arc<dyn SelectionStore>) -> Self {
        Self { source, store }
    }
}

impl StartupLoader for ThreadStartupLoader {
    fn spawn_startup(&self, token: u64) -> Receiver<StartupEvent> {
        let (sender, receiver) = mpsc::channel();
        let source = Arc::clone(&self.source);
        let store = Arc::clone(&self.store);

        std::thread::spawn(move || {
            let outcome = run_startup(source.as_ref(), store.as_ref());
            debug!(token, "startup reads finished");
            let _ = sender.send(StartupEvent::Done { token, outcome });
        });

        receiver
    }
}
