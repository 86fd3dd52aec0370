use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};

use postpick_core::item::Item;
use postpick_core::store::{PersistError, SelectionStore};
use tracing::{debug, warn};

#[derive(Debug)]
pub enum SaveEvent {
    Done {
        token: u64,
        item: Item,
        result: Result<(), PersistError>,
    },
}

pub trait SaveLoader: Send + Sync {
    fn spawn_save(&self, token: u64, item: Item) -> Receiver<SaveEvent>;
}

struct SaveJob {
    token: u64,
    item: Item,
    reply: Sender<SaveEvent>,
}

/// Runs saves on one long-lived worker so writes land in the order they
/// were requested.
pub struct ThreadSaveLoader {
    jobs: Mutex<Sender<SaveJob>>,
}

impl ThreadSaveLoader {
    pub fn new(store: Arc<dyn SelectionStore>) -> Self {
        let (jobs, queue) = mpsc::channel::<SaveJob>();

        std::thread::spawn(move || {
            for job in queue {
                let result = store.save(&job.item);
                debug!(token = job.token, ok = result.is_ok(), "save finished");
                let _ = job.reply.send(SaveEvent::Done {
                    token: job.token,
                    item: job.item,
                    result,
                });
            }
        });

        Self {
            jobs: Mutex::new(jobs),
        }
    }
}

impl SaveLoader for ThreadSaveLoader {
    fn spawn_save(&self, token: u64, item: Item) -> Receiver<SaveEvent> {
        let (reply, receiver) = mpsc::channel();
        let jobs = self
            .jobs
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);

        if jobs.send(SaveJob { token, item, reply }).is_err() {
            // The dropped reply sender disconnects `receiver`.
            warn!(token, "save worker is gone");
        }

        receiver
    }
}
