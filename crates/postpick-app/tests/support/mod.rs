use std::collections::VecDeque;
use std::sync::Mutex;

use postpick_core::item::Item;
use postpick_core::source::{FetchError, ListSource};

pub fn item(id: i64, title: &str, body: &str) -> Item {
    Item {
        id,
        title: title.to_string(),
        body: body.to_string(),
    }
}

pub fn sample_posts() -> Vec<Item> {
    vec![item(1, "Hello World", "a"), item(2, "Goodbye", "b")]
}

pub struct QueueSource {
    responses: Mutex<VecDeque<Result<Vec<Item>, FetchError>>>,
}

impl QueueSource {
    pub fn new(responses: Vec<Result<Vec<Item>, FetchError>>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
        }
    }
}

impl ListSource for QueueSource {
    fn fetch_all(&self) -> Result<Vec<Item>, FetchError> {
        self.responses
            .lock()
            .expect("responses lock")
            .pop_front()
            .unwrap_or_else(|| {
                Err(FetchError::NotArray {
                    endpoint: "scripted://exhausted".to_string(),
                })
            })
    }
}

pub fn unavailable() -> Result<Vec<Item>, FetchError> {
    Err(FetchError::Status {
        endpoint: "http://localhost/posts".to_string(),
        status: 503,
    })
}
