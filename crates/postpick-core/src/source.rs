use std::time::Duration;

use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use crate::item::{Item, decode_items};

pub const DEFAULT_ENDPOINT: &str = "https://jsonplaceholder.typicode.com/posts";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("failed to build http client: {0}")]
    Client(#[source] reqwest::Error),
    #[error("request to {endpoint} failed: {source}")]
    Request {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{endpoint} returned status {status}")]
    Status { endpoint: String, status: u16 },
    #[error("failed to read posts from {endpoint}: {source}")]
    Decode {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{endpoint} did not return a JSON array")]
    NotArray { endpoint: String },
}

pub trait ListSource: Send + Sync {
    fn fetch_all(&self) -> Result<Vec<Item>, FetchError>;
}

#[derive(Debug, Clone)]
pub struct HttpListSource {
    endpoint: String,
    client: reqwest::blocking::Client,
}

impl HttpListSource {
    pub fn new(endpoint: impl Into<String>) -> Result<Self, FetchError> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(concat!("postpick/", env!("CARGO_PKG_VERSION")))
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(FetchError::Client)?;
        Ok(Self::with_client(endpoint, client))
    }

    pub fn with_client(endpoint: impl Into<String>, client: reqwest::blocking::Client) -> Self {
        Self {
            endpoint: endpoint.into(),
            client,
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl ListSource for HttpListSource {
    fn fetch_all(&self) -> Result<Vec<Item>, FetchError> {
        debug!(endpoint = %self.endpoint, "fetching posts");

        let response = self
            .client
            .get(&self.endpoint)
            .header("Accept", "application/json")
            .send()
            .map_err(|source| FetchError::Request {
                endpoint: self.endpoint.clone(),
                source,
            })?;

        if !response.status().is_success() {
            return Err(FetchError::Status {
                endpoint: self.endpoint.clone(),
                status: response.status().as_u16(),
            });
        }

        let payload = response
            .json::<Value>()
            .map_err(|source| FetchError::Decode {
                endpoint: self.endpoint.clone(),
                source,
            })?;

        let decoded = decode_items(payload).ok_or_else(|| FetchError::NotArray {
            endpoint: self.endpoint.clone(),
        })?;

        if decoded.dropped > 0 {
            warn!(
                endpoint = %self.endpoint,
                dropped = decoded.dropped,
                kept = decoded.items.len(),
                "dropped malformed posts"
            );
        }

        debug!(count = decoded.items.len(), "fetched posts");
        Ok(decoded.items)
    }
}
