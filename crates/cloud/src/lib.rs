//! Managed-service collaborators
//!
//! Every external dependency of the concierge sits behind one async trait:
//! - **NLU** (`nlu`) - text recognition against the conversational bot
//! - **Queue** (`queue`) - hand-off of collected dining requests
//! - **Document store** (`store`) - restaurant details keyed by business id
//! - **Search index** (`search`) - business ids tagged by cuisine
//! - **Email** (`email`) - delivery of the suggestion list
//!
//! Each trait has a JSON-over-HTTP adapter built on a shared `reqwest` client
//! (`connection`) and an in-memory adapter (`memory`) used by tests and local
//! runs.
//!
//! # Deployment
//!
//! The HTTP adapters send unsigned requests. Managed AWS endpoints reject
//! those, so every configured endpoint must be either a SigV4 signing proxy
//! in front of the real service or a local emulator that skips
//! authentication. Pointing an adapter straight at a regional AWS endpoint
//! fails every call with an authorization error (`ServiceError::Status`).

pub mod connection;
pub mod email;
pub mod memory;
pub mod nlu;
pub mod queue;
pub mod search;
pub mod store;

use thiserror::Error;

pub use connection::http_client;
pub use email::{EmailSender, HttpEmailSender, OutboundEmail};
pub use memory::{
    InMemoryEmailSender, InMemoryMessageQueue, InMemoryNluClient, InMemoryRestaurantStore,
    InMemorySearchIndex,
};
pub use nlu::{HttpNluClient, NluClient, NluMessage, RecognizeTextRequest, RecognizeTextResponse};
pub use queue::{HttpMessageQueue, MessageQueue, OutboundMessage, QueueMessage};
pub use search::{CuisineQuery, HttpSearchIndex, SearchHit, SearchIndex};
pub use store::{HttpRestaurantStore, RestaurantStore};

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("transport error: {0}")]
    Transport(String),
    #[error("service returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("decode error: {0}")]
    Decode(String),
    #[error("{0}")]
    Unavailable(String),
}

impl From<reqwest::Error> for ServiceError {
    fn from(value: reqwest::Error) -> Self {
        if value.is_decode() {
            Self::Decode(value.to_string())
        } else {
            Self::Transport(value.to_string())
        }
    }
}

impl From<serde_json::Error> for ServiceError {
    fn from(value: serde_json::Error) -> Self {
        Self::Decode(value.to_string())
    }
}
