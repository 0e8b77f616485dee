//! The three units of work behind the dining assistant.
//!
//! - `router` relays chat text to the intent-recognition service and wraps
//!   its reply for the web client.
//! - `fulfillment` answers the recognition service's code hooks: it validates
//!   slots while the dialog is in progress and enqueues the finished request.
//! - `worker` drains one queued request at a time, picks restaurants from the
//!   search index and document store, and emails them to the diner.
//!
//! None of them keep state between invocations. Every collaborator is reached
//! through a trait from `dinebot-cloud`, so the same code runs against the
//! HTTP adapters in production and the in-memory ones in tests.

pub mod components;
pub mod fulfillment;
pub mod router;
pub mod worker;

pub use components::{component_statuses, ComponentStatus, Components};
pub use fulfillment::DialogFulfillmentHandler;
pub use router::{ChatContext, ChatReply, ErrorBody, MessageRouter};
pub use worker::{SuggestionOutcome, SuggestionWorker, WorkerError};
