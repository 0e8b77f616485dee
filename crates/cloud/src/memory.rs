use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use dinebot_core::{BusinessId, RestaurantRecord};
use tokio::sync::{Mutex, RwLock};

use crate::email::{EmailSender, OutboundEmail};
use crate::nlu::{NluClient, NluMessage, RecognizeTextRequest, RecognizeTextResponse};
use crate::queue::{MessageQueue, OutboundMessage, QueueMessage};
use crate::search::{CuisineQuery, SearchHit, SearchIndex};
use crate::store::RestaurantStore;
use crate::ServiceError;

/// Replies with a fixed list of fragments and records every request.
#[derive(Default)]
pub struct InMemoryNluClient {
    replies: Vec<NluMessage>,
    fail: AtomicBool,
    requests: Mutex<Vec<RecognizeTextRequest>>,
}

impl InMemoryNluClient {
    pub fn with_replies(replies: Vec<NluMessage>) -> Self {
        Self { replies, ..Self::default() }
    }

    pub fn set_failing(&self, failing: bool) {
        self.fail.store(failing, Ordering::SeqCst);
    }

    pub async fn requests(&self) -> Vec<RecognizeTextRequest> {
        self.requests.lock().await.clone()
    }
}

#[async_trait]
impl NluClient for InMemoryNluClient {
    async fn recognize_text(
        &self,
        request: &RecognizeTextRequest,
    ) -> Result<RecognizeTextResponse, ServiceError> {
        self.requests.lock().await.push(request.clone());
        if self.fail.load(Ordering::SeqCst) {
            return Err(ServiceError::Unavailable("nlu runtime unavailable".to_string()));
        }
        Ok(RecognizeTextResponse {
            messages: self.replies.clone(),
            session_id: Some(request.session_id.clone()),
        })
    }
}

/// FIFO queue. Received messages stay in flight until deleted.
#[derive(Default)]
pub struct InMemoryMessageQueue {
    pending: Mutex<VecDeque<QueueMessage>>,
    in_flight: Mutex<HashMap<String, QueueMessage>>,
    sent: Mutex<Vec<OutboundMessage>>,
    deleted: Mutex<Vec<String>>,
    next_id: AtomicUsize,
    fail_sends: AtomicBool,
}

impl InMemoryMessageQueue {
    pub fn set_failing_sends(&self, failing: bool) {
        self.fail_sends.store(failing, Ordering::SeqCst);
    }

    /// Makes a raw body visible to receivers, as a producer would.
    pub async fn push_body(&self, body: impl Into<String>) -> QueueMessage {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        let message = QueueMessage {
            message_id: format!("msg-{id}"),
            receipt_handle: format!("receipt-{id}"),
            body: body.into(),
        };
        self.pending.lock().await.push_back(message.clone());
        message
    }

    pub async fn sent(&self) -> Vec<OutboundMessage> {
        self.sent.lock().await.clone()
    }

    pub async fn deleted(&self) -> Vec<String> {
        self.deleted.lock().await.clone()
    }

    pub async fn pending_len(&self) -> usize {
        self.pending.lock().await.len()
    }

    pub async fn in_flight_len(&self) -> usize {
        self.in_flight.lock().await.len()
    }
}

#[async_trait]
impl MessageQueue for InMemoryMessageQueue {
    async fn send(&self, message: OutboundMessage) -> Result<String, ServiceError> {
        if self.fail_sends.load(Ordering::SeqCst) {
            return Err(ServiceError::Unavailable("queue rejected the message".to_string()));
        }
        let queued = self.push_body(message.body.clone()).await;
        self.sent.lock().await.push(message);
        Ok(queued.message_id)
    }

    async fn receive_one(&self) -> Result<Option<QueueMessage>, ServiceError> {
        let next = self.pending.lock().await.pop_front();
        if let Some(message) = &next {
            self.in_flight.lock().await.insert(message.receipt_handle.clone(), message.clone());
        }
        Ok(next)
    }

    async fn delete(&self, receipt_handle: &str) -> Result<(), ServiceError> {
        self.in_flight.lock().await.remove(receipt_handle);
        self.deleted.lock().await.push(receipt_handle.to_string());
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryRestaurantStore {
    records: RwLock<HashMap<String, RestaurantRecord>>,
    failing_ids: RwLock<HashSet<String>>,
    reads: AtomicUsize,
}

impl InMemoryRestaurantStore {
    pub async fn save(&self, record: RestaurantRecord) {
        self.records.write().await.insert(record.business_id.0.clone(), record);
    }

    pub async fn fail_on(&self, id: &BusinessId) {
        self.failing_ids.write().await.insert(id.0.clone());
    }

    pub fn read_count(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RestaurantStore for InMemoryRestaurantStore {
    async fn find_by_id(
        &self,
        id: &BusinessId,
    ) -> Result<Option<RestaurantRecord>, ServiceError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        if self.failing_ids.read().await.contains(&id.0) {
            return Err(ServiceError::Unavailable(format!("store read failed for {}", id.0)));
        }
        Ok(self.records.read().await.get(&id.0).cloned())
    }
}

/// Term queries match the tag exactly, match queries ignore case.
#[derive(Default)]
pub struct InMemorySearchIndex {
    hits: RwLock<Vec<SearchHit>>,
    fail_exact: AtomicBool,
    fail_fuzzy: AtomicBool,
    queries: Mutex<Vec<CuisineQuery>>,
}

impl InMemorySearchIndex {
    pub async fn index(&self, hit: SearchHit) {
        self.hits.write().await.push(hit);
    }

    pub fn set_failing_exact(&self, failing: bool) {
        self.fail_exact.store(failing, Ordering::SeqCst);
    }

    pub fn set_failing_fuzzy(&self, failing: bool) {
        self.fail_fuzzy.store(failing, Ordering::SeqCst);
    }

    pub async fn queries(&self) -> Vec<CuisineQuery> {
        self.queries.lock().await.clone()
    }
}

#[async_trait]
impl SearchIndex for InMemorySearchIndex {
    async fn search(&self, query: &CuisineQuery) -> Result<Vec<SearchHit>, ServiceError> {
        self.queries.lock().await.push(query.clone());

        let hits = self.hits.read().await;
        let matching = match query {
            CuisineQuery::Exact(cuisine) => {
                if self.fail_exact.load(Ordering::SeqCst) {
                    return Err(ServiceError::Status {
                        status: 400,
                        body: "no mapping for Cuisine.keyword".to_string(),
                    });
                }
                hits.iter().filter(|hit| hit.cuisine.as_deref() == Some(cuisine.as_str())).cloned().collect()
            }
            CuisineQuery::Fuzzy(cuisine) => {
                if self.fail_fuzzy.load(Ordering::SeqCst) {
                    return Err(ServiceError::Unavailable("search cluster unavailable".to_string()));
                }
                hits.iter()
                    .filter(|hit| {
                        hit.cuisine.as_deref().is_some_and(|tag| tag.eq_ignore_ascii_case(cuisine))
                    })
                    .cloned()
                    .collect()
            }
        };
        Ok(matching)
    }
}

#[derive(Default)]
pub struct InMemoryEmailSender {
    outbox: Mutex<Vec<OutboundEmail>>,
    fail: AtomicBool,
}

impl InMemoryEmailSender {
    pub fn set_failing(&self, failing: bool) {
        self.fail.store(failing, Ordering::SeqCst);
    }

    pub async fn outbox(&self) -> Vec<OutboundEmail> {
        self.outbox.lock().await.clone()
    }
}

#[async_trait]
impl EmailSender for InMemoryEmailSender {
    async fn send(&self, email: &OutboundEmail) -> Result<(), ServiceError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(ServiceError::Status {
                status: 400,
                body: "Email address is not verified".to_string(),
            });
        }
        self.outbox.lock().await.push(email.clone());
        Ok(())
    }
}
