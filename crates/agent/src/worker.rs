use std::fmt::Write as _;
use std::sync::Arc;

use dinebot_cloud::{
    CuisineQuery, EmailSender, MessageQueue, OutboundEmail, QueueMessage, RestaurantStore,
    SearchHit, SearchIndex, ServiceError,
};
use dinebot_core::{capitalize, display_location, BusinessId, PendingSuggestion, RestaurantRecord};
use rand::seq::SliceRandom;
use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};

/// Upper bound on restaurants included in one email.
pub const MAX_SUGGESTIONS: usize = 5;

/// Terminal result of one worker invocation. Every variant except
/// `QueueEmpty` means the message was deleted.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SuggestionOutcome {
    QueueEmpty,
    MalformedMessage,
    MissingRequiredFields,
    NoRestaurantsFound { cuisine: String },
    NoRestaurantDetails,
    EmailSent { restaurants_sent: usize },
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct OutcomeReport {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub restaurants_sent: Option<usize>,
}

impl SuggestionOutcome {
    pub fn status(&self) -> String {
        match self {
            Self::QueueEmpty => "No messages in queue".to_string(),
            Self::MalformedMessage => "Malformed message body".to_string(),
            Self::MissingRequiredFields => "Missing required fields".to_string(),
            Self::NoRestaurantsFound { cuisine } => format!("No restaurants found for {cuisine}"),
            Self::NoRestaurantDetails => "No restaurant details found".to_string(),
            Self::EmailSent { .. } => "Email sent successfully".to_string(),
        }
    }

    pub fn restaurants_sent(&self) -> Option<usize> {
        match self {
            Self::EmailSent { restaurants_sent } => Some(*restaurants_sent),
            _ => None,
        }
    }

    pub fn report(&self) -> OutcomeReport {
        OutcomeReport { status: self.status(), restaurants_sent: self.restaurants_sent() }
    }
}

#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("queue request failed: {0}")]
    Queue(#[source] ServiceError),
    #[error("search request failed: {0}")]
    Search(#[source] ServiceError),
    #[error("email delivery to `{recipient}` failed: {source}")]
    Email {
        recipient: String,
        #[source]
        source: ServiceError,
    },
}

/// Turns one queued request into an email of restaurant suggestions.
pub struct SuggestionWorker {
    queue: Arc<dyn MessageQueue>,
    search: Arc<dyn SearchIndex>,
    store: Arc<dyn RestaurantStore>,
    email: Arc<dyn EmailSender>,
}

impl SuggestionWorker {
    pub fn new(
        queue: Arc<dyn MessageQueue>,
        search: Arc<dyn SearchIndex>,
        store: Arc<dyn RestaurantStore>,
        email: Arc<dyn EmailSender>,
    ) -> Self {
        Self { queue, search, store, email }
    }

    /// Processes at most one message. Messages are deleted on every terminal
    /// path, including a failed email delivery.
    pub async fn run_once(&self) -> Result<SuggestionOutcome, WorkerError> {
        let Some(message) = self.queue.receive_one().await.map_err(WorkerError::Queue)? else {
            info!(
                event_name = "worker.queue.empty",
                correlation_id = "worker",
                "no messages in queue"
            );
            return Ok(SuggestionOutcome::QueueEmpty);
        };
        let correlation_id = message.message_id.clone();

        let pending = match PendingSuggestion::from_body(&message.body) {
            Ok(pending) => pending,
            Err(error) => {
                warn!(
                    event_name = "worker.message.malformed",
                    correlation_id = %correlation_id,
                    error = %error,
                    "queue message body is not a suggestion request"
                );
                self.delete(&message).await?;
                return Ok(SuggestionOutcome::MalformedMessage);
            }
        };

        let cuisine = capitalize(pending.cuisine.as_deref().unwrap_or_default());
        let email = pending.email.clone().unwrap_or_default();
        if cuisine.is_empty() || email.is_empty() {
            warn!(
                event_name = "worker.message.incomplete",
                correlation_id = %correlation_id,
                "cuisine or email missing, discarding message"
            );
            self.delete(&message).await?;
            return Ok(SuggestionOutcome::MissingRequiredFields);
        }
        let location = display_location(pending.location.as_deref().unwrap_or_default());

        let hits = self.search_cuisine(&cuisine, &correlation_id).await?;
        let ids: Vec<BusinessId> = hits.into_iter().filter_map(|hit| hit.restaurant_id).collect();
        info!(
            event_name = "worker.search.completed",
            correlation_id = %correlation_id,
            cuisine = %cuisine,
            hits = ids.len(),
            "search index answered"
        );
        if ids.is_empty() {
            self.delete(&message).await?;
            return Ok(SuggestionOutcome::NoRestaurantsFound { cuisine });
        }

        let sampled: Vec<BusinessId> = {
            let mut rng = rand::thread_rng();
            ids.choose_multiple(&mut rng, MAX_SUGGESTIONS).cloned().collect()
        };
        let restaurants = self.fetch_records(&sampled, &correlation_id).await;
        if restaurants.is_empty() {
            self.delete(&message).await?;
            return Ok(SuggestionOutcome::NoRestaurantDetails);
        }

        let request = SuggestionEmail {
            cuisine: &cuisine,
            location: &location,
            number_of_people: pending.number_of_people.as_deref().unwrap_or_default(),
            dining_time: pending.dining_time.as_deref().unwrap_or_default(),
        };
        let outbound = OutboundEmail {
            to: email.clone(),
            subject: request.subject(),
            body_text: request.body(&restaurants),
        };

        if let Err(source) = self.email.send(&outbound).await {
            warn!(
                event_name = "worker.email.failed",
                correlation_id = %correlation_id,
                error = %source,
                "email delivery failed, discarding message"
            );
            if let Err(delete_error) = self.delete(&message).await {
                warn!(
                    event_name = "worker.message.delete_failed",
                    correlation_id = %correlation_id,
                    error = %delete_error,
                    "could not delete message after email failure"
                );
            }
            return Err(WorkerError::Email { recipient: email, source });
        }

        self.delete(&message).await?;
        info!(
            event_name = "worker.email.sent",
            correlation_id = %correlation_id,
            restaurants_sent = restaurants.len(),
            "suggestions emailed"
        );
        Ok(SuggestionOutcome::EmailSent { restaurants_sent: restaurants.len() })
    }

    /// Exact tag match first; any error there falls back to a match query.
    async fn search_cuisine(
        &self,
        cuisine: &str,
        correlation_id: &str,
    ) -> Result<Vec<SearchHit>, WorkerError> {
        match self.search.search(&CuisineQuery::Exact(cuisine.to_string())).await {
            Ok(hits) => Ok(hits),
            Err(error) => {
                warn!(
                    event_name = "worker.search.fallback",
                    correlation_id = %correlation_id,
                    error = %error,
                    "exact cuisine query failed, retrying as match query"
                );
                self.search
                    .search(&CuisineQuery::Fuzzy(cuisine.to_string()))
                    .await
                    .map_err(WorkerError::Search)
            }
        }
    }

    async fn fetch_records(
        &self,
        ids: &[BusinessId],
        correlation_id: &str,
    ) -> Vec<RestaurantRecord> {
        let mut records = Vec::with_capacity(ids.len());
        for id in ids {
            match self.store.find_by_id(id).await {
                Ok(Some(record)) => records.push(record),
                Ok(None) => info!(
                    event_name = "worker.store.miss",
                    correlation_id = %correlation_id,
                    business_id = %id.as_str(),
                    "restaurant not in document store"
                ),
                Err(error) => warn!(
                    event_name = "worker.store.failed",
                    correlation_id = %correlation_id,
                    business_id = %id.as_str(),
                    error = %error,
                    "document store read failed"
                ),
            }
        }
        records
    }

    async fn delete(&self, message: &QueueMessage) -> Result<(), WorkerError> {
        self.queue.delete(&message.receipt_handle).await.map_err(WorkerError::Queue)?;
        info!(
            event_name = "worker.message.deleted",
            correlation_id = %message.message_id,
            "queue message deleted"
        );
        Ok(())
    }
}

struct SuggestionEmail<'a> {
    cuisine: &'a str,
    location: &'a str,
    number_of_people: &'a str,
    dining_time: &'a str,
}

impl SuggestionEmail<'_> {
    fn subject(&self) -> String {
        format!("Your {} Dining Suggestions in {}", self.cuisine, self.location)
    }

    fn body(&self, restaurants: &[RestaurantRecord]) -> String {
        let mut text = format!(
            "Hello!\n\nHere are your {} restaurant suggestions in {} for {} people at {}:\n\n",
            self.cuisine, self.location, self.number_of_people, self.dining_time
        );
        for (idx, restaurant) in restaurants.iter().enumerate() {
            let _ = write!(
                text,
                "{}. {}\n   Address: {}\n   Rating: {} ({} reviews)\n\n",
                idx + 1,
                restaurant.display_name(),
                restaurant.display_address(),
                restaurant.display_rating(),
                restaurant.display_review_count(),
            );
        }
        text.push_str("Enjoy your meal!\n- Dining Concierge Bot");
        text
    }
}

#[cfg(test)]
mod tests {
    use dinebot_core::{BusinessId, RestaurantRecord};

    use super::{SuggestionEmail, SuggestionOutcome};

    #[test]
    fn body_lists_restaurants_with_placeholders() {
        let email = SuggestionEmail {
            cuisine: "Italian",
            location: "manhattan",
            number_of_people: "2",
            dining_time: "19:00",
        };
        let restaurants = vec![
            RestaurantRecord {
                business_id: BusinessId("a".to_string()),
                name: Some("Carbone".to_string()),
                address: Some("181 Thompson St".to_string()),
                rating: Some(4.5),
                review_count: Some(1200),
            },
            RestaurantRecord {
                business_id: BusinessId("b".to_string()),
                name: None,
                address: None,
                rating: None,
                review_count: None,
            },
        ];

        assert_eq!(email.subject(), "Your Italian Dining Suggestions in manhattan");
        assert_eq!(
            email.body(&restaurants),
            "Hello!\n\nHere are your Italian restaurant suggestions in manhattan for 2 people \
             at 19:00:\n\n1. Carbone\n   Address: 181 Thompson St\n   Rating: 4.5 (1200 \
             reviews)\n\n2. Unknown\n   Address: Address not available\n   Rating: N/A (N/A \
             reviews)\n\nEnjoy your meal!\n- Dining Concierge Bot"
        );
    }

    #[test]
    fn outcome_reports_status_and_count() {
        let sent = SuggestionOutcome::EmailSent { restaurants_sent: 3 }.report();
        assert_eq!(sent.status, "Email sent successfully");
        assert_eq!(sent.restaurants_sent, Some(3));

        let none = SuggestionOutcome::NoRestaurantsFound { cuisine: "Thai".to_string() };
        assert_eq!(none.status(), "No restaurants found for Thai");
        assert_eq!(
            serde_json::to_value(none.report()).expect("encode"),
            serde_json::json!({"status": "No restaurants found for Thai"})
        );
    }
}
