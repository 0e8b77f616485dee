use std::sync::Arc;

use chrono::{DateTime, Utc};
use dinebot_cloud::{MessageQueue, OutboundMessage};
use dinebot_core::dialog::event::SessionAttributes;
use dinebot_core::{
    capitalize, validate_dining_suggestion, ApplicationError, CodeHookEvent, DialogDirective,
    DialogResponse, DomainError, FulfillmentState, InvocationSource, SlotName, SlotSet,
    SuggestionRequest,
};
use tracing::{info, warn};

pub const GREETING_INTENT: &str = "GreetingIntent";
pub const THANK_YOU_INTENT: &str = "ThankYouIntent";
pub const DINING_SUGGESTIONS_INTENT: &str = "DiningSuggestionsIntent";

const GREETING_MESSAGE: &str =
    "Hi there! How can I help you? You can ask me for dining suggestions.";
const THANK_YOU_MESSAGE: &str = "You're welcome! Have a great day and enjoy your meal!";
const UNKNOWN_INTENT_MESSAGE: &str = "Sorry, I didn't understand that. Can you try again?";
const FULFILLMENT_FAILED_MESSAGE: &str =
    "I'm sorry, something went wrong while processing your request. Please try again later.";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Intent {
    Greeting,
    ThankYou,
    DiningSuggestions,
    Unknown,
}

impl Intent {
    fn from_name(name: &str) -> Self {
        match name {
            GREETING_INTENT => Self::Greeting,
            THANK_YOU_INTENT => Self::ThankYou,
            DINING_SUGGESTIONS_INTENT => Self::DiningSuggestions,
            _ => Self::Unknown,
        }
    }
}

/// Slot values read back at the fulfillment hook.
struct FilledSlots<'a> {
    location: &'a str,
    cuisine: &'a str,
    dining_time: &'a str,
    number_of_people: &'a str,
    email: &'a str,
}

impl<'a> FilledSlots<'a> {
    fn read(slots: &'a SlotSet) -> Result<Self, DomainError> {
        let slot =
            move |name: SlotName| slots.interpreted(name).ok_or(DomainError::MissingSlot(name));
        Ok(Self {
            location: slot(SlotName::Location)?,
            cuisine: slot(SlotName::Cuisine)?,
            dining_time: slot(SlotName::DiningTime)?,
            number_of_people: slot(SlotName::NumberOfPeople)?,
            email: slot(SlotName::Email)?,
        })
    }

    fn confirmation(&self) -> String {
        format!(
            "You're all set! I've received your request for {} restaurant suggestions in {} \
             for {} people at {}. I will notify you via email at {} once I have the list of \
             suggestions. Expect it shortly!",
            capitalize(self.cuisine),
            self.location,
            self.number_of_people,
            self.dining_time,
            self.email,
        )
    }
}

/// Answers dialog and fulfillment code hooks for the dining assistant.
pub struct DialogFulfillmentHandler {
    queue: Arc<dyn MessageQueue>,
}

impl DialogFulfillmentHandler {
    pub fn new(queue: Arc<dyn MessageQueue>) -> Self {
        Self { queue }
    }

    /// Never fails: every problem is expressed as a directive for the
    /// recognition service.
    pub async fn handle(&self, event: CodeHookEvent) -> DialogResponse {
        self.handle_at(event, Utc::now()).await
    }

    pub async fn handle_at(&self, event: CodeHookEvent, now: DateTime<Utc>) -> DialogResponse {
        let intent_name = event.intent_name().to_string();
        let correlation_id = event.session_id.clone().unwrap_or_else(|| "unknown".to_string());

        let (directive, session_attributes) = match Intent::from_name(&intent_name) {
            Intent::Greeting => (
                DialogDirective::close(FulfillmentState::Fulfilled, GREETING_MESSAGE),
                event.session_attributes(),
            ),
            Intent::ThankYou => (
                DialogDirective::close(FulfillmentState::Fulfilled, THANK_YOU_MESSAGE),
                event.session_attributes(),
            ),
            Intent::DiningSuggestions => {
                let directive = self.dining_suggestions(&event, now, &correlation_id).await;
                (directive, event.session_attributes())
            }
            Intent::Unknown => {
                warn!(
                    event_name = "dialog.intent.unknown",
                    correlation_id = %correlation_id,
                    intent = %intent_name,
                    "closing conversation for unrecognised intent"
                );
                (
                    DialogDirective::close(FulfillmentState::Failed, UNKNOWN_INTENT_MESSAGE),
                    SessionAttributes::new(),
                )
            }
        };

        info!(
            event_name = "dialog.directive.issued",
            correlation_id = %correlation_id,
            intent = %intent_name,
            directive = ?directive.kind(),
            "code hook answered"
        );
        directive.into_response(intent_name, session_attributes)
    }

    async fn dining_suggestions(
        &self,
        event: &CodeHookEvent,
        now: DateTime<Utc>,
        correlation_id: &str,
    ) -> DialogDirective {
        let mut slots = event.slots();
        match event.invocation_source {
            InvocationSource::DialogCodeHook => match validate_dining_suggestion(&slots) {
                Ok(()) => DialogDirective::Delegate { slots: event.received_slots() },
                Err(violation) => {
                    info!(
                        event_name = "dialog.slot.rejected",
                        correlation_id = %correlation_id,
                        slot = %violation.slot,
                        "slot failed validation, eliciting again"
                    );
                    slots.clear(violation.slot);
                    DialogDirective::ElicitSlot {
                        slot: violation.slot,
                        slots,
                        message: violation.message,
                    }
                }
            },
            InvocationSource::FulfillmentCodeHook => {
                match self.enqueue(&slots, now, correlation_id).await {
                    Ok(confirmation) => {
                        DialogDirective::close(FulfillmentState::Fulfilled, confirmation)
                    }
                    Err(error) => {
                        warn!(
                            event_name = "dialog.fulfillment.failed",
                            correlation_id = %correlation_id,
                            error = %error,
                            "could not queue suggestion request"
                        );
                        DialogDirective::close(FulfillmentState::Failed, FULFILLMENT_FAILED_MESSAGE)
                    }
                }
            }
            InvocationSource::Unknown => {
                DialogDirective::Delegate { slots: event.received_slots() }
            }
        }
    }

    async fn enqueue(
        &self,
        slots: &SlotSet,
        now: DateTime<Utc>,
        correlation_id: &str,
    ) -> Result<String, ApplicationError> {
        let filled = FilledSlots::read(slots)?;
        let request = SuggestionRequest::new(
            filled.location,
            filled.cuisine,
            filled.dining_time,
            filled.number_of_people,
            filled.email,
            now,
        );
        let message = OutboundMessage::try_from(&request)
            .map_err(|error| ApplicationError::Integration(error.to_string()))?;
        let message_id = self
            .queue
            .send(message)
            .await
            .map_err(|error| ApplicationError::Integration(error.to_string()))?;

        info!(
            event_name = "dialog.fulfillment.queued",
            correlation_id = %correlation_id,
            message_id = %message_id,
            cuisine = %request.cuisine,
            "suggestion request queued"
        );
        Ok(filled.confirmation())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::{TimeZone, Utc};
    use dinebot_cloud::InMemoryMessageQueue;
    use dinebot_core::dialog::event::{
        DialogActionType, IntentSnapshot, IntentState, SessionState,
    };
    use dinebot_core::{CodeHookEvent, InvocationSource, SlotName, SlotSet, SuggestionRequest};

    use super::{DialogFulfillmentHandler, FULFILLMENT_FAILED_MESSAGE};

    fn event(intent: &str, source: InvocationSource, slots: SlotSet) -> CodeHookEvent {
        CodeHookEvent {
            session_state: SessionState {
                session_attributes: Some([("channel".to_string(), "web".to_string())].into()),
                intent: IntentSnapshot { name: intent.to_string(), slots: Some(slots), state: None },
            },
            invocation_source: source,
            input_transcript: None,
            session_id: Some("10-0-0-7".to_string()),
        }
    }

    fn complete_slots() -> SlotSet {
        SlotSet::new()
            .with_value(SlotName::Location, "Manhattan")
            .with_value(SlotName::Cuisine, "italian")
            .with_value(SlotName::DiningTime, "19:30")
            .with_value(SlotName::NumberOfPeople, "4")
            .with_value(SlotName::Email, "diner@example.com")
    }

    fn handler() -> (Arc<InMemoryMessageQueue>, DialogFulfillmentHandler) {
        let queue = Arc::new(InMemoryMessageQueue::default());
        (queue.clone(), DialogFulfillmentHandler::new(queue))
    }

    #[tokio::test]
    async fn greeting_closes_fulfilled_and_echoes_attributes() {
        let (queue, handler) = handler();
        let response =
            handler.handle(event("GreetingIntent", InvocationSource::DialogCodeHook, SlotSet::new())).await;

        assert_eq!(response.session_state.dialog_action.kind, DialogActionType::Close);
        assert_eq!(response.session_state.intent.state, Some(IntentState::Fulfilled));
        assert_eq!(response.session_state.session_attributes["channel"], "web");
        assert!(response.messages[0].content.starts_with("Hi there!"));
        assert!(queue.sent().await.is_empty());
    }

    #[tokio::test]
    async fn unknown_intent_fails_with_empty_attributes() {
        let (_, handler) = handler();
        let response =
            handler.handle(event("OrderPizza", InvocationSource::DialogCodeHook, SlotSet::new())).await;

        assert_eq!(response.session_state.intent.state, Some(IntentState::Failed));
        assert!(response.session_state.session_attributes.is_empty());
        assert_eq!(
            response.messages[0].content,
            "Sorry, I didn't understand that. Can you try again?"
        );
    }

    #[tokio::test]
    async fn valid_dialog_slots_are_delegated_unchanged() {
        let (_, handler) = handler();
        let slots = complete_slots();
        let response = handler
            .handle(event("DiningSuggestionsIntent", InvocationSource::DialogCodeHook, slots.clone()))
            .await;

        assert_eq!(response.session_state.dialog_action.kind, DialogActionType::Delegate);
        assert_eq!(response.session_state.intent.slots, Some(Some(slots)));
        assert!(response.messages.is_empty());
    }

    #[tokio::test]
    async fn invalid_slot_is_cleared_and_elicited() {
        let (_, handler) = handler();
        let slots = complete_slots().with_value(SlotName::NumberOfPeople, "25");
        let response = handler
            .handle(event("DiningSuggestionsIntent", InvocationSource::DialogCodeHook, slots))
            .await;

        assert_eq!(response.session_state.dialog_action.kind, DialogActionType::ElicitSlot);
        assert_eq!(
            response.session_state.dialog_action.slot_to_elicit.as_deref(),
            Some("NumberOfPeople")
        );
        let returned = response.session_state.intent.slots.flatten().expect("slots returned");
        assert!(returned.contains(SlotName::NumberOfPeople));
        assert_eq!(returned.interpreted(SlotName::NumberOfPeople), None);
        assert_eq!(returned.interpreted(SlotName::Cuisine), Some("italian"));
        assert_eq!(response.messages[0].content, "Please enter a valid number of people (1-20).");
    }

    #[tokio::test]
    async fn fulfillment_queues_request_and_confirms() {
        let (queue, handler) = handler();
        let now = Utc.with_ymd_and_hms(2025, 3, 14, 18, 0, 0).single().expect("valid instant");
        let response = handler
            .handle_at(
                event("DiningSuggestionsIntent", InvocationSource::FulfillmentCodeHook, complete_slots()),
                now,
            )
            .await;

        assert_eq!(response.session_state.intent.state, Some(IntentState::Fulfilled));
        assert_eq!(
            response.messages[0].content,
            "You're all set! I've received your request for Italian restaurant suggestions in \
             Manhattan for 4 people at 19:30. I will notify you via email at diner@example.com \
             once I have the list of suggestions. Expect it shortly!"
        );

        let sent = queue.sent().await;
        assert_eq!(sent.len(), 1);
        let queued: SuggestionRequest = serde_json::from_str(&sent[0].body).expect("queued body");
        assert_eq!(queued.location, "new york");
        assert_eq!(queued.timestamp, "2025-03-14T18:00:00.000000Z");
        assert_eq!(sent[0].attributes["Location"], "new york");
    }

    #[tokio::test]
    async fn queue_failure_closes_as_failed() {
        let (queue, handler) = handler();
        queue.set_failing_sends(true);
        let response = handler
            .handle(event("DiningSuggestionsIntent", InvocationSource::FulfillmentCodeHook, complete_slots()))
            .await;

        assert_eq!(response.session_state.intent.state, Some(IntentState::Failed));
        assert_eq!(response.messages[0].content, FULFILLMENT_FAILED_MESSAGE);
    }

    #[tokio::test]
    async fn missing_slot_at_fulfillment_closes_as_failed_without_queueing() {
        let (queue, handler) = handler();
        let slots = SlotSet::new().with_value(SlotName::Cuisine, "italian");
        let response = handler
            .handle(event("DiningSuggestionsIntent", InvocationSource::FulfillmentCodeHook, slots))
            .await;

        assert_eq!(response.session_state.intent.state, Some(IntentState::Failed));
        assert!(queue.sent().await.is_empty());
    }

    #[tokio::test]
    async fn other_invocation_sources_delegate() {
        let (_, handler) = handler();
        let slots = complete_slots().with_value(SlotName::Cuisine, "thai");
        let response = handler
            .handle(event("DiningSuggestionsIntent", InvocationSource::Unknown, slots.clone()))
            .await;

        assert_eq!(response.session_state.dialog_action.kind, DialogActionType::Delegate);
        assert_eq!(response.session_state.intent.slots, Some(Some(slots)));
    }

    #[tokio::test]
    async fn null_slot_map_is_delegated_as_null() {
        let (_, handler) = handler();
        let mut hook =
            event("DiningSuggestionsIntent", InvocationSource::DialogCodeHook, SlotSet::new());
        hook.session_state.intent.slots = None;

        let response = handler.handle(hook).await;

        assert_eq!(response.session_state.dialog_action.kind, DialogActionType::Delegate);
        assert_eq!(response.session_state.intent.slots, Some(None));
        let encoded = serde_json::to_value(&response).expect("encode");
        assert_eq!(encoded["sessionState"]["intent"]["slots"], serde_json::Value::Null);
        assert!(encoded["sessionState"]["intent"].get("slots").is_some());
    }
}
