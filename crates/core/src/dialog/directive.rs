use serde::{Deserialize, Serialize};

use crate::dialog::event::{
    DialogAction, DialogActionType, DialogResponse, IntentState, ResponseIntent, ResponseMessage,
    ResponseSessionState, SessionAttributes,
};
use crate::domain::slots::{SlotName, SlotSet};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum FulfillmentState {
    Fulfilled,
    Failed,
}

impl From<FulfillmentState> for IntentState {
    fn from(value: FulfillmentState) -> Self {
        match value {
            FulfillmentState::Fulfilled => Self::Fulfilled,
            FulfillmentState::Failed => Self::Failed,
        }
    }
}

/// What the code hook tells the NLU service to do next.
#[derive(Clone, Debug, PartialEq)]
pub enum DialogDirective {
    /// End the conversation with a single message.
    Close { state: FulfillmentState, message: String },
    /// Ask the user for one slot again.
    ElicitSlot { slot: SlotName, slots: SlotSet, message: String },
    /// Let the service continue its own slot filling. Slots are echoed as
    /// received, including a null slot map.
    Delegate { slots: Option<SlotSet> },
}

impl DialogDirective {
    pub fn close(state: FulfillmentState, message: impl Into<String>) -> Self {
        Self::Close { state, message: message.into() }
    }

    pub fn kind(&self) -> DialogActionType {
        match self {
            Self::Close { .. } => DialogActionType::Close,
            Self::ElicitSlot { .. } => DialogActionType::ElicitSlot,
            Self::Delegate { .. } => DialogActionType::Delegate,
        }
    }

    pub fn into_response(
        self,
        intent_name: impl Into<String>,
        session_attributes: SessionAttributes,
    ) -> DialogResponse {
        let name = intent_name.into();
        let kind = self.kind();

        let (intent, slot_to_elicit, messages) = match self {
            Self::Close { state, message } => (
                ResponseIntent { name, slots: None, state: Some(state.into()) },
                None,
                vec![ResponseMessage::plain_text(message)],
            ),
            Self::ElicitSlot { slot, slots, message } => (
                ResponseIntent {
                    name,
                    slots: Some(Some(slots)),
                    state: Some(IntentState::InProgress),
                },
                Some(slot.as_str().to_string()),
                vec![ResponseMessage::plain_text(message)],
            ),
            Self::Delegate { slots } => {
                (ResponseIntent { name, slots: Some(slots), state: None }, None, Vec::new())
            }
        };

        DialogResponse {
            session_state: ResponseSessionState {
                session_attributes,
                dialog_action: DialogAction { kind, slot_to_elicit },
                intent,
            },
            messages,
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{DialogDirective, FulfillmentState};
    use crate::dialog::event::SessionAttributes;
    use crate::domain::slots::{SlotName, SlotSet};

    #[test]
    fn close_serializes_state_and_single_message() {
        let response = DialogDirective::close(FulfillmentState::Fulfilled, "bye")
            .into_response("ThankYouIntent", SessionAttributes::new());

        assert_eq!(
            serde_json::to_value(&response).expect("encode"),
            json!({
                "sessionState": {
                    "sessionAttributes": {},
                    "dialogAction": {"type": "Close"},
                    "intent": {"name": "ThankYouIntent", "state": "Fulfilled"}
                },
                "messages": [{"contentType": "PlainText", "content": "bye"}]
            })
        );
    }

    #[test]
    fn elicit_slot_names_the_slot_and_marks_in_progress() {
        let slots = SlotSet::new().with_empty(SlotName::Email);
        let response = DialogDirective::ElicitSlot {
            slot: SlotName::Email,
            slots,
            message: "Please provide a valid email address.".to_string(),
        }
        .into_response("DiningSuggestionsIntent", SessionAttributes::new());
        let encoded = serde_json::to_value(&response).expect("encode");

        assert_eq!(encoded["sessionState"]["dialogAction"]["type"], "ElicitSlot");
        assert_eq!(encoded["sessionState"]["dialogAction"]["slotToElicit"], "Email");
        assert_eq!(encoded["sessionState"]["intent"]["state"], "InProgress");
        assert_eq!(encoded["sessionState"]["intent"]["slots"]["Email"], json!(null));
    }

    #[test]
    fn delegate_carries_slots_without_messages() {
        let slots = SlotSet::new().with_value(SlotName::Cuisine, "mexican");
        let response = DialogDirective::Delegate { slots: Some(slots.clone()) }
            .into_response("DiningSuggestionsIntent", SessionAttributes::new());

        assert_eq!(response.session_state.intent.slots, Some(Some(slots)));
        assert_eq!(response.session_state.intent.state, None);
        assert!(response.messages.is_empty());
        let encoded = serde_json::to_value(&response).expect("encode");
        assert!(encoded.get("messages").is_none());
    }

    #[test]
    fn delegate_writes_null_slots_back_as_null() {
        let response = DialogDirective::Delegate { slots: None }
            .into_response("DiningSuggestionsIntent", SessionAttributes::new());

        assert_eq!(
            serde_json::to_value(&response).expect("encode"),
            json!({
                "sessionState": {
                    "sessionAttributes": {},
                    "dialogAction": {"type": "Delegate"},
                    "intent": {"name": "DiningSuggestionsIntent", "slots": null}
                }
            })
        );
    }
}
