use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};

use crate::domain::slots::SlotSet;

pub type SessionAttributes = BTreeMap<String, String>;

/// Where in the conversation the NLU service invoked the code hook.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum InvocationSource {
    DialogCodeHook,
    FulfillmentCodeHook,
    #[default]
    #[serde(other)]
    Unknown,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CodeHookEvent {
    pub session_state: SessionState,
    #[serde(default)]
    pub invocation_source: InvocationSource,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_transcript: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionState {
    #[serde(default)]
    pub session_attributes: Option<SessionAttributes>,
    pub intent: IntentSnapshot,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct IntentSnapshot {
    pub name: String,
    #[serde(default)]
    pub slots: Option<SlotSet>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
}

impl CodeHookEvent {
    pub fn intent_name(&self) -> &str {
        &self.session_state.intent.name
    }

    pub fn session_attributes(&self) -> SessionAttributes {
        self.session_state.session_attributes.clone().unwrap_or_default()
    }

    /// Slots for validation; a null or absent slot map reads as empty.
    pub fn slots(&self) -> SlotSet {
        self.session_state.intent.slots.clone().unwrap_or_default()
    }

    /// Slots exactly as received, `None` when the service sent null.
    pub fn received_slots(&self) -> Option<SlotSet> {
        self.session_state.intent.slots.clone()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DialogActionType {
    Close,
    ElicitSlot,
    Delegate,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum IntentState {
    Fulfilled,
    Failed,
    InProgress,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DialogAction {
    #[serde(rename = "type")]
    pub kind: DialogActionType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slot_to_elicit: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ResponseIntent {
    pub name: String,
    /// Outer `None` omits the key; `Some(None)` writes an explicit null.
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "present")]
    pub slots: Option<Option<SlotSet>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<IntentState>,
}

fn present<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseSessionState {
    pub session_attributes: SessionAttributes,
    pub dialog_action: DialogAction,
    pub intent: ResponseIntent,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseMessage {
    pub content_type: String,
    pub content: String,
}

impl ResponseMessage {
    pub fn plain_text(content: impl Into<String>) -> Self {
        Self { content_type: "PlainText".to_string(), content: content.into() }
    }
}

/// Code-hook reply in the shape the NLU service consumes.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DialogResponse {
    pub session_state: ResponseSessionState,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub messages: Vec<ResponseMessage>,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{CodeHookEvent, DialogResponse, InvocationSource};
    use crate::domain::slots::SlotName;

    #[test]
    fn decodes_dialog_hook_event() {
        let event: CodeHookEvent = serde_json::from_value(json!({
            "sessionId": "10-0-0-1",
            "inputTranscript": "italian please",
            "invocationSource": "DialogCodeHook",
            "sessionState": {
                "sessionAttributes": {"returning": "true"},
                "intent": {
                    "name": "DiningSuggestionsIntent",
                    "state": "InProgress",
                    "slots": {
                        "Cuisine": {"value": {"originalValue": "italian", "interpretedValue": "italian"}},
                        "Email": null
                    }
                }
            }
        }))
        .expect("event decodes");

        assert_eq!(event.invocation_source, InvocationSource::DialogCodeHook);
        assert_eq!(event.intent_name(), "DiningSuggestionsIntent");
        assert_eq!(event.session_attributes()["returning"], "true");
        assert_eq!(event.slots().interpreted(SlotName::Cuisine), Some("italian"));
    }

    #[test]
    fn unknown_invocation_source_and_missing_fields_default() {
        let event: CodeHookEvent = serde_json::from_value(json!({
            "invocationSource": "SomethingNew",
            "sessionState": {"intent": {"name": "GreetingIntent"}}
        }))
        .expect("event decodes");

        assert_eq!(event.invocation_source, InvocationSource::Unknown);
        assert!(event.session_attributes().is_empty());
        assert!(event.slots().is_empty());
    }

    #[test]
    fn null_slots_read_as_empty_but_are_kept_as_received() {
        let event: CodeHookEvent = serde_json::from_value(json!({
            "invocationSource": "DialogCodeHook",
            "sessionState": {"intent": {"name": "DiningSuggestionsIntent", "slots": null}}
        }))
        .expect("event decodes");

        assert!(event.slots().is_empty());
        assert_eq!(event.received_slots(), None);
    }

    #[test]
    fn response_distinguishes_null_slots_from_absent_slots() {
        let with_null: DialogResponse = serde_json::from_value(json!({
            "sessionState": {
                "sessionAttributes": {},
                "dialogAction": {"type": "Delegate"},
                "intent": {"name": "DiningSuggestionsIntent", "slots": null}
            }
        }))
        .expect("response decodes");
        let without: DialogResponse = serde_json::from_value(json!({
            "sessionState": {
                "sessionAttributes": {},
                "dialogAction": {"type": "Close"},
                "intent": {"name": "GreetingIntent", "state": "Fulfilled"}
            }
        }))
        .expect("response decodes");

        assert_eq!(with_null.session_state.intent.slots, Some(None));
        assert_eq!(without.session_state.intent.slots, None);
    }
}
