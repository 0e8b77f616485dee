use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Slots collected by the dining suggestion intent.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SlotName {
    Location,
    Cuisine,
    DiningTime,
    NumberOfPeople,
    Email,
}

impl SlotName {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Location => "Location",
            Self::Cuisine => "Cuisine",
            Self::DiningTime => "DiningTime",
            Self::NumberOfPeople => "NumberOfPeople",
            Self::Email => "Email",
        }
    }
}

impl fmt::Display for SlotName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotValue {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interpreted_value: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A single slot as exchanged with the NLU service. Fields other than the
/// interpreted value are carried through untouched.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Slot {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<SlotValue>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Slot {
    pub fn interpreted(value: impl Into<String>) -> Self {
        let value = value.into();
        let mut extra = Map::new();
        extra.insert("originalValue".to_string(), Value::String(value.clone()));
        Self {
            value: Some(SlotValue { interpreted_value: Some(value), extra }),
            extra: Map::new(),
        }
    }
}

/// Slot name to optional slot. A `None` entry is a slot the service still has
/// to elicit.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SlotSet(BTreeMap<String, Option<Slot>>);

impl SlotSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_value(mut self, name: SlotName, value: impl Into<String>) -> Self {
        self.0.insert(name.as_str().to_string(), Some(Slot::interpreted(value)));
        self
    }

    pub fn with_empty(mut self, name: SlotName) -> Self {
        self.0.insert(name.as_str().to_string(), None);
        self
    }

    pub fn interpreted(&self, name: SlotName) -> Option<&str> {
        self.0
            .get(name.as_str())?
            .as_ref()?
            .value
            .as_ref()?
            .interpreted_value
            .as_deref()
    }

    /// Resets a filled slot so the service asks for it again. Absent slots are
    /// left absent.
    pub fn clear(&mut self, name: SlotName) {
        if let Some(entry) = self.0.get_mut(name.as_str()) {
            *entry = None;
        }
    }

    pub fn contains(&self, name: SlotName) -> bool {
        self.0.contains_key(name.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
