pub mod config;
pub mod dialog;
pub mod domain;
pub mod errors;

pub use chrono;

pub use dialog::{
    validate_dining_suggestion, CodeHookEvent, DialogDirective, DialogResponse, FulfillmentState,
    InvocationSource, SlotViolation,
};
pub use domain::cuisine::{capitalize, Cuisine};
pub use domain::location::{display_location, queue_location, ServiceArea};
pub use domain::restaurant::{BusinessId, RestaurantRecord, SearchDocument};
pub use domain::slots::{Slot, SlotName, SlotSet, SlotValue};
pub use domain::suggestion::{PendingSuggestion, SuggestionRequest};
pub use errors::{ApplicationError, DomainError, InterfaceError};
