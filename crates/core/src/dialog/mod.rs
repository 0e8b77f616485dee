//! Dialog code-hook contract: the event the NLU service sends, the directive
//! the handler decides on, and the slot validators behind that decision.

pub mod directive;
pub mod event;
pub mod validation;

pub use directive::{DialogDirective, FulfillmentState};
pub use event::{CodeHookEvent, DialogResponse, InvocationSource};
pub use validation::{validate_dining_suggestion, SlotViolation};
