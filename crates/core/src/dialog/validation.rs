use std::sync::OnceLock;

use regex::Regex;

use crate::domain::cuisine::Cuisine;
use crate::domain::location::ServiceArea;
use crate::domain::slots::{SlotName, SlotSet};

const EMAIL_PATTERN: &str = r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$";

const MIN_PARTY_SIZE: i64 = 1;
const MAX_PARTY_SIZE: i64 = 20;

/// First slot that failed validation, with the prompt used to re-elicit it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SlotViolation {
    pub slot: SlotName,
    pub message: String,
}

pub fn is_valid_location(location: Option<&str>) -> bool {
    location.map_or(true, |value| ServiceArea::parse(value).is_some())
}

pub fn is_valid_cuisine(cuisine: Option<&str>) -> bool {
    cuisine.map_or(true, |value| Cuisine::parse(value).is_some())
}

pub fn is_valid_number_of_people(number: Option<&str>) -> bool {
    number.map_or(true, |value| {
        value
            .trim()
            .parse::<i64>()
            .map(|count| (MIN_PARTY_SIZE..=MAX_PARTY_SIZE).contains(&count))
            .unwrap_or(false)
    })
}

/// Only `H:M` shaped input is checked. Anything without a colon is accepted
/// verbatim, e.g. "7 pm" or "abc".
pub fn is_valid_dining_time(dining_time: Option<&str>) -> bool {
    let Some(value) = dining_time else {
        return true;
    };
    if !value.contains(':') {
        return true;
    }

    let mut parts = value.split(':');
    let hour = parts.next().and_then(|part| part.trim().parse::<i64>().ok());
    let minute = parts.next().and_then(|part| part.trim().parse::<i64>().ok());

    match (hour, minute) {
        (Some(hour), Some(minute)) => (0..=23).contains(&hour) && (0..=59).contains(&minute),
        _ => false,
    }
}

pub fn is_valid_email(email: Option<&str>) -> bool {
    email.map_or(true, |value| email_pattern().is_some_and(|pattern| pattern.is_match(value)))
}

fn email_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(EMAIL_PATTERN).ok()).as_ref()
}

/// Checks slots in elicitation order and reports the first violation.
pub fn validate_dining_suggestion(slots: &SlotSet) -> Result<(), SlotViolation> {
    let location = slots.interpreted(SlotName::Location);
    if !is_valid_location(location) {
        return Err(SlotViolation {
            slot: SlotName::Location,
            message: format!(
                "Sorry, I don't have suggestions for {}. Try another city?",
                location.unwrap_or_default()
            ),
        });
    }

    let cuisine = slots.interpreted(SlotName::Cuisine);
    if !is_valid_cuisine(cuisine) {
        return Err(SlotViolation {
            slot: SlotName::Cuisine,
            message: format!(
                "{} isn't a supported cuisine. Choose from: {}.",
                cuisine.unwrap_or_default(),
                Cuisine::supported_list()
            ),
        });
    }

    if !is_valid_number_of_people(slots.interpreted(SlotName::NumberOfPeople)) {
        return Err(SlotViolation {
            slot: SlotName::NumberOfPeople,
            message: "Please enter a valid number of people (1-20).".to_string(),
        });
    }

    if !is_valid_dining_time(slots.interpreted(SlotName::DiningTime)) {
        return Err(SlotViolation {
            slot: SlotName::DiningTime,
            message: "Please provide a valid time (e.g., 7 pm).".to_string(),
        });
    }

    if !is_valid_email(slots.interpreted(SlotName::Email)) {
        return Err(SlotViolation {
            slot: SlotName::Email,
            message: "Please provide a valid email address.".to_string(),
        });
    }

    Ok(())
}
