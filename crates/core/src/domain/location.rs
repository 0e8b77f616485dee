use serde::{Deserialize, Serialize};

/// Boroughs the concierge accepts during slot validation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceArea {
    Manhattan,
    Brooklyn,
}

const NEW_YORK_SYNONYMS: [&str; 6] =
    ["manhattan", "new york", "new york, ny", "new york city", "nyc", "ny, ny"];

/// Label used in outgoing suggestion emails for any New York synonym.
pub const NEW_YORK_DISPLAY_LABEL: &str = "manhattan";

/// Label written to queued requests in place of "manhattan".
pub const NEW_YORK_QUEUE_LABEL: &str = "new york";

impl ServiceArea {
    pub const ALL: [ServiceArea; 2] = [Self::Manhattan, Self::Brooklyn];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Manhattan => "manhattan",
            Self::Brooklyn => "brooklyn",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        let normalized = value.trim().to_lowercase();
        Self::ALL.into_iter().find(|area| area.as_str() == normalized)
    }
}

/// Rewrites "manhattan" (any case, no trimming) to the queue label; everything
/// else passes through untouched.
pub fn queue_location(location: &str) -> String {
    if location.to_lowercase() == ServiceArea::Manhattan.as_str() {
        NEW_YORK_QUEUE_LABEL.to_string()
    } else {
        location.to_string()
    }
}

/// Collapses New York synonyms onto a single display label.
pub fn display_location(location: &str) -> String {
    let normalized = location.trim().to_lowercase();
    if NEW_YORK_SYNONYMS.contains(&normalized.as_str()) {
        NEW_YORK_DISPLAY_LABEL.to_string()
    } else {
        location.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::{display_location, queue_location, ServiceArea};

    #[test]
    fn service_area_parse_trims_and_ignores_case() {
        assert_eq!(ServiceArea::parse("  Brooklyn "), Some(ServiceArea::Brooklyn));
        assert_eq!(ServiceArea::parse("MANHATTAN"), Some(ServiceArea::Manhattan));
        assert_eq!(ServiceArea::parse("queens"), None);
    }

    #[test]
    fn queue_location_only_rewrites_manhattan() {
        assert_eq!(queue_location("Manhattan"), "new york");
        assert_eq!(queue_location("brooklyn"), "brooklyn");
        assert_eq!(queue_location(" manhattan"), " manhattan");
    }

    #[test]
    fn display_location_collapses_new_york_synonyms() {
        for synonym in ["new york", "NYC", " New York City ", "ny, ny", "Manhattan"] {
            assert_eq!(display_location(synonym), "manhattan", "synonym {synonym:?}");
        }
        assert_eq!(display_location("Brooklyn"), "Brooklyn");
    }
}
