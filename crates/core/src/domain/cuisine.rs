use serde::{Deserialize, Serialize};

/// Cuisines the concierge has restaurant data for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Cuisine {
    Chinese,
    Italian,
    Mexican,
    Japanese,
    Indian,
    Turkish,
    Spanish,
}

impl Cuisine {
    pub const ALL: [Cuisine; 7] = [
        Self::Chinese,
        Self::Italian,
        Self::Mexican,
        Self::Japanese,
        Self::Indian,
        Self::Turkish,
        Self::Spanish,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Chinese => "chinese",
            Self::Italian => "italian",
            Self::Mexican => "mexican",
            Self::Japanese => "japanese",
            Self::Indian => "indian",
            Self::Turkish => "turkish",
            Self::Spanish => "spanish",
        }
    }

    /// Case-insensitive lookup. Surrounding whitespace is significant.
    pub fn parse(value: &str) -> Option<Self> {
        let lowered = value.to_lowercase();
        Self::ALL.into_iter().find(|cuisine| cuisine.as_str() == lowered)
    }

    pub fn supported_list() -> String {
        Self::ALL.iter().map(Cuisine::as_str).collect::<Vec<_>>().join(", ")
    }
}

/// Upper-cases the first character and lower-cases the rest.
pub fn capitalize(value: &str) -> String {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}
