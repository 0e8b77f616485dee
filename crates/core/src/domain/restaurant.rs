use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BusinessId(pub String);

impl BusinessId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Restaurant details as held by the document store.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RestaurantRecord {
    pub business_id: BusinessId,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub rating: Option<f64>,
    #[serde(default)]
    pub review_count: Option<u64>,
}

impl RestaurantRecord {
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("Unknown")
    }

    pub fn display_address(&self) -> &str {
        self.address.as_deref().unwrap_or("Address not available")
    }

    pub fn display_rating(&self) -> String {
        self.rating.map(|rating| rating.to_string()).unwrap_or_else(|| "N/A".to_string())
    }

    pub fn display_review_count(&self) -> String {
        self.review_count.map(|count| count.to_string()).unwrap_or_else(|| "N/A".to_string())
    }
}

/// Entry in the search index correlating a business with its cuisine tag.
/// Either field may be missing from an indexed document.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchDocument {
    #[serde(rename = "RestaurantID", default, skip_serializing_if = "Option::is_none")]
    pub restaurant_id: Option<BusinessId>,
    #[serde(rename = "Cuisine", default, skip_serializing_if = "Option::is_none")]
    pub cuisine: Option<String>,
}
