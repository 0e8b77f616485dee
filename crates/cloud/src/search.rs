use async_trait::async_trait;
use dinebot_core::config::SearchSettings;
use dinebot_core::{BusinessId, SearchDocument};
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::connection::{endpoint_url, post_json};
use crate::ServiceError;

/// Upper bound on hits requested per query.
pub const SEARCH_PAGE_SIZE: usize = 50;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CuisineQuery {
    /// Exact match on the keyword sub-field.
    Exact(String),
    /// Analysed full-text match on the cuisine field.
    Fuzzy(String),
}

impl CuisineQuery {
    pub fn to_body(&self) -> Value {
        match self {
            Self::Exact(cuisine) => json!({
                "size": SEARCH_PAGE_SIZE,
                "query": {"term": {"Cuisine.keyword": cuisine}}
            }),
            Self::Fuzzy(cuisine) => json!({
                "size": SEARCH_PAGE_SIZE,
                "query": {"match": {"Cuisine": cuisine}}
            }),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SearchHit {
    pub restaurant_id: Option<BusinessId>,
    pub cuisine: Option<String>,
}

impl SearchHit {
    pub fn new(restaurant_id: impl Into<String>, cuisine: impl Into<String>) -> Self {
        Self { restaurant_id: Some(BusinessId(restaurant_id.into())), cuisine: Some(cuisine.into()) }
    }
}

#[async_trait]
pub trait SearchIndex: Send + Sync {
    async fn search(&self, query: &CuisineQuery) -> Result<Vec<SearchHit>, ServiceError>;
}

pub struct HttpSearchIndex {
    client: Client,
    endpoint: String,
    index: String,
}

impl HttpSearchIndex {
    pub fn new(client: Client, settings: &SearchSettings) -> Self {
        Self { client, endpoint: settings.endpoint.clone(), index: settings.index.clone() }
    }
}

#[derive(Deserialize)]
struct SearchResponse {
    #[serde(default)]
    hits: HitsEnvelope,
}

#[derive(Default, Deserialize)]
struct HitsEnvelope {
    #[serde(default)]
    hits: Vec<RawHit>,
}

#[derive(Deserialize)]
struct RawHit {
    #[serde(rename = "_source", default)]
    source: Option<SearchDocument>,
}

impl From<RawHit> for SearchHit {
    fn from(hit: RawHit) -> Self {
        let SearchDocument { restaurant_id, cuisine } = hit.source.unwrap_or_default();
        Self { restaurant_id, cuisine }
    }
}

#[async_trait]
impl SearchIndex for HttpSearchIndex {
    async fn search(&self, query: &CuisineQuery) -> Result<Vec<SearchHit>, ServiceError> {
        let url = endpoint_url(&self.endpoint, &[self.index.as_str(), "_search"])?;
        let response: SearchResponse = post_json(&self.client, url, &query.to_body()).await?;
        Ok(response.hits.hits.into_iter().map(SearchHit::from).collect())
    }
}
