use std::collections::BTreeMap;

use async_trait::async_trait;
use dinebot_core::config::StoreSettings;
use dinebot_core::{BusinessId, RestaurantRecord};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::connection::post_target;
use crate::ServiceError;

const KEY_ATTRIBUTE: &str = "businessId";

#[async_trait]
pub trait RestaurantStore: Send + Sync {
    async fn find_by_id(&self, id: &BusinessId)
        -> Result<Option<RestaurantRecord>, ServiceError>;
}

pub struct HttpRestaurantStore {
    client: Client,
    endpoint: String,
    table: String,
}

impl HttpRestaurantStore {
    pub fn new(client: Client, settings: &StoreSettings) -> Self {
        Self { client, endpoint: settings.endpoint.clone(), table: settings.table.clone() }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct GetItemInput<'a> {
    table_name: &'a str,
    key: BTreeMap<&'static str, BTreeMap<&'static str, &'a str>>,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct GetItemOutput {
    #[serde(default)]
    item: Option<BTreeMap<String, Value>>,
}

#[async_trait]
impl RestaurantStore for HttpRestaurantStore {
    async fn find_by_id(
        &self,
        id: &BusinessId,
    ) -> Result<Option<RestaurantRecord>, ServiceError> {
        let input = GetItemInput {
            table_name: &self.table,
            key: BTreeMap::from([(KEY_ATTRIBUTE, BTreeMap::from([("S", id.as_str())]))]),
        };

        let output: GetItemOutput =
            post_target(&self.client, &self.endpoint, "DynamoDB_20120810.GetItem", &input).await?;
        Ok(output.item.map(|item| record_from_item(id, &item)))
    }
}

/// Maps a typed attribute map (`{"S": ..}` / `{"N": ..}`) onto a record.
/// Attributes of an unexpected type are treated as absent.
fn record_from_item(id: &BusinessId, item: &BTreeMap<String, Value>) -> RestaurantRecord {
    RestaurantRecord {
        business_id: string_attribute(item, KEY_ATTRIBUTE)
            .map(BusinessId)
            .unwrap_or_else(|| id.clone()),
        name: string_attribute(item, "name"),
        address: string_attribute(item, "address"),
        rating: number_attribute(item, "rating").and_then(|raw| raw.parse::<f64>().ok()),
        review_count: number_attribute(item, "reviewCount").and_then(|raw| raw.parse::<u64>().ok()),
    }
}

fn string_attribute(item: &BTreeMap<String, Value>, name: &str) -> Option<String> {
    item.get(name)?.get("S")?.as_str().map(str::to_string)
}

fn number_attribute(item: &BTreeMap<String, Value>, name: &str) -> Option<String> {
    let attribute = item.get(name)?;
    attribute.get("N").or_else(|| attribute.get("S"))?.as_str().map(str::to_string)
}
