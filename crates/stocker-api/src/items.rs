// Item endpoints

use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::client::{ApiClient, ApiRequest, method_path};
use crate::envelope;
use crate::error::Error;
use crate::models::{Item, ItemDetail, ItemGroup, normalize_items};

const LIST_ITEMS: &str = "stocker.stocker.api.list_items";
const GET_ITEMS: &str = "stocker.stocker.api.get_items";

// Item detail lives under `data` only; `message` carries status text.
#[derive(Debug, Deserialize)]
struct DetailResponse {
    #[serde(default)]
    data: Option<Value>,
}

impl ApiClient {
    /// Raw item groups, optionally scoped to a warehouse.
    pub async fn list_item_groups(&self, warehouse: Option<&str>) -> Result<Vec<ItemGroup>, Error> {
        let req = ApiRequest::get(method_path(LIST_ITEMS)).query_opt("warehouse", warehouse);
        let payload = self.execute_payload::<Value>(req).await?;

        Ok(match payload.into_option() {
            Some(Value::Array(groups)) => groups
                .into_iter()
                .filter_map(|g| serde_json::from_value(g).ok())
                .collect(),
            _ => Vec::new(),
        })
    }

    /// Items flattened across groups.
    ///
    /// `barcode` only selects the display UOM; it does not filter.
    pub async fn list_items(
        &self,
        warehouse: Option<&str>,
        barcode: Option<&str>,
    ) -> Result<Vec<Item>, Error> {
        let groups = self.list_item_groups(warehouse).await?;
        let items = normalize_items(groups, barcode);
        debug!(count = items.len(), "listed items");
        Ok(items)
    }

    /// Look up a single item by barcode. `None` when the server has no match.
    pub async fn get_item_by_barcode(
        &self,
        barcode: &str,
        warehouse: Option<&str>,
    ) -> Result<Option<ItemDetail>, Error> {
        let req = ApiRequest::get(method_path(GET_ITEMS))
            .query_opt("barcode", Some(barcode))
            .query_opt("warehouse", warehouse);

        let body = self.execute(req).await?;
        let resp: DetailResponse = envelope::decode(&body)?;
        match resp.data {
            Some(data @ Value::Object(_)) => envelope::from_value(data, &body).map(Some),
            _ => Ok(None),
        }
    }
}
