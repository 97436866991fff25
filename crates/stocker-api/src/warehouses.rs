// Warehouse endpoints
//
// Implemented as inherent methods on `ApiClient` to keep the client
// surface in one place while splitting the code by resource.

use tracing::debug;

use crate::client::{ApiClient, ApiRequest, method_path};
use crate::error::Error;
use crate::models::Warehouse;

const WAREHOUSE_LIST: &str = "stocker.stocker.api.warehouse_list";

impl ApiClient {
    /// List the warehouses visible to the current user.
    ///
    /// Entries with neither an id nor a name are dropped.
    pub async fn list_warehouses(&self) -> Result<Vec<Warehouse>, Error> {
        let payload = self
            .execute_payload::<serde_json::Value>(ApiRequest::get(method_path(WAREHOUSE_LIST)))
            .await?;

        let list: Vec<Warehouse> = match payload.into_option() {
            Some(serde_json::Value::Array(items)) => items
                .into_iter()
                .filter_map(|w| serde_json::from_value(w).ok())
                .collect(),
            _ => Vec::new(),
        };

        let warehouses: Vec<Warehouse> = list
            .into_iter()
            .filter(|w| !w.warehouse_id.is_empty() || !w.warehouse_name.is_empty())
            .collect();
        debug!(count = warehouses.len(), "listed warehouses");
        Ok(warehouses)
    }
}
