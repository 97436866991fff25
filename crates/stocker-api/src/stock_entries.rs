// Stock entry endpoints

use serde_json::{Value, json};
use tracing::{debug, info};

use crate::client::{ApiClient, ApiRequest, method_path};
use crate::error::Error;
use crate::models::{MutationOutcome, NewStockEntry, StockEntry, StockEntryFilter, StockEntryUpdate};

const LIST_STOCK_ENTRIES: &str = "stocker.stocker.api.list_stock_entries";
const CREATE_STOCK_ENTRY: &str = "stocker.stocker.api.create_stock_entry";
const UPDATE_STOCK_ENTRY: &str = "stocker.stocker.api.update_stock_entry";
const DELETE_STOCK_ENTRY: &str = "stocker.stocker.api.delete_stock_entry";

impl ApiClient {
    /// List stock entries, scoped by warehouse on the server and by day
    /// on the client.
    pub async fn list_stock_entries(
        &self,
        filter: &StockEntryFilter,
    ) -> Result<Vec<StockEntry>, Error> {
        let req = ApiRequest::get(method_path(LIST_STOCK_ENTRIES))
            .query_opt("warehouse", filter.warehouse.as_deref());
        let body: Value = self.execute_json(req).await?;

        let entries: Vec<StockEntry> = match body.get("data") {
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(|e| serde_json::from_value::<StockEntry>(e.clone()).ok())
                .filter(|e| filter.matches(e))
                .collect(),
            _ => Vec::new(),
        };
        debug!(count = entries.len(), "listed stock entries");
        Ok(entries)
    }

    /// Record a counted quantity for an item on a shelf.
    pub async fn create_stock_entry(&self, entry: &NewStockEntry) -> Result<MutationOutcome, Error> {
        let req = ApiRequest::post(method_path(CREATE_STOCK_ENTRY)).form(entry.to_form());
        let body = self.execute(req).await?;
        let outcome = MutationOutcome::from_body(&body)?;
        info!(
            status = outcome.status.as_deref().unwrap_or("-"),
            entry_id = outcome.entry_id.as_deref().unwrap_or("-"),
            "created stock entry"
        );
        Ok(outcome)
    }

    pub async fn update_stock_entry(
        &self,
        update: &StockEntryUpdate,
    ) -> Result<MutationOutcome, Error> {
        let req = ApiRequest::put(method_path(UPDATE_STOCK_ENTRY)).form(update.to_form());
        let body = self.execute(req).await?;
        let outcome = MutationOutcome::from_body(&body)?;
        info!(
            status = outcome.status.as_deref().unwrap_or("-"),
            entry_id = %update.entry_id,
            "updated stock entry"
        );
        Ok(outcome)
    }

    /// Delete an entry by id. A blank id is rejected without a request.
    pub async fn delete_stock_entry(&self, entry_id: &str) -> Result<MutationOutcome, Error> {
        let entry_id = entry_id.trim();
        if entry_id.is_empty() {
            return Err(Error::InvalidInput(
                "delete_stock_entry requires an entry id".into(),
            ));
        }

        let req = ApiRequest::delete(method_path(DELETE_STOCK_ENTRY))
            .json(json!({ "entry_id": entry_id }));
        let body = self.execute(req).await?;
        if body.trim().is_empty() {
            return Ok(MutationOutcome {
                status: Some("error".into()),
                message: Some("no response data from server".into()),
                ..MutationOutcome::default()
            });
        }
        let outcome = MutationOutcome::from_body(&body)?;
        info!(
            status = outcome.status.as_deref().unwrap_or("-"),
            entry_id,
            "deleted stock entry"
        );
        Ok(outcome)
    }
}

