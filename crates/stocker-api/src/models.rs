// Domain types for the inventory API
//
// Wire structs are lenient (every field defaulted, quantities accept
// numbers or numeric strings) because the server omits and retypes fields
// freely. Normalized types are what callers actually work with.

use chrono::{Local, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Error;

/// Timestamp format the server expects for `date` / `date_time` fields.
pub const DATE_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Format a timestamp the way the server expects it.
pub fn format_date_time(at: &NaiveDateTime) -> String {
    at.format(DATE_TIME_FORMAT).to_string()
}

/// Calendar day of a server `date` value (`YYYY-MM-DD[ HH:MM:SS]`).
pub fn parse_day(raw: &str) -> Option<NaiveDate> {
    let day = raw.trim().get(..10)?;
    NaiveDate::parse_from_str(day, "%Y-%m-%d").ok()
}

// ── Warehouses ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Warehouse {
    #[serde(default, deserialize_with = "crate::de::string_or_empty")]
    pub warehouse_id: String,
    #[serde(default, deserialize_with = "crate::de::string_or_empty")]
    pub warehouse_name: String,
}

impl Warehouse {
    /// Display label: the name, or the id when the name is empty.
    pub fn label(&self) -> &str {
        if self.warehouse_name.is_empty() {
            &self.warehouse_id
        } else {
            &self.warehouse_name
        }
    }
}

// ── Items ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BarcodeEntry {
    #[serde(default, deserialize_with = "crate::de::string_opt")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "crate::de::string_opt")]
    pub barcode: Option<String>,
    #[serde(default, deserialize_with = "crate::de::string_opt")]
    pub uom: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UomEntry {
    #[serde(default, deserialize_with = "crate::de::string_opt")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "crate::de::string_opt")]
    pub uom: Option<String>,
    #[serde(default, deserialize_with = "crate::de::f64_opt")]
    pub conversion_factor: Option<f64>,
    #[serde(default, deserialize_with = "crate::de::f64_opt")]
    pub price: Option<f64>,
    #[serde(default, deserialize_with = "crate::de::string_opt")]
    pub barcode: Option<String>,
}

/// An item as the list endpoint returns it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ItemRaw {
    #[serde(default, deserialize_with = "crate::de::string_opt")]
    pub item_id: Option<String>,
    #[serde(default, deserialize_with = "crate::de::string_opt")]
    pub item_code: Option<String>,
    #[serde(default, deserialize_with = "crate::de::string_opt")]
    pub item_name: Option<String>,
    #[serde(default, deserialize_with = "crate::de::string_opt")]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "crate::de::string_opt")]
    pub item_group: Option<String>,
    #[serde(default, deserialize_with = "crate::de::vec_lenient")]
    pub barcodes: Vec<BarcodeEntry>,
    #[serde(default, deserialize_with = "crate::de::vec_lenient")]
    pub uom: Vec<UomEntry>,
    #[serde(default, deserialize_with = "crate::de::f64_opt")]
    pub qty: Option<f64>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

impl ItemRaw {
    /// UOM whose barcode matches `barcode`, else the first UOM listed.
    pub fn display_uom(&self, barcode: Option<&str>) -> Option<String> {
        let preferred = barcode.map(str::trim).filter(|b| !b.is_empty());
        preferred
            .and_then(|want| {
                self.uom
                    .iter()
                    .find(|u| u.barcode.as_deref().map(str::trim) == Some(want))
                    .and_then(|u| u.uom.clone())
            })
            .or_else(|| self.uom.first().and_then(|u| u.uom.clone()))
    }
}

/// One `{item_group, items}` bucket of the item list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ItemGroup {
    #[serde(default, deserialize_with = "crate::de::string_opt")]
    pub item_group: Option<String>,
    #[serde(default, deserialize_with = "crate::de::vec_lenient")]
    pub items: Vec<ItemRaw>,
}

/// Flattened list entry.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Item {
    pub item_code: Option<String>,
    pub item_name: Option<String>,
    pub description: Option<String>,
    pub uom: Option<String>,
    pub qty: f64,
    #[serde(skip)]
    pub raw: ItemRaw,
}

impl Item {
    pub fn from_raw(raw: ItemRaw, barcode: Option<&str>) -> Self {
        Self {
            item_code: raw.item_code.clone(),
            item_name: raw.item_name.clone(),
            description: raw.description.clone(),
            uom: raw.display_uom(barcode),
            qty: raw.qty.unwrap_or(0.0),
            raw,
        }
    }
}

/// Flatten item groups into list entries, choosing the display UOM by
/// `barcode` when given.
pub fn normalize_items(groups: Vec<ItemGroup>, barcode: Option<&str>) -> Vec<Item> {
    groups
        .into_iter()
        .flat_map(|g| g.items)
        .map(|raw| Item::from_raw(raw, barcode))
        .collect()
}

/// Stock figures for one item scanned in one warehouse.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ItemDetail {
    #[serde(default, deserialize_with = "crate::de::string_opt")]
    pub item_id: Option<String>,
    #[serde(default, deserialize_with = "crate::de::string_opt")]
    pub item_name: Option<String>,
    #[serde(default, deserialize_with = "crate::de::string_opt")]
    pub uom: Option<String>,
    #[serde(default, deserialize_with = "crate::de::f64_opt")]
    pub total_qty: Option<f64>,
    #[serde(default, deserialize_with = "crate::de::f64_opt")]
    pub shelf_qty: Option<f64>,
}

// ── Stock entries ────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StockEntry {
    #[serde(default, deserialize_with = "crate::de::string_or_empty")]
    pub entry_id: String,
    #[serde(default, deserialize_with = "crate::de::string_or_empty")]
    pub warehouse: String,
    #[serde(default, deserialize_with = "crate::de::string_or_empty")]
    pub item_code: String,
    #[serde(default, deserialize_with = "crate::de::string_or_empty")]
    pub barcode: String,
    #[serde(default, deserialize_with = "crate::de::string_or_empty")]
    pub shelf: String,
    #[serde(default, deserialize_with = "crate::de::string_or_empty")]
    pub uom: String,
    #[serde(default, deserialize_with = "crate::de::f64_opt")]
    pub qty: Option<f64>,
    #[serde(default, deserialize_with = "crate::de::string_or_empty")]
    pub date: String,
}

impl StockEntry {
    pub fn day(&self) -> Option<NaiveDate> {
        parse_day(&self.date)
    }
}

/// Client-side filter for the stock entry list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StockEntryFilter {
    pub warehouse: Option<String>,
    /// Keep only entries dated on this calendar day.
    pub on_day: Option<NaiveDate>,
}

impl StockEntryFilter {
    pub fn warehouse(warehouse: impl Into<String>) -> Self {
        Self {
            warehouse: Some(warehouse.into()),
            on_day: None,
        }
    }

    /// Restrict to entries made today (local time).
    #[must_use]
    pub fn today(self) -> Self {
        self.on(Local::now().date_naive())
    }

    #[must_use]
    pub fn on(mut self, day: NaiveDate) -> Self {
        self.on_day = Some(day);
        self
    }

    pub fn matches(&self, entry: &StockEntry) -> bool {
        self.on_day.is_none_or(|day| entry.day() == Some(day))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewStockEntry {
    pub item_id: String,
    pub uom: String,
    pub qty: f64,
    pub warehouse: String,
    pub barcode: String,
    pub shelf: String,
    /// Left unset, the server stamps the entry itself.
    pub date_time: Option<NaiveDateTime>,
}

impl NewStockEntry {
    pub(crate) fn to_form(&self) -> Vec<(&'static str, String)> {
        let mut form = vec![
            ("item_id", self.item_id.clone()),
            ("uom", self.uom.clone()),
            ("qty", self.qty.to_string()),
            ("warehouse", self.warehouse.clone()),
            ("barcode", self.barcode.clone()),
            ("shelf", self.shelf.clone()),
        ];
        if let Some(at) = &self.date_time {
            form.push(("date_time", format_date_time(at)));
        }
        form
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StockEntryUpdate {
    pub entry_id: String,
    pub warehouse: String,
    pub barcode: String,
    pub shelf: String,
    pub date: NaiveDateTime,
    pub item_code: String,
    pub uom: String,
    pub qty: f64,
}

impl StockEntryUpdate {
    pub(crate) fn to_form(&self) -> Vec<(&'static str, String)> {
        vec![
            ("entry_id", self.entry_id.clone()),
            ("warehouse", self.warehouse.clone()),
            ("barcode", self.barcode.clone()),
            ("shelf", self.shelf.clone()),
            ("date", format_date_time(&self.date)),
            ("item_code", self.item_code.clone()),
            ("uom", self.uom.clone()),
            ("qty", self.qty.to_string()),
        ]
    }
}

/// Result of a create/update/delete call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MutationOutcome {
    #[serde(default, deserialize_with = "crate::de::string_opt")]
    pub status: Option<String>,
    #[serde(default, deserialize_with = "crate::de::string_opt")]
    pub message: Option<String>,
    #[serde(default, alias = "id", deserialize_with = "crate::de::string_opt")]
    pub entry_id: Option<String>,
    #[serde(default, deserialize_with = "crate::de::string_opt")]
    pub item_code: Option<String>,
    #[serde(default, deserialize_with = "crate::de::string_opt")]
    pub warehouse: Option<String>,
    #[serde(default, deserialize_with = "crate::de::string_opt")]
    pub shelf: Option<String>,
    #[serde(default, deserialize_with = "crate::de::string_opt")]
    pub barcode: Option<String>,
    #[serde(default, deserialize_with = "crate::de::string_opt")]
    pub uom: Option<String>,
    #[serde(default, deserialize_with = "crate::de::f64_opt")]
    pub qty: Option<f64>,
    #[serde(default, deserialize_with = "crate::de::string_opt")]
    pub date: Option<String>,
}

impl MutationOutcome {
    pub fn is_success(&self) -> bool {
        self.status
            .as_deref()
            .is_some_and(|s| s.eq_ignore_ascii_case("success"))
    }

    /// `Ok(self)` on success, otherwise the server's message as an error.
    pub fn into_result(self) -> Result<Self, Error> {
        if self.is_success() {
            return Ok(self);
        }
        let message = self
            .message
            .filter(|m| !m.is_empty())
            .or(self.status)
            .unwrap_or_else(|| "request was not accepted".into());
        Err(Error::Application { message })
    }

    /// Read an outcome from a mutation response body.
    ///
    /// The fields live under `data` when present, else under an object
    /// `message`, else at the top level. A plain-string top-level
    /// `message` fills in `message` when the outcome has none.
    pub(crate) fn from_body(body: &str) -> Result<Self, Error> {
        let value: Value = crate::envelope::decode(body)?;
        let top_message = value
            .get("message")
            .and_then(Value::as_str)
            .map(str::to_owned);

        let nested = [value.get("data"), value.get("message")]
            .into_iter()
            .flatten()
            .find(|v| v.is_object())
            .cloned();
        let source = nested.unwrap_or(value);

        let mut outcome: Self = serde_json::from_value(source).map_err(|e| {
            Error::Deserialization {
                message: e.to_string(),
                body: body.to_owned(),
            }
        })?;
        if outcome.message.is_none() {
            outcome.message = top_message;
        }
        Ok(outcome)
    }
}
