// stocker-api: Async Rust client for the stocker inventory API
//
// Layers, bottom-up: transport (reqwest client construction), auth (token
// store, token generator, single-flight refresher), client (request
// pipeline with refresh-on-401), envelope normalization, and the endpoint
// modules that hang inherent methods off `ApiClient`.

pub mod auth;
pub mod client;
pub(crate) mod de;
pub mod envelope;
pub mod error;
pub mod models;
pub mod transport;

mod items;
mod stock_entries;
mod warehouses;

pub use auth::{
    AccessToken, BaseUrl, DEFAULT_SAFETY_MARGIN, DEFAULT_TOKEN_ENDPOINT, RefreshOutcome,
    SessionCredentials, TokenGenerator, TokenRefresher, TokenStore,
};
pub use client::{ApiClient, ApiClientBuilder, method_path};
pub use envelope::{Payload, normalize};
pub use error::Error;
pub use models::{
    BarcodeEntry, DATE_TIME_FORMAT, Item, ItemDetail, ItemGroup, ItemRaw, MutationOutcome,
    NewStockEntry, StockEntry, StockEntryFilter, StockEntryUpdate, UomEntry, Warehouse,
    format_date_time, normalize_items, parse_day,
};
pub use transport::{TlsMode, TransportConfig};
