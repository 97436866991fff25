// ── Session ──
//
// Owns everything one logged-in user needs: the token store, the base URL
// cell, the token refresher and the API client, plus the warehouse/shelf
// selection. State changes are published through a watch channel so a
// front end can re-render on every transition.

use std::sync::Arc;

use chrono::{DateTime, Local, Utc};
use tokio::sync::watch;
use tracing::{debug, info, warn};
use url::Url;

use stocker_api::{
    ApiClient, ItemDetail, MutationOutcome, NewStockEntry, StockEntry, StockEntryFilter, Warehouse,
};

use crate::config::SessionConfig;
use crate::error::CoreError;
use crate::login::{LoginProfile, parse_qr_payload};

// ── SessionState ─────────────────────────────────────────────────

/// Snapshot of the session observable by consumers.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionState {
    pub profile: Option<LoginProfile>,
    pub warehouse: Option<Warehouse>,
    pub shelf: Option<String>,
    /// A token refresh started through the session is in flight.
    pub auth_loading: bool,
    /// Message of the last failed token refresh, cleared on success.
    pub auth_error: Option<String>,
    /// Expiry of the current access token, if one is held.
    pub token_expires_at: Option<DateTime<Utc>>,
}

impl SessionState {
    pub fn is_logged_in(&self) -> bool {
        self.profile.is_some()
    }
}

// ── Session ──────────────────────────────────────────────────────

/// The main entry point for consumers.
///
/// Cheaply cloneable via `Arc<SessionInner>`.
#[derive(Clone)]
pub struct Session {
    inner: Arc<SessionInner>,
}

struct SessionInner {
    config: SessionConfig,
    api: ApiClient,
    state: watch::Sender<SessionState>,
}

impl Session {
    /// Create a logged-out session. No network I/O happens here.
    pub fn new(config: SessionConfig) -> Result<Self, CoreError> {
        let api = ApiClient::builder()
            .transport(config.transport())
            .credentials(config.credentials.clone())
            .token_endpoint(config.token_endpoint.clone())
            .token_safety_margin(config.token_safety_margin)
            .build()?;
        let (state, _) = watch::channel(SessionState::default());

        Ok(Self {
            inner: Arc::new(SessionInner { config, api, state }),
        })
    }

    pub fn config(&self) -> &SessionConfig {
        &self.inner.config
    }

    /// API client for domain calls. Shares this session's token store and
    /// base URL.
    pub fn api(&self) -> &ApiClient {
        &self.inner.api
    }

    pub fn snapshot(&self) -> SessionState {
        self.inner.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.inner.state.subscribe()
    }

    fn update(&self, f: impl FnOnce(&mut SessionState)) {
        self.inner.state.send_modify(f);
    }

    // ── Login lifecycle ──────────────────────────────────────────

    /// Log in with a scanned QR payload.
    ///
    /// Points the client at the encoded server and drops any token issued
    /// by a previous server. Does not fetch a token; call
    /// [`start()`](Self::start) for that.
    pub fn login(&self, qr_payload: &str) -> Result<LoginProfile, CoreError> {
        let profile = parse_qr_payload(qr_payload)?;
        info!(
            company = %profile.company,
            user = %profile.user_id,
            server = %profile.base_url,
            "logged in"
        );
        self.restore(profile.clone());
        Ok(profile)
    }

    /// Re-apply a previously decoded login (e.g. loaded from disk).
    pub fn restore(&self, profile: LoginProfile) {
        let api = self.api();
        if api.base_url().get().as_ref() != Some(&profile.base_url) {
            api.tokens().clear();
        }
        api.base_url().set(profile.base_url.clone());
        debug!(server = %profile.base_url, "session restored");
        self.update(|s| {
            s.profile = Some(profile);
            s.token_expires_at = None;
        });
    }

    /// Point requests at a different server without changing the profile.
    pub fn override_base_url(&self, url: Url) {
        debug!(server = %url, "base URL overridden");
        self.api().tokens().clear();
        self.api().base_url().set(url);
    }

    /// Fetch an initial token. Run once after login or restore.
    pub async fn start(&self) -> Result<(), CoreError> {
        if !self.snapshot().is_logged_in() && self.api().base_url().get().is_none() {
            return Err(CoreError::NotLoggedIn);
        }
        self.refresh_token().await
    }

    /// Forget the token, the server and every selection.
    pub fn logout(&self) {
        let api = self.api();
        api.tokens().clear();
        api.base_url().clear();
        self.update(|s| *s = SessionState::default());
        info!("logged out");
    }

    // ── Warehouse context ────────────────────────────────────────

    /// Select (or clear) the working warehouse, then refresh the token so
    /// subsequent calls run with a fresh one.
    pub async fn select_warehouse(&self, warehouse: Option<Warehouse>) -> Result<(), CoreError> {
        match &warehouse {
            Some(w) => info!(warehouse = %w.warehouse_id, "warehouse selected"),
            None => info!("warehouse cleared"),
        }
        self.update(|s| s.warehouse = warehouse);
        self.refresh_token().await
    }

    /// Re-apply a persisted warehouse and shelf without touching the token.
    pub fn restore_selection(&self, warehouse: Option<Warehouse>, shelf: Option<&str>) {
        self.update(|s| s.warehouse = warehouse);
        self.set_shelf(shelf);
    }

    /// Set the shelf being counted; blank clears it.
    pub fn set_shelf(&self, shelf: Option<&str>) {
        let shelf = shelf
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_owned);
        debug!(?shelf, "shelf set");
        self.update(|s| s.shelf = shelf);
    }

    pub fn warehouse(&self) -> Option<Warehouse> {
        self.inner.state.borrow().warehouse.clone()
    }

    pub fn shelf(&self) -> Option<String> {
        self.inner.state.borrow().shelf.clone()
    }

    pub fn require_warehouse(&self) -> Result<Warehouse, CoreError> {
        self.warehouse().ok_or(CoreError::NoWarehouseSelected)
    }

    pub fn require_shelf(&self) -> Result<String, CoreError> {
        self.shelf().ok_or(CoreError::NoShelfSelected)
    }

    // ── Token ────────────────────────────────────────────────────

    /// Obtain a new access token, joining any refresh already in flight.
    ///
    /// Tracks progress in `auth_loading` and the outcome in `auth_error`.
    pub async fn refresh_token(&self) -> Result<(), CoreError> {
        self.update(|s| {
            s.auth_loading = true;
            s.auth_error = None;
        });

        let outcome = self.api().refresher().refresh().await;

        match outcome {
            Ok(token) => {
                let expires_at = token.expires_at();
                self.update(|s| {
                    s.auth_loading = false;
                    s.token_expires_at = Some(expires_at);
                });
                Ok(())
            }
            Err(e) => {
                let err = CoreError::from(e.as_ref());
                warn!(error = %err, "token refresh failed");
                let message = err.to_string();
                self.update(|s| {
                    s.auth_loading = false;
                    s.auth_error = Some(message);
                    s.token_expires_at = None;
                });
                Err(err)
            }
        }
    }

    /// Whether an unexpired token is currently held.
    pub fn has_valid_token(&self) -> bool {
        self.api()
            .tokens()
            .get()
            .is_some_and(|t| !t.is_expired(Utc::now()))
    }

    // ── Counting workflow ────────────────────────────────────────

    /// Look up a scanned barcode in the selected warehouse.
    pub async fn lookup_item(&self, barcode: &str) -> Result<ItemDetail, CoreError> {
        let warehouse = self.require_warehouse()?;
        self.api()
            .get_item_by_barcode(barcode, Some(&warehouse.warehouse_id))
            .await?
            .ok_or_else(|| CoreError::NotFound {
                entity_type: "Item".into(),
                identifier: barcode.trim().to_owned(),
            })
    }

    /// Record a counted quantity for a scanned barcode on the current
    /// warehouse and shelf.
    ///
    /// `qty` must be positive and no larger than the item's total on
    /// hand. `uom` defaults to the item's own unit. The entry is stamped
    /// with the local time.
    pub async fn record_count(
        &self,
        barcode: &str,
        qty: f64,
        uom: Option<&str>,
    ) -> Result<MutationOutcome, CoreError> {
        let warehouse = self.require_warehouse()?;
        let shelf = self.require_shelf()?;
        if !qty.is_finite() || qty <= 0.0 {
            return Err(CoreError::ValidationFailed {
                message: format!("quantity must be greater than zero, got {qty}"),
            });
        }

        let item = self.lookup_item(barcode).await?;
        if let Some(total) = item.total_qty.filter(|&t| qty > t) {
            return Err(CoreError::ValidationFailed {
                message: format!("quantity {qty} exceeds the {total} on hand"),
            });
        }
        let item_id = item.item_id.clone().ok_or_else(|| CoreError::NotFound {
            entity_type: "Item".into(),
            identifier: barcode.trim().to_owned(),
        })?;
        let uom = uom
            .map(str::to_owned)
            .or(item.uom)
            .ok_or_else(|| CoreError::ValidationFailed {
                message: "item has no unit of measure; pass one explicitly".into(),
            })?;

        let entry = NewStockEntry {
            item_id,
            uom,
            qty,
            warehouse: warehouse.warehouse_id,
            barcode: barcode.trim().to_owned(),
            shelf,
            date_time: Some(Local::now().naive_local()),
        };
        Ok(self.api().create_stock_entry(&entry).await?.into_result()?)
    }

    /// Entries recorded today in the selected warehouse.
    pub async fn todays_entries(&self) -> Result<Vec<StockEntry>, CoreError> {
        let warehouse = self.require_warehouse()?;
        let filter = StockEntryFilter::warehouse(warehouse.warehouse_id).today();
        Ok(self.api().list_stock_entries(&filter).await?)
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("state", &*self.inner.state.borrow())
            .finish_non_exhaustive()
    }
}
