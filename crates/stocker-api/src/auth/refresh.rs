// Single-flight token refresh.
//
// Idle -> Refreshing -> Idle. The first caller parks a shared future in the
// slot and every concurrent caller awaits a clone of it, so any number of
// simultaneous 401s produce exactly one token request. The future clears
// the slot itself when it finishes, which returns the refresher to Idle.

use std::sync::{Arc, Weak};

use chrono::Utc;
use futures_util::FutureExt;
use futures_util::future::{BoxFuture, Shared};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::generator::TokenGenerator;
use super::store::{AccessToken, TokenStore};
use crate::error::Error;

/// Result shared by every waiter of one refresh episode.
pub type RefreshOutcome = Result<Arc<AccessToken>, Arc<Error>>;

type InFlight = Shared<BoxFuture<'static, RefreshOutcome>>;
type Slot = Mutex<Option<InFlight>>;

/// Coalesces concurrent token refreshes into one request.
///
/// Cheaply cloneable; clones share the same in-flight slot.
#[derive(Clone)]
pub struct TokenRefresher {
    generator: Arc<TokenGenerator>,
    store: Arc<TokenStore>,
    slot: Arc<Slot>,
    token_path: Arc<str>,
}

impl TokenRefresher {
    pub fn new(generator: TokenGenerator, store: Arc<TokenStore>) -> Self {
        let token_path: Arc<str> = generator.endpoint_path().into();
        Self {
            generator: Arc::new(generator),
            store,
            slot: Arc::new(Mutex::new(None)),
            token_path,
        }
    }

    /// Request path of the token endpoint (never refreshed on 401).
    pub fn token_path(&self) -> &str {
        &self.token_path
    }

    pub fn generator(&self) -> &TokenGenerator {
        &self.generator
    }

    pub fn store(&self) -> &Arc<TokenStore> {
        &self.store
    }

    /// Whether a refresh is currently in flight.
    pub async fn is_refreshing(&self) -> bool {
        self.slot.lock().await.is_some()
    }

    /// Obtain a fresh token, joining an in-flight refresh if there is one.
    ///
    /// On success the token store already holds the returned token. On
    /// failure the store has been cleared; every waiter of the same episode
    /// receives the same error.
    pub async fn refresh(&self) -> RefreshOutcome {
        let flight = {
            let mut slot = self.slot.lock().await;
            if let Some(existing) = slot.as_ref() {
                debug!("joining in-flight token refresh");
                existing.clone()
            } else {
                let flight = self.start();
                *slot = Some(flight.clone());
                flight
            }
        };
        flight.await
    }

    /// Return the stored token if it is still valid, otherwise refresh.
    pub async fn ensure_token(&self) -> RefreshOutcome {
        if let Some(token) = self.store.get() {
            if !token.is_expired(Utc::now()) {
                return Ok(token);
            }
            debug!("stored token expired");
        }
        self.refresh().await
    }

    fn start(&self) -> InFlight {
        debug!("starting token refresh");
        let generator = Arc::clone(&self.generator);
        let store = Arc::clone(&self.store);
        let slot: Weak<Slot> = Arc::downgrade(&self.slot);

        async move {
            let outcome = match generator.generate().await {
                Ok(Some(token)) => {
                    let token = Arc::new(token);
                    store.set_shared(Arc::clone(&token));
                    info!("refreshed access token");
                    Ok(token)
                }
                Ok(None) => {
                    store.clear();
                    warn!("token refresh produced no token");
                    Err(Arc::new(Error::TokenUnavailable))
                }
                Err(e) => {
                    store.clear();
                    warn!(error = %e, "token refresh failed");
                    Err(Arc::new(e))
                }
            };
            if let Some(slot) = slot.upgrade() {
                *slot.lock().await = None;
            }
            outcome
        }
        .boxed()
        .shared()
    }
}

impl std::fmt::Debug for TokenRefresher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenRefresher")
            .field("token_path", &self.token_path)
            .finish_non_exhaustive()
    }
}
