// Token and base-URL holders.
//
// Both are read on every request and written rarely (refresh, login), so
// they are lock-free swaps rather than mutex-guarded cells.

use std::fmt;
use std::sync::Arc;

use arc_swap::ArcSwapOption;
use chrono::{DateTime, TimeDelta, Utc};
use secrecy::{ExposeSecret, SecretString};
use url::Url;

use crate::error::Error;

// ── AccessToken ──────────────────────────────────────────────────────

/// A bearer token plus its absolute expiry.
#[derive(Clone)]
pub struct AccessToken {
    value: SecretString,
    expires_at: DateTime<Utc>,
}

impl AccessToken {
    pub fn new(value: impl Into<String>, expires_at: DateTime<Utc>) -> Self {
        Self {
            value: SecretString::from(value.into()),
            expires_at,
        }
    }

    /// The raw token, for the `Authorization` header.
    pub fn expose(&self) -> &str {
        self.value.expose_secret()
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    /// Time left before expiry, clamped at zero.
    pub fn remaining(&self, now: DateTime<Utc>) -> TimeDelta {
        (self.expires_at - now).max(TimeDelta::zero())
    }

    /// Log-safe preview: first six and last four characters.
    pub fn masked(&self) -> String {
        mask(self.expose())
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessToken")
            .field("value", &self.masked())
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

pub(crate) fn mask(token: &str) -> String {
    let chars: Vec<char> = token.chars().collect();
    if chars.len() <= 10 {
        return "***".into();
    }
    let head: String = chars.iter().take(6).collect();
    let tail: String = chars.iter().skip(chars.len() - 4).collect();
    format!("{head}...{tail}")
}

// ── TokenStore ───────────────────────────────────────────────────────

/// Holder of the current access token.
///
/// Writes are visible to every subsequent read. Shared by `Arc` between
/// the API client (reader) and the refresher (writer).
#[derive(Debug, Default)]
pub struct TokenStore {
    current: ArcSwapOption<AccessToken>,
}

impl TokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self) -> Option<Arc<AccessToken>> {
        self.current.load_full()
    }

    pub fn set(&self, token: Option<AccessToken>) {
        self.current.store(token.map(Arc::new));
    }

    pub(crate) fn set_shared(&self, token: Arc<AccessToken>) {
        self.current.store(Some(token));
    }

    pub fn clear(&self) {
        self.current.store(None);
    }

    pub fn is_present(&self) -> bool {
        self.current.load().is_some()
    }
}

// ── BaseUrl ──────────────────────────────────────────────────────────

/// The server root every request is resolved against.
///
/// Empty until login; replaced when a different QR code is scanned.
#[derive(Debug, Default)]
pub struct BaseUrl {
    current: ArcSwapOption<Url>,
}

impl BaseUrl {
    pub fn new(url: Option<Url>) -> Self {
        Self {
            current: ArcSwapOption::from(url.map(Arc::new)),
        }
    }

    pub fn get(&self) -> Option<Url> {
        self.current.load_full().map(|u| (*u).clone())
    }

    pub fn set(&self, url: Url) {
        self.current.store(Some(Arc::new(url)));
    }

    pub fn clear(&self) {
        self.current.store(None);
    }

    /// Resolve an absolute API path (`/api/method/...`) against the base.
    ///
    /// Any path already present on the base URL is kept as a prefix.
    pub fn join(&self, path: &str) -> Result<Url, Error> {
        let base = self.current.load_full().ok_or(Error::MissingBaseUrl)?;
        let root = base.as_str().trim_end_matches('/');
        let path = path.trim_start_matches('/');
        Ok(Url::parse(&format!("{root}/{path}"))?)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn store_set_is_visible_to_next_get() {
        let store = TokenStore::new();
        assert!(store.get().is_none());

        let expiry = Utc::now() + TimeDelta::seconds(60);
        store.set(Some(AccessToken::new("tok-1", expiry)));
        assert_eq!(store.get().map(|t| t.expose().to_owned()), Some("tok-1".into()));

        store.set(Some(AccessToken::new("tok-2", expiry)));
        assert_eq!(store.get().map(|t| t.expose().to_owned()), Some("tok-2".into()));

        store.clear();
        assert!(!store.is_present());
    }

    #[test]
    fn masked_token_hides_the_middle() {
        let token = AccessToken::new("abcdef0123456789wxyz", Utc::now());
        assert_eq!(token.masked(), "abcdef...wxyz");
        assert!(!format!("{token:?}").contains("0123456789"));
        assert_eq!(mask("short"), "***");
    }

    #[test]
    fn remaining_is_clamped_at_zero() {
        let now = Utc::now();
        let token = AccessToken::new("t", now - TimeDelta::seconds(5));
        assert!(token.is_expired(now));
        assert_eq!(token.remaining(now), TimeDelta::zero());
    }

    #[test]
    fn join_requires_a_base_url() {
        let base = BaseUrl::default();
        assert!(matches!(base.join("/api/method/x"), Err(Error::MissingBaseUrl)));
    }

    #[test]
    fn join_keeps_base_path_prefix() {
        let base = BaseUrl::new(Some(Url::parse("https://host/erp/").unwrap()));
        let url = base.join("/api/method/x").unwrap();
        assert_eq!(url.as_str(), "https://host/erp/api/method/x");

        base.set(Url::parse("https://other").unwrap());
        let url = base.join("api/method/y").unwrap();
        assert_eq!(url.as_str(), "https://other/api/method/y");
    }
}
