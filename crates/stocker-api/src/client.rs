// API HTTP client
//
// Every request goes through the same pipeline:
//
//   build (ApiRequest -> RequestBuilder) -> authorize (bearer from the
//   token store) -> send -> handle_response
//
// A 401 on a request that has not been retried (and is not the token
// endpoint itself) triggers one single-flight token refresh and one
// resubmission. Endpoint modules (warehouses, items, stock entries) are
// implemented as inherent methods in separate files.

use std::sync::Arc;
use std::time::Duration;

use reqwest::header::CONTENT_TYPE;
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, info, warn};
use url::Url;

use crate::auth::{
    AccessToken, BaseUrl, RefreshOutcome, SessionCredentials, TokenGenerator, TokenRefresher,
    TokenStore, mask,
};
use crate::envelope::{self, Payload};
use crate::error::Error;
use crate::transport::TransportConfig;

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// `/api/method/<name>` for a whitelisted server method.
pub fn method_path(name: &str) -> String {
    format!("/api/method/{}", name.trim_start_matches('/'))
}

// ── ApiRequest ───────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub(crate) enum RequestBody {
    None,
    Form(Vec<(&'static str, String)>),
    Json(Value),
}

/// A request description that can be rebuilt for the retry.
#[derive(Debug, Clone)]
pub(crate) struct ApiRequest {
    method: Method,
    path: String,
    query: Vec<(&'static str, String)>,
    body: RequestBody,
    retried: bool,
}

impl ApiRequest {
    fn new(method: Method, path: String) -> Self {
        Self {
            method,
            path,
            query: Vec::new(),
            body: RequestBody::None,
            retried: false,
        }
    }

    pub(crate) fn get(path: String) -> Self {
        Self::new(Method::GET, path)
    }

    pub(crate) fn post(path: String) -> Self {
        Self::new(Method::POST, path)
    }

    pub(crate) fn put(path: String) -> Self {
        Self::new(Method::PUT, path)
    }

    pub(crate) fn delete(path: String) -> Self {
        Self::new(Method::DELETE, path)
    }

    /// Add a query parameter unless the value is blank. Values are trimmed.
    pub(crate) fn query_opt(mut self, key: &'static str, value: Option<&str>) -> Self {
        if let Some(v) = value.map(str::trim).filter(|v| !v.is_empty()) {
            self.query.push((key, v.to_owned()));
        }
        self
    }

    pub(crate) fn form(mut self, fields: Vec<(&'static str, String)>) -> Self {
        self.body = RequestBody::Form(fields);
        self
    }

    pub(crate) fn json(mut self, value: Value) -> Self {
        self.body = RequestBody::Json(value);
        self
    }
}

// ── ApiClient ────────────────────────────────────────────────────────

/// Authenticated HTTP client for the inventory API.
///
/// Cheaply cloneable. The base URL and token store are shared cells, so a
/// login or refresh performed through one clone is seen by all of them.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: Arc<BaseUrl>,
    tokens: Arc<TokenStore>,
    refresher: TokenRefresher,
}

impl ApiClient {
    pub fn builder() -> ApiClientBuilder {
        ApiClientBuilder::default()
    }

    /// The shared base URL cell.
    pub fn base_url(&self) -> &Arc<BaseUrl> {
        &self.base_url
    }

    /// The shared token store.
    pub fn tokens(&self) -> &Arc<TokenStore> {
        &self.tokens
    }

    pub fn refresher(&self) -> &TokenRefresher {
        &self.refresher
    }

    /// The underlying HTTP client.
    pub fn http(&self) -> &reqwest::Client {
        &self.http
    }

    // ── Pipeline stages ──────────────────────────────────────────────

    fn build(&self, req: &ApiRequest) -> Result<reqwest::RequestBuilder, Error> {
        let url = self.base_url.join(&req.path)?;
        let mut builder = self.http.request(req.method.clone(), url);
        if !req.query.is_empty() {
            builder = builder.query(&req.query);
        }
        Ok(match &req.body {
            RequestBody::None => builder.header(CONTENT_TYPE, FORM_CONTENT_TYPE),
            RequestBody::Form(fields) => builder.form(fields),
            RequestBody::Json(value) => builder.json(value),
        })
    }

    fn authorize(
        builder: reqwest::RequestBuilder,
        token: Option<&AccessToken>,
    ) -> reqwest::RequestBuilder {
        match token {
            Some(token) => builder.bearer_auth(token.expose()),
            None => builder,
        }
    }

    async fn dispatch(
        &self,
        req: &ApiRequest,
        token: Option<&AccessToken>,
    ) -> Result<reqwest::Response, Error> {
        let builder = Self::authorize(self.build(req)?, token);
        let auth = token.map_or_else(|| "none".to_owned(), |t| mask(t.expose()));
        debug!(retried = req.retried, auth = %auth, "{} {}", req.method, req.path);
        Ok(builder.send().await?)
    }

    async fn handle_response(resp: reqwest::Response) -> Result<String, Error> {
        let status = resp.status();
        let body = resp.text().await?;

        if status == StatusCode::UNAUTHORIZED {
            return Err(Error::Unauthorized {
                message: error_message(&body),
            });
        }

        if !status.is_success() {
            return Err(Error::Api {
                status: status.as_u16(),
                message: error_message(&body),
            });
        }

        Ok(body)
    }

    fn may_refresh(&self, req: &ApiRequest) -> bool {
        !req.retried && req.path != self.refresher.token_path()
    }

    /// A token to retry with after `sent` was rejected.
    ///
    /// If the store already holds a different token, a refresh finished
    /// while the rejected request was in flight and its result is reused.
    async fn renewed_token(&self, sent: Option<&AccessToken>) -> RefreshOutcome {
        let newer = self
            .tokens
            .get()
            .filter(|current| sent.is_none_or(|s| s.expose() != current.expose()));
        match newer {
            Some(current) => {
                debug!("store already holds a newer token");
                Ok(current)
            }
            None => self.refresher.refresh().await,
        }
    }

    /// Run a request through the pipeline and return the raw success body.
    pub(crate) async fn execute(&self, mut req: ApiRequest) -> Result<String, Error> {
        let sent = self.tokens.get();
        let resp = self.dispatch(&req, sent.as_deref()).await?;

        if resp.status() == StatusCode::UNAUTHORIZED && self.may_refresh(&req) {
            req.retried = true;
            match self.renewed_token(sent.as_deref()).await {
                Ok(fresh) => {
                    info!(path = %req.path, "retrying request with refreshed token");
                    let retry = self.dispatch(&req, Some(&fresh)).await?;
                    return Self::handle_response(retry).await;
                }
                Err(e) => {
                    warn!(path = %req.path, error = %e, "token refresh failed, not retrying");
                }
            }
        }

        Self::handle_response(resp).await
    }

    /// Execute and normalize the `{data|message}` envelope.
    pub(crate) async fn execute_payload<T: DeserializeOwned>(
        &self,
        req: ApiRequest,
    ) -> Result<Payload<T>, Error> {
        let body = self.execute(req).await?;
        envelope::normalize(&body)
    }

    /// Execute and decode the whole body.
    pub(crate) async fn execute_json<T: DeserializeOwned>(
        &self,
        req: ApiRequest,
    ) -> Result<T, Error> {
        let body = self.execute(req).await?;
        envelope::decode(&body)
    }
}

/// Best human-readable message from an error body.
fn error_message(body: &str) -> String {
    if let Ok(Value::Object(map)) = serde_json::from_str::<Value>(body) {
        for key in ["message", "exception", "exc_type", "error"] {
            if let Some(Value::String(msg)) = map.get(key) {
                if !msg.is_empty() {
                    return msg.clone();
                }
            }
        }
    }
    let preview = envelope::preview(body);
    if preview.is_empty() {
        "(empty response body)".into()
    } else {
        preview
    }
}

// ── Builder ──────────────────────────────────────────────────────────

/// Assembles an [`ApiClient`] together with its token machinery.
#[derive(Debug, Default)]
pub struct ApiClientBuilder {
    transport: TransportConfig,
    http: Option<reqwest::Client>,
    base_url: Option<Url>,
    credentials: SessionCredentials,
    token_endpoint: Option<String>,
    safety_margin: Option<Duration>,
}

impl ApiClientBuilder {
    pub fn transport(mut self, transport: TransportConfig) -> Self {
        self.transport = transport;
        self
    }

    /// Use a pre-built `reqwest::Client` instead of building one from the
    /// transport config.
    pub fn http_client(mut self, http: reqwest::Client) -> Self {
        self.http = Some(http);
        self
    }

    pub fn base_url(mut self, url: Url) -> Self {
        self.base_url = Some(url);
        self
    }

    pub fn credentials(mut self, credentials: SessionCredentials) -> Self {
        self.credentials = credentials;
        self
    }

    pub fn token_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.token_endpoint = Some(endpoint.into());
        self
    }

    pub fn token_safety_margin(mut self, margin: Duration) -> Self {
        self.safety_margin = Some(margin);
        self
    }

    pub fn build(self) -> Result<ApiClient, Error> {
        let http = match self.http {
            Some(http) => http,
            None => self.transport.build_client()?,
        };
        let base_url = Arc::new(BaseUrl::new(self.base_url));
        let tokens = Arc::new(TokenStore::new());

        let mut generator =
            TokenGenerator::new(http.clone(), Arc::clone(&base_url), self.credentials);
        if let Some(endpoint) = self.token_endpoint {
            generator = generator.with_endpoint(endpoint);
        }
        if let Some(margin) = self.safety_margin {
            generator = generator.with_safety_margin(margin);
        }
        let refresher = TokenRefresher::new(generator, Arc::clone(&tokens));

        Ok(ApiClient {
            http,
            base_url,
            tokens,
            refresher,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn method_path_prefixes_api_method() {
        assert_eq!(method_path("a.b.c"), "/api/method/a.b.c");
        assert_eq!(method_path("/a.b.c"), "/api/method/a.b.c");
    }

    #[test]
    fn query_opt_trims_and_skips_blanks() {
        let req = ApiRequest::get("/x".into())
            .query_opt("warehouse", Some("  W1 "))
            .query_opt("barcode", Some("   "))
            .query_opt("shelf", None);
        assert_eq!(req.query, vec![("warehouse", "W1".to_string())]);
    }

    #[test]
    fn error_message_prefers_json_message() {
        assert_eq!(error_message(r#"{"message": "Item not found"}"#), "Item not found");
        assert_eq!(
            error_message(r#"{"exception": "frappe.PermissionError"}"#),
            "frappe.PermissionError"
        );
        assert_eq!(error_message("Bad Gateway"), "Bad Gateway");
        assert_eq!(error_message(""), "(empty response body)");
    }
}
