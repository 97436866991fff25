// Token lifecycle
//
// The store holds the current bearer token, the generator exchanges app
// credentials for a new one, and the refresher makes sure concurrent
// callers share a single exchange.

mod generator;
mod refresh;
mod store;

pub use generator::{
    DEFAULT_SAFETY_MARGIN, DEFAULT_TOKEN_ENDPOINT, SessionCredentials, TokenGenerator,
};
pub use refresh::{RefreshOutcome, TokenRefresher};
pub use store::{AccessToken, BaseUrl, TokenStore};

pub(crate) use store::mask;
