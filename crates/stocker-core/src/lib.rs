//! Session layer between `stocker-api` and front ends (the CLI).
//!
//! - **[`Session`]** owns the token store, base URL, refresher and
//!   [`ApiClient`](stocker_api::ApiClient) for one logged-in user, together
//!   with the selected warehouse and shelf. State snapshots are published
//!   through a `tokio::sync::watch` channel ([`Session::subscribe`]).
//!
//! - **QR login** ([`login`]) decodes the base64 company QR payload into a
//!   [`LoginProfile`] and derives the server base URL from it.
//!
//! - **[`CoreError`]** is the user-facing error type; transport failures
//!   from `stocker-api` are translated into it.

pub mod config;
pub mod error;
pub mod login;
pub mod session;

pub use config::{SessionConfig, TlsVerification};
pub use error::CoreError;
pub use login::{LoginProfile, base_url_of, parse_profile_text, parse_qr_payload};
pub use session::{Session, SessionState};

// Domain types callers need alongside the session.
pub use stocker_api::{
    AccessToken, ApiClient, Item, ItemDetail, MutationOutcome, NewStockEntry, SessionCredentials,
    StockEntry, StockEntryFilter, StockEntryUpdate, Warehouse,
};
