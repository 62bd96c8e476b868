//! OpenLMS HTTP client.
//!
//! Everything that talks to the LMS backend lives here: the persisted
//! session record, the token manager (single-flight refresh), the
//! authorizing HTTP wrapper with its one-shot 401 recovery, the
//! background session validator, and typed endpoint clients.
//!
//! # Usage
//!
//! ```ignore
//! use openlms_client::{Http, ResourceClient, SessionStore, TokenManager};
//!
//! let sessions = SessionStore::load("~/.openlms/session.json")?;
//! let client = reqwest::Client::builder().cookie_store(true).build()?;
//! let tokens = TokenManager::new(client.clone(), base_url, sessions, sink);
//! let http = Http::new(client, base_url, tokens);
//! let courses = ResourceClient::<Course>::new(http.clone()).list().await?;
//! ```

pub mod api;
pub mod error;
pub mod http;
pub mod session;
pub mod token;
pub mod validator;

pub use error::{error_code, ApiError};
pub use http::{Http, ResourceClient};
pub use session::{Session, SessionError, SessionStore};
pub use token::{
    token_expiry, EventSink, NoAuth, SessionEvent, StaticToken, TokenManager, TokenSource,
};
pub use validator::SessionValidator;
