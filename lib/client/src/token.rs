use std::sync::Arc;

use futures_util::future::{BoxFuture, FutureExt, Shared};
use serde::Deserialize;

use crate::error::ApiError;
use crate::session::{Session, SessionStore};

// ── Session events ──────────────────────────────────────────────────

/// Lifecycle notifications emitted by the token manager and the session
/// validator. The application layer wires these into its state store.
#[derive(Debug, Clone)]
pub enum SessionEvent {
    /// Refresh produced a new session (new token, possibly updated user).
    Refreshed(Session),

    /// Refresh terminally failed. Persisted state is already cleared.
    Expired { reason: String },

    /// The identity check found the account blocked, deleted, or
    /// role-changed. Persisted state is already cleared.
    Invalidated { reason: String },
}

/// Callback receiving [`SessionEvent`]s.
pub type EventSink = Arc<dyn Fn(SessionEvent) + Send + Sync>;

// ── TokenSource ─────────────────────────────────────────────────────

/// Pluggable token provider, consulted before every authorized request.
#[async_trait::async_trait]
pub trait TokenSource: Send + Sync + 'static {
    /// Token to attach, `Ok(None)` for anonymous.
    async fn token(&self) -> Result<Option<String>, ApiError>;

    /// Called after the backend rejected `stale`. Returns a replacement
    /// token when one can be obtained; `Ok(None)` means no recovery is
    /// possible and the rejection stands.
    async fn exchange_rejected(&self, stale: &str) -> Result<Option<String>, ApiError> {
        let _ = stale;
        Ok(None)
    }
}

/// No authentication, requests go out anonymous.
pub struct NoAuth;

#[async_trait::async_trait]
impl TokenSource for NoAuth {
    async fn token(&self) -> Result<Option<String>, ApiError> {
        Ok(None)
    }
}

/// Static bearer token (already obtained externally).
pub struct StaticToken(String);

impl StaticToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }
}

#[async_trait::async_trait]
impl TokenSource for StaticToken {
    async fn token(&self) -> Result<Option<String>, ApiError> {
        Ok(Some(self.0.clone()))
    }
}

// ── Expiry tracking ─────────────────────────────────────────────────

/// Treat a token as expired this many seconds early to avoid
/// edge-case races.
const EXPIRY_MARGIN_SECS: i64 = 30;

#[derive(Deserialize)]
struct BearerClaims {
    exp: Option<i64>,
}

/// Peek at the unverified `exp` claim of an access token.
///
/// The backend stays the authority on validity; this only schedules
/// proactive refreshes. Returns `None` for tokens that don't decode or
/// carry no expiry.
pub fn token_expiry(token: &str) -> Option<i64> {
    let mut validation = jsonwebtoken::Validation::new(jsonwebtoken::Algorithm::HS256);
    validation.insecure_disable_signature_validation();
    validation.validate_exp = false;
    validation.validate_aud = false;
    validation.required_spec_claims.clear();
    let key = jsonwebtoken::DecodingKey::from_secret(&[]);
    jsonwebtoken::decode::<BearerClaims>(token, &key, &validation)
        .ok()
        .and_then(|data| data.claims.exp)
}

fn token_is_stale(token: &str) -> bool {
    match token_expiry(token) {
        Some(exp) => chrono::Utc::now().timestamp() >= exp - EXPIRY_MARGIN_SECS,
        // No readable expiry: valid until the backend says otherwise.
        None => false,
    }
}

// ── TokenManager ────────────────────────────────────────────────────

#[derive(Debug, Clone)]
struct RefreshFailed {
    reason: String,
}

type FlightResult = Result<String, RefreshFailed>;
type Flight = Shared<BoxFuture<'static, FlightResult>>;

/// The single authority for obtaining a currently-valid access token.
///
/// Owns the refresh protocol: a token past its locally-tracked expiry
/// (or rejected by the backend) is exchanged at `/auth/refresh-token`,
/// authenticated by the refresh cookie riding in the shared cookie jar.
///
/// Refreshes are single-flight: callers that need one while another is
/// in progress await the same shared future, so N near-simultaneous
/// expired-token requests produce exactly one network call and observe
/// one common outcome. A terminal refresh failure clears the persisted
/// session, emits [`SessionEvent::Expired`], and surfaces
/// [`ApiError::SessionExpired`] to every waiter.
#[derive(Clone)]
pub struct TokenManager {
    inner: Arc<ManagerInner>,
}

struct ManagerInner {
    http: reqwest::Client,
    base_url: String,
    sessions: SessionStore,
    events: EventSink,
    inflight: tokio::sync::Mutex<Option<Flight>>,
}

impl TokenManager {
    /// `http` must be the same client the rest of the application uses,
    /// so the refresh cookie set at login is visible here.
    pub fn new(
        http: reqwest::Client,
        base_url: impl Into<String>,
        sessions: SessionStore,
        events: EventSink,
    ) -> Self {
        Self {
            inner: Arc::new(ManagerInner {
                http,
                base_url: base_url.into().trim_end_matches('/').to_string(),
                sessions,
                events,
                inflight: tokio::sync::Mutex::new(None),
            }),
        }
    }

    /// A token guaranteed non-expired by local tracking at the moment of
    /// return.
    ///
    /// - `Ok(Some(_))`: valid token, refreshed first if needed.
    /// - `Ok(None)`: no session; the caller goes out anonymous.
    /// - `Err(SessionExpired)`: there was a session but refresh
    ///   terminally failed; logout is already signaled.
    pub async fn get_valid_access_token(&self) -> Result<Option<String>, ApiError> {
        let Some(session) = self.inner.sessions.snapshot() else {
            return Ok(None);
        };

        // Fast path: locally-tracked expiry says the token is still good.
        if !token_is_stale(&session.access_token) {
            return Ok(Some(session.access_token));
        }

        tracing::debug!("access token at or past expiry, refreshing");
        let token = self.join_refresh(&session.access_token).await?;
        Ok(Some(token))
    }

    /// Recovery entry point after the backend rejected `stale` with a
    /// 401: force a refresh even when local tracking still likes the
    /// token. Single-flight with every other refresh path.
    pub async fn refresh_after_reject(&self, stale: &str) -> Result<String, ApiError> {
        match self.inner.sessions.snapshot() {
            None => {
                return Err(ApiError::SessionExpired("no active session".into()));
            }
            // A parallel flight already replaced the rejected token.
            Some(s) if s.access_token != stale => return Ok(s.access_token),
            Some(_) => {}
        }
        self.join_refresh(stale).await
    }

    /// Join the in-flight refresh, or start one if the token at hand is
    /// still the stale one the caller observed.
    async fn join_refresh(&self, observed_stale: &str) -> Result<String, ApiError> {
        let flight = {
            let mut slot = self.inner.inflight.lock().await;
            match slot.as_ref() {
                Some(f) => f.clone(),
                None => {
                    // Double-check under the slot lock: a flight that
                    // completed while we waited may have already
                    // replaced the token.
                    match self.inner.sessions.snapshot() {
                        None => {
                            return Err(ApiError::SessionExpired(
                                "no active session".into(),
                            ));
                        }
                        Some(s)
                            if s.access_token != observed_stale
                                && !token_is_stale(&s.access_token) =>
                        {
                            return Ok(s.access_token);
                        }
                        Some(_) => {}
                    }

                    let inner = Arc::clone(&self.inner);
                    let f: Flight = async move {
                        let out = run_refresh(&inner).await;
                        // Clear the slot so the next expiry starts a
                        // fresh flight.
                        *inner.inflight.lock().await = None;
                        out
                    }
                    .boxed()
                    .shared();
                    *slot = Some(f.clone());
                    f
                }
            }
        };

        flight
            .await
            .map_err(|e| ApiError::SessionExpired(e.reason))
    }
}

#[async_trait::async_trait]
impl TokenSource for TokenManager {
    async fn token(&self) -> Result<Option<String>, ApiError> {
        self.get_valid_access_token().await
    }

    async fn exchange_rejected(&self, stale: &str) -> Result<Option<String>, ApiError> {
        self.refresh_after_reject(stale).await.map(Some)
    }
}

/// One refresh attempt. Runs inside the shared flight, so at most one
/// instance executes at a time.
async fn run_refresh(inner: &ManagerInner) -> FlightResult {
    let url = format!("{}/auth/refresh-token", inner.base_url);
    // The refresh cookie rides along from the shared cookie jar; the
    // request body is deliberately empty.
    let result = inner
        .http
        .post(&url)
        .json(&serde_json::json!({}))
        .send()
        .await;

    let failure = match result {
        Ok(resp) if resp.status().is_success() => match resp.json::<Session>().await {
            Ok(session) => {
                let token = session.access_token.clone();
                if let Err(e) = inner.sessions.put(session.clone()) {
                    tracing::warn!(error = %e, "failed to persist refreshed session");
                }
                tracing::info!(user = %session.user.email, "access token refreshed");
                (inner.events)(SessionEvent::Refreshed(session));
                return Ok(token);
            }
            Err(e) => format!("refresh response: {}", e),
        },
        Ok(resp) => {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            format!("refresh rejected ({}): {}", status, body)
        }
        Err(e) => format!("refresh transport: {}", e),
    };

    // Terminal: the session is over. Clear storage before signaling so
    // no observer can see a half-torn-down session.
    tracing::error!(error = %failure, "token refresh failed, ending session");
    if let Err(e) = inner.sessions.clear() {
        tracing::warn!(error = %e, "failed to clear persisted session");
    }
    (inner.events)(SessionEvent::Expired {
        reason: failure.clone(),
    });
    Err(RefreshFailed { reason: failure })
}
