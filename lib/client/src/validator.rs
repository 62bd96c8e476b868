use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::task::JoinHandle;

use openlms_core::{Resource, User, UserStatus};

use crate::error::ApiError;
use crate::http::Http;
use crate::session::SessionStore;
use crate::token::{EventSink, SessionEvent};

/// Periodic identity check against the backend.
///
/// The request cycle only learns about an invalidated account when the
/// user does something. This task closes that gap: at a fixed interval
/// it re-fetches the signed-in user's record and forces logout when the
/// account is deleted, blocked, or its role no longer matches the one
/// the session was established with. Expired tokens are not its
/// business: the HTTP path refreshes those, and a terminally dead
/// session is ended by the token manager first.
pub struct SessionValidator {
    inner: Arc<ValidatorInner>,
    handle: Mutex<Option<JoinHandle<()>>>,
}

struct ValidatorInner {
    http: Http,
    sessions: SessionStore,
    events: EventSink,
    interval: Duration,
}

impl SessionValidator {
    pub fn new(
        http: Http,
        sessions: SessionStore,
        events: EventSink,
        interval: Duration,
    ) -> Self {
        Self {
            inner: Arc::new(ValidatorInner {
                http,
                sessions,
                events,
                interval,
            }),
            handle: Mutex::new(None),
        }
    }

    /// Start the background check. Idempotent: a running validator is
    /// left alone, so one session gets one task.
    pub fn start(&self) {
        let mut handle = self.handle.lock().unwrap();
        if handle.as_ref().is_some_and(|h| !h.is_finished()) {
            return;
        }
        let inner = Arc::clone(&self.inner);
        *handle = Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(inner.interval);
            // The first tick fires immediately; skip it so a fresh
            // login isn't instantly re-validated.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                run_check(&inner).await;
            }
        }));
        tracing::debug!(interval = ?self.inner.interval, "session validator started");
    }

    /// Stop the background check. Idempotent.
    pub fn stop(&self) {
        if let Some(handle) = self.handle.lock().unwrap().take() {
            handle.abort();
            tracing::debug!("session validator stopped");
        }
    }

    /// True while the background task is alive.
    pub fn is_running(&self) -> bool {
        self.handle
            .lock()
            .unwrap()
            .as_ref()
            .is_some_and(|h| !h.is_finished())
    }
}

impl Drop for SessionValidator {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn run_check(inner: &ValidatorInner) {
    let Some(session) = inner.sessions.snapshot() else {
        return;
    };
    let cached = session.user;

    let path = format!("/{}/{}", User::PATH, cached.id);
    let fresh: User = match inner.http.get(&path).await {
        Ok(user) => user,
        Err(ApiError::Server { status: 404, .. }) => {
            invalidate(inner, "account no longer exists");
            return;
        }
        Err(ApiError::SessionExpired(_)) => {
            // The token manager already ended the session.
            tracing::debug!("session ended during validation");
            return;
        }
        Err(e) => {
            // Transient trouble is not evidence against the account.
            tracing::warn!(error = %e, "session validation skipped");
            return;
        }
    };

    if fresh.is_deleted {
        invalidate(inner, "account deleted");
    } else if fresh.status == UserStatus::Blocked {
        invalidate(inner, "account blocked");
    } else if fresh.role != cached.role {
        invalidate(inner, "role changed");
    } else {
        tracing::debug!(user = %cached.email, "session still valid");
    }
}

fn invalidate(inner: &ValidatorInner, reason: &str) {
    tracing::info!(%reason, "session invalidated, forcing logout");
    if let Err(e) = inner.sessions.clear() {
        tracing::warn!(error = %e, "failed to clear persisted session");
    }
    (inner.events)(SessionEvent::Invalidated {
        reason: reason.to_string(),
    });
}
