use std::path::PathBuf;
use std::sync::{Arc, Weak};
use std::time::Duration;

use openlms_client::{
    EventSink, Http, SessionEvent, SessionStore, SessionValidator, TokenManager,
};
use openlms_flux::StateStore;

use crate::state::AuthState;

pub const DEFAULT_VALIDATE_INTERVAL: Duration = Duration::from_secs(60);

/// Application context configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Backend base URL, e.g. `https://lms.example.com/api/v1`.
    pub server_url: String,

    /// Where the session record lives on disk.
    pub session_file: PathBuf,

    /// How often the background validator re-checks the account.
    pub validate_interval: Duration,
}

impl AppConfig {
    pub fn new(server_url: impl Into<String>, session_file: impl Into<PathBuf>) -> Self {
        Self {
            server_url: server_url.into(),
            session_file: session_file.into(),
            validate_interval: DEFAULT_VALIDATE_INTERVAL,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("http client: {0}")]
    Client(#[from] reqwest::Error),
}

/// Shared application context.
///
/// Owns the state store, the session record, the authorizing HTTP
/// stack, and the background validator, wired so session events from
/// the client layer land in the store. All session teardown funnels
/// through [`App::forced_logout`].
pub struct App {
    store: StateStore,
    sessions: SessionStore,
    http: Http,
    validator: SessionValidator,
}

impl App {
    pub fn new(config: AppConfig) -> Result<Arc<Self>, AppError> {
        let client = reqwest::Client::builder().cookie_store(true).build()?;

        // An unreadable session file means starting signed out, not
        // failing to start.
        let sessions = match SessionStore::load(&config.session_file) {
            Ok(s) => s,
            Err(e) => {
                tracing::warn!(error = %e, "session file unreadable, starting signed out");
                SessionStore::empty(&config.session_file)
            }
        };

        let base_url = config.server_url.trim_end_matches('/').to_string();
        let app = Arc::new_cyclic(|weak: &Weak<App>| {
            let sink = session_sink(Weak::clone(weak));
            let manager = TokenManager::new(
                client.clone(),
                &base_url,
                sessions.clone(),
                Arc::clone(&sink),
            );
            let http = Http::new(client, &base_url, Arc::new(manager));
            let validator = SessionValidator::new(
                http.clone(),
                sessions.clone(),
                sink,
                config.validate_interval,
            );
            let store = StateStore::new();
            store.put(AuthState::Uninitialized);
            App {
                store,
                sessions,
                http,
                validator,
            }
        });
        Ok(app)
    }

    pub fn store(&self) -> &StateStore {
        &self.store
    }

    pub fn http(&self) -> &Http {
        &self.http
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    /// True while the background validator task is alive.
    pub fn is_validating(&self) -> bool {
        self.validator.is_running()
    }

    pub(crate) fn validator(&self) -> &SessionValidator {
        &self.validator
    }

    /// Stop background work. Further use of the context is fine; the
    /// validator restarts on the next sign-in.
    pub fn shutdown(&self) {
        self.validator.stop();
    }

    fn on_session_event(&self, event: SessionEvent) {
        match event {
            SessionEvent::Refreshed(session) => {
                // Keep the store in step with rotated credentials. If
                // the slice isn't Authenticated yet (restore still in
                // flight), initialize will write the final state.
                if self
                    .store
                    .read::<AuthState>()
                    .is_some_and(|s| s.is_authenticated())
                {
                    self.store.put(AuthState::Authenticated {
                        user: session.user,
                        access_token: session.access_token,
                    });
                }
            }
            SessionEvent::Expired { reason } => self.forced_logout(&reason),
            SessionEvent::Invalidated { reason } => self.forced_logout(&reason),
        }
    }

    /// End the session locally after an authoritative rejection.
    ///
    /// Safe to call from the validator's own task: the store moves to
    /// `Unauthenticated` before the validator is stopped, and the abort
    /// only lands at the task's next await point.
    pub(crate) fn forced_logout(&self, reason: &str) {
        tracing::info!(%reason, "session ended");
        if let Err(e) = self.sessions.clear() {
            tracing::warn!(error = %e, "failed to clear persisted session");
        }
        self.store.put(AuthState::signed_out());
        self.validator.stop();
    }
}

fn session_sink(app: Weak<App>) -> EventSink {
    Arc::new(move |event| {
        if let Some(app) = app.upgrade() {
            app.on_session_event(event);
        }
    })
}
