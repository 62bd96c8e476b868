use openlms_client::api::AuthApi;
use openlms_client::{ApiError, Session};
use openlms_core::{Resource, User, UserStatus};

use crate::state::AuthState;
use crate::App;

/// Restore a persisted session at app start.
///
/// The stored user is only trusted after the backend confirms it: the
/// record is re-fetched and compared against what the session was
/// established with. Any authoritative "no" (rejected refresh, missing,
/// deleted, or blocked account, changed role) clears storage and lands
/// in `Unauthenticated`. Transient network trouble also lands in
/// `Unauthenticated`, but keeps the stored session for the next start
/// and reports the error.
pub async fn initialize(app: &App) -> Result<(), ApiError> {
    let Some(session) = app.sessions().snapshot() else {
        app.store().put(AuthState::signed_out());
        return Ok(());
    };

    app.store().put(AuthState::Authenticating);
    let cached = session.user;

    let path = format!("/{}/{}", User::PATH, cached.id);
    match app.http().get::<User>(&path).await {
        Ok(fresh) => {
            let still_valid = !fresh.is_deleted
                && fresh.status != UserStatus::Blocked
                && fresh.role == cached.role;
            if !still_valid {
                tracing::info!(user = %cached.email, "persisted session no longer valid");
                end_local_session(app);
                return Ok(());
            }

            // The fetch may have rotated the token; re-read it before
            // committing the state.
            let Some(current) = app.sessions().snapshot() else {
                app.store().put(AuthState::signed_out());
                return Ok(());
            };
            let session = Session {
                access_token: current.access_token.clone(),
                user: fresh.clone(),
            };
            if let Err(e) = app.sessions().put(session) {
                tracing::warn!(error = %e, "failed to persist restored session");
            }
            tracing::info!(user = %fresh.email, "session restored");
            app.store().put(AuthState::Authenticated {
                user: fresh,
                access_token: current.access_token,
            });
            app.validator().start();
            Ok(())
        }
        Err(ApiError::SessionExpired(_)) => {
            // The token manager already tore the session down.
            app.store().put(AuthState::signed_out());
            Ok(())
        }
        Err(ApiError::Server { status, .. }) if matches!(status, 401 | 403 | 404) => {
            tracing::info!(user = %cached.email, status, "backend rejected persisted session");
            end_local_session(app);
            Ok(())
        }
        Err(e) => {
            tracing::warn!(error = %e, "session restore could not reach the backend");
            app.store().put(AuthState::signed_out());
            Err(e)
        }
    }
}

/// Sign in with credentials. On success the session is persisted, the
/// store moves to `Authenticated`, and the validator starts.
pub async fn login(app: &App, email: &str, password: &str) -> Result<(), ApiError> {
    app.store().put(AuthState::Authenticating);

    let api = AuthApi::new(app.http().clone());
    match api.login(email, password).await {
        Ok(session) => {
            if let Err(e) = app.sessions().put(session.clone()) {
                tracing::warn!(error = %e, "failed to persist session");
            }
            tracing::info!(user = %session.user.email, role = %session.user.role, "signed in");
            app.store().put(AuthState::Authenticated {
                user: session.user,
                access_token: session.access_token,
            });
            app.validator().start();
            Ok(())
        }
        Err(e) => {
            app.store().put(AuthState::Unauthenticated {
                error: Some(e.to_string()),
            });
            Err(e)
        }
    }
}

/// Sign out. Local state is torn down even when the server call fails;
/// signing out while already signed out is a no-op.
pub async fn logout(app: &App) -> Result<(), ApiError> {
    logout_inner(app, false).await
}

/// Sign out everywhere: the backend drops every session for this
/// account, then local state is torn down.
pub async fn logout_all(app: &App) -> Result<(), ApiError> {
    logout_inner(app, true).await
}

async fn logout_inner(app: &App, all: bool) -> Result<(), ApiError> {
    let signed_in = app.sessions().snapshot().is_some()
        || app
            .store()
            .read::<AuthState>()
            .is_some_and(|s| s.is_authenticated());
    if !signed_in {
        app.store().put(AuthState::signed_out());
        return Ok(());
    }

    let api = AuthApi::new(app.http().clone());
    let server = if all {
        api.logout_all().await
    } else {
        api.logout().await
    };
    if let Err(e) = server {
        tracing::warn!(error = %e, "server logout failed, ending session locally anyway");
    }

    end_local_session(app);
    app.validator().stop();
    Ok(())
}

/// Drop a retained login error, e.g. when the form is edited.
pub fn clear_login_error(app: &App) {
    if let Some(AuthState::Unauthenticated { error: Some(_) }) = app.store().read::<AuthState>() {
        app.store().put(AuthState::signed_out());
    }
}

fn end_local_session(app: &App) {
    if let Err(e) = app.sessions().clear() {
        tracing::warn!(error = %e, "failed to clear persisted session");
    }
    app.store().put(AuthState::signed_out());
}
