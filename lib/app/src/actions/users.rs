use openlms_client::api::UsersApi;
use openlms_client::{ApiError, Session};
use openlms_core::{Role, User, UserStatus};

use crate::actions::run_load;
use crate::state::AuthState;
use crate::App;

/// Load the user directory into `users/state`.
pub async fn load_users(app: &App) -> Result<(), ApiError> {
    let api = UsersApi::new(app.http().clone());
    run_load(app, async move { api.list().await }).await
}

/// Change a user's role. Changing the signed-in account's own role
/// ends the session.
pub async fn set_user_role(app: &App, id: &str, role: Role) -> Result<User, ApiError> {
    let api = UsersApi::new(app.http().clone());
    let updated = api.set_role(id, role).await?;
    handle_self_change(app, &updated);
    Ok(updated)
}

/// Block or reactivate a user. Blocking the signed-in account ends the
/// session.
pub async fn set_user_status(app: &App, id: &str, status: UserStatus) -> Result<User, ApiError> {
    let api = UsersApi::new(app.http().clone());
    let updated = api.set_status(id, status).await?;
    handle_self_change(app, &updated);
    Ok(updated)
}

/// Soft-delete a user. Deleting the signed-in account ends the session.
pub async fn remove_user(app: &App, id: &str) -> Result<(), ApiError> {
    let api = UsersApi::new(app.http().clone());
    api.remove(id).await?;
    if app
        .sessions()
        .snapshot()
        .is_some_and(|s| s.user.id == id)
    {
        app.forced_logout("account deleted");
    }
    Ok(())
}

/// One place decides whether an admin edit just invalidated the
/// editor's own session.
fn handle_self_change(app: &App, updated: &User) {
    let Some(session) = app.sessions().snapshot() else {
        return;
    };
    if session.user.id != updated.id {
        return;
    }

    if updated.is_deleted {
        app.forced_logout("account deleted");
    } else if updated.status == UserStatus::Blocked {
        app.forced_logout("account blocked");
    } else if updated.role != session.user.role {
        app.forced_logout("role changed");
    } else {
        // Benign self-edit: keep the cached record current.
        let refreshed = Session {
            access_token: session.access_token.clone(),
            user: updated.clone(),
        };
        if let Err(e) = app.sessions().put(refreshed) {
            tracing::warn!(error = %e, "failed to persist updated profile");
        }
        if let Some(AuthState::Authenticated { access_token, .. }) =
            app.store().read::<AuthState>()
        {
            app.store().put(AuthState::Authenticated {
                user: updated.clone(),
                access_token,
            });
        }
    }
}
