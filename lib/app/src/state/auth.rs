use openlms_core::User;
use openlms_flux::Slice;

/// The authentication state machine, stored at `auth/state`.
///
/// One value, replaced atomically. `Authenticated` carries both the
/// user and the token, so no observer can ever see one without the
/// other.
#[derive(Debug, Clone, PartialEq)]
pub enum AuthState {
    /// App start, before the persisted session has been checked.
    Uninitialized,

    /// Login or restore in progress.
    Authenticating,

    /// Signed in.
    Authenticated { user: User, access_token: String },

    /// Signed out. `error` retains the last login failure until the
    /// next attempt or an explicit clear.
    Unauthenticated { error: Option<String> },
}

impl AuthState {
    /// Signed out with no retained error.
    pub fn signed_out() -> Self {
        AuthState::Unauthenticated { error: None }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, AuthState::Authenticated { .. })
    }

    pub fn user(&self) -> Option<&User> {
        match self {
            AuthState::Authenticated { user, .. } => Some(user),
            _ => None,
        }
    }

    pub fn login_error(&self) -> Option<&str> {
        match self {
            AuthState::Unauthenticated { error } => error.as_deref(),
            _ => None,
        }
    }
}

impl Default for AuthState {
    fn default() -> Self {
        AuthState::Uninitialized
    }
}

impl Slice for AuthState {
    const PATH: &'static str = "auth/state";
}
