use serde_json::json;

use crate::error::ApiError;
use crate::http::Http;
use crate::session::Session;

/// Credential exchange endpoints.
///
/// These paths carry no bearer header: login authenticates by
/// credentials and sets the refresh cookie on the shared jar, logout
/// identifies the server-side session by that cookie.
#[derive(Clone)]
pub struct AuthApi {
    http: Http,
}

impl AuthApi {
    pub fn new(http: Http) -> Self {
        Self { http }
    }

    /// Exchange credentials for `{user, accessToken}`. The response
    /// also sets the HTTP-only refresh cookie.
    ///
    /// Rejected credentials come back as [`ApiError::Auth`] so callers
    /// can tell "wrong password" from infrastructure trouble.
    pub async fn login(&self, email: &str, password: &str) -> Result<Session, ApiError> {
        let body = json!({ "email": email, "password": password });
        match self.http.post::<_, Session>("/auth/login", &body).await {
            Ok(session) => Ok(session),
            Err(ApiError::Server { status, message })
                if matches!(status, 400 | 401 | 403 | 404) =>
            {
                Err(ApiError::Auth(message))
            }
            Err(e) => Err(e),
        }
    }

    /// Invalidate the current server-side session.
    pub async fn logout(&self) -> Result<(), ApiError> {
        self.http.post_ok("/auth/logout").await
    }

    /// Invalidate every server-side session for this account.
    pub async fn logout_all(&self) -> Result<(), ApiError> {
        self.http.post_ok("/auth/logout-all").await
    }
}
