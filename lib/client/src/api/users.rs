use serde_json::json;

use openlms_core::{ListResponse, Resource, Role, User, UserStatus};

use crate::error::ApiError;
use crate::http::Http;

/// User lookup and administration endpoints.
#[derive(Clone)]
pub struct UsersApi {
    http: Http,
}

impl UsersApi {
    pub fn new(http: Http) -> Self {
        Self { http }
    }

    fn item_path(id: &str) -> String {
        format!("/{}/{}", User::PATH, id)
    }

    /// Fetch a user by id. Doubles as the "is this account still in
    /// good standing" probe.
    pub async fn get(&self, id: &str) -> Result<User, ApiError> {
        self.http.get(&Self::item_path(id)).await
    }

    pub async fn list(&self) -> Result<ListResponse<User>, ApiError> {
        self.http.get(&format!("/{}", User::PATH)).await
    }

    /// Change a user's role, returning the updated record.
    pub async fn set_role(&self, id: &str, role: Role) -> Result<User, ApiError> {
        self.http
            .patch(&format!("{}/role", Self::item_path(id)), &json!({ "role": role }))
            .await
    }

    /// Block or reactivate a user, returning the updated record.
    pub async fn set_status(&self, id: &str, status: UserStatus) -> Result<User, ApiError> {
        self.http
            .patch(
                &format!("{}/status", Self::item_path(id)),
                &json!({ "status": status }),
            )
            .await
    }

    /// Soft-delete a user.
    pub async fn remove(&self, id: &str) -> Result<(), ApiError> {
        self.http.delete(&Self::item_path(id)).await
    }
}
