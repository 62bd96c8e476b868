use serde_json::json;

use openlms_core::{EnrollmentRequest, ListResponse, Resource};

use crate::error::ApiError;
use crate::http::Http;

/// Enrollment-request workflow endpoints.
#[derive(Clone)]
pub struct EnrollmentApi {
    http: Http,
}

impl EnrollmentApi {
    pub fn new(http: Http) -> Self {
        Self { http }
    }

    fn base() -> String {
        format!("/{}", EnrollmentRequest::PATH)
    }

    /// All requests (admin view).
    pub async fn list(&self) -> Result<ListResponse<EnrollmentRequest>, ApiError> {
        self.http.get(&Self::base()).await
    }

    /// The signed-in user's own requests.
    pub async fn mine(&self) -> Result<ListResponse<EnrollmentRequest>, ApiError> {
        self.http.get(&format!("{}/my", Self::base())).await
    }

    /// Ask for access to a course.
    pub async fn request(&self, course_id: &str) -> Result<EnrollmentRequest, ApiError> {
        self.http
            .post(&Self::base(), &json!({ "courseId": course_id }))
            .await
    }

    /// Approve a pending request, returning the updated record.
    pub async fn approve(&self, id: &str) -> Result<EnrollmentRequest, ApiError> {
        self.http
            .patch_empty(&format!("{}/{}/approve", Self::base(), id))
            .await
    }

    /// Reject a pending request, returning the updated record.
    pub async fn reject(&self, id: &str) -> Result<EnrollmentRequest, ApiError> {
        self.http
            .patch_empty(&format!("{}/{}/reject", Self::base(), id))
            .await
    }
}
