use openlms_client::api::EnrollmentApi;
use openlms_client::ApiError;
use openlms_core::EnrollmentRequest;

use crate::actions::run_load;
use crate::state::EnrollmentsState;
use crate::App;

/// Load every enrollment request (admin view) into `enrollments/state`.
pub async fn load_enrollments(app: &App) -> Result<(), ApiError> {
    let api = EnrollmentApi::new(app.http().clone());
    run_load(app, async move { api.list().await }).await
}

/// Load the signed-in user's own requests into `enrollments/state`.
pub async fn load_my_enrollments(app: &App) -> Result<(), ApiError> {
    let api = EnrollmentApi::new(app.http().clone());
    run_load(app, async move { api.mine().await }).await
}

/// Ask for access to a course.
pub async fn request_enrollment(app: &App, course_id: &str) -> Result<EnrollmentRequest, ApiError> {
    EnrollmentApi::new(app.http().clone())
        .request(course_id)
        .await
}

/// Approve a pending request and update the cached row.
pub async fn approve_enrollment(app: &App, id: &str) -> Result<EnrollmentRequest, ApiError> {
    let updated = EnrollmentApi::new(app.http().clone()).approve(id).await?;
    patch_cached(app, &updated);
    Ok(updated)
}

/// Reject a pending request and update the cached row.
pub async fn reject_enrollment(app: &App, id: &str) -> Result<EnrollmentRequest, ApiError> {
    let updated = EnrollmentApi::new(app.http().clone()).reject(id).await?;
    patch_cached(app, &updated);
    Ok(updated)
}

fn patch_cached(app: &App, updated: &EnrollmentRequest) {
    if let Some(mut state) = app.store().read::<EnrollmentsState>() {
        if let Some(row) = state.data.iter_mut().find(|r| r.id == updated.id) {
            *row = updated.clone();
            app.store().put(state);
        }
    }
}
