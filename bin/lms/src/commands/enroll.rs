//! Enrollment workflow commands.

use anyhow::Result;
use openlms_app::{actions, App};

/// Ask to join a course.
pub async fn enroll(app: &App, course_id: &str) -> Result<()> {
    let request = actions::enrollment::request_enrollment(app, course_id).await?;
    println!(
        "Enrollment requested for course {} (request {}, {}).",
        request.course_id, request.id, request.status
    );
    Ok(())
}

/// Approve a pending enrollment request.
pub async fn approve(app: &App, id: &str) -> Result<()> {
    let request = actions::enrollment::approve_enrollment(app, id).await?;
    println!(
        "Request {} approved (user {}, course {}).",
        request.id, request.user_id, request.course_id
    );
    Ok(())
}

/// Reject a pending enrollment request.
pub async fn reject(app: &App, id: &str) -> Result<()> {
    let request = actions::enrollment::reject_enrollment(app, id).await?;
    println!(
        "Request {} rejected (user {}, course {}).",
        request.id, request.user_id, request.course_id
    );
    Ok(())
}
