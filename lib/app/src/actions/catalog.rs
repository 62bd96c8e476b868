use openlms_client::ApiError;
use openlms_core::{Blog, Course, CourseModule, Lecture};

use crate::actions::run_load;
use crate::App;

/// Load the course catalog into `courses/state`.
pub async fn load_courses(app: &App) -> Result<(), ApiError> {
    let client = app.http().resource::<Course>();
    run_load(app, async move { client.list().await }).await
}

/// Load a course's modules into `modules/state`.
pub async fn load_modules(app: &App, course_id: &str) -> Result<(), ApiError> {
    let client = app.http().resource::<CourseModule>();
    let course_id = course_id.to_string();
    run_load(app, async move {
        client.list_where(&[("courseId", course_id.as_str())]).await
    })
    .await
}

/// Load a module's lectures into `lectures/state`.
pub async fn load_lectures(app: &App, module_id: &str) -> Result<(), ApiError> {
    let client = app.http().resource::<Lecture>();
    let module_id = module_id.to_string();
    run_load(app, async move {
        client.list_where(&[("moduleId", module_id.as_str())]).await
    })
    .await
}

/// Load blog posts into `blogs/state`.
pub async fn load_blogs(app: &App) -> Result<(), ApiError> {
    let client = app.http().resource::<Blog>();
    run_load(app, async move { client.list().await }).await
}
