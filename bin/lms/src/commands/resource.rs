//! Generic resource CRUD commands.
//!
//! `lms get courses`, `lms create blogs`, etc. Resource names map to
//! the typed API clients, so responses are checked against the wire
//! shapes before anything is printed.

use anyhow::Result;
use openlms_app::{actions, App};
use openlms_core::{Blog, Course, CourseModule, EnrollmentRequest, Lecture, ListResponse, Resource, User};

/// List filters and pagination for `get`.
#[derive(Debug, Default)]
pub struct ListFilter {
    pub course: Option<String>,
    pub module: Option<String>,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

/// GET a resource (list or get by ID).
pub async fn get(
    app: &App,
    resource: &str,
    id: Option<&str>,
    json_output: bool,
    filter: &ListFilter,
) -> Result<()> {
    match resource.to_lowercase().as_str() {
        "user" | "users" => fetch::<User>(app, id, json_output, filter).await,
        "course" | "courses" => fetch::<Course>(app, id, json_output, filter).await,
        "module" | "modules" => fetch::<CourseModule>(app, id, json_output, filter).await,
        "lecture" | "lectures" => fetch::<Lecture>(app, id, json_output, filter).await,
        "blog" | "blogs" => fetch::<Blog>(app, id, json_output, filter).await,
        "enrollment" | "enrollments" | "enrollment-request" | "enrollment-requests" => {
            fetch::<EnrollmentRequest>(app, id, json_output, filter).await
        }
        _ => Err(anyhow::anyhow!("Unknown resource type: {}", resource)),
    }
}

/// CREATE a resource.
pub async fn create(app: &App, resource: &str, json_body: &str) -> Result<()> {
    let body: serde_json::Value = serde_json::from_str(json_body)
        .map_err(|e| anyhow::anyhow!("Invalid JSON: {}", e))?;

    match resource.to_lowercase().as_str() {
        "user" | "users" => submit_new::<User>(app, "user", &body).await,
        "course" | "courses" => submit_new::<Course>(app, "course", &body).await,
        "module" | "modules" => submit_new::<CourseModule>(app, "module", &body).await,
        "lecture" | "lectures" => submit_new::<Lecture>(app, "lecture", &body).await,
        "blog" | "blogs" => submit_new::<Blog>(app, "blog", &body).await,
        "enrollment" | "enrollments" | "enrollment-request" | "enrollment-requests" => {
            submit_new::<EnrollmentRequest>(app, "enrollment-request", &body).await
        }
        _ => Err(anyhow::anyhow!("Unknown resource type: {}", resource)),
    }
}

/// UPDATE a resource (PATCH).
pub async fn update(app: &App, resource: &str, id: &str, json_body: &str) -> Result<()> {
    let body: serde_json::Value = serde_json::from_str(json_body)
        .map_err(|e| anyhow::anyhow!("Invalid JSON: {}", e))?;

    match resource.to_lowercase().as_str() {
        "user" | "users" => submit_edit::<User>(app, "user", id, &body).await,
        "course" | "courses" => submit_edit::<Course>(app, "course", id, &body).await,
        "module" | "modules" => submit_edit::<CourseModule>(app, "module", id, &body).await,
        "lecture" | "lectures" => submit_edit::<Lecture>(app, "lecture", id, &body).await,
        "blog" | "blogs" => submit_edit::<Blog>(app, "blog", id, &body).await,
        "enrollment" | "enrollments" | "enrollment-request" | "enrollment-requests" => {
            submit_edit::<EnrollmentRequest>(app, "enrollment-request", id, &body).await
        }
        _ => Err(anyhow::anyhow!("Unknown resource type: {}", resource)),
    }
}

/// DELETE a resource.
pub async fn delete(app: &App, resource: &str, id: &str) -> Result<()> {
    match resource.to_lowercase().as_str() {
        // User removal routes through the account actions; deleting
        // yourself also ends the local session.
        "user" | "users" => {
            actions::users::remove_user(app, id).await?;
            println!("user {} deleted.", id);
            Ok(())
        }
        "course" | "courses" => remove::<Course>(app, "course", id).await,
        "module" | "modules" => remove::<CourseModule>(app, "module", id).await,
        "lecture" | "lectures" => remove::<Lecture>(app, "lecture", id).await,
        "blog" | "blogs" => remove::<Blog>(app, "blog", id).await,
        "enrollment" | "enrollments" | "enrollment-request" | "enrollment-requests" => {
            remove::<EnrollmentRequest>(app, "enrollment-request", id).await
        }
        _ => Err(anyhow::anyhow!("Unknown resource type: {}", resource)),
    }
}

async fn fetch<T: Resource>(
    app: &App,
    id: Option<&str>,
    json_output: bool,
    filter: &ListFilter,
) -> Result<()> {
    let client = app.http().resource::<T>();

    if let Some(id) = id {
        let item = client.get(id).await?;
        println!("{}", serde_json::to_string_pretty(&item)?);
        return Ok(());
    }

    let limit = filter.limit.map(|l| l.to_string());
    let offset = filter.offset.map(|o| o.to_string());
    let mut query: Vec<(&str, &str)> = Vec::new();
    if let Some(c) = &filter.course {
        query.push(("courseId", c));
    }
    if let Some(m) = &filter.module {
        query.push(("moduleId", m));
    }
    if let Some(l) = &limit {
        query.push(("limit", l));
    }
    if let Some(o) = &offset {
        query.push(("offset", o));
    }

    let page = if query.is_empty() {
        client.list().await?
    } else {
        client.list_where(&query).await?
    };

    if json_output {
        println!("{}", serde_json::to_string_pretty(&page.items)?);
        return Ok(());
    }
    print_table(&page)
}

async fn submit_new<T: Resource>(
    app: &App,
    singular: &str,
    body: &serde_json::Value,
) -> Result<()> {
    let created = app.http().resource::<T>().create(body).await?;
    println!("{} created.", singular);
    println!("{}", serde_json::to_string_pretty(&created)?);
    Ok(())
}

async fn submit_edit<T: Resource>(
    app: &App,
    singular: &str,
    id: &str,
    body: &serde_json::Value,
) -> Result<()> {
    let updated = app.http().resource::<T>().update(id, body).await?;
    println!("{} {} updated.", singular, id);
    println!("{}", serde_json::to_string_pretty(&updated)?);
    Ok(())
}

async fn remove<T: Resource>(app: &App, singular: &str, id: &str) -> Result<()> {
    app.http().resource::<T>().delete(id).await?;
    println!("{} {} deleted.", singular, id);
    Ok(())
}

fn print_table<T: Resource>(page: &ListResponse<T>) -> Result<()> {
    if page.items.is_empty() {
        println!("No results.");
        return Ok(());
    }

    println!("{:26} {}", "ID", "SUMMARY");
    for item in &page.items {
        let value = serde_json::to_value(item)?;
        let id = value["_id"].as_str().unwrap_or("-");
        println!("{:26} {}", id, summary(&value));
    }
    println!("({} total)", page.total);
    Ok(())
}

/// One-line description of a row, keyed off whichever fields exist.
fn summary(value: &serde_json::Value) -> String {
    if let Some(title) = value["title"].as_str() {
        return title.to_string();
    }
    if let Some(name) = value["name"].as_str() {
        let email = value["email"].as_str().unwrap_or("-");
        let role = value["role"].as_str().unwrap_or("-");
        return format!("{} <{}> {}", name, email, role);
    }
    if let Some(status) = value["status"].as_str() {
        let user = value["userId"].as_str().unwrap_or("-");
        let course = value["courseId"].as_str().unwrap_or("-");
        return format!("user {} course {} ({})", user, course, status);
    }
    "-".to_string()
}
