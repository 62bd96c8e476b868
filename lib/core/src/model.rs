use serde::{Deserialize, Serialize};

use crate::types::Resource;

/// An account on the LMS backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Backend object id.
    #[serde(rename = "_id")]
    pub id: String,

    /// Display name.
    pub name: String,

    /// Login email.
    pub email: String,

    /// Access level. Changing this for the signed-in account ends the
    /// session.
    pub role: Role,

    /// `in-progress` is the active state; `blocked` accounts cannot
    /// hold a session.
    pub status: UserStatus,

    /// Soft-delete marker.
    #[serde(default)]
    pub is_deleted: bool,

    /// RFC 3339 creation timestamp.
    pub created_at: String,

    /// RFC 3339 last update timestamp.
    pub updated_at: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    #[serde(rename = "user")]
    User,
    #[serde(rename = "admin")]
    Admin,
    #[serde(rename = "superAdmin")]
    SuperAdmin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Admin => "admin",
            Role::SuperAdmin => "superAdmin",
        }
    }

    /// Parse the wire spelling. Returns `None` for unknown values.
    pub fn parse(s: &str) -> Option<Role> {
        match s {
            "user" => Some(Role::User),
            "admin" => Some(Role::Admin),
            "superAdmin" => Some(Role::SuperAdmin),
            _ => None,
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UserStatus {
    #[serde(rename = "in-progress")]
    InProgress,
    #[serde(rename = "blocked")]
    Blocked,
}

impl UserStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserStatus::InProgress => "in-progress",
            UserStatus::Blocked => "blocked",
        }
    }

    pub fn parse(s: &str) -> Option<UserStatus> {
        match s {
            "in-progress" => Some(UserStatus::InProgress),
            "blocked" => Some(UserStatus::Blocked),
            _ => None,
        }
    }
}

impl std::fmt::Display for UserStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A course in the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Course {
    #[serde(rename = "_id")]
    pub id: String,

    pub title: String,

    #[serde(default)]
    pub description: String,

    /// Cover image URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,

    #[serde(default)]
    pub is_deleted: bool,

    pub created_at: String,
    pub updated_at: String,
}

/// A module grouping lectures inside a course.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseModule {
    #[serde(rename = "_id")]
    pub id: String,

    /// Owning course id.
    pub course_id: String,

    pub title: String,

    /// 1-based position within the course.
    pub module_number: u32,

    #[serde(default)]
    pub is_deleted: bool,

    pub created_at: String,
    pub updated_at: String,
}

/// A single lecture: one video plus attached PDF notes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Lecture {
    #[serde(rename = "_id")]
    pub id: String,

    /// Owning module id.
    pub module_id: String,

    pub title: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_url: Option<String>,

    #[serde(default)]
    pub pdf_urls: Vec<String>,

    /// 1-based position within the module.
    pub lecture_number: u32,

    #[serde(default)]
    pub is_deleted: bool,

    pub created_at: String,
    pub updated_at: String,
}

/// A blog post.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Blog {
    #[serde(rename = "_id")]
    pub id: String,

    pub title: String,

    #[serde(default)]
    pub content: String,

    #[serde(default)]
    pub is_deleted: bool,

    pub created_at: String,
    pub updated_at: String,
}

/// A user's request for access to a course's gated content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrollmentRequest {
    #[serde(rename = "_id")]
    pub id: String,

    pub user_id: String,
    pub course_id: String,

    pub status: EnrollmentStatus,

    #[serde(default)]
    pub is_deleted: bool,

    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnrollmentStatus {
    Pending,
    Approved,
    Rejected,
}

impl std::fmt::Display for EnrollmentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            EnrollmentStatus::Pending => "pending",
            EnrollmentStatus::Approved => "approved",
            EnrollmentStatus::Rejected => "rejected",
        };
        f.write_str(s)
    }
}

impl Resource for User {
    const PATH: &'static str = "users";
}

impl Resource for Course {
    const PATH: &'static str = "courses";
}

impl Resource for CourseModule {
    const PATH: &'static str = "modules";
}

impl Resource for Lecture {
    const PATH: &'static str = "lectures";
}

impl Resource for Blog {
    const PATH: &'static str = "blogs";
}

impl Resource for EnrollmentRequest {
    const PATH: &'static str = "enrollment-requests";
}
