//! Shared domain model for the OpenLMS client.
//!
//! Wire types for the LMS backend (users, catalog, blogs, enrollment),
//! the [`Resource`] trait that names each collection's API path, and a
//! few small helpers. Everything here mirrors the backend's JSON shapes:
//! camelCase keys, Mongo-style `_id`, RFC 3339 timestamp strings.

pub mod model;
pub mod types;

pub use model::{
    Blog, Course, CourseModule, EnrollmentRequest, EnrollmentStatus, Lecture, Role, User,
    UserStatus,
};
pub use types::{now_rfc3339, ListResponse, Resource};
