//! Typed endpoint groups over [`Http`](crate::http::Http).
//!
//! Generic CRUD goes through [`ResourceClient`](crate::http::ResourceClient);
//! these modules cover the endpoints with shapes of their own.

pub mod auth;
pub mod enrollment;
pub mod users;

pub use auth::AuthApi;
pub use enrollment::EnrollmentApi;
pub use users::UsersApi;
