//! OpenLMS application layer.
//!
//! Glues the client stack to the state store: [`App`] wires the session
//! record, token manager, HTTP wrapper, and background validator
//! together, and `actions` exposes the operations views call. Every
//! state change flows through the store, so a UI only ever subscribes
//! and renders.

pub mod actions;
pub mod app;
pub mod state;

pub use app::{App, AppConfig, AppError, DEFAULT_VALIDATE_INTERVAL};
pub use state::{
    AuthState, BlogsState, CoursesState, EnrollmentsState, LecturesState, ModulesState,
    ResourceState, UsersState,
};
