//! State slices held in the [`StateStore`](openlms_flux::StateStore).

mod auth;
mod resources;

pub use auth::AuthState;
pub use resources::{
    BlogsState, CoursesState, EnrollmentsState, LecturesState, ModulesState, ResourceState,
    UsersState,
};
