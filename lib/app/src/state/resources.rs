use openlms_core::{Blog, Course, CourseModule, EnrollmentRequest, Lecture, User};
use openlms_flux::Slice;

/// Uniform async-data shape shared by every non-auth slice.
///
/// `data` keeps the last loaded rows while a reload is in flight or
/// after a failed one, so views never flash empty.
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceState<T> {
    pub is_loading: bool,
    pub data: Vec<T>,
    pub error: Option<String>,
}

impl<T> ResourceState<T> {
    pub fn idle() -> Self {
        Self {
            is_loading: false,
            data: Vec::new(),
            error: None,
        }
    }

    pub fn loading(data: Vec<T>) -> Self {
        Self {
            is_loading: true,
            data,
            error: None,
        }
    }

    pub fn loaded(data: Vec<T>) -> Self {
        Self {
            is_loading: false,
            data,
            error: None,
        }
    }

    pub fn failed(data: Vec<T>, error: String) -> Self {
        Self {
            is_loading: false,
            data,
            error: Some(error),
        }
    }
}

impl<T> Default for ResourceState<T> {
    fn default() -> Self {
        Self::idle()
    }
}

pub type CoursesState = ResourceState<Course>;
pub type ModulesState = ResourceState<CourseModule>;
pub type LecturesState = ResourceState<Lecture>;
pub type BlogsState = ResourceState<Blog>;
pub type UsersState = ResourceState<User>;
pub type EnrollmentsState = ResourceState<EnrollmentRequest>;

impl Slice for CoursesState {
    const PATH: &'static str = "courses/state";
}

impl Slice for ModulesState {
    const PATH: &'static str = "modules/state";
}

impl Slice for LecturesState {
    const PATH: &'static str = "lectures/state";
}

impl Slice for BlogsState {
    const PATH: &'static str = "blogs/state";
}

impl Slice for UsersState {
    const PATH: &'static str = "users/state";
}

impl Slice for EnrollmentsState {
    const PATH: &'static str = "enrollments/state";
}
