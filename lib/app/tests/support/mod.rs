//! In-process LMS backend for application-layer tests.
//!
//! Extends the auth endpoints with the admin and enrollment surfaces
//! the actions drive, all against an in-memory record set.
#![allow(dead_code)]

use std::collections::{HashMap, HashSet, VecDeque};
use std::path::{Path as FsPath, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Path, State};
use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, patch, post};
use axum::{Json, Router};
use serde_json::json;

use openlms_app::{App, AppConfig, AuthState};
use openlms_core::{
    now_rfc3339, EnrollmentRequest, EnrollmentStatus, Role, User, UserStatus,
};

pub const EMAIL: &str = "a@b.com";
pub const PASSWORD: &str = "secret1";
pub const USER_ID: &str = "u1";
pub const OTHER_ID: &str = "u2";
pub const REFRESH_COOKIE: &str = "refreshToken=rt-1";

pub fn sample_user(id: &str, email: &str, role: Role) -> User {
    User {
        id: id.to_string(),
        name: format!("User {}", id),
        email: email.to_string(),
        role,
        status: UserStatus::InProgress,
        is_deleted: false,
        created_at: now_rfc3339(),
        updated_at: now_rfc3339(),
    }
}

/// Sign a throwaway JWT whose `exp` lies `offset_secs` from now.
pub fn mint_jwt(offset_secs: i64) -> String {
    #[derive(serde::Serialize)]
    struct Claims {
        sub: String,
        exp: i64,
    }
    jsonwebtoken::encode(
        &jsonwebtoken::Header::default(),
        &Claims {
            sub: USER_ID.to_string(),
            exp: chrono::Utc::now().timestamp() + offset_secs,
        },
        &jsonwebtoken::EncodingKey::from_secret(b"test-secret"),
    )
    .unwrap()
}

// ── Mock backend ────────────────────────────────────────────────────

pub struct MockState {
    users: Mutex<HashMap<String, User>>,
    enrollments: Mutex<HashMap<String, EnrollmentRequest>>,
    valid_tokens: Mutex<HashSet<String>>,
    next_tokens: Mutex<VecDeque<String>>,
    login_token: Mutex<String>,
    refresh_hits: AtomicUsize,
    users_hits: AtomicUsize,
    courses_hits: AtomicUsize,
    logout_hits: AtomicUsize,
    refresh_fail: AtomicBool,
    courses_500: AtomicBool,
}

impl MockState {
    fn new() -> Self {
        let mut users = HashMap::new();
        users.insert(USER_ID.to_string(), sample_user(USER_ID, EMAIL, Role::User));
        users.insert(
            OTHER_ID.to_string(),
            sample_user(OTHER_ID, "other@b.com", Role::User),
        );
        let mut enrollments = HashMap::new();
        enrollments.insert(
            "e1".to_string(),
            EnrollmentRequest {
                id: "e1".into(),
                user_id: USER_ID.into(),
                course_id: "c1".into(),
                status: EnrollmentStatus::Pending,
                is_deleted: false,
                created_at: now_rfc3339(),
                updated_at: now_rfc3339(),
            },
        );
        Self {
            users: Mutex::new(users),
            enrollments: Mutex::new(enrollments),
            valid_tokens: Mutex::new(HashSet::new()),
            next_tokens: Mutex::new(VecDeque::new()),
            login_token: Mutex::new("tok1".to_string()),
            refresh_hits: AtomicUsize::new(0),
            users_hits: AtomicUsize::new(0),
            courses_hits: AtomicUsize::new(0),
            logout_hits: AtomicUsize::new(0),
            refresh_fail: AtomicBool::new(false),
            courses_500: AtomicBool::new(false),
        }
    }

    fn token_valid(&self, headers: &HeaderMap) -> bool {
        headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .map(|t| self.valid_tokens.lock().unwrap().contains(t))
            .unwrap_or(false)
    }
}

fn unauthorized(message: &str) -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({ "message": message })),
    )
        .into_response()
}

fn not_found(message: &str) -> Response {
    (StatusCode::NOT_FOUND, Json(json!({ "message": message }))).into_response()
}

#[derive(serde::Deserialize)]
struct LoginBody {
    email: String,
    password: String,
}

#[derive(serde::Deserialize)]
struct RoleBody {
    role: Role,
}

#[derive(serde::Deserialize)]
struct StatusBody {
    status: UserStatus,
}

async fn healthz() -> &'static str {
    "ok"
}

async fn login(State(state): State<Arc<MockState>>, Json(body): Json<LoginBody>) -> Response {
    if body.email != EMAIL || body.password != PASSWORD {
        return unauthorized("invalid email or password");
    }
    let token = state.login_token.lock().unwrap().clone();
    state.valid_tokens.lock().unwrap().insert(token.clone());
    let user = state.users.lock().unwrap().get(USER_ID).cloned().unwrap();
    let mut resp = Json(json!({ "user": user, "accessToken": token })).into_response();
    resp.headers_mut().insert(
        header::SET_COOKIE,
        HeaderValue::from_static("refreshToken=rt-1; HttpOnly; Path=/"),
    );
    resp
}

async fn refresh(State(state): State<Arc<MockState>>, headers: HeaderMap) -> Response {
    state.refresh_hits.fetch_add(1, Ordering::SeqCst);
    let cookie_ok = headers
        .get(header::COOKIE)
        .and_then(|v| v.to_str().ok())
        .map(|c| c.contains(REFRESH_COOKIE))
        .unwrap_or(false);
    if state.refresh_fail.load(Ordering::SeqCst) || !cookie_ok {
        return unauthorized("refresh token invalid");
    }
    let Some(token) = state.next_tokens.lock().unwrap().pop_front() else {
        return unauthorized("refresh token exhausted");
    };
    state.valid_tokens.lock().unwrap().insert(token.clone());
    let user = state.users.lock().unwrap().get(USER_ID).cloned().unwrap();
    Json(json!({ "user": user, "accessToken": token })).into_response()
}

async fn logout(State(state): State<Arc<MockState>>) -> Response {
    state.logout_hits.fetch_add(1, Ordering::SeqCst);
    Json(json!({ "message": "logged out" })).into_response()
}

async fn list_users(State(state): State<Arc<MockState>>, headers: HeaderMap) -> Response {
    if !state.token_valid(&headers) {
        return unauthorized("jwt expired");
    }
    let users: Vec<User> = state.users.lock().unwrap().values().cloned().collect();
    let total = users.len();
    Json(json!({ "items": users, "total": total })).into_response()
}

async fn get_user(
    State(state): State<Arc<MockState>>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Response {
    state.users_hits.fetch_add(1, Ordering::SeqCst);
    if !state.token_valid(&headers) {
        return unauthorized("jwt expired");
    }
    match state.users.lock().unwrap().get(&id) {
        Some(u) => Json(u.clone()).into_response(),
        None => not_found("user not found"),
    }
}

async fn patch_role(
    State(state): State<Arc<MockState>>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(body): Json<RoleBody>,
) -> Response {
    if !state.token_valid(&headers) {
        return unauthorized("jwt expired");
    }
    let mut users = state.users.lock().unwrap();
    match users.get_mut(&id) {
        Some(u) => {
            u.role = body.role;
            u.updated_at = now_rfc3339();
            Json(u.clone()).into_response()
        }
        None => not_found("user not found"),
    }
}

async fn patch_status(
    State(state): State<Arc<MockState>>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(body): Json<StatusBody>,
) -> Response {
    if !state.token_valid(&headers) {
        return unauthorized("jwt expired");
    }
    let mut users = state.users.lock().unwrap();
    match users.get_mut(&id) {
        Some(u) => {
            u.status = body.status;
            u.updated_at = now_rfc3339();
            Json(u.clone()).into_response()
        }
        None => not_found("user not found"),
    }
}

async fn delete_user(
    State(state): State<Arc<MockState>>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Response {
    if !state.token_valid(&headers) {
        return unauthorized("jwt expired");
    }
    let mut users = state.users.lock().unwrap();
    match users.get_mut(&id) {
        Some(u) => {
            u.is_deleted = true;
            u.updated_at = now_rfc3339();
            Json(json!({ "message": "deleted" })).into_response()
        }
        None => not_found("user not found"),
    }
}

async fn list_courses(State(state): State<Arc<MockState>>, headers: HeaderMap) -> Response {
    state.courses_hits.fetch_add(1, Ordering::SeqCst);
    if state.courses_500.load(Ordering::SeqCst) {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "message": "boom" })),
        )
            .into_response();
    }
    if !state.token_valid(&headers) {
        return unauthorized("jwt expired");
    }
    Json(json!({
        "items": [{
            "_id": "c1",
            "title": "Rust for Web Developers",
            "description": "",
            "isDeleted": false,
            "createdAt": now_rfc3339(),
            "updatedAt": now_rfc3339(),
        }],
        "total": 1
    }))
    .into_response()
}

#[derive(serde::Deserialize)]
#[serde(rename_all = "camelCase")]
struct EnrollBody {
    course_id: String,
}

async fn create_enrollment(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    Json(body): Json<EnrollBody>,
) -> Response {
    if !state.token_valid(&headers) {
        return unauthorized("jwt expired");
    }
    let mut rows = state.enrollments.lock().unwrap();
    let id = format!("e{}", rows.len() + 1);
    let row = EnrollmentRequest {
        id: id.clone(),
        user_id: USER_ID.into(),
        course_id: body.course_id,
        status: EnrollmentStatus::Pending,
        is_deleted: false,
        created_at: now_rfc3339(),
        updated_at: now_rfc3339(),
    };
    rows.insert(id, row.clone());
    Json(row).into_response()
}

async fn list_enrollments(State(state): State<Arc<MockState>>, headers: HeaderMap) -> Response {
    if !state.token_valid(&headers) {
        return unauthorized("jwt expired");
    }
    let rows: Vec<EnrollmentRequest> =
        state.enrollments.lock().unwrap().values().cloned().collect();
    let total = rows.len();
    Json(json!({ "items": rows, "total": total })).into_response()
}

async fn my_enrollments(State(state): State<Arc<MockState>>, headers: HeaderMap) -> Response {
    if !state.token_valid(&headers) {
        return unauthorized("jwt expired");
    }
    let rows: Vec<EnrollmentRequest> = state
        .enrollments
        .lock()
        .unwrap()
        .values()
        .filter(|r| r.user_id == USER_ID)
        .cloned()
        .collect();
    let total = rows.len();
    Json(json!({ "items": rows, "total": total })).into_response()
}

async fn decide_enrollment(
    state: &MockState,
    id: &str,
    headers: &HeaderMap,
    status: EnrollmentStatus,
) -> Response {
    if !state.token_valid(headers) {
        return unauthorized("jwt expired");
    }
    let mut rows = state.enrollments.lock().unwrap();
    match rows.get_mut(id) {
        Some(r) => {
            r.status = status;
            r.updated_at = now_rfc3339();
            Json(r.clone()).into_response()
        }
        None => not_found("request not found"),
    }
}

async fn approve_enrollment(
    State(state): State<Arc<MockState>>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Response {
    decide_enrollment(&state, &id, &headers, EnrollmentStatus::Approved).await
}

async fn reject_enrollment(
    State(state): State<Arc<MockState>>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Response {
    decide_enrollment(&state, &id, &headers, EnrollmentStatus::Rejected).await
}

fn router(state: Arc<MockState>) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/auth/login", post(login))
        .route("/auth/refresh-token", post(refresh))
        .route("/auth/logout", post(logout))
        .route("/auth/logout-all", post(logout))
        .route("/users", get(list_users))
        .route("/users/{id}", get(get_user).delete(delete_user))
        .route("/users/{id}/role", patch(patch_role))
        .route("/users/{id}/status", patch(patch_status))
        .route("/courses", get(list_courses))
        .route(
            "/enrollment-requests",
            get(list_enrollments).post(create_enrollment),
        )
        .route("/enrollment-requests/my", get(my_enrollments))
        .route("/enrollment-requests/{id}/approve", patch(approve_enrollment))
        .route("/enrollment-requests/{id}/reject", patch(reject_enrollment))
        .with_state(state)
}

pub struct TestBackend {
    pub url: String,
    state: Arc<MockState>,
}

impl TestBackend {
    pub async fn spawn() -> Self {
        let state = Arc::new(MockState::new());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let app = router(Arc::clone(&state));
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        let url = format!("http://{}", addr);
        for _ in 0..50 {
            if reqwest::get(format!("{}/healthz", url)).await.is_ok() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        TestBackend { url, state }
    }

    pub fn refresh_hits(&self) -> usize {
        self.state.refresh_hits.load(Ordering::SeqCst)
    }

    pub fn users_hits(&self) -> usize {
        self.state.users_hits.load(Ordering::SeqCst)
    }

    pub fn logout_hits(&self) -> usize {
        self.state.logout_hits.load(Ordering::SeqCst)
    }

    pub fn set_login_token(&self, token: &str) {
        *self.state.login_token.lock().unwrap() = token.to_string();
    }

    pub fn queue_refresh_token(&self, token: &str) {
        self.state
            .next_tokens
            .lock()
            .unwrap()
            .push_back(token.to_string());
    }

    pub fn invalidate_token(&self, token: &str) {
        self.state.valid_tokens.lock().unwrap().remove(token);
    }

    pub fn fail_refresh(&self, on: bool) {
        self.state.refresh_fail.store(on, Ordering::SeqCst);
    }

    pub fn fail_courses(&self, on: bool) {
        self.state.courses_500.store(on, Ordering::SeqCst);
    }

    pub fn update_user(&self, id: &str, f: impl FnOnce(&mut User)) {
        if let Some(u) = self.state.users.lock().unwrap().get_mut(id) {
            f(u);
        }
    }
}

// ── App under test ──────────────────────────────────────────────────

pub struct TestBed {
    pub dir: tempfile::TempDir,
}

impl TestBed {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().unwrap(),
        }
    }

    pub fn session_path(&self) -> PathBuf {
        self.dir.path().join("session.json")
    }

    /// Build an app context against `url` with a fast validator.
    pub fn app(&self, url: &str, interval_ms: u64) -> Arc<App> {
        build_app(url, &self.session_path(), interval_ms)
    }
}

pub fn build_app(url: &str, session_path: &FsPath, interval_ms: u64) -> Arc<App> {
    let mut config = AppConfig::new(url, session_path);
    config.validate_interval = Duration::from_millis(interval_ms);
    App::new(config).unwrap()
}

/// Record every value written to `auth/state`, in order.
pub fn record_auth_states(app: &App) -> Arc<Mutex<Vec<AuthState>>> {
    let states: Arc<Mutex<Vec<AuthState>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&states);
    app.store().subscribe("auth/state", move |_, value| {
        if let Some(s) = value.downcast_ref::<AuthState>() {
            sink.lock().unwrap().push(s.clone());
        }
    });
    states
}

pub fn auth_state(app: &App) -> AuthState {
    app.store().read::<AuthState>().unwrap()
}

pub async fn wait_until(mut cond: impl FnMut() -> bool) {
    for _ in 0..80 {
        if cond() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(25)).await;
    }
    panic!("condition not met within 2s");
}
