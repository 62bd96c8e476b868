//! In-process LMS backend for integration tests.
//!
//! Serves the auth and resource endpoints the client talks to, with
//! knobs for rotating tokens, failing refreshes, and editing the user
//! record mid-session. Counters record what the client actually sent.
#![allow(dead_code)]

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Path, State};
use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;

use openlms_client::{EventSink, Http, SessionEvent, SessionStore, TokenManager};
use openlms_core::{now_rfc3339, Role, User, UserStatus};

pub const EMAIL: &str = "a@b.com";
pub const PASSWORD: &str = "secret1";
pub const USER_ID: &str = "u1";
pub const REFRESH_COOKIE: &str = "refreshToken=rt-1";

pub fn sample_user(id: &str, role: Role) -> User {
    User {
        id: id.to_string(),
        name: "Abu Bakkor".to_string(),
        email: EMAIL.to_string(),
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

pub struct BackendState {
    users: Mutex<HashMap<String, User>>,
    valid_tokens: Mutex<HashSet<String>>,
    next_tokens: Mutex<VecDeque<String>>,
    login_token: Mutex<String>,
    refresh_hits: AtomicUsize,
    courses_hits: AtomicUsize,
    users_hits: AtomicUsize,
    refresh_fail: AtomicBool,
    reject_resources: AtomicBool,
    resources_500: AtomicBool,
    refresh_delay_ms: AtomicU64,
    course_auth: Mutex<Vec<Option<String>>>,
    logout_auth: Mutex<Vec<Option<String>>>,
}

impl BackendState {
    fn new() -> Self {
        let mut users = HashMap::new();
        users.insert(USER_ID.to_string(), sample_user(USER_ID, Role::User));
        Self {
            users: Mutex::new(users),
            valid_tokens: Mutex::new(HashSet::new()),
            next_tokens: Mutex::new(VecDeque::new()),
            login_token: Mutex::new("tok1".to_string()),
            refresh_hits: AtomicUsize::new(0),
            courses_hits: AtomicUsize::new(0),
            users_hits: AtomicUsize::new(0),
            refresh_fail: AtomicBool::new(false),
            reject_resources: AtomicBool::new(false),
            resources_500: AtomicBool::new(false),
            refresh_delay_ms: AtomicU64::new(0),
            course_auth: Mutex::new(Vec::new()),
            logout_auth: Mutex::new(Vec::new()),
        }
    }

    fn token_valid(&self, headers: &HeaderMap) -> bool {
        match bearer(headers) {
            Some(t) => self.valid_tokens.lock().unwrap().contains(&t),
            None => false,
        }
    }
}

fn bearer(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(String::from)
}

fn raw_auth(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(String::from)
}

fn unauthorized(message: &str) -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({ "message": message })),
    )
        .into_response()
}

#[derive(serde::Deserialize)]
struct LoginBody {
    email: String,
    password: String,
}

async fn healthz() -> &'static str {
    "ok"
}

async fn login(State(state): State<Arc<BackendState>>, Json(body): Json<LoginBody>) -> Response {
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

async fn refresh(State(state): State<Arc<BackendState>>, headers: HeaderMap) -> Response {
    state.refresh_hits.fetch_add(1, Ordering::SeqCst);
    let delay = state.refresh_delay_ms.load(Ordering::SeqCst);
    if delay > 0 {
        tokio::time::sleep(Duration::from_millis(delay)).await;
    }
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

async fn logout(State(state): State<Arc<BackendState>>, headers: HeaderMap) -> Response {
    state.logout_auth.lock().unwrap().push(raw_auth(&headers));
    Json(json!({ "message": "logged out" })).into_response()
}

async fn get_user(
    State(state): State<Arc<BackendState>>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Response {
    state.users_hits.fetch_add(1, Ordering::SeqCst);
    if !state.token_valid(&headers) {
        return unauthorized("jwt expired");
    }
    match state.users.lock().unwrap().get(&id) {
        Some(u) => Json(u.clone()).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(json!({ "message": "user not found" })),
        )
            .into_response(),
    }
}

async fn list_courses(State(state): State<Arc<BackendState>>, headers: HeaderMap) -> Response {
    state.courses_hits.fetch_add(1, Ordering::SeqCst);
    state.course_auth.lock().unwrap().push(raw_auth(&headers));
    if state.resources_500.load(Ordering::SeqCst) {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "message": "boom" })),
        )
            .into_response();
    }
    if state.reject_resources.load(Ordering::SeqCst) || !state.token_valid(&headers) {
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

fn router(state: Arc<BackendState>) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/auth/login", post(login))
        .route("/auth/refresh-token", post(refresh))
        .route("/auth/logout", post(logout))
        .route("/auth/logout-all", post(logout))
        .route("/users/{id}", get(get_user))
        .route("/courses", get(list_courses))
        .with_state(state)
}

pub struct TestBackend {
    pub url: String,
    state: Arc<BackendState>,
}

impl TestBackend {
    pub async fn spawn() -> Self {
        let state = Arc::new(BackendState::new());
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

    pub fn courses_hits(&self) -> usize {
        self.state.courses_hits.load(Ordering::SeqCst)
    }

    pub fn users_hits(&self) -> usize {
        self.state.users_hits.load(Ordering::SeqCst)
    }

    /// Token handed out by the next login.
    pub fn set_login_token(&self, token: &str) {
        *self.state.login_token.lock().unwrap() = token.to_string();
    }

    /// Token handed out by the next successful refresh.
    pub fn queue_refresh_token(&self, token: &str) {
        self.state
            .next_tokens
            .lock()
            .unwrap()
            .push_back(token.to_string());
    }

    /// Server-side token rotation: `token` stops being accepted.
    pub fn invalidate_token(&self, token: &str) {
        self.state.valid_tokens.lock().unwrap().remove(token);
    }

    pub fn fail_refresh(&self, on: bool) {
        self.state.refresh_fail.store(on, Ordering::SeqCst);
    }

    /// Make `/courses` answer 401 regardless of the token.
    pub fn reject_resources(&self, on: bool) {
        self.state.reject_resources.store(on, Ordering::SeqCst);
    }

    /// Make `/courses` answer 500.
    pub fn fail_resources(&self, on: bool) {
        self.state.resources_500.store(on, Ordering::SeqCst);
    }

    /// Hold each refresh response for `ms`, so concurrent callers
    /// overlap a flight.
    pub fn set_refresh_delay(&self, ms: u64) {
        self.state.refresh_delay_ms.store(ms, Ordering::SeqCst);
    }

    pub fn course_auth_headers(&self) -> Vec<Option<String>> {
        self.state.course_auth.lock().unwrap().clone()
    }

    pub fn logout_auth_headers(&self) -> Vec<Option<String>> {
        self.state.logout_auth.lock().unwrap().clone()
    }

    pub fn update_user(&self, id: &str, f: impl FnOnce(&mut User)) {
        if let Some(u) = self.state.users.lock().unwrap().get_mut(id) {
            f(u);
        }
    }

    pub fn remove_user(&self, id: &str) {
        self.state.users.lock().unwrap().remove(id);
    }
}

// ── Client stack under test ─────────────────────────────────────────

pub struct TestClient {
    pub sessions: SessionStore,
    pub manager: TokenManager,
    pub http: Http,
    events: Arc<Mutex<Vec<SessionEvent>>>,
    _dir: tempfile::TempDir,
}

impl TestClient {
    pub fn new(base_url: &str) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let sessions = SessionStore::load(dir.path().join("session.json")).unwrap();
        let events: Arc<Mutex<Vec<SessionEvent>>> = Arc::new(Mutex::new(Vec::new()));
        let sink: EventSink = {
            let events = Arc::clone(&events);
            Arc::new(move |e| events.lock().unwrap().push(e))
        };
        let client = reqwest::Client::builder()
            .cookie_store(true)
            .build()
            .unwrap();
        let manager = TokenManager::new(client.clone(), base_url, sessions.clone(), sink);
        let http = Http::new(client, base_url, Arc::new(manager.clone()));
        TestClient {
            sessions,
            manager,
            http,
            events,
            _dir: dir,
        }
    }

    /// Sign in and persist the session the way the application layer
    /// does.
    pub async fn login(&self) -> openlms_client::Session {
        let api = openlms_client::api::AuthApi::new(self.http.clone());
        let session = api.login(EMAIL, PASSWORD).await.unwrap();
        self.sessions.put(session.clone()).unwrap();
        session
    }

    /// A fresh sink feeding the same recorded event list.
    pub fn sink(&self) -> EventSink {
        let events = Arc::clone(&self.events);
        Arc::new(move |e| events.lock().unwrap().push(e))
    }

    pub fn events(&self) -> Vec<SessionEvent> {
        self.events.lock().unwrap().clone()
    }
}
