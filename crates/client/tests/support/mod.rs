//! In-process mock of the blog API, bound to an ephemeral port.
//!
//! Tokens are opaque strings tracked in memory (or unsigned-for-us JWTs in
//! JWT mode) so tests can expire, revoke and inspect them directly.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Path, Query, Request, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use serde_json::{Value, json};

use quire_client::{ApiClient, ClientConfig, TokenStore};

pub const JWT_SECRET: &str = "mock-server-secret";

#[derive(Debug, Clone)]
pub struct Seen {
    pub method: String,
    pub path: String,
    pub authorization: Option<String>,
}

#[derive(Debug, Clone)]
pub struct MockUser {
    pub id: i64,
    pub password: String,
    pub is_staff: bool,
    pub groups: Vec<String>,
    pub display_name: String,
}

#[derive(Default)]
pub struct MockState {
    next_token: AtomicUsize,
    next_id: AtomicUsize,
    access: Mutex<HashMap<String, String>>,
    refresh: Mutex<HashMap<String, String>>,
    users: Mutex<HashMap<String, MockUser>>,
    comments: Mutex<Vec<Value>>,
    seen: Mutex<Vec<Seen>>,
    pub refresh_disabled: AtomicBool,
    pub jwt_access: AtomicBool,
    /// How far the server's clock runs ahead of ours, in seconds.
    pub clock_ahead_secs: AtomicI64,
    pub refresh_calls: AtomicUsize,
    pub me_calls: AtomicUsize,
}

impl MockState {
    pub fn add_user(&self, username: &str, password: &str, is_staff: bool, groups: &[&str]) {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) as i64 + 1;
        self.users.lock().unwrap().insert(
            username.to_string(),
            MockUser {
                id,
                password: password.to_string(),
                is_staff,
                groups: groups.iter().map(|g| g.to_string()).collect(),
                display_name: String::new(),
            },
        );
    }

    pub fn user(&self, username: &str) -> Option<MockUser> {
        self.users.lock().unwrap().get(username).cloned()
    }

    /// Mint a fresh access token for `username` and remember it as valid.
    pub fn issue_access(&self, username: &str) -> String {
        let n = self.next_token.fetch_add(1, Ordering::SeqCst) + 1;
        let token = if self.jwt_access.load(Ordering::SeqCst) {
            let user = self.user(username).expect("unknown mock user");
            let now = Utc::now().timestamp() + self.clock_ahead_secs.load(Ordering::SeqCst);
            mint_jwt(json!({
                "token_type": "access",
                "exp": now + 300,
                "iat": now,
                "jti": format!("jti-{n}"),
                "user_id": user.id.to_string(),
                "username": username,
                "is_staff": user.is_staff,
                "groups": user.groups,
            }))
        } else {
            format!("access-{n}")
        };
        self.access
            .lock()
            .unwrap()
            .insert(token.clone(), username.to_string());
        token
    }

    /// Mint a full pair, as `POST /token/` would.
    pub fn issue_pair(&self, username: &str) -> (String, String) {
        let access = self.issue_access(username);
        let n = self.next_token.fetch_add(1, Ordering::SeqCst) + 1;
        let refresh = format!("refresh-{n}");
        self.refresh
            .lock()
            .unwrap()
            .insert(refresh.clone(), username.to_string());
        (access, refresh)
    }

    /// Make an access token stop working, as if it had expired.
    pub fn expire_access(&self, token: &str) {
        self.access.lock().unwrap().remove(token);
    }

    pub fn seen(&self) -> Vec<Seen> {
        self.seen.lock().unwrap().clone()
    }

    pub fn seen_at(&self, path: &str) -> Vec<Seen> {
        self.seen().into_iter().filter(|s| s.path == path).collect()
    }

    pub fn request_count(&self) -> usize {
        self.seen.lock().unwrap().len()
    }

    pub fn refresh_calls(&self) -> usize {
        self.refresh_calls.load(Ordering::SeqCst)
    }

    pub fn me_calls(&self) -> usize {
        self.me_calls.load(Ordering::SeqCst)
    }

    fn authorized(&self, headers: &HeaderMap) -> Option<String> {
        let token = headers
            .get(header::AUTHORIZATION)?
            .to_str()
            .ok()?
            .strip_prefix("Bearer ")?;
        self.access.lock().unwrap().get(token).cloned()
    }

    fn me_json(&self, username: &str) -> Value {
        let user = self.user(username).expect("unknown mock user");
        json!({
            "id": user.id,
            "username": username,
            "email": format!("{username}@example.com"),
            "first_name": "",
            "last_name": "",
            "is_staff": user.is_staff,
            "is_superuser": false,
            "groups": user.groups,
            "profile": {
                "username": username,
                "display_name": user.display_name,
                "bio": "",
                "avatar_url": ""
            }
        })
    }
}

pub fn mint_jwt(claims: Value) -> String {
    jsonwebtoken::encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(JWT_SECRET.as_bytes()),
    )
    .expect("failed to encode jwt")
}

fn articles() -> Vec<Value> {
    vec![
        json!({
            "id": 1, "title": "First", "content": "one",
            "published_at": "2024-01-01T09:00:00Z", "author_name": "alice",
            "tags": [{ "id": 1, "name": "rust" }]
        }),
        json!({
            "id": 2, "title": "Second", "content": "two",
            "published_at": "2024-02-01T09:00:00Z", "author_name": "bob",
            "tags": [{ "id": 2, "name": "web" }]
        }),
        json!({
            "id": 3, "title": "Third", "content": "three",
            "published_at": "2024-03-01T09:00:00Z", "author_name": "bob",
            "tags": [{ "id": 1, "name": "rust" }, { "id": 2, "name": "web" }]
        }),
    ]
}

fn unauthorized() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({
            "detail": "Given token not valid for any token type",
            "code": "token_not_valid"
        })),
    )
        .into_response()
}

type Shared = State<Arc<MockState>>;

async fn record(State(state): Shared, req: Request, next: Next) -> Response {
    let authorization = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    state.seen.lock().unwrap().push(Seen {
        method: req.method().to_string(),
        path: req.uri().path().to_string(),
        authorization,
    });
    next.run(req).await
}

async fn obtain_pair(State(state): Shared, Json(body): Json<Value>) -> Response {
    let username = body["username"].as_str().unwrap_or_default();
    let password = body["password"].as_str().unwrap_or_default();

    match state.user(username) {
        Some(user) if user.password == password => {
            let (access, refresh) = state.issue_pair(username);
            Json(json!({ "access": access, "refresh": refresh })).into_response()
        }
        _ => (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "detail": "No active account found with the given credentials" })),
        )
            .into_response(),
    }
}

async fn refresh(State(state): Shared, Json(body): Json<Value>) -> Response {
    state.refresh_calls.fetch_add(1, Ordering::SeqCst);
    if state.refresh_disabled.load(Ordering::SeqCst) {
        return unauthorized();
    }

    let token = body["refresh"].as_str().unwrap_or_default();
    let owner = state.refresh.lock().unwrap().get(token).cloned();
    match owner {
        Some(username) => Json(json!({ "access": state.issue_access(&username) })).into_response(),
        None => unauthorized(),
    }
}

async fn register(State(state): Shared, Json(body): Json<Value>) -> Response {
    let username = body["username"].as_str().unwrap_or_default().to_string();
    let password = body["password"].as_str().unwrap_or_default().to_string();

    if state.user(&username).is_some() {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "username": ["Username is already taken."] })),
        )
            .into_response();
    }
    state.add_user(&username, &password, false, &[]);
    (
        StatusCode::CREATED,
        Json(json!({ "username": username, "email": "" })),
    )
        .into_response()
}

async fn me(State(state): Shared, headers: HeaderMap) -> Response {
    state.me_calls.fetch_add(1, Ordering::SeqCst);
    match state.authorized(&headers) {
        Some(username) => Json(state.me_json(&username)).into_response(),
        None => unauthorized(),
    }
}

async fn update_me(State(state): Shared, headers: HeaderMap, Json(body): Json<Value>) -> Response {
    let Some(username) = state.authorized(&headers) else {
        return unauthorized();
    };
    if let Some(name) = body["profile"]["display_name"].as_str() {
        if let Some(user) = state.users.lock().unwrap().get_mut(&username) {
            user.display_name = name.to_string();
        }
    }
    Json(state.me_json(&username)).into_response()
}

async fn echo() -> Response {
    Json(json!({ "ok": true })).into_response()
}

async fn always_unauthorized() -> Response {
    unauthorized()
}

async fn slow() -> Response {
    tokio::time::sleep(Duration::from_secs(2)).await;
    Json(json!({ "ok": true })).into_response()
}

async fn list_articles(Query(params): Query<HashMap<String, String>>) -> Response {
    let all = articles();
    match params.get("tags__name") {
        // Filtered view answers with a bare array.
        Some(tag) => {
            let filtered: Vec<Value> = all
                .into_iter()
                .filter(|a| {
                    a["tags"]
                        .as_array()
                        .is_some_and(|tags| tags.iter().any(|t| t["name"] == tag.as_str()))
                })
                .collect();
            Json(Value::Array(filtered)).into_response()
        }
        None => Json(json!({
            "count": all.len(),
            "next": null,
            "previous": null,
            "results": all
        }))
        .into_response(),
    }
}

async fn article_detail(Path(id): Path<String>) -> Response {
    if id == "latest" {
        let mut all = articles();
        all.reverse();
        return Json(Value::Array(all)).into_response();
    }

    let found = articles()
        .into_iter()
        .find(|a| a["id"].to_string() == id);
    match found {
        Some(article) => Json(article).into_response(),
        None => (StatusCode::NOT_FOUND, Json(json!({ "detail": "Not found." }))).into_response(),
    }
}

async fn list_comments(State(state): Shared, Path(article_id): Path<i64>) -> Response {
    let results: Vec<Value> = state
        .comments
        .lock()
        .unwrap()
        .iter()
        .filter(|c| c["article"] == article_id)
        .cloned()
        .collect();
    Json(json!({ "count": results.len(), "next": null, "previous": null, "results": results }))
        .into_response()
}

async fn create_comment(
    State(state): Shared,
    Path(article_id): Path<i64>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let Some(username) = state.authorized(&headers) else {
        return unauthorized();
    };
    let mut comments = state.comments.lock().unwrap();
    let comment = json!({
        "id": comments.len() + 1,
        "article": article_id,
        "content": body["content"],
        "author_name": username,
        "created_at": Utc::now().to_rfc3339(),
    });
    comments.push(comment.clone());
    (StatusCode::CREATED, Json(comment)).into_response()
}

async fn delete_comment(State(state): Shared, Path(id): Path<i64>, headers: HeaderMap) -> Response {
    if state.authorized(&headers).is_none() {
        return unauthorized();
    }
    state.comments.lock().unwrap().retain(|c| c["id"] != id);
    StatusCode::NO_CONTENT.into_response()
}

fn router(state: Arc<MockState>) -> Router {
    Router::new()
        .route("/api/token/", post(obtain_pair))
        .route("/api/token/refresh/", post(refresh))
        .route("/api/register/", post(register))
        .route("/api/me/", get(me).patch(update_me))
        .route("/api/echo/", get(echo))
        .route("/api/always-401/", get(always_unauthorized))
        .route("/api/slow/", get(slow))
        .route("/api/articles/", get(list_articles))
        .route("/api/articles/:id/", get(article_detail))
        .route("/api/articles/:id/comments/", get(list_comments).post(create_comment))
        .route("/api/comments/:id/", axum::routing::delete(delete_comment))
        .layer(middleware::from_fn_with_state(state.clone(), record))
        .with_state(state)
}

pub struct TestServer {
    pub base_url: String,
    pub state: Arc<MockState>,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    pub async fn spawn() -> Self {
        let state = Arc::new(MockState::default());
        state.add_user("alice", "wonderland", false, &[]);
        state.add_user("bob", "builder", false, &[]);
        state.add_user("root", "toor", true, &[]);
        state.add_user("carol", "writes", false, &["writer"]);

        let app = router(state.clone());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}/api", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url,
            state,
            handle,
        }
    }

    pub fn config(&self) -> ClientConfig {
        ClientConfig::new(&self.base_url)
    }

    pub fn client(&self, tokens: Arc<dyn TokenStore>) -> ApiClient {
        ApiClient::new(&self.config(), tokens).expect("failed to build client")
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
