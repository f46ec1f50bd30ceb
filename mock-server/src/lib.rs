//! In-process stand-in for the JSONPlaceholder REST API.
//!
//! Serves the `users`, `posts` and `todos` resources the client scenarios
//! touch, seeded with deterministic data, plus a handful of diagnostic routes
//! that let tests provoke each client outcome on demand:
//!
//! - `/echo` reflects method, query, headers and body as JSON
//! - `/delay/{ms}` answers after sleeping `ms` milliseconds
//! - `/status/{code}` answers with an arbitrary status and a text body
//! - `/text` answers with a plain-text body
//! - `/malformed` claims `application/json` but sends a truncated document
//! - `/empty-json` claims `application/json` with a 200 and sends nothing
//! - `/no-content` answers 204 under an `application/json` content type
//! - `/cookies` sends `set-cookie` twice
//!
//! Every request passing through the router bumps a hit counter readable via
//! [`AppState::hits`].

use std::{
    collections::{BTreeMap, HashMap},
    net::SocketAddr,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
    time::Duration,
};

use axum::{
    extract::{Path, Query, Request, State},
    http::{header, HeaderMap, HeaderValue, Method, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{any, get},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::RwLock};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: u64,
    pub name: String,
    pub username: String,
    pub email: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: u64,
    pub user_id: u64,
    pub title: String,
    pub body: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Todo {
    pub id: u64,
    pub user_id: u64,
    pub title: String,
    pub completed: bool,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPost {
    pub user_id: u64,
    pub title: String,
    pub body: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostPatch {
    pub user_id: Option<u64>,
    pub title: Option<String>,
    pub body: Option<String>,
}

#[derive(Deserialize)]
pub struct PostFilter {
    #[serde(rename = "userId")]
    pub user_id: Option<u64>,
}

pub const USER_COUNT: u64 = 10;
pub const POSTS_PER_USER: u64 = 10;
pub const TODOS_PER_USER: u64 = 20;

#[derive(Debug, Default)]
struct Db {
    users: BTreeMap<u64, User>,
    posts: BTreeMap<u64, Post>,
    todos: BTreeMap<u64, Todo>,
}

impl Db {
    fn seeded() -> Self {
        let mut db = Db::default();
        for id in 1..=USER_COUNT {
            db.users.insert(
                id,
                User {
                    id,
                    name: format!("User {id}"),
                    username: format!("user{id}"),
                    email: format!("user{id}@example.test"),
                },
            );
        }
        for id in 1..=USER_COUNT * POSTS_PER_USER {
            let user_id = (id - 1) / POSTS_PER_USER + 1;
            db.posts.insert(
                id,
                Post {
                    id,
                    user_id,
                    title: format!("post {id} by user {user_id}"),
                    body: format!("body of post {id}"),
                },
            );
        }
        for id in 1..=USER_COUNT * TODOS_PER_USER {
            db.todos.insert(
                id,
                Todo {
                    id,
                    user_id: (id - 1) / TODOS_PER_USER + 1,
                    title: format!("todo {id}"),
                    completed: id % 3 == 0,
                },
            );
        }
        db
    }
}

/// Shared server state: the resource store and the request counter.
#[derive(Clone, Debug)]
pub struct AppState {
    db: Arc<RwLock<Db>>,
    hits: Arc<AtomicUsize>,
}

impl AppState {
    pub fn seeded() -> Self {
        Self {
            db: Arc::new(RwLock::new(Db::seeded())),
            hits: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Number of requests the router has received so far.
    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }
}

pub fn app() -> Router {
    router(AppState::seeded())
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/users", get(list_users))
        .route("/users/{id}", get(get_user))
        .route("/posts", get(list_posts).post(create_post))
        .route(
            "/posts/{id}",
            get(get_post)
                .put(replace_post)
                .patch(patch_post)
                .delete(delete_post),
        )
        .route("/todos/{id}", get(get_todo))
        .route("/echo", any(echo))
        .route("/delay/{ms}", get(delay))
        .route("/status/{code}", any(status))
        .route("/text", get(text))
        .route("/malformed", get(malformed))
        .route("/empty-json", get(empty_json))
        .route("/no-content", get(no_content))
        .route("/cookies", get(cookies))
        .layer(middleware::from_fn_with_state(state.clone(), count_hits))
        .with_state(state)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    serve(listener, AppState::seeded()).await
}

pub async fn serve(listener: TcpListener, state: AppState) -> Result<(), std::io::Error> {
    axum::serve(listener, router(state)).await
}

/// Bind an ephemeral local port and serve a freshly seeded store on the
/// current runtime. Returns the bound address and a handle on the state.
pub async fn spawn() -> Result<(SocketAddr, AppState), std::io::Error> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let state = AppState::seeded();
    let served = state.clone();
    tokio::spawn(async move {
        if let Err(err) = serve(listener, served).await {
            tracing::error!(%err, "mock server stopped");
        }
    });
    Ok((addr, state))
}

async fn count_hits(State(state): State<AppState>, req: Request, next: Next) -> Response {
    state.hits.fetch_add(1, Ordering::SeqCst);
    tracing::debug!(method = %req.method(), uri = %req.uri(), "request");
    next.run(req).await
}

async fn list_users(State(state): State<AppState>) -> Json<Vec<User>> {
    let db = state.db.read().await;
    Json(db.users.values().cloned().collect())
}

async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Json<User>, StatusCode> {
    let db = state.db.read().await;
    db.users.get(&id).cloned().map(Json).ok_or(StatusCode::NOT_FOUND)
}

async fn list_posts(
    State(state): State<AppState>,
    Query(filter): Query<PostFilter>,
) -> Json<Vec<Post>> {
    let db = state.db.read().await;
    Json(
        db.posts
            .values()
            .filter(|post| filter.user_id.map_or(true, |uid| post.user_id == uid))
            .cloned()
            .collect(),
    )
}

async fn get_post(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Json<Post>, StatusCode> {
    let db = state.db.read().await;
    db.posts.get(&id).cloned().map(Json).ok_or(StatusCode::NOT_FOUND)
}

async fn create_post(
    State(state): State<AppState>,
    Json(input): Json<NewPost>,
) -> (StatusCode, Json<Post>) {
    let mut db = state.db.write().await;
    let id = db.posts.keys().next_back().map_or(1, |last| last + 1);
    let post = Post {
        id,
        user_id: input.user_id,
        title: input.title,
        body: input.body,
    };
    db.posts.insert(id, post.clone());
    (StatusCode::CREATED, Json(post))
}

async fn replace_post(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    Json(input): Json<NewPost>,
) -> Result<Json<Post>, StatusCode> {
    let mut db = state.db.write().await;
    let post = db.posts.get_mut(&id).ok_or(StatusCode::NOT_FOUND)?;
    *post = Post {
        id,
        user_id: input.user_id,
        title: input.title,
        body: input.body,
    };
    Ok(Json(post.clone()))
}

async fn patch_post(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    Json(input): Json<PostPatch>,
) -> Result<Json<Post>, StatusCode> {
    let mut db = state.db.write().await;
    let post = db.posts.get_mut(&id).ok_or(StatusCode::NOT_FOUND)?;
    if let Some(user_id) = input.user_id {
        post.user_id = user_id;
    }
    if let Some(title) = input.title {
        post.title = title;
    }
    if let Some(body) = input.body {
        post.body = body;
    }
    Ok(Json(post.clone()))
}

// JSONPlaceholder answers a delete with 200 and an empty object.
async fn delete_post(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Json<Value>, StatusCode> {
    let mut db = state.db.write().await;
    db.posts
        .remove(&id)
        .map(|_| Json(json!({})))
        .ok_or(StatusCode::NOT_FOUND)
}

async fn get_todo(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Json<Todo>, StatusCode> {
    let db = state.db.read().await;
    db.todos.get(&id).cloned().map(Json).ok_or(StatusCode::NOT_FOUND)
}

async fn echo(
    method: Method,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
    body: String,
) -> Json<Value> {
    let headers: BTreeMap<String, String> = headers
        .iter()
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|v| (name.as_str().to_string(), v.to_string()))
        })
        .collect();
    Json(json!({
        "method": method.as_str(),
        "query": query,
        "headers": headers,
        "body": body,
    }))
}

async fn delay(Path(ms): Path<u64>) -> Json<Value> {
    tokio::time::sleep(Duration::from_millis(ms)).await;
    Json(json!({ "delayed_ms": ms }))
}

async fn status(Path(code): Path<u16>) -> Response {
    let status = StatusCode::from_u16(code).unwrap_or(StatusCode::BAD_REQUEST);
    (
        status,
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        format!("status {code}"),
    )
        .into_response()
}

async fn text() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        "plain text body",
    )
}

async fn malformed() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "application/json")],
        r#"{"truncated":"#,
    )
}

async fn empty_json() -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "application/json")], "")
}

async fn no_content() -> impl IntoResponse {
    (
        StatusCode::NO_CONTENT,
        [(header::CONTENT_TYPE, "application/json")],
    )
}

async fn cookies() -> Response {
    let mut headers = HeaderMap::new();
    headers.append(header::SET_COOKIE, HeaderValue::from_static("a=1"));
    headers.append(header::SET_COOKIE, HeaderValue::from_static("b=2"));
    (headers, "ok").into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn post_serializes_with_camel_case_user_id() {
        let post = Post {
            id: 1,
            user_id: 7,
            title: "Test".to_string(),
            body: "Body".to_string(),
        };
        let json = serde_json::to_value(&post).unwrap();
        assert_eq!(json["userId"], 7);
        assert!(json.get("user_id").is_none());
    }

    #[test]
    fn seeded_store_assigns_posts_to_users_in_blocks() {
        let db = Db::seeded();
        assert_eq!(db.users.len() as u64, USER_COUNT);
        assert_eq!(db.posts[&1].user_id, 1);
        assert_eq!(db.posts[&10].user_id, 1);
        assert_eq!(db.posts[&11].user_id, 2);
        assert_eq!(db.posts[&70].user_id, 7);
        assert_eq!(db.todos[&21].user_id, 2);
    }

    #[test]
    fn new_post_rejects_missing_title() {
        let result: Result<NewPost, _> = serde_json::from_str(r#"{"userId":1,"body":"b"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn post_patch_all_fields_optional() {
        let input: PostPatch = serde_json::from_str(r#"{}"#).unwrap();
        assert!(input.user_id.is_none());
        assert!(input.title.is_none());
        assert!(input.body.is_none());
    }

    #[test]
    fn post_filter_reads_user_id_key() {
        let filter: PostFilter = serde_json::from_str(r#"{"userId":3}"#).unwrap();
        assert_eq!(filter.user_id, Some(3));
    }
}
