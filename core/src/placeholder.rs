//! Typed calls against the JSONPlaceholder REST API.
//!
//! # Design
//! The DTOs mirror the public API's camelCase schema but keep only the
//! fields used here; unknown fields in responses are ignored. Each function
//! is a thin layer over `ApiClient` and the `compose` helpers and fails with
//! whatever `RequestError` the underlying call produced.

use serde::{Deserialize, Serialize};

use crate::client::ApiClient;
use crate::compose::{chain, fan_out};
use crate::error::RequestError;
use crate::transport::Transport;

pub const JSONPLACEHOLDER_URL: &str = "https://jsonplaceholder.typicode.com";

/// Users fetched by [`fetch_first_users`].
pub const FIRST_USER_IDS: [u64; 5] = [1, 2, 3, 4, 5];

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct User {
    pub id: u64,
    pub name: String,
    pub username: String,
    pub email: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: u64,
    pub user_id: u64,
    pub title: String,
    pub body: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Todo {
    pub id: u64,
    pub user_id: u64,
    pub title: String,
    pub completed: bool,
}

/// Payload for creating or replacing a post.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPost {
    pub user_id: u64,
    pub title: String,
    pub body: String,
}

/// Partial update of a post. Only the fields present are sent.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
}

pub async fn fetch_todo<T: Transport>(client: &ApiClient<T>, id: u64) -> Result<Todo, RequestError> {
    client.get(&format!("/todos/{id}")).send().await?.json()
}

pub async fn fetch_user<T: Transport>(client: &ApiClient<T>, id: u64) -> Result<User, RequestError> {
    client.get(&format!("/users/{id}")).send().await?.json()
}

/// Look the user up, then list the posts filed under the id the server
/// reported for them.
pub async fn fetch_user_posts<T: Transport>(
    client: &ApiClient<T>,
    user_id: u64,
) -> Result<Vec<Post>, RequestError> {
    chain(
        client.get(&format!("/users/{user_id}")).send(),
        |response| async move {
            let user: User = response.json()?;
            let posts: Vec<Post> = client
                .get("/posts")
                .query("userId", user.id)
                .send()
                .await?
                .json()?;
            Ok::<_, RequestError>(posts)
        },
    )
    .await
}

/// Fetch every user concurrently, in the order the ids were given.
pub async fn fetch_users<T: Transport>(
    client: &ApiClient<T>,
    ids: &[u64],
) -> Result<Vec<User>, RequestError> {
    fan_out(ids.iter().map(|&id| fetch_user(client, id))).await
}

pub async fn fetch_first_users<T: Transport>(client: &ApiClient<T>) -> Result<Vec<User>, RequestError> {
    fetch_users(client, &FIRST_USER_IDS).await
}

pub async fn create_post<T: Transport>(
    client: &ApiClient<T>,
    post: &NewPost,
) -> Result<Post, RequestError> {
    client.post("/posts", post).send().await?.json()
}

pub async fn replace_post<T: Transport>(
    client: &ApiClient<T>,
    id: u64,
    post: &NewPost,
) -> Result<Post, RequestError> {
    client.put(&format!("/posts/{id}"), post).send().await?.json()
}

pub async fn update_post<T: Transport>(
    client: &ApiClient<T>,
    id: u64,
    patch: &PostPatch,
) -> Result<Post, RequestError> {
    client.patch(&format!("/posts/{id}"), patch).send().await?.json()
}

pub async fn delete_post<T: Transport>(client: &ApiClient<T>, id: u64) -> Result<(), RequestError> {
    client.delete(&format!("/posts/{id}")).send().await?;
    Ok(())
}
