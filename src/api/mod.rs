//! Remote user API client.
//!
//! Wire types and the `UserApi` trait for the CRUD contract, plus the
//! `reqwest`-backed `HttpUserApi` used by the binary. The server owns all
//! records; the client only holds disposable copies of what it fetched.

use chrono::NaiveDateTime;
use reqwest::blocking::{Client, Response};
use serde::{Deserialize, Serialize};

use crate::error::{Context, DynError, Result, simple_error};

/// A user record as returned by the server. `id` and `created_at` are
/// server-assigned and never sent back on create/update.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub age: Option<i32>,
    pub created_at: NaiveDateTime,
}

/// Create/update payload. `age` serializes as JSON `null` when absent;
/// the field is never omitted.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UserDraft {
    pub name: String,
    pub email: String,
    pub age: Option<i32>,
}

/// Failure body the server attaches to non-2xx responses.
#[derive(Debug, Deserialize)]
struct ErrorReply {
    detail: Option<String>,
}

/// Success body of a delete.
#[derive(Debug, Deserialize)]
struct DeleteReply {
    message: Option<String>,
}

/// The CRUD operations the client needs from the server. Trait seam so the
/// controller can be driven by a fake in tests.
pub trait UserApi: Send + Sync {
    fn list_users(&self) -> Result<Vec<UserRecord>>;
    fn get_user(&self, id: i64) -> Result<UserRecord>;
    fn create_user(&self, draft: &UserDraft) -> Result<UserRecord>;
    fn update_user(&self, id: i64, draft: &UserDraft) -> Result<UserRecord>;
    /// Returns the server's confirmation message, if it sent one.
    fn delete_user(&self, id: i64) -> Result<Option<String>>;
}

/// `UserApi` over HTTP, speaking UTF-8 JSON to `base_url`.
pub struct HttpUserApi {
    base_url: String,
    client: Client,
}

impl HttpUserApi {
    /// No local timeouts are configured; the transport defaults apply.
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        let base_url = base_url.trim_end_matches('/').to_string();
        Self {
            base_url,
            client: Client::new(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

/// Turn a non-2xx response into an error carrying the server's `detail`
/// when the body parses, else a generic message naming the action.
fn status_error(action: &str, resp: Response) -> DynError {
    let status = resp.status();
    let detail = resp.json::<ErrorReply>().ok().and_then(|e| e.detail);
    match detail {
        Some(detail) => simple_error(detail),
        None => simple_error(format!("{action} failed: HTTP {status}")),
    }
}

impl UserApi for HttpUserApi {
    fn list_users(&self) -> Result<Vec<UserRecord>> {
        let url = self.url("/users");
        tracing::debug!(%url, "list users");
        let resp = self
            .client
            .get(&url)
            .send()
            .with_ctx(|| format!("GET {url}"))?;
        if !resp.status().is_success() {
            return Err(status_error("list users", resp));
        }
        resp.json::<Vec<UserRecord>>()
            .with_ctx(|| "decode user list".to_string())
    }

    fn get_user(&self, id: i64) -> Result<UserRecord> {
        let url = self.url(&format!("/users/{id}"));
        tracing::debug!(%url, "get user");
        let resp = self
            .client
            .get(&url)
            .send()
            .with_ctx(|| format!("GET {url}"))?;
        if !resp.status().is_success() {
            return Err(status_error("get user", resp));
        }
        resp.json::<UserRecord>()
            .with_ctx(|| format!("decode user {id}"))
    }

    fn create_user(&self, draft: &UserDraft) -> Result<UserRecord> {
        let url = self.url("/users");
        tracing::debug!(%url, name = %draft.name, "create user");
        let resp = self
            .client
            .post(&url)
            .json(draft)
            .send()
            .with_ctx(|| format!("POST {url}"))?;
        if !resp.status().is_success() {
            return Err(status_error("create user", resp));
        }
        resp.json::<UserRecord>()
            .with_ctx(|| "decode created user".to_string())
    }

    fn update_user(&self, id: i64, draft: &UserDraft) -> Result<UserRecord> {
        let url = self.url(&format!("/users/{id}"));
        tracing::debug!(%url, "update user");
        let resp = self
            .client
            .put(&url)
            .json(draft)
            .send()
            .with_ctx(|| format!("PUT {url}"))?;
        if !resp.status().is_success() {
            return Err(status_error("update user", resp));
        }
        resp.json::<UserRecord>()
            .with_ctx(|| format!("decode updated user {id}"))
    }

    fn delete_user(&self, id: i64) -> Result<Option<String>> {
        let url = self.url(&format!("/users/{id}"));
        tracing::debug!(%url, "delete user");
        let resp = self
            .client
            .delete(&url)
            .send()
            .with_ctx(|| format!("DELETE {url}"))?;
        if !resp.status().is_success() {
            return Err(status_error("delete user", resp));
        }
        let reply = resp
            .json::<DeleteReply>()
            .with_ctx(|| "decode delete reply".to_string())?;
        Ok(reply.message)
    }
}
