use std::marker::PhantomData;
use std::sync::Arc;

use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use openlms_core::{ListResponse, Resource};

use crate::error::ApiError;
use crate::token::TokenSource;

/// Authorizing HTTP wrapper around the shared `reqwest` client.
///
/// Every call resolves a bearer token through the [`TokenSource`],
/// attaches it (auth endpoints excepted), and recovers once from a
/// stale-token 401 by exchanging the rejected token and replaying the
/// identical request. Cheap to clone; clones share the connection pool
/// and cookie jar.
#[derive(Clone)]
pub struct Http {
    client: reqwest::Client,
    base_url: String,
    tokens: Arc<dyn TokenSource>,
}

/// Auth endpoints carry no bearer header. They authenticate by
/// credentials or by the refresh cookie, and a 401 from them is an
/// answer, not a stale token.
fn is_auth_path(path: &str) -> bool {
    path == "/auth" || path.starts_with("/auth/")
}

#[derive(serde::Deserialize)]
struct ErrorBody {
    message: String,
}

impl Http {
    pub fn new(
        client: reqwest::Client,
        base_url: impl Into<String>,
        tokens: Arc<dyn TokenSource>,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            tokens,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Typed CRUD client for resource `T`.
    pub fn resource<T: Resource>(&self) -> ResourceClient<T> {
        ResourceClient::new(self.clone())
    }

    /// Send a request, attaching authorization and recovering at most
    /// once from a stale-token rejection.
    ///
    /// `body` is pre-encoded so the retry replays byte-identical JSON.
    async fn dispatch(
        &self,
        method: Method,
        path: &str,
        query: &[(String, String)],
        body: Option<&Value>,
    ) -> Result<reqwest::Response, ApiError> {
        let url = format!("{}{}", self.base_url, path);
        let wants_auth = !is_auth_path(path);
        let mut token = if wants_auth {
            self.tokens.token().await?
        } else {
            None
        };

        let mut retried = false;
        loop {
            let mut req = self.client.request(method.clone(), url.as_str());
            if !query.is_empty() {
                req = req.query(query);
            }
            if let Some(t) = &token {
                req = req.bearer_auth(t);
            }
            if let Some(b) = body {
                req = req.json(b);
            }

            let resp = req.send().await?;

            if resp.status() == StatusCode::UNAUTHORIZED && !retried {
                // Anonymous requests have no token to exchange.
                if let Some(stale) = token.clone() {
                    tracing::debug!(%path, "request rejected with stale token, retrying");
                    match self.tokens.exchange_rejected(&stale).await? {
                        Some(fresh) => {
                            token = Some(fresh);
                            retried = true;
                            continue;
                        }
                        None => return Ok(resp),
                    }
                }
            }
            return Ok(resp);
        }
    }

    /// Decode a successful response, mapping failures to [`ApiError`].
    async fn parse<R: DeserializeOwned>(resp: reqwest::Response) -> Result<R, ApiError> {
        if !resp.status().is_success() {
            return Err(Self::error_from(resp).await);
        }
        resp.json::<R>()
            .await
            .map_err(|e| ApiError::Decode(format!("response body: {}", e)))
    }

    async fn expect_ok(resp: reqwest::Response) -> Result<(), ApiError> {
        if !resp.status().is_success() {
            return Err(Self::error_from(resp).await);
        }
        Ok(())
    }

    /// Build a `Server` error from a non-success response, preferring
    /// the backend's `{"message": …}` envelope over raw text.
    async fn error_from(resp: reqwest::Response) -> ApiError {
        let status = resp.status().as_u16();
        let body = resp.text().await.unwrap_or_default();
        let message = match serde_json::from_str::<ErrorBody>(&body) {
            Ok(eb) => eb.message,
            Err(_) => body,
        };
        ApiError::Server { status, message }
    }

    fn encode<B: Serialize>(body: &B) -> Result<Value, ApiError> {
        serde_json::to_value(body).map_err(|e| ApiError::Decode(format!("request body: {}", e)))
    }

    pub async fn get<R: DeserializeOwned>(&self, path: &str) -> Result<R, ApiError> {
        let resp = self.dispatch(Method::GET, path, &[], None).await?;
        Self::parse(resp).await
    }

    pub async fn get_query<R: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<R, ApiError> {
        let owned: Vec<(String, String)> = query
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        let resp = self.dispatch(Method::GET, path, &owned, None).await?;
        Self::parse(resp).await
    }

    pub async fn post<B: Serialize, R: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<R, ApiError> {
        let body = Self::encode(body)?;
        let resp = self.dispatch(Method::POST, path, &[], Some(&body)).await?;
        Self::parse(resp).await
    }

    /// POST with no body, where only success or failure matters.
    pub async fn post_ok(&self, path: &str) -> Result<(), ApiError> {
        let resp = self.dispatch(Method::POST, path, &[], None).await?;
        Self::expect_ok(resp).await
    }

    pub async fn put<B: Serialize, R: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<R, ApiError> {
        let body = Self::encode(body)?;
        let resp = self.dispatch(Method::PUT, path, &[], Some(&body)).await?;
        Self::parse(resp).await
    }

    pub async fn patch<B: Serialize, R: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<R, ApiError> {
        let body = Self::encode(body)?;
        let resp = self.dispatch(Method::PATCH, path, &[], Some(&body)).await?;
        Self::parse(resp).await
    }

    /// PATCH with an empty body, decoding the updated record.
    pub async fn patch_empty<R: DeserializeOwned>(&self, path: &str) -> Result<R, ApiError> {
        let resp = self.dispatch(Method::PATCH, path, &[], None).await?;
        Self::parse(resp).await
    }

    pub async fn delete(&self, path: &str) -> Result<(), ApiError> {
        let resp = self.dispatch(Method::DELETE, path, &[], None).await?;
        Self::expect_ok(resp).await
    }
}

/// Type-safe CRUD client for a single [`Resource`] collection.
pub struct ResourceClient<T: Resource> {
    http: Http,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Resource> Clone for ResourceClient<T> {
    fn clone(&self) -> Self {
        Self {
            http: self.http.clone(),
            _marker: PhantomData,
        }
    }
}

impl<T: Resource> ResourceClient<T> {
    pub fn new(http: Http) -> Self {
        Self {
            http,
            _marker: PhantomData,
        }
    }

    fn collection_path() -> String {
        format!("/{}", T::PATH)
    }

    fn item_path(id: &str) -> String {
        format!("/{}/{}", T::PATH, id)
    }

    /// List all records.
    pub async fn list(&self) -> Result<ListResponse<T>, ApiError> {
        self.http.get(&Self::collection_path()).await
    }

    /// List records matching the given query filters.
    pub async fn list_where(&self, query: &[(&str, &str)]) -> Result<ListResponse<T>, ApiError> {
        self.http.get_query(&Self::collection_path(), query).await
    }

    /// Get a record by ID.
    pub async fn get(&self, id: &str) -> Result<T, ApiError> {
        self.http.get(&Self::item_path(id)).await
    }

    /// Create a record. The payload may be a partial shape; the backend
    /// assigns `_id` and timestamps.
    pub async fn create<B: Serialize>(&self, body: &B) -> Result<T, ApiError> {
        self.http.post(&Self::collection_path(), body).await
    }

    /// Update a record by ID.
    pub async fn update<B: Serialize>(&self, id: &str, body: &B) -> Result<T, ApiError> {
        self.http.put(&Self::item_path(id), body).await
    }

    /// Delete a record by ID.
    pub async fn delete(&self, id: &str) -> Result<(), ApiError> {
        self.http.delete(&Self::item_path(id)).await
    }
}
