//! REST document store client.
//!
//! Async HTTP client using `reqwest`. Every path maps to
//! `{base_url}/{path}.json`; absent values come back as the literal `null`.

use reqwest::header::CONTENT_TYPE;
use tracing::debug;

use crate::ABSENT;
use crate::error::StoreError;
use crate::remote::{RemoteStore, StoreFuture};

/// HTTP-backed [`RemoteStore`].
pub struct HttpStore {
    http: reqwest::Client,
    base_url: String,
}

impl HttpStore {
    /// Creates a client rooted at `base_url`.
    pub fn new(base_url: &str) -> Result<Self, StoreError> {
        let http = reqwest::Client::builder().build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        let path = path.trim_matches('/');
        if path.is_empty() {
            format!("{}.json", self.base_url)
        } else {
            format!("{}/{path}.json", self.base_url)
        }
    }

    /// Sends a request and returns the body of a successful response.
    async fn send(&self, req: reqwest::RequestBuilder) -> Result<String, StoreError> {
        let resp = req.send().await?;
        let status = resp.status();

        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(StoreError::Api {
                status: status.as_u16(),
                body,
            });
        }

        Ok(resp.text().await?)
    }
}

/// Whether a PUT response carries an `error` key.
fn has_error_key(body: &str) -> bool {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("error").cloned())
        .is_some()
}

impl RemoteStore for HttpStore {
    fn get<'a>(&'a self, path: &'a str) -> StoreFuture<'a, String> {
        Box::pin(async move {
            let body = self.send(self.http.get(self.url(path))).await?;
            debug!(%path, bytes = body.len(), "fetched");
            Ok(body)
        })
    }

    fn put<'a>(&'a self, path: &'a str, json: &'a str) -> StoreFuture<'a, ()> {
        Box::pin(async move {
            let req = self
                .http
                .put(self.url(path))
                .header(CONTENT_TYPE, "application/json")
                .body(json.to_string());
            let body = self.send(req).await?;
            if has_error_key(&body) {
                return Err(StoreError::Rejected(body));
            }
            debug!(%path, "uploaded");
            Ok(())
        })
    }

    fn delete<'a>(&'a self, path: &'a str) -> StoreFuture<'a, ()> {
        Box::pin(async move {
            let body = self.send(self.http.delete(self.url(path))).await?;
            if body.trim() != ABSENT {
                return Err(StoreError::Rejected(body));
            }
            debug!(%path, "deleted");
            Ok(())
        })
    }
}
