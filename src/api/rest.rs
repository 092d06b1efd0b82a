//! reqwest implementation of the [`PinBackend`] trait.

use async_trait::async_trait;
use serde_json::Value;

use super::{unwrap_envelope, PinBackend};
use crate::errors::CoreError;
use crate::models::{AddTagRequest, CreateBookmarkRequest, CreatePinRequest, UpdatePinRequest};

/// HTTP client for the PinCo REST backend.
#[derive(Clone)]
pub struct RestBackend {
    client: reqwest::Client,
    base_url: String,
}

impl RestBackend {
    /// Build a backend for the given base URL (including any path prefix,
    /// e.g. `http://host:8080/api`).
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Send a request and unwrap the response envelope to its `data`
    /// payload. Application-level errors inside HTTP 2xx are surfaced the
    /// same way as HTTP-level failures.
    async fn execute(&self, req: reqwest::RequestBuilder) -> Result<Value, CoreError> {
        let res = req.send().await?;
        let status = res.status();
        let body: Value = res.json().await.unwrap_or(Value::Null);

        if !status.is_success() {
            // The error envelope may carry a more specific code than the
            // HTTP status.
            if let Err(e @ CoreError::Api { .. }) = unwrap_envelope(body) {
                return Err(e);
            }
            return Err(CoreError::Api {
                code: status.as_u16().to_string(),
                message: format!("HTTP {}", status),
            });
        }

        unwrap_envelope(body)
    }
}

#[async_trait]
impl PinBackend for RestBackend {
    async fn pins_near(
        &self,
        lat: f64,
        lng: f64,
        radius_m: Option<f64>,
    ) -> Result<Value, CoreError> {
        let mut query = vec![("latitude", lat.to_string()), ("longitude", lng.to_string())];
        if let Some(r) = radius_m {
            query.push(("radius", r.to_string()));
        }
        self.execute(self.client.get(self.url("/pins")).query(&query))
            .await
    }

    async fn pins_all(
        &self,
        lat: Option<f64>,
        lng: Option<f64>,
        radius_m: Option<f64>,
    ) -> Result<Value, CoreError> {
        let mut query = Vec::new();
        if let Some(lat) = lat {
            query.push(("latitude", lat.to_string()));
        }
        if let Some(lng) = lng {
            query.push(("longitude", lng.to_string()));
        }
        if let Some(r) = radius_m {
            query.push(("radius", r.to_string()));
        }
        self.execute(self.client.get(self.url("/pins/all")).query(&query))
            .await
    }

    async fn get_pin(&self, pin_id: i64) -> Result<Value, CoreError> {
        self.execute(self.client.get(self.url(&format!("/pins/{}", pin_id))))
            .await
    }

    async fn create_pin(&self, req: &CreatePinRequest) -> Result<Value, CoreError> {
        self.execute(self.client.post(self.url("/pins")).json(req))
            .await
    }

    async fn update_pin(&self, pin_id: i64, req: &UpdatePinRequest) -> Result<Value, CoreError> {
        self.execute(
            self.client
                .put(self.url(&format!("/pins/{}", pin_id)))
                .json(req),
        )
        .await
    }

    async fn toggle_public(&self, pin_id: i64) -> Result<Value, CoreError> {
        self.execute(
            self.client
                .put(self.url(&format!("/pins/{}/public", pin_id))),
        )
        .await
    }

    async fn delete_pin(&self, pin_id: i64) -> Result<(), CoreError> {
        self.execute(self.client.delete(self.url(&format!("/pins/{}", pin_id))))
            .await
            .map(|_| ())
    }

    async fn pin_tags(&self, pin_id: i64) -> Result<Value, CoreError> {
        self.execute(self.client.get(self.url(&format!("/pins/{}/tags", pin_id))))
            .await
    }

    async fn add_tag(&self, pin_id: i64, req: &AddTagRequest) -> Result<Value, CoreError> {
        self.execute(
            self.client
                .post(self.url(&format!("/pins/{}/tags", pin_id)))
                .json(req),
        )
        .await
    }

    async fn remove_tag(&self, pin_id: i64, tag_id: i64) -> Result<(), CoreError> {
        self.execute(
            self.client
                .delete(self.url(&format!("/pins/{}/tags/{}", pin_id, tag_id))),
        )
        .await
        .map(|_| ())
    }

    async fn all_tags(&self) -> Result<Value, CoreError> {
        self.execute(self.client.get(self.url("/tags"))).await
    }

    async fn pins_by_tags(&self, keywords: &[String]) -> Result<Value, CoreError> {
        // One query-parameter occurrence per selected keyword.
        let query: Vec<(&str, &str)> = keywords.iter().map(|k| ("keywords", k.as_str())).collect();
        self.execute(self.client.get(self.url("/tags/filter")).query(&query))
            .await
    }

    async fn like(&self, pin_id: i64, user_id: i64) -> Result<Value, CoreError> {
        self.execute(
            self.client
                .post(self.url(&format!("/pins/{}/likes", pin_id)))
                .json(&serde_json::json!({ "userId": user_id })),
        )
        .await
    }

    async fn unlike(&self, pin_id: i64, user_id: i64) -> Result<Value, CoreError> {
        self.execute(
            self.client
                .delete(self.url(&format!("/pins/{}/likes", pin_id)))
                .query(&[("userId", user_id.to_string())]),
        )
        .await
    }

    async fn create_bookmark(&self, req: &CreateBookmarkRequest) -> Result<Value, CoreError> {
        self.execute(self.client.post(self.url("/bookmarks")).json(req))
            .await
    }

    async fn bookmarks(&self, user_id: i64) -> Result<Value, CoreError> {
        self.execute(
            self.client
                .get(self.url("/bookmarks"))
                .query(&[("userId", user_id.to_string())]),
        )
        .await
    }

    async fn delete_bookmark(&self, bookmark_id: i64, user_id: i64) -> Result<(), CoreError> {
        self.execute(
            self.client
                .delete(self.url(&format!("/bookmarks/{}", bookmark_id)))
                .query(&[("userId", user_id.to_string())]),
        )
        .await
        .map(|_| ())
    }

    async fn liked_pins(&self, user_id: i64) -> Result<Value, CoreError> {
        self.execute(
            self.client
                .get(self.url(&format!("/user/{}/likespins", user_id))),
        )
        .await
    }
}
