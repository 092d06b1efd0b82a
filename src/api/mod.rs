//! Remote collaborator seam.
//!
//! The backend speaks a `{code|errorCode, message|msg, data}` envelope whose
//! `data` field may be missing, null, an array, or a nested object, and may
//! report an application-level failure inside an HTTP success. This module
//! owns envelope decoding and the [`PinBackend`] trait the engine consumes;
//! shape normalization of `data` lives in [`parse`].

pub mod parse;
mod rest;

pub use rest::RestBackend;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

use crate::errors::CoreError;
use crate::models::{AddTagRequest, CreateBookmarkRequest, CreatePinRequest, UpdatePinRequest};

/// Response envelope, with both code/message spellings the backend has used.
#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default, rename = "errorCode")]
    error_code: Option<String>,
    #[serde(default)]
    msg: Option<String>,
    #[serde(default)]
    data: Option<Value>,
}

/// Unwrap a response body to its `data` payload.
///
/// An HTTP success can still carry an application-level error; a body
/// without any envelope keys is treated as the payload itself.
pub fn unwrap_envelope(body: Value) -> Result<Value, CoreError> {
    let is_enveloped = body
        .as_object()
        .map(|o| {
            o.contains_key("code")
                || o.contains_key("errorCode")
                || o.contains_key("data")
                || o.contains_key("msg")
        })
        .unwrap_or(false);
    if !is_enveloped {
        return Ok(body);
    }

    let envelope: Envelope = serde_json::from_value(body)?;

    if let Some(code) = envelope.error_code {
        return Err(CoreError::Api {
            message: envelope
                .msg
                .or(envelope.message)
                .unwrap_or_else(|| "request failed".to_string()),
            code,
        });
    }
    if let Some(code) = envelope.code {
        if !code.starts_with('2') {
            return Err(CoreError::Api {
                message: envelope
                    .message
                    .or(envelope.msg)
                    .unwrap_or_else(|| "request failed".to_string()),
                code,
            });
        }
    }

    Ok(envelope.data.unwrap_or(Value::Null))
}

/// The PinCo REST backend, consumed abstractly.
///
/// Read endpoints return the raw `data` payload; callers normalize through
/// [`parse`] so shape tolerance stays in one place.
#[async_trait]
pub trait PinBackend: Send + Sync {
    /// GET /pins?latitude&longitude[&radius]
    async fn pins_near(
        &self,
        lat: f64,
        lng: f64,
        radius_m: Option<f64>,
    ) -> Result<Value, CoreError>;

    /// GET /pins/all[?latitude&longitude&radius]
    async fn pins_all(
        &self,
        lat: Option<f64>,
        lng: Option<f64>,
        radius_m: Option<f64>,
    ) -> Result<Value, CoreError>;

    /// GET /pins/{id}
    async fn get_pin(&self, pin_id: i64) -> Result<Value, CoreError>;

    /// POST /pins
    async fn create_pin(&self, req: &CreatePinRequest) -> Result<Value, CoreError>;

    /// PUT /pins/{id}
    async fn update_pin(&self, pin_id: i64, req: &UpdatePinRequest) -> Result<Value, CoreError>;

    /// PUT /pins/{id}/public
    async fn toggle_public(&self, pin_id: i64) -> Result<Value, CoreError>;

    /// DELETE /pins/{id}
    async fn delete_pin(&self, pin_id: i64) -> Result<(), CoreError>;

    /// GET /pins/{id}/tags
    async fn pin_tags(&self, pin_id: i64) -> Result<Value, CoreError>;

    /// POST /pins/{id}/tags
    async fn add_tag(&self, pin_id: i64, req: &AddTagRequest) -> Result<Value, CoreError>;

    /// DELETE /pins/{id}/tags/{tagId}
    async fn remove_tag(&self, pin_id: i64, tag_id: i64) -> Result<(), CoreError>;

    /// GET /tags
    async fn all_tags(&self) -> Result<Value, CoreError>;

    /// GET /tags/filter?keywords=a&keywords=b (one occurrence per keyword)
    async fn pins_by_tags(&self, keywords: &[String]) -> Result<Value, CoreError>;

    /// POST /pins/{id}/likes
    async fn like(&self, pin_id: i64, user_id: i64) -> Result<Value, CoreError>;

    /// DELETE /pins/{id}/likes
    async fn unlike(&self, pin_id: i64, user_id: i64) -> Result<Value, CoreError>;

    /// POST /bookmarks
    async fn create_bookmark(&self, req: &CreateBookmarkRequest) -> Result<Value, CoreError>;

    /// GET /bookmarks?userId=
    async fn bookmarks(&self, user_id: i64) -> Result<Value, CoreError>;

    /// DELETE /bookmarks/{id}?userId=
    async fn delete_bookmark(&self, bookmark_id: i64, user_id: i64) -> Result<(), CoreError>;

    /// GET /user/{id}/likespins
    async fn liked_pins(&self, user_id: i64) -> Result<Value, CoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_unwrap_success_envelope() {
        let data = unwrap_envelope(json!({"code": "200", "message": "ok", "data": [1, 2]}));
        assert_eq!(data.unwrap(), json!([1, 2]));
    }

    #[test]
    fn test_unwrap_missing_data_yields_null() {
        let data = unwrap_envelope(json!({"code": "200", "message": "ok"}));
        assert_eq!(data.unwrap(), Value::Null);
    }

    #[test]
    fn test_unenveloped_body_is_payload() {
        let data = unwrap_envelope(json!([{"id": 1}]));
        assert_eq!(data.unwrap(), json!([{"id": 1}]));
    }

    #[test]
    fn test_app_level_error_in_http_success() {
        let err = unwrap_envelope(json!({"code": "403", "message": "forbidden", "data": null}))
            .unwrap_err();
        match err {
            CoreError::Api { code, message } => {
                assert_eq!(code, "403");
                assert_eq!(message, "forbidden");
            }
            other => panic!("expected Api error, got {}", other),
        }
    }

    #[test]
    fn test_error_code_spelling_variant() {
        let err = unwrap_envelope(json!({"errorCode": "E42", "msg": "boom"})).unwrap_err();
        match err {
            CoreError::Api { code, message } => {
                assert_eq!(code, "E42");
                assert_eq!(message, "boom");
            }
            other => panic!("expected Api error, got {}", other),
        }
    }
}
