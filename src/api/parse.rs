//! Defensive parsers for the backend's shape-varying payloads.
//!
//! Each endpoint gets a small tagged-variant parser that either produces a
//! normalized record or an explicit parse error. Field-level problems are
//! coerced to defaults (`likeCount` -> 0, `isPublic` -> true); an entry
//! without a usable id is skipped, not fabricated; only an unrecognized
//! top-level shape is an error.

use std::collections::BTreeSet;

use serde_json::Value;

use crate::errors::CoreError;
use crate::models::{Bookmark, LikeStatus, Pin, Tag};

/// Accepted pin-list shapes: a bare array, `{"pins": [..]}`, or entries
/// wrapped as `{"pin": {..}, ..}` (the bookmark-list shape).
pub fn pin_list(data: &Value) -> Result<Vec<Pin>, CoreError> {
    let entries = match data {
        Value::Null => return Ok(Vec::new()),
        Value::Array(items) => items,
        Value::Object(obj) => match obj.get("pins") {
            Some(Value::Array(items)) => items,
            _ => {
                return Err(CoreError::Parse(format!(
                    "pin list: unrecognized object shape (keys: {:?})",
                    obj.keys().collect::<Vec<_>>()
                )))
            }
        },
        other => {
            return Err(CoreError::Parse(format!(
                "pin list: expected array or object, got {}",
                type_name(other)
            )))
        }
    };

    let mut pins = Vec::with_capacity(entries.len());
    for entry in entries {
        let raw = match entry.get("pin") {
            Some(nested @ Value::Object(_)) => nested,
            _ => entry,
        };
        match pin_record(raw) {
            Ok(pin) => pins.push(pin),
            Err(e) => tracing::warn!("Skipping malformed pin entry: {}", e),
        }
    }
    Ok(pins)
}

/// A single pin object, e.g. from `GET /pins/{id}`.
pub fn single_pin(data: &Value) -> Result<Pin, CoreError> {
    let raw = match data.get("pin") {
        Some(nested @ Value::Object(_)) => nested,
        _ => data,
    };
    pin_record(raw)
}

/// Accepted tag-list shapes: a bare array, `{"tags": [..]}`, or
/// `{"pinId": .., "tags": [..]}`.
pub fn tag_list(data: &Value) -> Result<Vec<Tag>, CoreError> {
    let entries = match data {
        Value::Null => return Ok(Vec::new()),
        Value::Array(items) => items,
        Value::Object(obj) => match obj.get("tags") {
            Some(Value::Array(items)) => items,
            _ => {
                return Err(CoreError::Parse(format!(
                    "tag list: unrecognized object shape (keys: {:?})",
                    obj.keys().collect::<Vec<_>>()
                )))
            }
        },
        other => {
            return Err(CoreError::Parse(format!(
                "tag list: expected array or object, got {}",
                type_name(other)
            )))
        }
    };

    let mut tags = Vec::with_capacity(entries.len());
    for entry in entries {
        let Some(id) = int_field(entry, "id") else {
            tracing::warn!("Skipping tag entry without id");
            continue;
        };
        tags.push(Tag {
            id,
            keyword: str_field(entry, "keyword"),
            created_at: str_field(entry, "createdAt"),
        });
    }
    Ok(tags)
}

/// The server-confirmed `{isLiked, likeCount}` pair from a like toggle.
pub fn like_status(data: &Value) -> Result<LikeStatus, CoreError> {
    let obj = match data.get("isLiked") {
        Some(_) => data,
        None => data.get("likes").unwrap_or(data),
    };
    let is_liked = match obj.get("isLiked") {
        Some(Value::Bool(b)) => *b,
        _ => {
            return Err(CoreError::Parse(
                "like status: missing isLiked field".to_string(),
            ))
        }
    };
    Ok(LikeStatus {
        is_liked,
        like_count: int_field(obj, "likeCount").unwrap_or(0),
    })
}

/// A bookmark entry: server-assigned id wrapping the pin.
pub fn bookmark(data: &Value) -> Result<Bookmark, CoreError> {
    let Some(id) = int_field(data, "id") else {
        return Err(CoreError::Parse(
            "bookmark: missing server-assigned id".to_string(),
        ));
    };
    let pin = match data.get("pin") {
        Some(raw @ Value::Object(_)) => pin_record(raw)?,
        _ => {
            return Err(CoreError::Parse(
                "bookmark: missing nested pin".to_string(),
            ))
        }
    };
    Ok(Bookmark {
        id,
        pin,
        created_at: str_field(data, "createdAt"),
    })
}

/// Normalize one raw pin object. Requires a numeric `id`; every other
/// field is coerced with an explicit default.
fn pin_record(raw: &Value) -> Result<Pin, CoreError> {
    let Some(id) = int_field(raw, "id") else {
        return Err(CoreError::Parse("pin: missing numeric id".to_string()));
    };

    // A tags array in the payload counts as hydrated; absence means the
    // lazy per-pin fetch still has to run.
    let (tags, tags_loaded): (BTreeSet<String>, bool) = match raw.get("tags") {
        Some(Value::Array(items)) => (
            items
                .iter()
                .filter_map(|t| match t {
                    Value::String(s) => Some(s.clone()),
                    Value::Object(_) => t.get("keyword").and_then(Value::as_str).map(String::from),
                    _ => None,
                })
                .collect(),
            true,
        ),
        _ => (BTreeSet::new(), false),
    };

    Ok(Pin {
        id,
        latitude: float_field(raw, "latitude"),
        longitude: float_field(raw, "longitude"),
        content: str_field(raw, "content"),
        user_id: int_field(raw, "userId").unwrap_or(0),
        like_count: int_field(raw, "likeCount").unwrap_or(0),
        is_public: raw
            .get("isPublic")
            .and_then(Value::as_bool)
            .unwrap_or(true),
        created_at: str_field(raw, "createdAt"),
        modified_at: str_field(raw, "modifiedAt"),
        tags,
        tags_loaded,
        is_liked: raw.get("isLiked").and_then(Value::as_bool).unwrap_or(false),
        is_bookmarked: false,
        bookmark_id: None,
    })
}

fn int_field(v: &Value, key: &str) -> Option<i64> {
    match v.get(key)? {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

fn float_field(v: &Value, key: &str) -> f64 {
    match v.get(key) {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
        Some(Value::String(s)) => s.parse().unwrap_or(0.0),
        _ => 0.0,
    }
}

fn str_field(v: &Value, key: &str) -> String {
    v.get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

fn type_name(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
