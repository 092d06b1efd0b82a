//! Tag model matching the backend tag payload.

use serde::{Deserialize, Serialize};

/// A tag attached to pins. Filtering operates on `keyword`, not `id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tag {
    pub id: i64,
    pub keyword: String,
    #[serde(default)]
    pub created_at: String,
}

/// Request body for attaching a tag to a pin.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddTagRequest {
    pub keyword: String,
}
