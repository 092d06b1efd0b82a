//! Bookmark model matching the backend bookmark payload.

use serde::{Deserialize, Serialize};

use super::Pin;

/// A bookmark entry as returned by `GET /bookmarks`: the server-assigned
/// bookmark id wrapping the bookmarked pin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bookmark {
    pub id: i64,
    pub pin: Pin,
    #[serde(default)]
    pub created_at: String,
}

/// Request body for creating a bookmark.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBookmarkRequest {
    pub user_id: i64,
    pub pin_id: i64,
}
