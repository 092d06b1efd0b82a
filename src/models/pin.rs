//! Pin model matching the backend pin payload, plus client-side enrichment.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// A geolocated post, the unit every view mode displays.
///
/// Canonical identity is `id`. All server fields are replaced wholesale on
/// each aggregation fetch; `tags` is hydrated lazily and cached per pin,
/// and the bookmark/like enrichment fields are maintained client-side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pin {
    pub id: i64,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub content: String,
    /// Owner of the pin
    #[serde(default)]
    pub user_id: i64,
    #[serde(default)]
    pub like_count: i64,
    #[serde(default = "default_true")]
    pub is_public: bool,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub modified_at: String,
    /// Tag keywords, attached by hydration or carried in filter responses
    #[serde(default)]
    pub tags: BTreeSet<String>,
    /// Whether `tags` reflects a successful hydration fetch
    #[serde(skip)]
    pub tags_loaded: bool,
    /// Whether the acting user has liked this pin
    #[serde(default)]
    pub is_liked: bool,
    /// Whether the acting user has bookmarked this pin
    #[serde(skip)]
    pub is_bookmarked: bool,
    /// Server-assigned bookmark id, required for removal
    #[serde(skip)]
    pub bookmark_id: Option<i64>,
}

fn default_true() -> bool {
    true
}

impl Pin {
    /// Carry client-side enrichment from a previous record into a freshly
    /// fetched one. Used by read-after-write so a refresh does not wipe
    /// cached tags or bookmark state.
    pub fn carry_enrichment_from(mut self, prev: &Pin) -> Pin {
        if !self.tags_loaded && prev.tags_loaded {
            self.tags = prev.tags.clone();
            self.tags_loaded = true;
        }
        self.is_liked = prev.is_liked;
        self.is_bookmarked = prev.is_bookmarked;
        self.bookmark_id = prev.bookmark_id;
        self
    }
}

/// Request body for creating a pin.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePinRequest {
    pub latitude: f64,
    pub longitude: f64,
    pub content: String,
}

/// Request body for editing a pin.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePinRequest {
    pub latitude: f64,
    pub longitude: f64,
    pub content: String,
}

/// Server-confirmed like state, the authority after a like toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LikeStatus {
    pub is_liked: bool,
    #[serde(default)]
    pub like_count: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pin(id: i64) -> Pin {
        serde_json::from_value(serde_json::json!({
            "id": id, "latitude": 37.5, "longitude": 127.0
        }))
        .unwrap()
    }

    #[test]
    fn test_defaults_on_sparse_payload() {
        let p = pin(1);
        assert_eq!(p.like_count, 0);
        assert!(p.is_public);
        assert!(p.tags.is_empty());
        assert!(!p.tags_loaded);
        assert!(p.bookmark_id.is_none());
    }

    #[test]
    fn test_carry_enrichment_preserves_tags_and_bookmark() {
        let mut prev = pin(1);
        prev.tags = ["cafe".to_string()].into_iter().collect();
        prev.tags_loaded = true;
        prev.is_bookmarked = true;
        prev.bookmark_id = Some(9);

        let fresh = pin(1).carry_enrichment_from(&prev);
        assert!(fresh.tags_loaded);
        assert!(fresh.tags.contains("cafe"));
        assert_eq!(fresh.bookmark_id, Some(9));
    }

    #[test]
    fn test_hydrated_tags_win_over_previous() {
        let mut prev = pin(1);
        prev.tags = ["old".to_string()].into_iter().collect();
        prev.tags_loaded = true;

        let mut fresh = pin(1);
        fresh.tags = ["new".to_string()].into_iter().collect();
        fresh.tags_loaded = true;

        let merged = fresh.carry_enrichment_from(&prev);
        assert!(merged.tags.contains("new"));
        assert!(!merged.tags.contains("old"));
    }
}
