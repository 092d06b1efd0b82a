//! Tag filtering.
//!
//! A pin matches a filter `T` iff `T` is a subset of the pin's tag set
//! (AND semantics). The client-side path is a pure, synchronous,
//! order-independent function over an already-loaded set; the server-side
//! path (unbounded nearby search space) goes through the aggregator's
//! `TagFiltered` target instead.

use std::sync::Arc;

use crate::api::{parse, PinBackend};
use crate::errors::CoreError;
use crate::models::{Pin, Tag};

/// AND-intersection filter over tag keywords.
pub struct TagFilterEngine {
    backend: Arc<dyn PinBackend>,
}

impl TagFilterEngine {
    pub fn new(backend: Arc<dyn PinBackend>) -> Self {
        Self { backend }
    }

    /// Whether a pin's tag set contains every selected keyword.
    pub fn matches(pin: &Pin, keywords: &[String]) -> bool {
        keywords.iter().all(|k| pin.tags.contains(k))
    }

    /// Filter an already-loaded set. Pure and idempotent; an empty filter
    /// returns the input unchanged.
    pub fn apply(pins: &[Pin], keywords: &[String]) -> Vec<Pin> {
        if keywords.is_empty() {
            return pins.to_vec();
        }
        pins.iter()
            .filter(|p| Self::matches(p, keywords))
            .cloned()
            .collect()
    }

    /// Fetch the global tag catalog backing the filter controls.
    pub async fn catalog(&self) -> Result<Vec<Tag>, CoreError> {
        let data = self.backend.all_tags().await?;
        parse::tag_list(&data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    fn pin(id: i64, tags: &[&str]) -> Pin {
        Pin {
            id,
            latitude: 0.0,
            longitude: 0.0,
            content: String::new(),
            user_id: 1,
            like_count: 0,
            is_public: true,
            created_at: String::new(),
            modified_at: String::new(),
            tags: tags.iter().map(|t| t.to_string()).collect::<BTreeSet<_>>(),
            tags_loaded: true,
            is_liked: false,
            is_bookmarked: false,
            bookmark_id: None,
        }
    }

    fn keywords(ks: &[&str]) -> Vec<String> {
        ks.iter().map(|k| k.to_string()).collect()
    }

    #[test]
    fn test_and_semantics() {
        let pins = vec![pin(1, &["cafe", "walk"]), pin(2, &["walk"])];

        let filtered = TagFilterEngine::apply(&pins, &keywords(&["cafe"]));
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].id, 1);

        // Both keywords must be present, not either.
        let filtered = TagFilterEngine::apply(&pins, &keywords(&["cafe", "walk"]));
        assert_eq!(filtered.len(), 1);
        let filtered = TagFilterEngine::apply(&pins, &keywords(&["cafe", "night"]));
        assert!(filtered.is_empty());
    }

    #[test]
    fn test_empty_filter_is_identity() {
        let pins = vec![pin(1, &["cafe"]), pin(2, &[])];
        assert_eq!(TagFilterEngine::apply(&pins, &[]), pins);
    }

    #[test]
    fn test_idempotence() {
        let pins = vec![pin(1, &["cafe", "walk"]), pin(2, &["walk"]), pin(3, &[])];
        let ks = keywords(&["walk"]);
        let once = TagFilterEngine::apply(&pins, &ks);
        let twice = TagFilterEngine::apply(&once, &ks);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_keyword_order_independent() {
        let pins = vec![pin(1, &["a", "b", "c"]), pin(2, &["a"])];
        let ab = TagFilterEngine::apply(&pins, &keywords(&["a", "b"]));
        let ba = TagFilterEngine::apply(&pins, &keywords(&["b", "a"]));
        assert_eq!(ab, ba);
    }

    #[test]
    fn test_unhydrated_pin_never_matches() {
        let mut unhydrated = pin(1, &[]);
        unhydrated.tags_loaded = false;
        let pins = vec![unhydrated];
        assert!(TagFilterEngine::apply(&pins, &keywords(&["cafe"])).is_empty());
    }
}
