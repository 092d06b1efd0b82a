//! Pin aggregation.
//!
//! Fetches the raw pin set for a fetch target, normalizes it into canonical
//! records through the defensive parsers, and runs the per-pin tag
//! hydration fan-out. Hydration is a known N+1 cost against the current
//! backend contract; the requests run concurrently and a failure on any
//! single pin yields an empty tag set for that pin only.

use std::sync::Arc;

use futures::future::join_all;
use serde_json::Value;

use crate::api::{parse, PinBackend};
use crate::errors::CoreError;
use crate::models::{GeoPoint, Pin, ViewportQuery};

/// What to fetch for a primary aggregation pass.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchTarget {
    /// Pins for the visible region; `None` before the first settled viewport
    Viewport(Option<ViewportQuery>),
    /// Pins within the backend's fixed radius of a point
    Nearby(GeoPoint),
    /// The user's bookmarked pins
    Bookmarked { user_id: i64 },
    /// The user's liked pins
    Liked { user_id: i64 },
    /// Server-side tag-intersection query
    TagFiltered(Vec<String>),
}

/// Fetch-and-normalize layer between the backend seam and the controller.
pub struct PinAggregator {
    backend: Arc<dyn PinBackend>,
}

impl PinAggregator {
    pub fn new(backend: Arc<dyn PinBackend>) -> Self {
        Self { backend }
    }

    /// Fetch the full set for a target: primary query, normalization, and
    /// tag hydration for every pin that did not arrive with tags attached.
    pub async fn fetch(&self, target: &FetchTarget) -> Result<Vec<Pin>, CoreError> {
        let data = match target {
            FetchTarget::Viewport(query) => {
                let (lat, lng, radius) = match query {
                    Some(q) => (Some(q.center.lat), Some(q.center.lng), Some(q.radius_m)),
                    None => (None, None, None),
                };
                self.backend.pins_all(lat, lng, radius).await?
            }
            FetchTarget::Nearby(center) => {
                self.backend.pins_near(center.lat, center.lng, None).await?
            }
            FetchTarget::Bookmarked { user_id } => self.backend.bookmarks(*user_id).await?,
            FetchTarget::Liked { user_id } => self.backend.liked_pins(*user_id).await?,
            FetchTarget::TagFiltered(keywords) => self.backend.pins_by_tags(keywords).await?,
        };

        let mut pins = match target {
            FetchTarget::Bookmarked { .. } => bookmark_pins(&data)?,
            FetchTarget::Liked { .. } => {
                let mut pins = parse::pin_list(&data)?;
                for pin in &mut pins {
                    pin.is_liked = true;
                }
                pins
            }
            _ => parse::pin_list(&data)?,
        };

        self.hydrate_tags(&mut pins).await;
        Ok(pins)
    }

    /// Fetch and normalize one canonical pin by id (read-after-write).
    pub async fn fetch_pin(&self, pin_id: i64) -> Result<Pin, CoreError> {
        let data = self.backend.get_pin(pin_id).await?;
        parse::single_pin(&data)
    }

    /// Attach tag keywords to every pin still lacking them. Fetches run
    /// concurrently; a failed fetch leaves that pin with empty tags and
    /// `tags_loaded` unset so a later selection may retry.
    pub async fn hydrate_tags(&self, pins: &mut [Pin]) {
        let wanted: Vec<(usize, i64)> = pins
            .iter()
            .enumerate()
            .filter(|(_, p)| !p.tags_loaded)
            .map(|(i, p)| (i, p.id))
            .collect();
        if wanted.is_empty() {
            return;
        }

        let fetches: Vec<_> = wanted
            .into_iter()
            .map(|(i, pin_id)| {
                let backend = Arc::clone(&self.backend);
                async move {
                    let result = backend
                        .pin_tags(pin_id)
                        .await
                        .and_then(|data| parse::tag_list(&data));
                    (i, pin_id, result)
                }
            })
            .collect();

        for (i, pin_id, result) in join_all(fetches).await {
            match result {
                Ok(tags) => {
                    pins[i].tags = tags.into_iter().map(|t| t.keyword).collect();
                    pins[i].tags_loaded = true;
                }
                Err(e) => {
                    tracing::warn!("Tag hydration failed for pin {}: {}", pin_id, e);
                    pins[i].tags.clear();
                }
            }
        }
    }

    /// Hydrate a single pin's tags, regardless of its loaded marker.
    pub async fn hydrate_pin(&self, pin: &mut Pin) {
        match self
            .backend
            .pin_tags(pin.id)
            .await
            .and_then(|data| parse::tag_list(&data))
        {
            Ok(tags) => {
                pin.tags = tags.into_iter().map(|t| t.keyword).collect();
                pin.tags_loaded = true;
            }
            Err(e) => {
                tracing::warn!("Tag hydration failed for pin {}: {}", pin.id, e);
                pin.tags.clear();
                pin.tags_loaded = false;
            }
        }
    }
}

/// Normalize a bookmark listing into pins carrying their bookmark ids.
fn bookmark_pins(data: &Value) -> Result<Vec<Pin>, CoreError> {
    let entries = match data {
        Value::Null => return Ok(Vec::new()),
        Value::Array(items) => items,
        // Some iterations returned the plain pin-list shapes here.
        _ => return parse::pin_list(data),
    };

    let mut pins = Vec::with_capacity(entries.len());
    for entry in entries {
        match parse::bookmark(entry) {
            Ok(bookmark) => {
                let mut pin = bookmark.pin;
                pin.is_bookmarked = true;
                pin.bookmark_id = Some(bookmark.id);
                pins.push(pin);
            }
            // Entry without the wrapper: treat it as a bare pin.
            Err(_) => match parse::single_pin(entry) {
                Ok(mut pin) => {
                    pin.is_bookmarked = true;
                    pins.push(pin);
                }
                Err(e) => tracing::warn!("Skipping malformed bookmark entry: {}", e),
            },
        }
    }
    Ok(pins)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_bookmark_entries_carry_ids() {
        let data = json!([
            {"id": 11, "createdAt": "", "pin": {"id": 1, "latitude": 0.0, "longitude": 0.0}},
            {"id": 12, "createdAt": "", "pin": {"id": 2, "latitude": 0.0, "longitude": 0.0}}
        ]);
        let pins = bookmark_pins(&data).unwrap();
        assert_eq!(pins.len(), 2);
        assert!(pins.iter().all(|p| p.is_bookmarked));
        assert_eq!(pins[0].bookmark_id, Some(11));
        assert_eq!(pins[1].bookmark_id, Some(12));
    }

    #[test]
    fn test_bare_pin_entries_in_bookmark_listing() {
        let data = json!([{"id": 3, "latitude": 1.0, "longitude": 2.0}]);
        let pins = bookmark_pins(&data).unwrap();
        assert_eq!(pins.len(), 1);
        assert!(pins[0].is_bookmarked);
        assert_eq!(pins[0].bookmark_id, None);
    }

    #[test]
    fn test_null_bookmark_listing_is_empty() {
        assert!(bookmark_pins(&Value::Null).unwrap().is_empty());
    }
}
