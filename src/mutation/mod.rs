//! Optimistic mutations.
//!
//! Every mutation is modeled as a [`MutationIntent`] with an explicit
//! lifecycle instead of scattered boolean flags: at most one Pending intent
//! may exist per `(pin, family)`, a second request for the same family is
//! rejected while one is in flight, and each mutation kind has a single
//! reconciliation path. Owner-only operations fail locally, before any
//! network call or optimistic state change.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use serde_json::Value;

use crate::aggregator::PinAggregator;
use crate::api::{parse, PinBackend};
use crate::errors::CoreError;
use crate::models::{
    AddTagRequest, CreateBookmarkRequest, CreatePinRequest, IntentFamily, IntentKind,
    IntentStatus, MutationIntent, Pin, UpdatePinRequest,
};
use crate::state::SharedState;

/// Applies optimistic local changes, issues the remote mutation, and
/// reconciles or rolls back.
pub struct MutationCoordinator {
    state: SharedState,
    backend: Arc<dyn PinBackend>,
    aggregator: Arc<PinAggregator>,
    user_id: Option<i64>,
    pending: Mutex<HashMap<(i64, IntentFamily), MutationIntent>>,
}

impl MutationCoordinator {
    pub fn new(
        state: SharedState,
        backend: Arc<dyn PinBackend>,
        aggregator: Arc<PinAggregator>,
        user_id: Option<i64>,
    ) -> Self {
        Self {
            state,
            backend,
            aggregator,
            user_id,
            pending: Mutex::new(HashMap::new()),
        }
    }

    /// Toggle the acting user's like on a pin.
    ///
    /// The flip is applied locally before the call; on success the
    /// server-confirmed `{isLiked, likeCount}` pair overwrites it, on
    /// failure both values return exactly to their pre-toggle state.
    pub async fn toggle_like(&self, pin_id: i64) -> Result<MutationIntent, CoreError> {
        let user_id = self.require_user()?;
        let pin = self.find_pin(pin_id)?;

        let kind = if pin.is_liked {
            IntentKind::Unlike
        } else {
            IntentKind::Like
        };
        self.begin(pin_id, kind)?;

        let prev_liked = pin.is_liked;
        let prev_count = pin.like_count;
        {
            let mut st = self.state.lock().unwrap();
            st.patch_pin(pin_id, |p| {
                p.is_liked = !prev_liked;
                p.like_count = if prev_liked {
                    (prev_count - 1).max(0)
                } else {
                    prev_count + 1
                };
            });
        }

        let result = match kind {
            IntentKind::Like => self.backend.like(pin_id, user_id).await,
            _ => self.backend.unlike(pin_id, user_id).await,
        };

        match result {
            Ok(data) => {
                // The server pair is the authority; an unparseable body
                // leaves the optimistic values standing.
                match parse::like_status(&data) {
                    Ok(status) => {
                        let mut st = self.state.lock().unwrap();
                        st.patch_pin(pin_id, |p| {
                            p.is_liked = status.is_liked;
                            p.like_count = status.like_count;
                        });
                    }
                    Err(e) => tracing::warn!("Like response unparseable, keeping local: {}", e),
                }
                Ok(self.settle(pin_id, kind, IntentStatus::Confirmed))
            }
            Err(e) => {
                let mut st = self.state.lock().unwrap();
                st.patch_pin(pin_id, |p| {
                    p.is_liked = prev_liked;
                    p.like_count = prev_count;
                });
                drop(st);
                self.settle(pin_id, kind, IntentStatus::RolledBack);
                Err(e)
            }
        }
    }

    /// Toggle the acting user's bookmark on a pin.
    ///
    /// Creation waits for the server-assigned bookmark id before marking
    /// the pin bookmarked; removal requires a known id, removes
    /// optimistically, and on failure only reports the error (a retry of
    /// the delete is idempotent).
    pub async fn toggle_bookmark(&self, pin_id: i64) -> Result<MutationIntent, CoreError> {
        let user_id = self.require_user()?;
        let pin = self.find_pin(pin_id)?;

        if !pin.is_bookmarked {
            self.begin(pin_id, IntentKind::Bookmark)?;
            let req = CreateBookmarkRequest { user_id, pin_id };
            match self.backend.create_bookmark(&req).await {
                Ok(data) => {
                    let bookmark = match parse::bookmark(&data) {
                        Ok(b) => b,
                        Err(e) => {
                            self.settle(pin_id, IntentKind::Bookmark, IntentStatus::RolledBack);
                            return Err(e);
                        }
                    };
                    let mut st = self.state.lock().unwrap();
                    st.patch_pin(pin_id, |p| {
                        p.is_bookmarked = true;
                        p.bookmark_id = Some(bookmark.id);
                    });
                    drop(st);
                    Ok(self.settle(pin_id, IntentKind::Bookmark, IntentStatus::Confirmed))
                }
                Err(e) => {
                    // No optimistic change was made, nothing to revert.
                    self.settle(pin_id, IntentKind::Bookmark, IntentStatus::RolledBack);
                    Err(e)
                }
            }
        } else {
            let Some(bookmark_id) = pin.bookmark_id else {
                return Err(CoreError::MissingBookmark(format!(
                    "pin {} is bookmarked but its bookmark id is unknown",
                    pin_id
                )));
            };
            self.begin(pin_id, IntentKind::Unbookmark)?;
            {
                let mut st = self.state.lock().unwrap();
                st.patch_pin(pin_id, |p| {
                    p.is_bookmarked = false;
                    p.bookmark_id = None;
                });
            }
            match self.backend.delete_bookmark(bookmark_id, user_id).await {
                Ok(()) => Ok(self.settle(pin_id, IntentKind::Unbookmark, IntentStatus::Confirmed)),
                Err(e) => {
                    // Removal stays applied; retrying the delete is safe.
                    tracing::error!("Bookmark delete failed for pin {}: {}", pin_id, e);
                    self.settle(pin_id, IntentKind::Unbookmark, IntentStatus::Confirmed);
                    Err(e)
                }
            }
        }
    }

    /// Toggle a pin's public visibility. Owner-only.
    pub async fn toggle_visibility(&self, pin_id: i64) -> Result<MutationIntent, CoreError> {
        let pin = self.find_pin(pin_id)?;
        self.require_owner(&pin)?;

        let kind = if pin.is_public {
            IntentKind::Unpublish
        } else {
            IntentKind::Publish
        };
        self.begin(pin_id, kind)?;

        let prev_public = pin.is_public;
        {
            let mut st = self.state.lock().unwrap();
            st.patch_pin(pin_id, |p| p.is_public = !prev_public);
        }

        match self.backend.toggle_public(pin_id).await {
            Ok(data) => {
                if let Some(confirmed) = confirmed_visibility(&data) {
                    let mut st = self.state.lock().unwrap();
                    st.patch_pin(pin_id, |p| p.is_public = confirmed);
                }
                Ok(self.settle(pin_id, kind, IntentStatus::Confirmed))
            }
            Err(e) => {
                let mut st = self.state.lock().unwrap();
                st.patch_pin(pin_id, |p| p.is_public = prev_public);
                drop(st);
                self.settle(pin_id, kind, IntentStatus::RolledBack);
                Err(e)
            }
        }
    }

    /// Edit a pin's content. Owner-only; after the write succeeds the
    /// canonical record is re-fetched by id and propagated to every cached
    /// set, carrying over client-side enrichment.
    pub async fn edit_pin(&self, pin_id: i64, content: String) -> Result<Pin, CoreError> {
        let pin = self.find_pin(pin_id)?;
        self.require_owner(&pin)?;

        let req = UpdatePinRequest {
            latitude: pin.latitude,
            longitude: pin.longitude,
            content: content.clone(),
        };
        self.backend.update_pin(pin_id, &req).await?;

        // Read-after-write: trust the canonical record, not the write echo.
        match self.aggregator.fetch_pin(pin_id).await {
            Ok(fresh) => {
                let fresh = fresh.carry_enrichment_from(&pin);
                let mut st = self.state.lock().unwrap();
                st.replace_pin(&fresh);
                Ok(fresh)
            }
            Err(e) => {
                tracing::warn!("Read-after-write failed for pin {}: {}", pin_id, e);
                let mut st = self.state.lock().unwrap();
                st.patch_pin(pin_id, |p| p.content = content.clone());
                Ok(st.find_pin(pin_id).unwrap_or(pin))
            }
        }
    }

    /// Delete a pin. Owner-only; on success the pin is removed from every
    /// cached set and from the selection.
    pub async fn delete_pin(&self, pin_id: i64) -> Result<(), CoreError> {
        let pin = self.find_pin(pin_id)?;
        self.require_owner(&pin)?;

        self.backend.delete_pin(pin_id).await?;

        let mut st = self.state.lock().unwrap();
        st.remove_pin(pin_id);
        Ok(())
    }

    /// Create a pin at a point. Requires login; the caller re-issues the
    /// current mode's fetch to pick the new pin up.
    pub async fn create_pin(
        &self,
        latitude: f64,
        longitude: f64,
        content: String,
    ) -> Result<Pin, CoreError> {
        self.require_user()?;
        let req = CreatePinRequest {
            latitude,
            longitude,
            content,
        };
        let data = self.backend.create_pin(&req).await?;
        parse::single_pin(&data)
    }

    /// Attach a tag keyword to a pin, then re-hydrate its tag set.
    pub async fn add_tag(&self, pin_id: i64, keyword: String) -> Result<Pin, CoreError> {
        let mut pin = self.find_pin(pin_id)?;
        self.backend
            .add_tag(pin_id, &AddTagRequest { keyword })
            .await?;
        self.rehydrate(&mut pin).await;
        Ok(pin)
    }

    /// Remove a tag from a pin, then re-hydrate its tag set.
    pub async fn remove_tag(&self, pin_id: i64, tag_id: i64) -> Result<Pin, CoreError> {
        let mut pin = self.find_pin(pin_id)?;
        self.backend.remove_tag(pin_id, tag_id).await?;
        self.rehydrate(&mut pin).await;
        Ok(pin)
    }

    async fn rehydrate(&self, pin: &mut Pin) {
        self.aggregator.hydrate_pin(pin).await;
        let mut st = self.state.lock().unwrap();
        if st.is_active() {
            st.replace_pin(pin);
        }
    }

    fn find_pin(&self, pin_id: i64) -> Result<Pin, CoreError> {
        self.state
            .lock()
            .unwrap()
            .find_pin(pin_id)
            .ok_or_else(|| CoreError::NotFound(format!("pin {} is not loaded", pin_id)))
    }

    fn require_user(&self) -> Result<i64, CoreError> {
        self.user_id
            .ok_or_else(|| CoreError::AuthRequired("login required for this action".to_string()))
    }

    fn require_owner(&self, pin: &Pin) -> Result<i64, CoreError> {
        let user_id = self.require_user()?;
        if user_id != pin.user_id {
            return Err(CoreError::NotOwner(format!(
                "pin {} belongs to user {}",
                pin.id, pin.user_id
            )));
        }
        Ok(user_id)
    }

    /// Register a Pending intent; rejects if one of the same family is
    /// already in flight for this pin.
    fn begin(&self, pin_id: i64, kind: IntentKind) -> Result<(), CoreError> {
        let mut pending = self.pending.lock().unwrap();
        match pending.entry((pin_id, kind.family())) {
            Entry::Occupied(existing) => Err(CoreError::MutationInFlight(format!(
                "{:?} already pending for pin {}",
                existing.get().kind,
                pin_id
            ))),
            Entry::Vacant(slot) => {
                slot.insert(MutationIntent::pending(pin_id, kind));
                Ok(())
            }
        }
    }

    /// Settle and remove the pending intent for this pin/family.
    fn settle(&self, pin_id: i64, kind: IntentKind, status: IntentStatus) -> MutationIntent {
        let mut pending = self.pending.lock().unwrap();
        let mut intent = pending
            .remove(&(pin_id, kind.family()))
            .unwrap_or_else(|| MutationIntent::pending(pin_id, kind));
        intent.status = status;
        tracing::debug!(pin_id, ?intent.kind, ?intent.status, "Mutation settled");
        intent
    }
}

/// Extract the confirmed visibility from a toggle response, which has been
/// either the updated pin or a bare `{isPublic}` object.
fn confirmed_visibility(data: &Value) -> Option<bool> {
    if let Some(v) = data.get("isPublic").and_then(Value::as_bool) {
        return Some(v);
    }
    data.get("pin")
        .and_then(|p| p.get("isPublic"))
        .and_then(Value::as_bool)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_confirmed_visibility_shapes() {
        assert_eq!(confirmed_visibility(&json!({"isPublic": false})), Some(false));
        assert_eq!(
            confirmed_visibility(&json!({"pin": {"isPublic": true}})),
            Some(true)
        );
        assert_eq!(confirmed_visibility(&json!({"ok": true})), None);
    }
}
