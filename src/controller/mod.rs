//! View-mode state machine.
//!
//! Owns "which query produced the currently displayed set" and arbitrates
//! how tag-filter and viewport changes interact with it. Switching primary
//! mode always clears the tag filter and issues exactly one fetch. A tag
//! filter applied in Viewport/Bookmarked/Liked is resolved client-side over
//! the cached full set; applied in Nearby (or before any primary fetch) it
//! becomes a server-side TagFiltered query.
//!
//! Every primary fetch carries a sequence number from the shared state; a
//! completion is applied only while it is still the latest issued and the
//! engine is still active, so a superseded fetch can never overwrite a
//! newer result.

use std::sync::Arc;

use crate::aggregator::{FetchTarget, PinAggregator};
use crate::errors::CoreError;
use crate::filter::TagFilterEngine;
use crate::models::{GeoPoint, Pin, Tag, ViewMode, ViewportQuery};
use crate::state::SharedState;

/// Arbiter of mode switches, filter changes, and viewport movement.
pub struct ModeController {
    state: SharedState,
    aggregator: Arc<PinAggregator>,
    filter: TagFilterEngine,
    user_id: Option<i64>,
}

impl ModeController {
    pub fn new(
        state: SharedState,
        aggregator: Arc<PinAggregator>,
        filter: TagFilterEngine,
        user_id: Option<i64>,
    ) -> Self {
        Self {
            state,
            aggregator,
            filter,
            user_id,
        }
    }

    /// Switch to Viewport mode, fetching at the last settled viewport (or
    /// the backend's unscoped listing before any viewport has settled).
    pub async fn show_viewport(&self) -> Result<(), CoreError> {
        let viewport = {
            let mut st = self.state.lock().unwrap();
            st.selected_tags.clear();
            st.prior_primary = None;
            st.viewport
        };
        self.run_primary(ViewMode::Viewport, FetchTarget::Viewport(viewport), false)
            .await
    }

    /// Switch to Nearby mode around a point.
    pub async fn show_nearby(&self, center: GeoPoint) -> Result<(), CoreError> {
        {
            let mut st = self.state.lock().unwrap();
            st.selected_tags.clear();
            st.prior_primary = None;
            st.nearby_center = Some(center);
        }
        self.run_primary(ViewMode::Nearby, FetchTarget::Nearby(center), false)
            .await
    }

    /// Switch to the user's bookmarked pins.
    pub async fn show_bookmarked(&self) -> Result<(), CoreError> {
        let user_id = self.require_user()?;
        {
            let mut st = self.state.lock().unwrap();
            st.selected_tags.clear();
            st.prior_primary = None;
        }
        self.run_primary(
            ViewMode::Bookmarked,
            FetchTarget::Bookmarked { user_id },
            false,
        )
        .await
    }

    /// Switch to the user's liked pins.
    pub async fn show_liked(&self) -> Result<(), CoreError> {
        let user_id = self.require_user()?;
        {
            let mut st = self.state.lock().unwrap();
            st.selected_tags.clear();
            st.prior_primary = None;
        }
        self.run_primary(ViewMode::Liked, FetchTarget::Liked { user_id }, false)
            .await
    }

    /// Consume a settled viewport query from the tracker. Stored always;
    /// acted on only while Viewport mode is active, re-applying the
    /// still-selected tag filter to the fresh set.
    pub async fn on_viewport(&self, query: ViewportQuery) -> Result<(), CoreError> {
        let in_viewport_mode = {
            let mut st = self.state.lock().unwrap();
            st.viewport = Some(query);
            st.mode == Some(ViewMode::Viewport)
        };
        if !in_viewport_mode {
            return Ok(());
        }
        self.run_primary(
            ViewMode::Viewport,
            FetchTarget::Viewport(Some(query)),
            true,
        )
        .await
    }

    /// Apply a tag filter. Empty keyword set clears the filter.
    pub async fn apply_filter(&self, keywords: Vec<String>) -> Result<(), CoreError> {
        if keywords.is_empty() {
            return self.clear_filter().await;
        }

        let mode = {
            let st = self.state.lock().unwrap();
            st.mode
        };

        match mode {
            // Fully materialized client-side: filter locally, no round trip,
            // primary mode unchanged.
            Some(m) if m.filters_client_side() => {
                let mut st = self.state.lock().unwrap();
                st.selected_tags = keywords;
                st.displayed = TagFilterEngine::apply(&st.cached_full, &st.selected_tags);
                Ok(())
            }
            // Nearby search space is unbounded; filter server-side.
            _ => {
                {
                    let mut st = self.state.lock().unwrap();
                    st.selected_tags = keywords.clone();
                    if let Some(m) = st.mode {
                        if m != ViewMode::TagFiltered {
                            st.prior_primary = Some(m);
                        }
                    }
                }
                self.run_primary(
                    ViewMode::TagFiltered,
                    FetchTarget::TagFiltered(keywords),
                    false,
                )
                .await
            }
        }
    }

    /// Clear the tag filter. Client-filtered modes restore the cached full
    /// set without a network call; a server-side filter re-issues the fetch
    /// for the primary mode it replaced.
    pub async fn clear_filter(&self) -> Result<(), CoreError> {
        let (mode, prior, nearby_center) = {
            let mut st = self.state.lock().unwrap();
            st.selected_tags.clear();
            (st.mode, st.prior_primary, st.nearby_center)
        };

        match mode {
            Some(m) if m.filters_client_side() => {
                let mut st = self.state.lock().unwrap();
                st.displayed = st.cached_full.clone();
                Ok(())
            }
            Some(ViewMode::TagFiltered) => match (prior, nearby_center) {
                (Some(ViewMode::Nearby), Some(center)) => self.show_nearby(center).await,
                _ => self.show_viewport().await,
            },
            _ => Ok(()),
        }
    }

    /// Re-issue the fetch for the current mode with its current parameters,
    /// preserving the active tag filter. Used after a mutation that may
    /// have changed the remote set (e.g. pin creation).
    pub async fn refresh(&self) -> Result<(), CoreError> {
        let (mode, viewport, nearby_center, keywords) = {
            let st = self.state.lock().unwrap();
            (
                st.mode,
                st.viewport,
                st.nearby_center,
                st.selected_tags.clone(),
            )
        };

        match mode {
            Some(ViewMode::Viewport) => {
                self.run_primary(ViewMode::Viewport, FetchTarget::Viewport(viewport), true)
                    .await
            }
            Some(ViewMode::Nearby) => {
                let Some(center) = nearby_center else {
                    return Ok(());
                };
                self.run_primary(ViewMode::Nearby, FetchTarget::Nearby(center), false)
                    .await
            }
            Some(ViewMode::TagFiltered) => {
                self.run_primary(
                    ViewMode::TagFiltered,
                    FetchTarget::TagFiltered(keywords),
                    false,
                )
                .await
            }
            Some(ViewMode::Bookmarked) => {
                let user_id = self.require_user()?;
                self.run_primary(
                    ViewMode::Bookmarked,
                    FetchTarget::Bookmarked { user_id },
                    true,
                )
                .await
            }
            Some(ViewMode::Liked) => {
                let user_id = self.require_user()?;
                self.run_primary(ViewMode::Liked, FetchTarget::Liked { user_id }, true)
                    .await
            }
            None => Ok(()),
        }
    }

    /// Load the global tag catalog into shared state.
    pub async fn refresh_tag_catalog(&self) -> Result<Vec<Tag>, CoreError> {
        let tags = self.filter.catalog().await?;
        let mut st = self.state.lock().unwrap();
        if st.is_active() {
            st.tag_catalog = tags.clone();
        }
        Ok(tags)
    }

    /// Snapshot of the set the UI should render.
    pub fn displayed(&self) -> Vec<Pin> {
        self.state.lock().unwrap().displayed.clone()
    }

    pub fn mode(&self) -> Option<ViewMode> {
        self.state.lock().unwrap().mode
    }

    pub fn selected_tags(&self) -> Vec<String> {
        self.state.lock().unwrap().selected_tags.clone()
    }

    fn require_user(&self) -> Result<i64, CoreError> {
        self.user_id
            .ok_or_else(|| CoreError::AuthRequired("login required for this view".to_string()))
    }

    /// Issue a sequenced primary fetch and apply the result if it is still
    /// the latest. A failed primary fetch clears to an empty set rather
    /// than leaving the prior mode's data visible.
    async fn run_primary(
        &self,
        mode: ViewMode,
        target: FetchTarget,
        reapply_filter: bool,
    ) -> Result<(), CoreError> {
        let seq = {
            let mut st = self.state.lock().unwrap();
            st.begin_fetch()
        };
        tracing::debug!(mode = mode.as_str(), seq, "Issuing primary fetch");

        let result = self.aggregator.fetch(&target).await;

        let mut st = self.state.lock().unwrap();
        if !st.may_apply(seq) {
            tracing::debug!(mode = mode.as_str(), seq, "Dropping superseded fetch result");
            return Ok(());
        }

        match result {
            Ok(pins) => {
                st.mode = Some(mode);
                st.cached_full = pins;
                st.displayed = if reapply_filter && !st.selected_tags.is_empty() {
                    TagFilterEngine::apply(&st.cached_full, &st.selected_tags)
                } else {
                    st.cached_full.clone()
                };
                tracing::info!(
                    mode = mode.as_str(),
                    count = st.cached_full.len(),
                    "Primary fetch applied"
                );
                Ok(())
            }
            Err(e) => {
                tracing::error!(mode = mode.as_str(), "Primary fetch failed: {}", e);
                st.mode = Some(mode);
                st.cached_full.clear();
                st.displayed.clear();
                Err(e)
            }
        }
    }
}
