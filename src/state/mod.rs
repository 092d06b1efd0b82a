//! Shared view state.
//!
//! One `ViewState` instance backs every component, held behind an
//! `Arc<Mutex<..>>`. The lock is only ever taken for short synchronous
//! sections and is never held across an await point.

use std::sync::{Arc, Mutex};

use crate::models::{GeoPoint, Pin, Tag, ViewMode, ViewportQuery};

/// Handle shared by the controller, mutation, and selection layers.
pub type SharedState = Arc<Mutex<ViewState>>;

/// Everything the engine knows about what is currently displayed and why.
#[derive(Debug)]
pub struct ViewState {
    /// Which query produced the displayed set; `None` before the first fetch
    pub mode: Option<ViewMode>,
    /// The set the UI should render
    pub displayed: Vec<Pin>,
    /// Last unfiltered result for the active primary mode, kept so a
    /// client-side tag filter can be cleared without a round trip
    pub cached_full: Vec<Pin>,
    /// Active tag filter keywords (empty = no filter)
    pub selected_tags: Vec<String>,
    /// Last settled viewport query
    pub viewport: Option<ViewportQuery>,
    /// Center of the last nearby query
    pub nearby_center: Option<GeoPoint>,
    /// Primary mode that was active when a server-side filter was applied,
    /// restored when the filter is cleared
    pub prior_primary: Option<ViewMode>,
    /// Currently selected pin, if any
    pub selected_pin: Option<i64>,
    /// Global tag catalog for filter controls
    pub tag_catalog: Vec<Tag>,
    /// Sequence number of the newest issued primary fetch
    issued_seq: u64,
    /// Cleared on teardown; completions must not apply afterwards
    active: bool,
}

impl ViewState {
    pub fn new() -> Self {
        Self {
            mode: None,
            displayed: Vec::new(),
            cached_full: Vec::new(),
            selected_tags: Vec::new(),
            viewport: None,
            nearby_center: None,
            prior_primary: None,
            selected_pin: None,
            tag_catalog: Vec::new(),
            issued_seq: 0,
            active: true,
        }
    }

    pub fn shared() -> SharedState {
        Arc::new(Mutex::new(Self::new()))
    }

    /// Issue a new primary-fetch sequence number. Any fetch issued earlier
    /// is superseded from this point on.
    pub fn begin_fetch(&mut self) -> u64 {
        self.issued_seq += 1;
        self.issued_seq
    }

    /// Whether a completion with this sequence number may still be applied.
    pub fn may_apply(&self, seq: u64) -> bool {
        self.active && seq == self.issued_seq
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Teardown guard: results of fetches initiated before this call are
    /// dropped instead of mutating state for a dead context.
    pub fn deactivate(&mut self) {
        self.active = false;
    }

    /// Look up a pin by id in the displayed set, falling back to the cache.
    pub fn find_pin(&self, pin_id: i64) -> Option<Pin> {
        self.displayed
            .iter()
            .chain(self.cached_full.iter())
            .find(|p| p.id == pin_id)
            .cloned()
    }

    /// Apply an in-place edit to every cached copy of a pin.
    pub fn patch_pin<F: Fn(&mut Pin)>(&mut self, pin_id: i64, f: F) {
        for pin in self
            .displayed
            .iter_mut()
            .chain(self.cached_full.iter_mut())
            .filter(|p| p.id == pin_id)
        {
            f(pin);
        }
    }

    /// Replace every cached copy of a pin with a new record.
    pub fn replace_pin(&mut self, record: &Pin) {
        self.patch_pin(record.id, |p| *p = record.clone());
    }

    /// Remove a pin from every cached set and drop it from the selection.
    pub fn remove_pin(&mut self, pin_id: i64) {
        self.displayed.retain(|p| p.id != pin_id);
        self.cached_full.retain(|p| p.id != pin_id);
        if self.selected_pin == Some(pin_id) {
            self.selected_pin = None;
        }
    }
}

impl Default for ViewState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    fn pin(id: i64) -> Pin {
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
            tags: BTreeSet::new(),
            tags_loaded: false,
            is_liked: false,
            is_bookmarked: false,
            bookmark_id: None,
        }
    }

    #[test]
    fn test_sequence_guard_latest_wins() {
        let mut state = ViewState::new();
        let first = state.begin_fetch();
        let second = state.begin_fetch();
        assert!(!state.may_apply(first));
        assert!(state.may_apply(second));
    }

    #[test]
    fn test_deactivate_blocks_all_applies() {
        let mut state = ViewState::new();
        let seq = state.begin_fetch();
        state.deactivate();
        assert!(!state.may_apply(seq));
    }

    #[test]
    fn test_patch_reaches_both_sets() {
        let mut state = ViewState::new();
        state.displayed = vec![pin(1)];
        state.cached_full = vec![pin(1), pin(2)];
        state.patch_pin(1, |p| p.like_count = 5);
        assert_eq!(state.displayed[0].like_count, 5);
        assert_eq!(state.cached_full[0].like_count, 5);
        assert_eq!(state.cached_full[1].like_count, 0);
    }

    #[test]
    fn test_remove_pin_clears_selection() {
        let mut state = ViewState::new();
        state.displayed = vec![pin(1), pin(2)];
        state.cached_full = vec![pin(1), pin(2)];
        state.selected_pin = Some(2);
        state.remove_pin(2);
        assert_eq!(state.displayed.len(), 1);
        assert_eq!(state.cached_full.len(), 1);
        assert!(state.selected_pin.is_none());
    }
}
