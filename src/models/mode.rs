//! View mode and mutation intent value types.

use serde::{Deserialize, Serialize};

/// Which query produced the currently displayed pin set.
///
/// Exactly one mode is active at a time. `Viewport`, `Nearby`,
/// `Bookmarked`, and `Liked` are primary modes chosen by the user;
/// `TagFiltered` is entered when a tag filter must be resolved
/// server-side (from `Nearby` or with no primary mode loaded yet).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ViewMode {
    Viewport,
    Nearby,
    TagFiltered,
    Bookmarked,
    Liked,
}

impl ViewMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ViewMode::Viewport => "viewport",
            ViewMode::Nearby => "nearby",
            ViewMode::TagFiltered => "tag-filtered",
            ViewMode::Bookmarked => "bookmarked",
            ViewMode::Liked => "liked",
        }
    }

    /// True for modes whose full set is materialized client-side, so a
    /// tag filter can be applied locally without a round trip.
    pub fn filters_client_side(&self) -> bool {
        matches!(
            self,
            ViewMode::Viewport | ViewMode::Bookmarked | ViewMode::Liked
        )
    }
}

/// Concrete mutation a user requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntentKind {
    Like,
    Unlike,
    Bookmark,
    Unbookmark,
    Publish,
    Unpublish,
}

impl IntentKind {
    pub fn family(&self) -> IntentFamily {
        match self {
            IntentKind::Like | IntentKind::Unlike => IntentFamily::Like,
            IntentKind::Bookmark | IntentKind::Unbookmark => IntentFamily::Bookmark,
            IntentKind::Publish | IntentKind::Unpublish => IntentFamily::Visibility,
        }
    }
}

/// Grouping used for the at-most-one-pending rule: a like cannot overlap
/// an unlike on the same pin, but may overlap a bookmark.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IntentFamily {
    Like,
    Bookmark,
    Visibility,
}

/// Lifecycle of an optimistic mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntentStatus {
    Pending,
    Confirmed,
    RolledBack,
}

/// An in-flight or settled optimistic mutation for one pin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MutationIntent {
    pub pin_id: i64,
    pub kind: IntentKind,
    pub status: IntentStatus,
}

impl MutationIntent {
    pub fn pending(pin_id: i64, kind: IntentKind) -> Self {
        Self {
            pin_id,
            kind,
            status: IntentStatus::Pending,
        }
    }

    pub fn family(&self) -> IntentFamily {
        self.kind.family()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_families() {
        assert_eq!(IntentKind::Like.family(), IntentKind::Unlike.family());
        assert_eq!(
            IntentKind::Bookmark.family(),
            IntentKind::Unbookmark.family()
        );
        assert_ne!(IntentKind::Like.family(), IntentKind::Publish.family());
    }

    #[test]
    fn test_client_side_filter_modes() {
        assert!(ViewMode::Viewport.filters_client_side());
        assert!(ViewMode::Bookmarked.filters_client_side());
        assert!(ViewMode::Liked.filters_client_side());
        assert!(!ViewMode::Nearby.filters_client_side());
        assert!(!ViewMode::TagFiltered.filters_client_side());
    }
}
