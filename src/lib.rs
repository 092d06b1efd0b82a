//! PinCo core engine
//!
//! The client-side engine that keeps a displayed pin set consistent with a
//! continuously moving map viewport, a selectable view mode, an orthogonal
//! tag-intersection filter, and in-flight optimistic mutations, against a
//! REST backend with inconsistent response shapes.
//!
//! The embedding UI owns rendering, the map SDK, session storage, and
//! routing; it drives this crate through [`Engine`]: map movement goes to
//! the [`viewport::ViewportTracker`], settled queries are forwarded to the
//! [`controller::ModeController`], and user actions call into the
//! controller, [`mutation::MutationCoordinator`], and
//! [`selection::SelectionController`], all sharing one view state.

pub mod aggregator;
pub mod api;
pub mod config;
pub mod controller;
pub mod errors;
pub mod filter;
pub mod models;
pub mod mutation;
pub mod selection;
pub mod state;
pub mod viewport;

use std::sync::Arc;

use tokio::sync::mpsc::UnboundedReceiver;

use aggregator::PinAggregator;
use api::{PinBackend, RestBackend};
use config::Config;
use controller::ModeController;
use errors::CoreError;
use filter::TagFilterEngine;
use models::ViewportQuery;
use mutation::MutationCoordinator;
use selection::SelectionController;
use state::{SharedState, ViewState};
use viewport::ViewportTracker;

/// Composition root: every engine component wired to one shared view state.
pub struct Engine {
    pub tracker: ViewportTracker,
    pub controller: ModeController,
    pub mutations: MutationCoordinator,
    pub selection: SelectionController,
    viewport_events: UnboundedReceiver<ViewportQuery>,
    state: SharedState,
}

impl Engine {
    /// Build an engine over an abstract backend. `user_id` is the acting
    /// user's id, `None` while logged out.
    pub fn new(config: &Config, backend: Arc<dyn PinBackend>, user_id: Option<i64>) -> Self {
        let state = ViewState::shared();
        let aggregator = Arc::new(PinAggregator::new(Arc::clone(&backend)));
        let (tracker, viewport_events) = ViewportTracker::new(config);

        let controller = ModeController::new(
            Arc::clone(&state),
            Arc::clone(&aggregator),
            TagFilterEngine::new(Arc::clone(&backend)),
            user_id,
        );
        let mutations = MutationCoordinator::new(
            Arc::clone(&state),
            Arc::clone(&backend),
            Arc::clone(&aggregator),
            user_id,
        );
        let selection = SelectionController::new(Arc::clone(&state), aggregator);

        Self {
            tracker,
            controller,
            mutations,
            selection,
            viewport_events,
            state,
        }
    }

    /// Build an engine talking HTTP to the configured backend URL.
    pub fn connect(config: &Config, user_id: Option<i64>) -> Self {
        let backend: Arc<dyn PinBackend> = Arc::new(RestBackend::new(&config.api_base_url));
        Self::new(config, backend, user_id)
    }

    /// Forward the next settled viewport query to the controller. Returns
    /// `false` once the tracker channel has closed.
    pub async fn forward_viewport(&mut self) -> Result<bool, CoreError> {
        match self.viewport_events.recv().await {
            Some(query) => {
                self.controller.on_viewport(query).await?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Tear the engine down: cancel the debounce timer and stop every
    /// in-flight fetch from applying its result.
    pub fn shutdown(&mut self) {
        self.state.lock().unwrap().deactivate();
        self.tracker.shutdown();
    }
}
