//! Pin selection.
//!
//! Tracks the single selected pin and lazily hydrates its tags on demand.
//! Hydration is skipped when the record already carries a successfully
//! loaded tag set; a failed hydration leaves the marker unset so the next
//! selection retries.

use std::sync::Arc;

use crate::aggregator::PinAggregator;
use crate::errors::CoreError;
use crate::models::Pin;
use crate::state::SharedState;

/// Owner of the "which pin is open" question.
pub struct SelectionController {
    state: SharedState,
    aggregator: Arc<PinAggregator>,
}

impl SelectionController {
    pub fn new(state: SharedState, aggregator: Arc<PinAggregator>) -> Self {
        Self { state, aggregator }
    }

    /// Select a loaded pin, hydrating its tags if they were never fetched.
    /// Returns the (possibly freshly hydrated) record.
    pub async fn select(&self, pin_id: i64) -> Result<Pin, CoreError> {
        let mut pin = {
            let st = self.state.lock().unwrap();
            st.find_pin(pin_id)
                .ok_or_else(|| CoreError::NotFound(format!("pin {} is not loaded", pin_id)))?
        };

        if !pin.tags_loaded {
            self.aggregator.hydrate_pin(&mut pin).await;
        }

        let mut st = self.state.lock().unwrap();
        if st.is_active() {
            st.replace_pin(&pin);
            st.selected_pin = Some(pin_id);
        }
        Ok(pin)
    }

    /// The currently selected pin's live record, if one is selected and
    /// still present in a cached set.
    pub fn selected(&self) -> Option<Pin> {
        let st = self.state.lock().unwrap();
        st.selected_pin.and_then(|id| st.find_pin(id))
    }

    pub fn clear(&self) {
        self.state.lock().unwrap().selected_pin = None;
    }
}
