//! Viewport tracking.
//!
//! Observes the map's visible region, debounces movement, and derives a
//! center-plus-radius query from the region's geographic diagonal. The
//! debounce window collapses any burst of pan/zoom events into at most one
//! emission; emissions whose center moved less than the configured delta
//! (~10 m) in both axes are suppressed to avoid no-op re-renders.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;

use crate::config::Config;
use crate::models::{viewport_radius_m, GeoPoint, MapRegion, ViewportQuery};

/// Debounced map-movement observer.
///
/// Owns a single cancellable timer: each movement aborts the previous
/// timer and arms a new one, so only a settled viewport emits a query.
pub struct ViewportTracker {
    debounce: Duration,
    min_delta_deg: f64,
    tx: UnboundedSender<ViewportQuery>,
    last_emitted: Arc<Mutex<Option<GeoPoint>>>,
    pending: Option<JoinHandle<()>>,
}

impl ViewportTracker {
    /// Build a tracker and the channel its settled queries arrive on.
    pub fn new(config: &Config) -> (Self, UnboundedReceiver<ViewportQuery>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            Self {
                debounce: config.debounce,
                min_delta_deg: config.min_center_delta_deg,
                tx,
                last_emitted: Arc::new(Mutex::new(None)),
                pending: None,
            },
            rx,
        )
    }

    /// Report a map movement. `None` means the map has not finished
    /// initializing, which is a silent no-op rather than an error.
    pub fn map_moved(&mut self, region: Option<MapRegion>) {
        let Some(region) = region else {
            return;
        };

        if let Some(timer) = self.pending.take() {
            timer.abort();
        }

        let tx = self.tx.clone();
        let last_emitted = Arc::clone(&self.last_emitted);
        let min_delta = self.min_delta_deg;
        let debounce = self.debounce;

        self.pending = Some(tokio::spawn(async move {
            tokio::time::sleep(debounce).await;

            let center = region.center();
            let radius_m = viewport_radius_m(&region);

            let mut last = last_emitted.lock().unwrap();
            if let Some(prev) = *last {
                let lat_diff = (center.lat - prev.lat).abs();
                let lng_diff = (center.lng - prev.lng).abs();
                if lat_diff <= min_delta && lng_diff <= min_delta {
                    tracing::debug!("Viewport settled within delta, suppressing emission");
                    return;
                }
            }
            *last = Some(center);

            tracing::debug!(
                lat = center.lat,
                lng = center.lng,
                radius_m,
                "Viewport settled"
            );
            let _ = tx.send(ViewportQuery { center, radius_m });
        }));
    }

    /// Cancel any armed timer. Called on teardown so a settling viewport
    /// cannot emit into a dead engine.
    pub fn shutdown(&mut self) {
        if let Some(timer) = self.pending.take() {
            timer.abort();
        }
    }
}

impl Drop for ViewportTracker {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::timeout;

    fn region(sw_lat: f64, sw_lng: f64, ne_lat: f64, ne_lng: f64) -> MapRegion {
        MapRegion {
            sw: GeoPoint::new(sw_lat, sw_lng),
            ne: GeoPoint::new(ne_lat, ne_lng),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_burst_collapses_to_one_emission() {
        let (mut tracker, mut rx) = ViewportTracker::new(&Config::default());

        tracker.map_moved(Some(region(37.0, 126.0, 37.1, 126.1)));
        tracker.map_moved(Some(region(37.2, 126.2, 37.3, 126.3)));
        tracker.map_moved(Some(region(37.495, 126.995, 37.505, 127.005)));

        let q = rx.recv().await.unwrap();
        assert!((q.center.lat - 37.5).abs() < 1e-9);
        assert!((q.radius_m - 709.7).abs() < 1.0);

        // Nothing else settles.
        assert!(timeout(Duration::from_secs(2), rx.recv()).await.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_sub_delta_movement_is_suppressed() {
        let (mut tracker, mut rx) = ViewportTracker::new(&Config::default());

        tracker.map_moved(Some(region(37.495, 126.995, 37.505, 127.005)));
        rx.recv().await.unwrap();

        // Center shifts by 0.00005 degrees on each axis, below the delta.
        tracker.map_moved(Some(region(37.49505, 126.99505, 37.50505, 127.00505)));
        assert!(timeout(Duration::from_secs(2), rx.recv()).await.is_err());

        // A real move emits again.
        tracker.map_moved(Some(region(37.6, 127.1, 37.7, 127.2)));
        assert!(rx.recv().await.is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_absent_map_handle_is_noop() {
        let (mut tracker, mut rx) = ViewportTracker::new(&Config::default());
        tracker.map_moved(None);
        assert!(timeout(Duration::from_secs(2), rx.recv()).await.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_cancels_armed_timer() {
        let (mut tracker, mut rx) = ViewportTracker::new(&Config::default());
        tracker.map_moved(Some(region(37.0, 126.0, 37.1, 126.1)));
        tracker.shutdown();
        assert!(timeout(Duration::from_secs(2), rx.recv()).await.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_radius_is_half_diagonal() {
        let (mut tracker, mut rx) = ViewportTracker::new(&Config::default());
        let r = region(37.495, 126.995, 37.505, 127.005);
        tracker.map_moved(Some(r));
        let q = rx.recv().await.unwrap();
        assert_eq!(q.radius_m, viewport_radius_m(&r));
    }
}
