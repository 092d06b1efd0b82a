//! Geographic primitives shared by the viewport tracker and fetch layer.

use serde::{Deserialize, Serialize};

/// Mean Earth radius in meters, as used by the haversine formula.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// A WGS84 coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

/// The map's visible bounding region, given as its south-west and
/// north-east corners.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MapRegion {
    pub sw: GeoPoint,
    pub ne: GeoPoint,
}

impl MapRegion {
    /// Midpoint of the region's corners.
    pub fn center(&self) -> GeoPoint {
        GeoPoint::new(
            (self.sw.lat + self.ne.lat) / 2.0,
            (self.sw.lng + self.ne.lng) / 2.0,
        )
    }
}

/// A center-plus-radius query derived from a settled viewport.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewportQuery {
    pub center: GeoPoint,
    pub radius_m: f64,
}

/// Great-circle distance between two points using the haversine formula.
pub fn haversine_m(a: GeoPoint, b: GeoPoint) -> f64 {
    let d_lat = (b.lat - a.lat).to_radians();
    let d_lng = (b.lng - a.lng).to_radians();
    let h = (d_lat / 2.0).sin().powi(2)
        + a.lat.to_radians().cos() * b.lat.to_radians().cos() * (d_lng / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());
    EARTH_RADIUS_M * c
}

/// Query radius for a viewport: half the region's geographic diagonal.
pub fn viewport_radius_m(region: &MapRegion) -> f64 {
    haversine_m(region.sw, region.ne) / 2.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_haversine_zero_distance() {
        let p = GeoPoint::new(37.5, 127.0);
        assert_eq!(haversine_m(p, p), 0.0);
    }

    #[test]
    fn test_haversine_one_degree_latitude() {
        // One degree of latitude is ~111.2 km anywhere on the sphere.
        let d = haversine_m(GeoPoint::new(0.0, 0.0), GeoPoint::new(1.0, 0.0));
        assert!((d - 111_195.0).abs() < 100.0, "got {}", d);
    }

    #[test]
    fn test_viewport_radius_reference_scenario() {
        // Seoul-area viewport, 0.01 degrees on each axis.
        let region = MapRegion {
            sw: GeoPoint::new(37.495, 126.995),
            ne: GeoPoint::new(37.505, 127.005),
        };
        let r = viewport_radius_m(&region);
        assert!((r - 709.7).abs() < 1.0, "got {}", r);
        assert_eq!(r, haversine_m(region.sw, region.ne) / 2.0);
    }

    #[test]
    fn test_region_center_is_midpoint() {
        let region = MapRegion {
            sw: GeoPoint::new(37.49, 126.99),
            ne: GeoPoint::new(37.51, 127.01),
        };
        let c = region.center();
        assert!((c.lat - 37.5).abs() < 1e-9);
        assert!((c.lng - 127.0).abs() < 1e-9);
    }
}
