/// Geographic helpers
///
/// Great-circle distance between two logged positions.

use serde::{Deserialize, Serialize};

/// Mean Earth radius in meters
const EARTH_RADIUS_METERS: f64 = 6_371_008.8;

/// A latitude/longitude pair in degrees. `(0.0, 0.0)` means "unknown".
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    pub const UNKNOWN: GeoPoint = GeoPoint {
        latitude: 0.0,
        longitude: 0.0,
    };

    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// True for the (0,0) sentinel or for coordinates that aren't numbers
    pub fn is_unknown(&self) -> bool {
        (self.latitude == 0.0 && self.longitude == 0.0)
            || !self.latitude.is_finite()
            || !self.longitude.is_finite()
    }

    /// Haversine distance in meters, `None` if either point is unknown
    pub fn distance_meters(&self, other: &GeoPoint) -> Option<f64> {
        if self.is_unknown() || other.is_unknown() {
            return None;
        }

        let lat1 = self.latitude.to_radians();
        let lat2 = other.latitude.to_radians();
        let d_lat = (other.latitude - self.latitude).to_radians();
        let d_lon = (other.longitude - self.longitude).to_radians();

        let a = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lon / 2.0).sin().powi(2);
        let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

        Some(EARTH_RADIUS_METERS * c)
    }

    /// Point `meters` due north of this one
    pub fn offset_north(&self, meters: f64) -> GeoPoint {
        let d_lat = (meters / EARTH_RADIUS_METERS).to_degrees();
        GeoPoint::new(self.latitude + d_lat, self.longitude)
    }
}
