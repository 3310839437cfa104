//! Coordinate sanity filter. Records failing this check never reach the
//! catalog.

// Metropolitan France, roughly.
const LAT_MIN: f64 = 41.3;
const LAT_MAX: f64 = 51.1;
const LNG_MIN: f64 = -5.2;
const LNG_MAX: f64 = 9.6;

/// Both coordinates finite, not the (0,0) null-island sentinel, and inside
/// the national bounding box.
pub fn valid_coordinates(lat: f64, lng: f64) -> bool {
    if !lat.is_finite() || !lng.is_finite() {
        return false;
    }
    if lat == 0.0 && lng == 0.0 {
        return false;
    }
    (LAT_MIN..=LAT_MAX).contains(&lat) && (LNG_MIN..=LNG_MAX).contains(&lng)
}
