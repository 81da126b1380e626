//! # Geographic Utilities
//!
//! Distance and bounds computation for event positions.
//!
//! ## Overview
//!
//! | Function | Description |
//! |----------|-------------|
//! | [`distance_km`] | Great-circle distance between two lat/lng pairs, in kilometres |
//! | [`haversine_km`] | Same, taking [`GeoPoint`]s |
//! | [`bounds_of`] | Bounding box of a set of positions |
//!
//! ## Example
//!
//! ```rust
//! use event_map::{GeoPoint, geo_utils};
//!
//! let melbourne = GeoPoint::new(-37.8136, 144.9631);
//! let geelong = GeoPoint::new(-38.1499, 144.3617);
//!
//! let dist = geo_utils::haversine_km(&melbourne, &geelong);
//! assert!(dist > 60.0 && dist < 70.0);
//! ```
//!
//! ## Algorithm Notes
//!
//! ### Haversine Formula
//!
//! The haversine formula calculates the great-circle distance between two points on a sphere.
//! A spherical Earth of radius 6,371 km is assumed, which is accurate to within 0.5% for
//! the distances a radius filter deals with.
//!
//! Reference: [Haversine formula (Wikipedia)](https://en.wikipedia.org/wiki/Haversine_formula)
//!
//! ### Coordinate System
//!
//! All functions expect WGS84 coordinates (latitude/longitude in degrees), which is what
//! geocoding services return and what event tables carry.

use geo::{BoundingRect, MultiPoint, Point, Rect};

use crate::GeoPoint;

/// Mean Earth radius in kilometres.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

// =============================================================================
// Distance Functions
// =============================================================================

/// Calculate the great-circle distance between two coordinates using the Haversine formula.
///
/// Inputs are in degrees; the result is in kilometres and is never negative.
///
/// # Example
///
/// ```rust
/// use event_map::distance_km;
///
/// // One degree of longitude along the equator
/// let d = distance_km(0.0, 0.0, 0.0, 1.0);
/// assert!((d - 111.19).abs() < 0.01);
/// ```
pub fn distance_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let d_lat = (lat2 - lat1).to_radians();
    let d_lon = (lon2 - lon1).to_radians();

    let a = (d_lat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (d_lon / 2.0).sin().powi(2);
    // Rounding can push `a` a hair outside [0, 1] for antipodal points
    let a = a.clamp(0.0, 1.0);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_KM * c
}

/// Great-circle distance between two [`GeoPoint`]s in kilometres.
#[inline]
pub fn haversine_km(p1: &GeoPoint, p2: &GeoPoint) -> f64 {
    distance_km(p1.latitude, p1.longitude, p2.latitude, p2.longitude)
}

// =============================================================================
// Bounding Box Functions
// =============================================================================

/// Compute the bounding box of a set of positions.
///
/// The returned rectangle uses `x = longitude`, `y = latitude`. Returns `None`
/// for empty input.
///
/// # Example
///
/// ```rust
/// use event_map::{GeoPoint, geo_utils};
///
/// let points = vec![
///     GeoPoint::new(-37.80, 144.90),
///     GeoPoint::new(-37.90, 145.00),
/// ];
///
/// let rect = geo_utils::bounds_of(&points).unwrap();
/// assert_eq!(rect.min().y, -37.90);
/// assert_eq!(rect.max().x, 145.00);
/// ```
pub fn bounds_of(points: &[GeoPoint]) -> Option<Rect<f64>> {
    let multi: MultiPoint<f64> = points
        .iter()
        .map(|p| Point::new(p.longitude, p.latitude))
        .collect();
    multi.bounding_rect()
}

// =============================================================================
// Unit Tests
// =============================================================================
