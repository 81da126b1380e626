//! # Event Map
//!
//! Event filtering and view synchronization for a list + map event browser.
//!
//! This library provides:
//! - Great-circle distance from a reference point to each event
//! - Date-range and radius filtering over an immutable event table
//! - Date-grouped projection of the filtered events for list rendering
//! - Marker and overlay reconciliation against an abstract map surface
//!
//! ## Features
//!
//! - **`parallel`** - Enable parallel filtering with rayon
//! - **`http`** - Enable the HTTP geocoding client
//! - **`full`** - Enable all features
//!
//! ## Quick Start
//!
//! ```rust
//! use event_map::{EventStore, FilterPredicate, group_by_date};
//!
//! let json = r#"[
//!   {"Event_Title": "Quiz night", "Time": "7pm", "Venue": "The Local",
//!    "Address": "1 Main St", "url": "", "Date": "2025/01/10",
//!    "Latitude": "-37.81", "Longitude": "144.96"}
//! ]"#;
//!
//! let store = EventStore::from_json(json).unwrap();
//! let visible = store.filtered(&FilterPredicate::All);
//! let groups = group_by_date(&visible);
//!
//! assert_eq!(groups.len(), 1);
//! assert_eq!(groups[0].header, "Friday 10/01");
//! ```

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

// Error types shared by every filter flow
pub mod error;
pub use error::{FilterError, GeocodeError, Result};

// Distance and bounds helpers
pub mod geo_utils;
pub use geo_utils::{distance_km, haversine_km};

// Canonical event table and predicates
pub mod store;
pub use store::{EventStore, FilterPredicate, RawEventRow};

// Date-grouped list projection
pub mod grouping;
pub use grouping::{group_by_date, is_date_sorted, DateGroup, GroupedView};

// Marker/overlay reconciliation
pub mod map_sync;
pub use map_sync::{MapSurface, MapSync, OverlayState, SyncStats};

// Filter orchestration
pub mod filter;
pub use filter::{FilterController, FilterOutcome, Geocoder, RadiusRequest, ViewTab};

// HTTP module for geocoding
#[cfg(feature = "http")]
pub mod http;

#[cfg(feature = "http")]
pub use http::GoogleGeocoder;

// ============================================================================
// Core Types
// ============================================================================

/// A WGS84 coordinate with latitude and longitude in degrees.
///
/// # Example
/// ```
/// use event_map::GeoPoint;
/// let point = GeoPoint::new(-37.8136, 144.9631); // Melbourne
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    /// Create a new point.
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }

    /// Check that both components are finite numbers.
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite() && self.longitude.is_finite()
    }
}

/// Identity of an event: its zero-based position in the ingested table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EventId(pub usize);

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "event#{}", self.0)
    }
}

/// A scheduled event as loaded from the data source.
///
/// Records are immutable once loaded. Coordinates that were blank or not a
/// number in the source are `None`, never zero.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventRecord {
    pub id: EventId,
    pub title: String,
    /// Local display time, passed through untouched
    pub time: String,
    pub venue: String,
    pub address: String,
    pub url: Option<String>,
    /// Calendar date; `None` when the source date was blank or malformed
    pub date: Option<NaiveDate>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl EventRecord {
    /// Map position, present only when latitude and longitude are both valid.
    pub fn position(&self) -> Option<GeoPoint> {
        match (self.latitude, self.longitude) {
            (Some(lat), Some(lng)) if lat.is_finite() && lng.is_finite() => {
                Some(GeoPoint::new(lat, lng))
            }
            _ => None,
        }
    }

    /// Date as `dd/mm/yyyy`, or an empty string for undated events.
    pub fn display_date(&self) -> String {
        self.date
            .map(|d| d.format("%d/%m/%Y").to_string())
            .unwrap_or_default()
    }
}

/// Configuration for the list and map views.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EventMapConfig {
    /// Map center before any filter is applied.
    /// Default: Melbourne CBD
    pub default_center: GeoPoint,

    /// Initial map zoom level.
    /// Default: 10
    pub default_zoom: u8,

    /// Marker title used when an event has a blank title.
    /// Default: "Untitled Event"
    pub untitled_title: String,

    /// Group header for events without a date.
    /// Default: "Date TBC"
    pub undated_header: String,

    /// Upper bound on a single geocode round trip, in seconds.
    /// Default: 30
    pub geocode_timeout_secs: u64,
}

impl Default for EventMapConfig {
    fn default() -> Self {
        Self {
            default_center: GeoPoint::new(-37.8136, 144.9631),
            default_zoom: 10,
            untitled_title: "Untitled Event".to_string(),
            undated_header: "Date TBC".to_string(),
            geocode_timeout_secs: 30,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn record(lat: Option<f64>, lng: Option<f64>) -> EventRecord {
        EventRecord {
            id: EventId(0),
            title: "Gig".to_string(),
            time: "8pm".to_string(),
            venue: "Hall".to_string(),
            address: "1 Main St".to_string(),
            url: None,
            date: NaiveDate::from_ymd_opt(2025, 1, 10),
            latitude: lat,
            longitude: lng,
        }
    }

    #[test]
    fn test_geo_point_validation() {
        assert!(GeoPoint::new(-37.8136, 144.9631).is_valid());
        assert!(!GeoPoint::new(f64::NAN, 0.0).is_valid());
        assert!(!GeoPoint::new(0.0, f64::INFINITY).is_valid());
    }

    #[test]
    fn test_position_requires_both_coordinates() {
        assert_eq!(
            record(Some(1.0), Some(2.0)).position(),
            Some(GeoPoint::new(1.0, 2.0))
        );
        assert_eq!(record(None, Some(2.0)).position(), None);
        assert_eq!(record(Some(1.0), None).position(), None);
        assert_eq!(record(Some(f64::NAN), Some(2.0)).position(), None);
    }

    #[test]
    fn test_zero_coordinates_are_a_real_position() {
        assert_eq!(
            record(Some(0.0), Some(0.0)).position(),
            Some(GeoPoint::new(0.0, 0.0))
        );
    }

    #[test]
    fn test_display_date() {
        assert_eq!(record(None, None).display_date(), "10/01/2025");
        let mut undated = record(None, None);
        undated.date = None;
        assert_eq!(undated.display_date(), "");
    }

    #[test]
    fn test_config_partial_override() {
        let config: EventMapConfig =
            serde_json::from_str(r#"{"default_zoom": 12}"#).unwrap();
        assert_eq!(config.default_zoom, 12);
        assert_eq!(config.untitled_title, "Untitled Event");
        assert_eq!(config.default_center, GeoPoint::new(-37.8136, 144.9631));
    }
}
