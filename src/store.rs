//! Canonical event table and filter predicates.
//!
//! The store is written once at load and only read afterwards. Every filter
//! produces a new sequence; the canonical table is never edited in place.

use chrono::NaiveDate;
use log::{debug, error, info};
use serde::{Deserialize, Deserializer};

use crate::error::{FilterError, Result};
use crate::geo_utils::haversine_km;
use crate::{EventId, EventRecord, GeoPoint};

/// Date formats accepted from the data source and from date inputs.
const DATE_FORMATS: [&str; 2] = ["%Y/%m/%d", "%Y-%m-%d"];

/// A row as it comes out of the tabular data source.
///
/// Field names follow the source header. Coordinates may arrive as numbers
/// or as text depending on how the table was parsed. A `null` text cell reads
/// as blank.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawEventRow {
    #[serde(rename = "Event_Title", default, deserialize_with = "null_as_empty")]
    pub title: String,
    #[serde(rename = "Time", default, deserialize_with = "null_as_empty")]
    pub time: String,
    #[serde(rename = "Venue", default, deserialize_with = "null_as_empty")]
    pub venue: String,
    #[serde(rename = "Address", default, deserialize_with = "null_as_empty")]
    pub address: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(rename = "Date", default, deserialize_with = "null_as_empty")]
    pub date: String,
    #[serde(rename = "Latitude", default)]
    pub latitude: Option<RawCoordinate>,
    #[serde(rename = "Longitude", default)]
    pub longitude: Option<RawCoordinate>,
}

fn null_as_empty<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// A coordinate cell: either already numeric or still text.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum RawCoordinate {
    Number(f64),
    Text(String),
}

impl RawCoordinate {
    /// Parse to a finite number. Blank text, `NaN` and infinities are `None`.
    pub fn value(&self) -> Option<f64> {
        let v = match self {
            RawCoordinate::Number(n) => *n,
            RawCoordinate::Text(s) => s.trim().parse::<f64>().ok()?,
        };
        v.is_finite().then_some(v)
    }
}

impl RawEventRow {
    fn is_blank(&self) -> bool {
        let coord_blank = |c: &Option<RawCoordinate>| match c {
            None => true,
            Some(RawCoordinate::Text(s)) => s.trim().is_empty(),
            Some(RawCoordinate::Number(_)) => false,
        };
        self.title.trim().is_empty()
            && self.time.trim().is_empty()
            && self.venue.trim().is_empty()
            && self.address.trim().is_empty()
            && self.url.as_deref().map_or(true, |u| u.trim().is_empty())
            && self.date.trim().is_empty()
            && coord_blank(&self.latitude)
            && coord_blank(&self.longitude)
    }

    fn into_record(self, id: EventId) -> EventRecord {
        EventRecord {
            id,
            title: self.title,
            time: self.time,
            venue: self.venue,
            address: self.address,
            url: self.url.filter(|u| !u.trim().is_empty()),
            date: parse_date(&self.date),
            latitude: self.latitude.as_ref().and_then(RawCoordinate::value),
            longitude: self.longitude.as_ref().and_then(RawCoordinate::value),
        }
    }
}

/// Parse a calendar date in `yyyy/mm/dd` or `yyyy-mm-dd` form.
///
/// # Example
/// ```
/// use event_map::store::parse_date;
/// use chrono::NaiveDate;
///
/// assert_eq!(parse_date("2025/01/10"), NaiveDate::from_ymd_opt(2025, 1, 10));
/// assert_eq!(parse_date("2025-01-10"), NaiveDate::from_ymd_opt(2025, 1, 10));
/// assert_eq!(parse_date(""), None);
/// ```
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
}

// ============================================================================
// Predicates
// ============================================================================

/// The single active filter. Filters replace each other; they never stack.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum FilterPredicate {
    /// Every event.
    #[default]
    All,
    /// Events dated within `[start, end]`, both ends inclusive.
    ///
    /// Bounds are used as given: `start > end` matches nothing.
    DateRange { start: NaiveDate, end: NaiveDate },
    /// Events within `radius_km` of `center`. Events without a valid
    /// position never match.
    Radius { center: GeoPoint, radius_km: f64 },
}

impl FilterPredicate {
    /// Evaluate the predicate against one event.
    pub fn matches(&self, event: &EventRecord) -> bool {
        match *self {
            FilterPredicate::All => true,
            FilterPredicate::DateRange { start, end } => {
                event.date.is_some_and(|d| start <= d && d <= end)
            }
            FilterPredicate::Radius { center, radius_km } => event
                .position()
                .is_some_and(|p| haversine_km(&center, &p) <= radius_km),
        }
    }
}

// ============================================================================
// Store
// ============================================================================

/// Owns the full, immutable event table.
#[derive(Debug, Default)]
pub struct EventStore {
    all: Vec<EventRecord>,
}

impl EventStore {
    /// Build a store from records. Identities are re-stamped to match
    /// each record's position.
    pub fn new(records: Vec<EventRecord>) -> Self {
        let all: Vec<EventRecord> = records
            .into_iter()
            .enumerate()
            .map(|(i, mut r)| {
                r.id = EventId(i);
                r
            })
            .collect();
        info!("[EventStore] Loaded {} events", all.len());
        Self { all }
    }

    /// Build a store from source rows, dropping rows where every field is blank.
    pub fn from_rows(rows: Vec<RawEventRow>) -> Self {
        let total = rows.len();
        let records: Vec<EventRecord> = rows
            .into_iter()
            .filter(|row| !row.is_blank())
            .enumerate()
            .map(|(i, row)| row.into_record(EventId(i)))
            .collect();

        if records.len() < total {
            debug!("[EventStore] Skipped {} blank rows", total - records.len());
        }

        let without_position = records.iter().filter(|r| r.position().is_none()).count();
        if without_position > 0 {
            debug!("[EventStore] {} events have no usable coordinates", without_position);
        }

        Self::new(records)
    }

    /// Parse a JSON array of source rows.
    pub fn from_json(json: &str) -> Result<Self> {
        let rows: Vec<RawEventRow> = serde_json::from_str(json).map_err(|e| {
            error!("[EventStore] Failed to parse event rows: {}", e);
            FilterError::DataLoadFailure(e.to_string())
        })?;
        Ok(Self::from_rows(rows))
    }

    /// Order-preserving selection of the events matching `predicate`.
    pub fn filtered(&self, predicate: &FilterPredicate) -> Vec<EventRecord> {
        self.all
            .iter()
            .filter(|e| predicate.matches(e))
            .cloned()
            .collect()
    }

    /// Parallel version of [`filtered`](Self::filtered). Output order is identical.
    #[cfg(feature = "parallel")]
    pub fn filtered_parallel(&self, predicate: &FilterPredicate) -> Vec<EventRecord> {
        use rayon::prelude::*;

        self.all
            .par_iter()
            .filter(|e| predicate.matches(e))
            .cloned()
            .collect()
    }

    /// Get an event by identity.
    pub fn get(&self, id: EventId) -> Option<&EventRecord> {
        self.all.get(id.0)
    }

    /// All events in load order.
    pub fn iter(&self) -> impl Iterator<Item = &EventRecord> {
        self.all.iter()
    }

    /// Get the number of events.
    pub fn len(&self) -> usize {
        self.all.len()
    }

    /// Check if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.all.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(date: &str, lat: Option<f64>, lng: Option<f64>) -> EventRecord {
        EventRecord {
            id: EventId(0),
            title: format!("Event {}", date),
            time: "7pm".to_string(),
            venue: "Venue".to_string(),
            address: "Address".to_string(),
            url: None,
            date: parse_date(date),
            latitude: lat,
            longitude: lng,
        }
    }

    fn dates(events: &[EventRecord]) -> Vec<String> {
        events.iter().map(|e| e.display_date()).collect()
    }

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_new_restamps_ids() {
        let store = EventStore::new(vec![
            event("2025/01/10", None, None),
            event("2025/01/11", None, None),
        ]);
        let ids: Vec<EventId> = store.iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![EventId(0), EventId(1)]);
        assert_eq!(store.get(EventId(1)).unwrap().display_date(), "11/01/2025");
        assert!(store.get(EventId(2)).is_none());
    }

    #[test]
    fn test_identity_round_trip() {
        let store = EventStore::new(vec![
            event("2025/01/12", None, None),
            event("2025/01/10", Some(1.0), Some(1.0)),
            event("", None, None),
        ]);
        let all: Vec<EventRecord> = store.iter().cloned().collect();
        assert_eq!(store.filtered(&FilterPredicate::All), all);
    }

    #[test]
    fn test_date_range_inclusive() {
        let store = EventStore::new(vec![
            event("2025/01/09", None, None),
            event("2025/01/10", None, None),
            event("2025/01/11", None, None),
            event("2025/01/13", None, None),
        ]);
        let predicate = FilterPredicate::DateRange {
            start: ymd(2025, 1, 10),
            end: ymd(2025, 1, 12),
        };
        assert_eq!(
            dates(&store.filtered(&predicate)),
            vec!["10/01/2025", "11/01/2025"]
        );
    }

    #[test]
    fn test_date_range_reversed_is_empty() {
        let store = EventStore::new(vec![event("2025/01/11", None, None)]);
        let predicate = FilterPredicate::DateRange {
            start: ymd(2025, 1, 12),
            end: ymd(2025, 1, 10),
        };
        assert!(store.filtered(&predicate).is_empty());
    }

    #[test]
    fn test_date_range_keeps_events_without_coordinates() {
        let store = EventStore::new(vec![event("2025/01/10", None, Some(1.0))]);
        let predicate = FilterPredicate::DateRange {
            start: ymd(2025, 1, 10),
            end: ymd(2025, 1, 10),
        };
        assert_eq!(store.filtered(&predicate).len(), 1);
    }

    #[test]
    fn test_date_range_excludes_undated() {
        let store = EventStore::new(vec![event("", None, None)]);
        let predicate = FilterPredicate::DateRange {
            start: ymd(2000, 1, 1),
            end: ymd(2100, 1, 1),
        };
        assert!(store.filtered(&predicate).is_empty());
    }

    #[test]
    fn test_radius_filter() {
        let store = EventStore::new(vec![
            event("2025/01/10", Some(0.0), Some(5.0)),
            event("2025/01/11", Some(0.0), Some(0.5)),
            event("2025/01/12", None, Some(0.0)),
        ]);
        let predicate = FilterPredicate::Radius {
            center: GeoPoint::new(0.0, 0.0),
            radius_km: 100.0,
        };
        let result = store.filtered(&predicate);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].id, EventId(1));
    }

    #[test]
    fn test_zero_radius_matches_exact_position() {
        let store = EventStore::new(vec![event("2025/01/10", Some(1.5), Some(2.5))]);
        let predicate = FilterPredicate::Radius {
            center: GeoPoint::new(1.5, 2.5),
            radius_km: 0.0,
        };
        assert_eq!(store.filtered(&predicate).len(), 1);
    }

    #[test]
    fn test_from_json_mixed_coordinate_types() {
        let json = r#"[
            {"Event_Title": "A", "Time": "7pm", "Venue": "V", "Address": "X",
             "url": "https://example.com", "Date": "2025/01/10",
             "Latitude": "-37.81", "Longitude": 144.96},
            {"Event_Title": "B", "Time": "", "Venue": "", "Address": "",
             "url": "", "Date": "2025-01-11", "Latitude": "", "Longitude": "abc"},
            {"Event_Title": "", "Time": "", "Venue": "", "Address": "",
             "url": "", "Date": "", "Latitude": "", "Longitude": ""}
        ]"#;
        let store = EventStore::from_json(json).unwrap();
        assert_eq!(store.len(), 2);

        let a = store.get(EventId(0)).unwrap();
        assert_eq!(a.position(), Some(GeoPoint::new(-37.81, 144.96)));
        assert_eq!(a.url.as_deref(), Some("https://example.com"));

        let b = store.get(EventId(1)).unwrap();
        assert_eq!(b.latitude, None);
        assert_eq!(b.longitude, None);
        assert_eq!(b.url, None);
        assert_eq!(b.date, Some(ymd(2025, 1, 11)));
    }

    #[test]
    fn test_from_json_null_cells_read_as_blank() {
        let json = r#"[
            {"Event_Title": "Pop-up", "Time": null, "Venue": null, "Address": null,
             "url": null, "Date": null, "Latitude": -37.8, "Longitude": 144.9},
            {"Event_Title": null, "Time": null, "Venue": null, "Address": null,
             "url": null, "Date": null, "Latitude": null, "Longitude": null}
        ]"#;
        let store = EventStore::from_json(json).unwrap();
        assert_eq!(store.len(), 1);

        let popup = store.get(EventId(0)).unwrap();
        assert_eq!(popup.title, "Pop-up");
        assert_eq!(popup.time, "");
        assert_eq!(popup.date, None);
        assert_eq!(popup.position(), Some(GeoPoint::new(-37.8, 144.9)));
    }

    #[test]
    fn test_from_json_rejects_malformed() {
        let err = EventStore::from_json("{not json").unwrap_err();
        assert!(matches!(err, FilterError::DataLoadFailure(_)));
    }

    #[test]
    fn test_raw_coordinate_value() {
        assert_eq!(RawCoordinate::Text(" 1.25 ".to_string()).value(), Some(1.25));
        assert_eq!(RawCoordinate::Text("NaN".to_string()).value(), None);
        assert_eq!(RawCoordinate::Text(String::new()).value(), None);
        assert_eq!(RawCoordinate::Number(0.0).value(), Some(0.0));
    }

    #[cfg(feature = "parallel")]
    #[test]
    fn test_filtered_parallel_matches_sequential() {
        let events: Vec<EventRecord> = (0..500)
            .map(|i| event("2025/01/10", Some(0.0), Some(i as f64 * 0.01)))
            .collect();
        let store = EventStore::new(events);
        let predicate = FilterPredicate::Radius {
            center: GeoPoint::new(0.0, 0.0),
            radius_km: 250.0,
        };
        assert_eq!(store.filtered(&predicate), store.filtered_parallel(&predicate));
    }
}
