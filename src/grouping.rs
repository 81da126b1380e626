//! Date-grouped projection of an event sequence for list rendering.
//!
//! Grouping is by adjacency: a new group starts whenever the formatted date
//! header differs from the previous event's. The input is expected to be
//! sorted by date already. Unsorted input still groups, but the same date can
//! then appear under more than one header.

use chrono::NaiveDate;
use log::warn;

use crate::EventRecord;

/// Header used for events without a date when no config is supplied.
pub const UNDATED_HEADER: &str = "Date TBC";

/// One list section: a date header and the events under it, in input order.
#[derive(Debug, Clone, PartialEq)]
pub struct DateGroup {
    /// Display header, e.g. "Friday 10/01"
    pub header: String,
    /// Date of the first event in the group
    pub date: Option<NaiveDate>,
    pub events: Vec<EventRecord>,
}

/// Ordered list sections.
pub type GroupedView = Vec<DateGroup>;

/// Format a list header: long weekday, 2-digit day, 2-digit month.
///
/// # Example
/// ```
/// use chrono::NaiveDate;
/// use event_map::grouping::format_header;
///
/// let date = NaiveDate::from_ymd_opt(2025, 1, 10).unwrap();
/// assert_eq!(format_header(date), "Friday 10/01");
/// ```
pub fn format_header(date: NaiveDate) -> String {
    date.format("%A %d/%m").to_string()
}

/// Check that event dates never decrease. Undated events sort first.
pub fn is_date_sorted(events: &[EventRecord]) -> bool {
    events.windows(2).all(|w| w[0].date <= w[1].date)
}

/// Group events into date sections using the default undated header.
pub fn group_by_date(events: &[EventRecord]) -> GroupedView {
    group_by_date_with(events, UNDATED_HEADER)
}

/// Group events into date sections.
///
/// One group per run of adjacent events sharing a header; groups appear in
/// the order of their first event.
pub fn group_by_date_with(events: &[EventRecord], undated_header: &str) -> GroupedView {
    if !is_date_sorted(events) {
        warn!(
            "[group_by_date] {} events are not in date order; dates may repeat across headers",
            events.len()
        );
    }

    let mut groups: GroupedView = Vec::new();

    for event in events {
        let header = event
            .date
            .map(format_header)
            .unwrap_or_else(|| undated_header.to_string());

        match groups.last_mut() {
            Some(group) if group.header == header => group.events.push(event.clone()),
            _ => groups.push(DateGroup {
                header,
                date: event.date,
                events: vec![event.clone()],
            }),
        }
    }

    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::parse_date;
    use crate::EventId;

    fn event(title: &str, date: &str) -> EventRecord {
        EventRecord {
            id: EventId(0),
            title: title.to_string(),
            time: String::new(),
            venue: String::new(),
            address: String::new(),
            url: None,
            date: parse_date(date),
            latitude: None,
            longitude: None,
        }
    }

    fn titles(group: &DateGroup) -> Vec<&str> {
        group.events.iter().map(|e| e.title.as_str()).collect()
    }

    #[test]
    fn test_group_sorted_input() {
        let events = vec![
            event("a", "2025/01/10"),
            event("b", "2025/01/10"),
            event("c", "2025/01/11"),
        ];
        let groups = group_by_date(&events);

        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].header, "Friday 10/01");
        assert_eq!(titles(&groups[0]), vec!["a", "b"]);
        assert_eq!(groups[1].header, "Saturday 11/01");
        assert_eq!(titles(&groups[1]), vec!["c"]);
    }

    #[test]
    fn test_group_empty() {
        assert!(group_by_date(&[]).is_empty());
    }

    #[test]
    fn test_unsorted_input_repeats_headers() {
        let events = vec![
            event("a", "2025/01/10"),
            event("b", "2025/01/11"),
            event("c", "2025/01/10"),
        ];
        assert!(!is_date_sorted(&events));

        let groups = group_by_date(&events);
        let headers: Vec<&str> = groups.iter().map(|g| g.header.as_str()).collect();
        assert_eq!(headers, vec!["Friday 10/01", "Saturday 11/01", "Friday 10/01"]);
    }

    #[test]
    fn test_undated_events() {
        let events = vec![event("x", ""), event("y", "nonsense"), event("z", "2025/01/10")];
        let groups = group_by_date_with(&events, "TBA");
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].header, "TBA");
        assert_eq!(groups[0].date, None);
        assert_eq!(titles(&groups[0]), vec!["x", "y"]);
    }

    #[test]
    fn test_grouping_is_deterministic() {
        let events = vec![event("a", "2025/03/01"), event("b", "2025/03/02")];
        assert_eq!(group_by_date(&events), group_by_date(&events));
    }
}
