//! Marker and overlay reconciliation against a map surface.
//!
//! [`MapSync`] owns one marker per visible event with a valid position and at
//! most one overlay popup for the whole map. The map itself is external and
//! driven through the [`MapSurface`] trait.
//!
//! Per-event states:
//!
//! | State | Meaning |
//! |-------|---------|
//! | absent | no marker on the map |
//! | placed | marker on the map, no popup |
//! | placed + popup open | marker on the map and it owns the overlay |
//!
//! Marker handles are kept across [`MapSync::sync`] calls for events that stay
//! visible, so refiltering does not recreate them.

use std::collections::{BTreeMap, BTreeSet};

use geo::Rect;
use log::debug;

use crate::geo_utils::bounds_of;
use crate::{EventId, EventMapConfig, EventRecord, GeoPoint};

/// Rendering capability the map view exposes.
///
/// Handles are opaque to [`MapSync`]; it only hands them back for removal.
/// The overlay's close affordance must call [`MapSync::close_popup`].
pub trait MapSurface {
    type Marker;
    type Overlay;

    fn create_marker(&mut self, position: GeoPoint, title: &str) -> Self::Marker;
    fn remove_marker(&mut self, marker: Self::Marker);
    fn create_overlay(&mut self, position: GeoPoint, html: &str) -> Self::Overlay;
    fn remove_overlay(&mut self, overlay: Self::Overlay);
    /// Re-layout after the map container becomes visible.
    fn trigger_resize(&mut self);
}

/// The shared overlay popup.
#[derive(Debug)]
pub enum OverlayState<O> {
    Closed,
    Open { owner: EventId, overlay: O },
}

impl<O> OverlayState<O> {
    /// Event whose marker currently owns the popup.
    pub fn owner(&self) -> Option<EventId> {
        match self {
            OverlayState::Closed => None,
            OverlayState::Open { owner, .. } => Some(*owner),
        }
    }

    pub fn is_open(&self) -> bool {
        matches!(self, OverlayState::Open { .. })
    }
}

impl<O> Default for OverlayState<O> {
    fn default() -> Self {
        OverlayState::Closed
    }
}

/// Marker counts changed by one [`MapSync::sync`] call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncStats {
    pub added: usize,
    pub removed: usize,
    pub kept: usize,
}

#[derive(Debug)]
struct PlacedMarker<M> {
    handle: M,
    position: GeoPoint,
    popup_html: String,
}

/// Keeps the map's markers and popup consistent with the visible events.
pub struct MapSync<S: MapSurface> {
    surface: S,
    markers: BTreeMap<EventId, PlacedMarker<S::Marker>>,
    overlay: OverlayState<S::Overlay>,
    untitled_title: String,
    default_center: GeoPoint,
    default_zoom: u8,
}

impl<S: MapSurface> MapSync<S> {
    /// Create a marker manager with default configuration.
    pub fn new(surface: S) -> Self {
        Self::with_config(surface, &EventMapConfig::default())
    }

    pub fn with_config(surface: S, config: &EventMapConfig) -> Self {
        Self {
            surface,
            markers: BTreeMap::new(),
            overlay: OverlayState::Closed,
            untitled_title: config.untitled_title.clone(),
            default_center: config.default_center,
            default_zoom: config.default_zoom,
        }
    }

    // ========================================================================
    // Transitions
    // ========================================================================

    /// Reconcile markers with `events`.
    ///
    /// Events without a valid position are skipped. Markers for events no
    /// longer present are removed, along with the popup if one of them owned
    /// it. Markers that stay visible are left alone.
    pub fn sync(&mut self, events: &[EventRecord]) -> SyncStats {
        let targets: BTreeMap<EventId, (&EventRecord, GeoPoint)> = events
            .iter()
            .filter_map(|e| e.position().map(|p| (e.id, (e, p))))
            .collect();

        let stale: Vec<EventId> = self
            .markers
            .keys()
            .filter(|id| !targets.contains_key(id))
            .copied()
            .collect();

        if let Some(owner) = self.overlay.owner() {
            if stale.contains(&owner) {
                self.close_popup();
            }
        }

        let mut stats = SyncStats::default();

        for id in stale {
            if let Some(marker) = self.markers.remove(&id) {
                self.surface.remove_marker(marker.handle);
                stats.removed += 1;
            }
        }

        for (id, (event, position)) in targets {
            if self.markers.contains_key(&id) {
                stats.kept += 1;
                continue;
            }
            let title = if event.title.trim().is_empty() {
                self.untitled_title.as_str()
            } else {
                event.title.as_str()
            };
            let handle = self.surface.create_marker(position, title);
            self.markers.insert(
                id,
                PlacedMarker {
                    handle,
                    position,
                    popup_html: popup_html(event),
                },
            );
            stats.added += 1;
        }

        debug!(
            "[MapSync] sync: +{} -{} ={} ({} markers)",
            stats.added,
            stats.removed,
            stats.kept,
            self.markers.len()
        );

        stats
    }

    /// Open the popup on an event's marker, closing any open popup first.
    ///
    /// Returns `false` and changes nothing if the event has no marker.
    pub fn open_popup(&mut self, id: EventId) -> bool {
        let Some(marker) = self.markers.get(&id) else {
            return false;
        };
        let position = marker.position;
        let html = marker.popup_html.clone();

        self.close_popup();

        let overlay = self.surface.create_overlay(position, &html);
        self.overlay = OverlayState::Open { owner: id, overlay };
        true
    }

    /// Close the popup if one is open. Returns whether anything was closed.
    pub fn close_popup(&mut self) -> bool {
        match std::mem::replace(&mut self.overlay, OverlayState::Closed) {
            OverlayState::Open { overlay, .. } => {
                self.surface.remove_overlay(overlay);
                true
            }
            OverlayState::Closed => false,
        }
    }

    /// Notify that the map view became visible after being hidden.
    pub fn on_visible(&mut self) {
        self.surface.trigger_resize();
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// Event that currently owns the popup.
    pub fn popup_owner(&self) -> Option<EventId> {
        self.overlay.owner()
    }

    pub fn overlay(&self) -> &OverlayState<S::Overlay> {
        &self.overlay
    }

    pub fn is_placed(&self, id: EventId) -> bool {
        self.markers.contains_key(&id)
    }

    /// Events with a marker, in identity order.
    pub fn placed_ids(&self) -> BTreeSet<EventId> {
        self.markers.keys().copied().collect()
    }

    pub fn marker_count(&self) -> usize {
        self.markers.len()
    }

    /// Bounding box of all placed markers, for fitting the viewport.
    pub fn marker_bounds(&self) -> Option<Rect<f64>> {
        let positions: Vec<GeoPoint> = self.markers.values().map(|m| m.position).collect();
        bounds_of(&positions)
    }

    /// Center of the placed markers, or the configured default when none are placed.
    pub fn view_center(&self) -> GeoPoint {
        self.marker_bounds()
            .map(|rect| {
                let c = rect.center();
                GeoPoint::new(c.y, c.x)
            })
            .unwrap_or(self.default_center)
    }

    pub fn default_zoom(&self) -> u8 {
        self.default_zoom
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }
}

/// Popup body: bold title, address, then a link or a placeholder.
pub fn popup_html(event: &EventRecord) -> String {
    let link = match event.url.as_deref() {
        Some(url) => format!(
            r#"<a href="{}" target="_blank" rel="noopener">Link</a>"#,
            escape_html(url)
        ),
        None => "No Link Available".to_string(),
    };
    format!(
        "<strong>{}</strong><br>{}<br>{}",
        escape_html(&event.title),
        escape_html(&event.address),
        link
    )
}

fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
