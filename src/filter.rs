//! Filter orchestration across the list and map views.
//!
//! [`FilterController`] owns the event table, the map marker state and the
//! current list projection. Every successful filter computes the visible
//! sequence once, then hands that same sequence to the grouper and to
//! [`MapSync::sync`], in that order.
//!
//! Radius filters need a geocode round trip. Each filter request takes a new
//! generation number; a geocode response is applied only if its request is
//! still the latest one, so a slow response can never overwrite a newer
//! filter.

use std::future::Future;

use log::{info, warn};

use crate::error::{FilterError, GeocodeError, Result};
use crate::grouping::{group_by_date_with, GroupedView};
use crate::map_sync::{MapSurface, MapSync};
use crate::store::{parse_date, EventStore, FilterPredicate};
use crate::{EventId, EventMapConfig, EventRecord, GeoPoint};

/// Address-to-coordinate lookup service.
pub trait Geocoder {
    /// Resolve an address to a reference point. One round trip, no retry.
    fn resolve(
        &self,
        address: &str,
    ) -> impl Future<Output = std::result::Result<GeoPoint, GeocodeError>> + Send;
}

/// Which view is on screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ViewTab {
    List,
    #[default]
    Map,
}

/// A validated radius filter waiting for its geocode response.
#[derive(Debug, Clone, PartialEq)]
pub struct RadiusRequest {
    generation: u64,
    address: String,
    radius_km: f64,
}

impl RadiusRequest {
    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn radius_km(&self) -> f64 {
        self.radius_km
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// Result of a filter request that did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOutcome {
    /// Both views now show `visible` events.
    Applied { visible: usize },
    /// A newer filter request was issued meanwhile; nothing changed.
    Superseded,
}

/// Owns the event table and both views, and applies one filter at a time.
pub struct FilterController<S: MapSurface> {
    store: EventStore,
    map: MapSync<S>,
    config: EventMapConfig,
    active: FilterPredicate,
    visible: Vec<EventRecord>,
    grouped: GroupedView,
    generation: u64,
    tab: ViewTab,
}

impl<S: MapSurface> FilterController<S> {
    /// Create a controller with default configuration and populate both
    /// views with every event.
    pub fn new(store: EventStore, surface: S) -> Self {
        Self::with_config(store, surface, EventMapConfig::default())
    }

    pub fn with_config(store: EventStore, surface: S, config: EventMapConfig) -> Self {
        let map = MapSync::with_config(surface, &config);
        let mut controller = Self {
            store,
            map,
            config,
            active: FilterPredicate::All,
            visible: Vec::new(),
            grouped: Vec::new(),
            generation: 0,
            tab: ViewTab::default(),
        };
        controller.apply_predicate(FilterPredicate::All);
        controller
    }

    // ========================================================================
    // Filter Flows
    // ========================================================================

    /// Apply an inclusive date range from raw input values.
    ///
    /// Fails with [`FilterError::InvalidInput`] when either bound is missing
    /// or not a date. Bounds are not reordered.
    pub fn apply_date_range(
        &mut self,
        start: Option<&str>,
        end: Option<&str>,
    ) -> Result<FilterOutcome> {
        let start = start.and_then(parse_date);
        let end = end.and_then(parse_date);
        let (Some(start), Some(end)) = (start, end) else {
            return Err(FilterError::missing_dates());
        };

        Ok(self.apply(FilterPredicate::DateRange { start, end }))
    }

    /// Validate radius filter input and reserve a generation for it.
    ///
    /// Invalid input changes nothing. A valid request supersedes any radius
    /// request still waiting on the geocoder.
    pub fn begin_radius_filter(&mut self, address: &str, radius: &str) -> Result<RadiusRequest> {
        let address = address.trim();
        let radius_km = radius
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|r| r.is_finite() && *r >= 0.0);

        let Some(radius_km) = radius_km.filter(|_| !address.is_empty()) else {
            return Err(FilterError::invalid_radius_input());
        };

        Ok(RadiusRequest {
            generation: self.next_generation(),
            address: address.to_string(),
            radius_km,
        })
    }

    /// Finish a radius filter with the geocode response for `request`.
    ///
    /// A failed lookup is returned as [`FilterError::GeocodeFailure`] and
    /// leaves both views as they were. A response for a superseded request is
    /// dropped.
    pub fn complete_radius_filter(
        &mut self,
        request: RadiusRequest,
        response: std::result::Result<GeoPoint, GeocodeError>,
    ) -> Result<FilterOutcome> {
        if request.generation != self.generation {
            warn!(
                "[FilterController] Dropping geocode response for '{}' (request {}, current {})",
                request.address, request.generation, self.generation
            );
            return Ok(FilterOutcome::Superseded);
        }

        let center = response
            .and_then(|p| {
                if p.is_valid() {
                    Ok(p)
                } else {
                    Err(GeocodeError::Service(format!("invalid coordinates {:?}", p)))
                }
            })
            .map_err(|e| {
                warn!("[FilterController] Geocoding '{}' failed: {:?}", request.address, e);
                FilterError::GeocodeFailure(e)
            })?;

        Ok(self.apply_predicate(FilterPredicate::Radius {
            center,
            radius_km: request.radius_km,
        }))
    }

    /// Validate, geocode and apply a radius filter in one call.
    pub async fn apply_radius_filter<G: Geocoder>(
        &mut self,
        geocoder: &G,
        address: &str,
        radius: &str,
    ) -> Result<FilterOutcome> {
        let request = self.begin_radius_filter(address, radius)?;
        let response = geocoder.resolve(request.address()).await;
        self.complete_radius_filter(request, response)
    }

    /// Show every event again.
    pub fn clear_filter(&mut self) -> FilterOutcome {
        self.apply(FilterPredicate::All)
    }

    /// Replace the active filter with `predicate`, superseding any pending
    /// radius request.
    pub fn apply(&mut self, predicate: FilterPredicate) -> FilterOutcome {
        self.next_generation();
        self.apply_predicate(predicate)
    }

    fn next_generation(&mut self) -> u64 {
        self.generation = self.generation.wrapping_add(1);
        self.generation
    }

    fn apply_predicate(&mut self, predicate: FilterPredicate) -> FilterOutcome {
        #[cfg(feature = "parallel")]
        let visible = self.store.filtered_parallel(&predicate);

        #[cfg(not(feature = "parallel"))]
        let visible = self.store.filtered(&predicate);

        self.grouped = group_by_date_with(&visible, &self.config.undated_header);
        let stats = self.map.sync(&visible);

        info!(
            "[FilterController] {:?}: {}/{} events, {} groups, {} markers (+{} -{})",
            predicate,
            visible.len(),
            self.store.len(),
            self.grouped.len(),
            self.map.marker_count(),
            stats.added,
            stats.removed
        );

        let count = visible.len();
        self.visible = visible;
        self.active = predicate;
        FilterOutcome::Applied { visible: count }
    }

    // ========================================================================
    // View Events
    // ========================================================================

    /// Switch tabs. Revealing the map triggers a resize on the surface.
    pub fn show(&mut self, tab: ViewTab) {
        if tab == ViewTab::Map && self.tab != ViewTab::Map {
            self.map.on_visible();
        }
        self.tab = tab;
    }

    /// A marker was clicked.
    pub fn on_marker_click(&mut self, id: EventId) -> bool {
        self.map.open_popup(id)
    }

    /// The popup's close affordance was used.
    pub fn on_popup_close(&mut self) -> bool {
        self.map.close_popup()
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn active_filter(&self) -> &FilterPredicate {
        &self.active
    }

    /// Events currently shown, in load order.
    pub fn visible(&self) -> &[EventRecord] {
        &self.visible
    }

    /// List view sections for the visible events.
    pub fn grouped(&self) -> &GroupedView {
        &self.grouped
    }

    pub fn map(&self) -> &MapSync<S> {
        &self.map
    }

    pub fn store(&self) -> &EventStore {
        &self.store
    }

    pub fn config(&self) -> &EventMapConfig {
        &self.config
    }

    pub fn tab(&self) -> ViewTab {
        self.tab
    }
}
