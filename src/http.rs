//! HTTP geocoding client for the Google Geocoding API.
//!
//! One request per lookup:
//! - No retry; a failure is reported to the caller as-is
//! - Whole round trip (headers + body) bounded by the configured timeout
//! - Pooled connections reused across lookups

use log::{debug, info, warn};
use reqwest::Client;
use serde::Deserialize;
use std::time::{Duration, Instant};

use crate::error::GeocodeError;
use crate::filter::Geocoder;
use crate::{EventMapConfig, GeoPoint};

const GEOCODE_ENDPOINT: &str = "https://maps.googleapis.com/maps/api/geocode/json";

/// API response for the geocode endpoint
#[derive(Debug, Deserialize)]
struct GeocodeApiResponse {
    #[serde(default)]
    status: String,
    #[serde(default)]
    results: Vec<ApiResult>,
    #[serde(default)]
    error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiResult {
    geometry: ApiGeometry,
}

#[derive(Debug, Deserialize)]
struct ApiGeometry {
    location: ApiLocation,
}

#[derive(Debug, Deserialize)]
struct ApiLocation {
    lat: f64,
    lng: f64,
}

/// Geocoder backed by the Google Geocoding JSON API
pub struct GoogleGeocoder {
    client: Client,
    api_key: String,
    endpoint: String,
    timeout: Duration,
}

impl GoogleGeocoder {
    /// Create a geocoder with the given API key and default configuration
    pub fn new(api_key: &str) -> Result<Self, GeocodeError> {
        Self::with_config(api_key, &EventMapConfig::default())
    }

    pub fn with_config(api_key: &str, config: &EventMapConfig) -> Result<Self, GeocodeError> {
        let client = Client::builder()
            .pool_idle_timeout(Duration::from_secs(60))
            .tcp_keepalive(Duration::from_secs(30))
            .build()
            .map_err(|e| GeocodeError::Service(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_key: api_key.to_string(),
            endpoint: GEOCODE_ENDPOINT.to_string(),
            timeout: Duration::from_secs(config.geocode_timeout_secs),
        })
    }

    /// Point the client at a different endpoint (proxy or test server)
    pub fn with_endpoint(mut self, endpoint: &str) -> Self {
        self.endpoint = endpoint.to_string();
        self
    }

    async fn fetch(&self, address: &str) -> Result<GeoPoint, GeocodeError> {
        let req_start = Instant::now();

        // Phase 1: Send request, receive headers
        let resp = self
            .client
            .get(&self.endpoint)
            .query(&[("address", address), ("key", self.api_key.as_str())])
            .send()
            .await
            .map_err(|e| GeocodeError::Service(format!("Request error: {}", e)))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(GeocodeError::Service(format!("HTTP {}", status)));
        }
        let headers_elapsed = req_start.elapsed();

        // Phase 2: Download response body
        let bytes = resp
            .bytes()
            .await
            .map_err(|e| GeocodeError::Service(format!("Body download error: {}", e)))?;

        debug!(
            "[Geocode] headers={:?} body={:.1}KB total={:?}",
            headers_elapsed,
            bytes.len() as f64 / 1024.0,
            req_start.elapsed()
        );

        // Phase 3: JSON deserialization
        parse_geocode_response(&bytes)
    }
}

impl Geocoder for GoogleGeocoder {
    async fn resolve(&self, address: &str) -> Result<GeoPoint, GeocodeError> {
        info!("[GoogleGeocoder] Resolving '{}'", address);

        let result = match tokio::time::timeout(self.timeout, self.fetch(address)).await {
            Ok(result) => result,
            Err(_) => Err(GeocodeError::Service(format!(
                "Timed out after {:?}",
                self.timeout
            ))),
        };

        match &result {
            Ok(point) => info!(
                "[GoogleGeocoder] '{}' -> ({:.5}, {:.5})",
                address, point.latitude, point.longitude
            ),
            Err(e) => warn!("[GoogleGeocoder] '{}' failed: {:?}", address, e),
        }

        result
    }
}

/// Decode a geocode response body into the first result's location.
///
/// An empty result list is [`GeocodeError::NotFound`] unless the service
/// reported an error status.
pub fn parse_geocode_response(body: &[u8]) -> Result<GeoPoint, GeocodeError> {
    let data: GeocodeApiResponse = serde_json::from_slice(body)
        .map_err(|e| GeocodeError::Service(format!("JSON parse error: {}", e)))?;

    if let Some(first) = data.results.first() {
        let location = &first.geometry.location;
        return Ok(GeoPoint::new(location.lat, location.lng));
    }

    match data.status.as_str() {
        "" | "OK" | "ZERO_RESULTS" => Err(GeocodeError::NotFound),
        status => Err(GeocodeError::Service(match data.error_message {
            Some(msg) => format!("{}: {}", status, msg),
            None => status.to_string(),
        })),
    }
}
