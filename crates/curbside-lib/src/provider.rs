//! Client for the external road-distance provider (openrouteservice).
//!
//! Every call is best-effort: network failures, non-success statuses, and
//! malformed payloads degrade to an explicit "unknown" result (`None` or an
//! empty geometry) instead of raising, so a flaky provider can never fail a
//! point insertion or a planning request. Calls are never retried
//! synchronously.

use std::env;
use std::time::Duration;

use reqwest::blocking::Client;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, warn};

use crate::error::Result;
use crate::model::Coordinates;

const DEFAULT_BASE_URL: &str = "https://api.openrouteservice.org";
const DIRECTIONS_PATH: &str = "/v2/directions/driving-car";
const API_KEY_ENV: &str = "ORS_API_KEY";
/// Override the provider base URL, used by tests to point at a local stub.
const BASE_URL_ENV: &str = "CURBSIDE_ORS_URL";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Road-distance and geometry source consumed by the edge synthesizer and
/// the route assembler. Implemented by [`OrsClient`] in production and by
/// in-memory fakes in tests.
pub trait DistanceProvider: Send + Sync {
    /// Road travel distance in metres between two coordinates, or `None`
    /// when the provider could not furnish one.
    fn road_distance(&self, from: &Coordinates, to: &Coordinates) -> Option<f64>;

    /// Turn-by-turn driving geometry between two coordinates as ordered
    /// `[lng, lat]` pairs. Empty on failure.
    fn route_geometry(&self, from: &Coordinates, to: &Coordinates) -> Vec<[f64; 2]>;
}

/// Blocking openrouteservice client.
pub struct OrsClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl OrsClient {
    /// Build a client from the environment: `ORS_API_KEY` for the
    /// Authorization header and `CURBSIDE_ORS_URL` to override the endpoint.
    /// A missing key is tolerated; every lookup will simply degrade.
    pub fn from_env() -> Result<Self> {
        let api_key = env::var(API_KEY_ENV).ok();
        if api_key.is_none() {
            warn!("{API_KEY_ENV} is not set; all distance lookups will degrade to unknown");
        }
        let base_url =
            env::var(BASE_URL_ENV).unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        Self::new(base_url, api_key)
    }

    /// Build a client for an explicit endpoint and key.
    pub fn new(base_url: impl Into<String>, api_key: Option<String>) -> Result<Self> {
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            client,
            base_url: base_url.into(),
            api_key,
        })
    }

    fn post(&self, url: &str, from: &Coordinates, to: &Coordinates) -> Option<serde_json::Value> {
        let key = self.api_key.as_deref()?;
        let body = json!({
            "coordinates": [[from.lng, from.lat], [to.lng, to.lat]],
        });

        let response = match self
            .client
            .post(url)
            .header("Authorization", key)
            .json(&body)
            .send()
        {
            Ok(response) => response,
            Err(error) => {
                warn!(%url, %error, "provider request failed");
                return None;
            }
        };

        if !response.status().is_success() {
            warn!(%url, status = %response.status(), "provider returned an error status");
            return None;
        }

        match response.json() {
            Ok(value) => Some(value),
            Err(error) => {
                warn!(%url, %error, "provider response was not valid JSON");
                None
            }
        }
    }
}

impl DistanceProvider for OrsClient {
    fn road_distance(&self, from: &Coordinates, to: &Coordinates) -> Option<f64> {
        let url = format!("{}{DIRECTIONS_PATH}", self.base_url);
        let value = self.post(&url, from, to)?;

        let parsed: DirectionsResponse = match serde_json::from_value(value) {
            Ok(parsed) => parsed,
            Err(error) => {
                warn!(%error, "unexpected directions payload shape");
                return None;
            }
        };

        let distance = parsed
            .routes
            .into_iter()
            .next()
            .and_then(|route| route.summary.distance);
        match distance {
            Some(distance) => {
                debug!(distance, "provider distance resolved");
                Some(distance)
            }
            None => {
                warn!("directions response carried no summary distance");
                None
            }
        }
    }

    fn route_geometry(&self, from: &Coordinates, to: &Coordinates) -> Vec<[f64; 2]> {
        let url = format!("{}{DIRECTIONS_PATH}/geojson", self.base_url);
        let Some(value) = self.post(&url, from, to) else {
            return Vec::new();
        };

        let parsed: GeoJsonResponse = match serde_json::from_value(value) {
            Ok(parsed) => parsed,
            Err(error) => {
                warn!(%error, "unexpected geojson payload shape");
                return Vec::new();
            }
        };

        parsed
            .features
            .into_iter()
            .next()
            .map(|feature| feature.geometry.coordinates)
            .unwrap_or_default()
    }
}

#[derive(Debug, Deserialize)]
struct DirectionsResponse {
    #[serde(default)]
    routes: Vec<DirectionsRoute>,
}

#[derive(Debug, Deserialize)]
struct DirectionsRoute {
    summary: DirectionsSummary,
}

#[derive(Debug, Deserialize)]
struct DirectionsSummary {
    distance: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct GeoJsonResponse {
    #[serde(default)]
    features: Vec<GeoJsonFeature>,
}

#[derive(Debug, Deserialize)]
struct GeoJsonFeature {
    geometry: GeoJsonGeometry,
}

#[derive(Debug, Deserialize)]
struct GeoJsonGeometry {
    #[serde(default)]
    coordinates: Vec<[f64; 2]>,
}
