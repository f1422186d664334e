use serde::{Deserialize, Serialize};

use crate::calculation::Units;
use crate::geo::{GeoPoint, LatLng};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WirePoint {
    pub lat: f64,
    pub lng: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl From<&GeoPoint> for WirePoint {
    fn from(point: &GeoPoint) -> Self {
        Self {
            lat: point.lat(),
            lng: point.lng(),
            name: (!point.label().is_empty()).then(|| point.label().to_string()),
        }
    }
}

/// Body of `POST /calculate`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalculateRequest {
    pub origin: WirePoint,
    pub destination: WirePoint,
    pub units: Units,
}

impl CalculateRequest {
    pub fn new(origin: &GeoPoint, destination: &GeoPoint, units: Units) -> Self {
        Self {
            origin: origin.into(),
            destination: destination.into(),
            units,
        }
    }
}

/// Answer of `POST /calculate`. Route geometry is already `[lat, lng]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalculateResponse {
    pub origin: WirePoint,
    pub destination: WirePoint,
    pub road_distance: f64,
    pub straight_distance: f64,
    #[serde(default)]
    pub circuity_factor: Option<f64>,
    #[serde(default)]
    pub efficiency_percent: Option<f64>,
    pub units: String,
    #[serde(default)]
    pub calculation_time_ms: u64,
    #[serde(default)]
    pub cached: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub route_geometry: Option<Vec<[f64; 2]>>,
}

impl CalculateResponse {
    /// Geometry as vertices, `None` when missing or empty.
    pub fn geometry(&self) -> Option<Vec<LatLng>> {
        self.route_geometry
            .as_ref()
            .filter(|coords| !coords.is_empty())
            .map(|coords| {
                coords
                    .iter()
                    .map(|pair| LatLng {
                        lat: pair[0],
                        lng: pair[1],
                    })
                    .collect()
            })
    }
}

/// Answer of the fallback router's `GET /route/v1/driving/...`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OsrmRouteResponse {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub routes: Vec<OsrmRoute>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OsrmRoute {
    pub geometry: OsrmGeometry,
    #[serde(default)]
    pub distance: Option<f64>,
    #[serde(default)]
    pub duration: Option<f64>,
}

/// GeoJSON line; coordinates are `[lng, lat]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OsrmGeometry {
    pub coordinates: Vec<[f64; 2]>,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
}

impl OsrmRouteResponse {
    /// First route's line, transposed to `(lat, lng)`.
    pub fn first_geometry(&self) -> Option<Vec<LatLng>> {
        self.routes.first().map(|route| {
            route
                .geometry
                .coordinates
                .iter()
                .copied()
                .map(LatLng::from_lng_lat)
                .collect()
        })
    }
}
