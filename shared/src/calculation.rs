use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::geo::{GeoPoint, LatLng};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Units {
    #[default]
    Miles,
    Km,
}

impl Units {
    pub fn as_str(self) -> &'static str {
        match self {
            Units::Miles => "miles",
            Units::Km => "km",
        }
    }
}

impl fmt::Display for Units {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Units {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "miles" | "mi" => Ok(Units::Miles),
            "km" | "kilometers" | "kilometres" => Ok(Units::Km),
            other => Err(format!("unknown distance unit `{other}`")),
        }
    }
}

/// Road distance over straight distance, absent when the straight distance is not positive.
pub fn circuity_factor(straight_distance: f64, road_distance: f64) -> Option<f64> {
    if straight_distance > 0.0 && straight_distance.is_finite() && road_distance.is_finite() {
        Some(road_distance / straight_distance)
    } else {
        None
    }
}

/// `100 / factor`, clamped at 100 for factors below 1 (measurement noise).
pub fn efficiency_percent(circuity_factor: f64) -> f64 {
    if circuity_factor < 1.0 {
        100.0
    } else {
        100.0 / circuity_factor
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EfficiencyRating {
    Excellent,
    Good,
    Fair,
    Poor,
}

impl EfficiencyRating {
    pub fn from_factor(circuity_factor: f64) -> Self {
        if circuity_factor < 1.2 {
            EfficiencyRating::Excellent
        } else if circuity_factor < 1.5 {
            EfficiencyRating::Good
        } else if circuity_factor < 2.0 {
            EfficiencyRating::Fair
        } else {
            EfficiencyRating::Poor
        }
    }
}

/// Full comparison between straight-line and road distance for one origin/destination pair.
///
/// The circuity factor and efficiency are always derived from the two distances, so the
/// `factor = road / straight` invariant holds for every value of this type.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CalculationResult {
    origin: GeoPoint,
    destination: GeoPoint,
    straight_distance: f64,
    road_distance: f64,
    circuity_factor: Option<f64>,
    efficiency_percent: Option<f64>,
    units: Units,
    elapsed_ms: u64,
    was_cached: bool,
    route_geometry: Option<Vec<LatLng>>,
}

impl CalculationResult {
    pub fn new(
        origin: GeoPoint,
        destination: GeoPoint,
        straight_distance: f64,
        road_distance: f64,
        units: Units,
    ) -> Self {
        let circuity_factor = circuity_factor(straight_distance, road_distance);
        Self {
            origin,
            destination,
            straight_distance,
            road_distance,
            circuity_factor,
            efficiency_percent: circuity_factor.map(efficiency_percent),
            units,
            elapsed_ms: 0,
            was_cached: false,
            route_geometry: None,
        }
    }

    pub fn with_timing(mut self, elapsed_ms: u64, was_cached: bool) -> Self {
        self.elapsed_ms = elapsed_ms;
        self.was_cached = was_cached;
        self
    }

    pub fn with_geometry(mut self, geometry: Vec<LatLng>) -> Self {
        self.route_geometry = Some(geometry);
        self
    }

    pub fn origin(&self) -> &GeoPoint {
        &self.origin
    }

    pub fn destination(&self) -> &GeoPoint {
        &self.destination
    }

    pub fn straight_distance(&self) -> f64 {
        self.straight_distance
    }

    pub fn road_distance(&self) -> f64 {
        self.road_distance
    }

    pub fn circuity_factor(&self) -> Option<f64> {
        self.circuity_factor
    }

    pub fn efficiency_percent(&self) -> Option<f64> {
        self.efficiency_percent
    }

    pub fn rating(&self) -> Option<EfficiencyRating> {
        self.circuity_factor.map(EfficiencyRating::from_factor)
    }

    pub fn units(&self) -> Units {
        self.units
    }

    pub fn elapsed_ms(&self) -> u64 {
        self.elapsed_ms
    }

    pub fn was_cached(&self) -> bool {
        self.was_cached
    }

    pub fn route_geometry(&self) -> Option<&[LatLng]> {
        self.route_geometry.as_deref()
    }

    /// Same comparison seen from the other end; distances are direction independent.
    pub fn swapped(&self) -> Self {
        Self {
            origin: self.destination.clone(),
            destination: self.origin.clone(),
            route_geometry: self.route_geometry.as_ref().map(|geometry| {
                let mut reversed = geometry.clone();
                reversed.reverse();
                reversed
            }),
            ..self.clone()
        }
    }
}

/// Road geometry obtained without any distance figures.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouteSketch {
    pub origin: GeoPoint,
    pub destination: GeoPoint,
    pub geometry: Vec<LatLng>,
}

impl RouteSketch {
    pub fn swapped(&self) -> Self {
        let mut geometry = self.geometry.clone();
        geometry.reverse();
        Self {
            origin: self.destination.clone(),
            destination: self.origin.clone(),
            geometry,
        }
    }
}
