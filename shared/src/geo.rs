use geo_types::{Rect, coord};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("coordinate is not a finite number")]
    NotFinite,
    #[error("latitude {0} out of range [-90, 90]")]
    LatitudeOutOfRange(f64),
    #[error("longitude {0} out of range [-180, 180]")]
    LongitudeOutOfRange(f64),
    #[error("point ({lat:.4}, {lng:.4}) lies outside {region}")]
    OutsideRegion { lat: f64, lng: f64, region: String },
}

/// A validated, immutable geographic point.
///
/// Construction goes through [`GeoPoint::new`] or [`BoundingRegion::admit`], so a value of this
/// type always carries in-range, finite coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawGeoPoint")]
pub struct GeoPoint {
    lat: f64,
    lng: f64,
    label: String,
}

#[derive(Deserialize)]
struct RawGeoPoint {
    lat: f64,
    lng: f64,
    #[serde(default)]
    label: String,
}

impl TryFrom<RawGeoPoint> for GeoPoint {
    type Error = ValidationError;

    fn try_from(raw: RawGeoPoint) -> Result<Self, Self::Error> {
        GeoPoint::new(raw.lat, raw.lng, raw.label)
    }
}

impl GeoPoint {
    pub fn new(lat: f64, lng: f64, label: impl Into<String>) -> Result<Self, ValidationError> {
        if !lat.is_finite() || !lng.is_finite() {
            return Err(ValidationError::NotFinite);
        }
        if !(-90.0..=90.0).contains(&lat) {
            return Err(ValidationError::LatitudeOutOfRange(lat));
        }
        if !(-180.0..=180.0).contains(&lng) {
            return Err(ValidationError::LongitudeOutOfRange(lng));
        }
        Ok(Self {
            lat,
            lng,
            label: label.into(),
        })
    }

    pub fn lat(&self) -> f64 {
        self.lat
    }

    pub fn lng(&self) -> f64 {
        self.lng
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Same coordinates, regardless of label.
    pub fn same_location(&self, other: &GeoPoint) -> bool {
        self.lat == other.lat && self.lng == other.lng
    }
}

/// One vertex of a route polyline, always in `(lat, lng)` order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    /// Builds a vertex from a GeoJSON `[lng, lat]` pair.
    pub fn from_lng_lat(pair: [f64; 2]) -> Self {
        Self {
            lat: pair[1],
            lng: pair[0],
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
struct LatitudeBand {
    above: f64,
    name: &'static str,
}

/// The fixed area outside of which points and search results are rejected.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundingRegion {
    name: String,
    aliases: Vec<String>,
    bounds: Rect<f64>,
    search_suffix: String,
    country_code: Option<String>,
    bands: Vec<LatitudeBand>,
    fallback_band: &'static str,
}

impl BoundingRegion {
    pub fn california() -> Self {
        Self {
            name: "California".to_string(),
            aliases: vec!["California".to_string(), "CA".to_string()],
            bounds: Rect::new(coord! { x: -124.4, y: 32.5 }, coord! { x: -114.6, y: 42.0 }),
            search_suffix: "California, USA".to_string(),
            country_code: Some("us".to_string()),
            bands: vec![
                LatitudeBand {
                    above: 40.0,
                    name: "Northern CA",
                },
                LatitudeBand {
                    above: 37.0,
                    name: "Bay Area",
                },
                LatitudeBand {
                    above: 35.0,
                    name: "Central CA",
                },
                LatitudeBand {
                    above: 34.0,
                    name: "Central Coast",
                },
            ],
            fallback_band: "Southern CA",
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn search_suffix(&self) -> &str {
        &self.search_suffix
    }

    pub fn country_code(&self) -> Option<&str> {
        self.country_code.as_deref()
    }

    pub fn south(&self) -> f64 {
        self.bounds.min().y
    }

    pub fn north(&self) -> f64 {
        self.bounds.max().y
    }

    pub fn west(&self) -> f64 {
        self.bounds.min().x
    }

    pub fn east(&self) -> f64 {
        self.bounds.max().x
    }

    /// Inclusive box test.
    pub fn contains(&self, lat: f64, lng: f64) -> bool {
        lat >= self.south() && lat <= self.north() && lng >= self.west() && lng <= self.east()
    }

    /// True when the text names this region by any of its aliases.
    pub fn mentioned_in(&self, text: &str) -> bool {
        self.aliases.iter().any(|alias| text.contains(alias.as_str()))
    }

    /// Validates a raw coordinate pair and turns it into a point of this region.
    pub fn admit(
        &self,
        lat: f64,
        lng: f64,
        label: impl Into<String>,
    ) -> Result<GeoPoint, ValidationError> {
        let point = GeoPoint::new(lat, lng, label)?;
        self.check(&point)?;
        Ok(point)
    }

    /// Rejects an already built point that falls outside this region.
    pub fn check(&self, point: &GeoPoint) -> Result<(), ValidationError> {
        if self.contains(point.lat, point.lng) {
            Ok(())
        } else {
            Err(ValidationError::OutsideRegion {
                lat: point.lat,
                lng: point.lng,
                region: self.name.clone(),
            })
        }
    }

    /// `west,south,east,north`, the geocoder's viewbox format.
    pub fn viewbox(&self) -> String {
        format!(
            "{},{},{},{}",
            self.west(),
            self.south(),
            self.east(),
            self.north()
        )
    }

    /// Human label for a clicked point, e.g. `"37.7749, -122.4194 (Bay Area)"`.
    pub fn describe(&self, lat: f64, lng: f64) -> String {
        let band = self
            .bands
            .iter()
            .find(|band| lat > band.above)
            .map(|band| band.name)
            .unwrap_or(self.fallback_band);
        format!("{lat:.4}, {lng:.4} ({band})")
    }
}

impl Default for BoundingRegion {
    fn default() -> Self {
        Self::california()
    }
}
