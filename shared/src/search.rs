use serde::{Deserialize, Deserializer, Serialize};

use crate::geo::{BoundingRegion, GeoPoint, ValidationError};

/// One raw entry of the geocoder's `/search` answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaceResult {
    #[serde(deserialize_with = "text_or_number")]
    pub place_id: String,
    pub display_name: String,
    #[serde(deserialize_with = "text_or_number")]
    pub lat: String,
    #[serde(deserialize_with = "text_or_number")]
    pub lon: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<PlaceAddress>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlaceAddress {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub road: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub county: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
}

fn text_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum TextOrNumber {
        Text(String),
        Integer(i64),
        Float(f64),
    }

    Ok(match TextOrNumber::deserialize(deserializer)? {
        TextOrNumber::Text(text) => text,
        TextOrNumber::Integer(value) => value.to_string(),
        TextOrNumber::Float(value) => value.to_string(),
    })
}

/// A geocoded location offered to the user while typing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeocodeCandidate {
    pub id: String,
    pub display_name: String,
    pub lat: f64,
    pub lng: f64,
}

impl GeocodeCandidate {
    /// Parses a raw place; `None` when its coordinates are not numbers.
    pub fn from_place(place: &PlaceResult) -> Option<Self> {
        let lat = place.lat.trim().parse::<f64>().ok()?;
        let lng = place.lon.trim().parse::<f64>().ok()?;
        Some(Self {
            id: place.place_id.clone(),
            display_name: place.display_name.clone(),
            lat,
            lng,
        })
    }

    /// First two comma-separated parts of the display name.
    pub fn short_label(&self) -> String {
        let mut parts = self.display_name.split(',').map(str::trim);
        match (parts.next(), parts.next()) {
            (Some(first), Some(second)) => format!("{first}, {second}"),
            (Some(first), None) => first.to_string(),
            _ => String::new(),
        }
    }

    pub fn to_point(&self, region: &BoundingRegion) -> Result<GeoPoint, ValidationError> {
        region.admit(self.lat, self.lng, self.short_label())
    }
}
