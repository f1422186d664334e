use async_trait::async_trait;
use shared::{BoundingRegion, PlaceResult};

use super::{Geocoder, join_url, read_json};
use crate::error::CoreError;

/// Nominatim `/search` client.
pub struct NominatimGeocoder {
    client: reqwest::Client,
    base_url: String,
}

impl NominatimGeocoder {
    pub fn new(client: reqwest::Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

pub(crate) fn search_params(
    text: &str,
    region: &BoundingRegion,
    limit: usize,
) -> Vec<(&'static str, String)> {
    let mut params = vec![
        ("q", format!("{}, {}", text.trim(), region.search_suffix())),
        ("format", "json".to_string()),
        ("limit", limit.to_string()),
        ("addressdetails", "1".to_string()),
        ("viewbox", region.viewbox()),
        ("bounded", "1".to_string()),
    ];
    if let Some(code) = region.country_code() {
        params.push(("countrycodes", code.to_string()));
    }
    params
}

#[async_trait]
impl Geocoder for NominatimGeocoder {
    async fn search(
        &self,
        text: &str,
        region: &BoundingRegion,
        limit: usize,
    ) -> Result<Vec<PlaceResult>, CoreError> {
        let response = self
            .client
            .get(join_url(&self.base_url, "search"))
            .query(&search_params(text, region, limit))
            .send()
            .await?;
        read_json(response).await
    }
}
