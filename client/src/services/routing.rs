use async_trait::async_trait;
use shared::{GeoPoint, LatLng, OsrmRouteResponse};

use super::{RoutingService, join_url, read_json};
use crate::error::CoreError;

/// OSRM-compatible router queried for driving geometry.
pub struct OsrmRoutingService {
    client: reqwest::Client,
    base_url: String,
}

impl OsrmRoutingService {
    pub fn new(client: reqwest::Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn route_url(&self, origin: &GeoPoint, destination: &GeoPoint) -> String {
        join_url(
            &self.base_url,
            &format!(
                "route/v1/driving/{},{};{},{}",
                origin.lng(),
                origin.lat(),
                destination.lng(),
                destination.lat()
            ),
        )
    }
}

#[async_trait]
impl RoutingService for OsrmRoutingService {
    async fn route_geometry(
        &self,
        origin: &GeoPoint,
        destination: &GeoPoint,
    ) -> Result<Vec<LatLng>, CoreError> {
        let response = self
            .client
            .get(self.route_url(origin, destination))
            .query(&[("overview", "full"), ("geometries", "geojson")])
            .send()
            .await?;
        let body: OsrmRouteResponse = read_json(response).await?;

        let geometry = body.first_geometry().ok_or(CoreError::NoRoute)?;
        let vertices = geometry.len();
        tracing::debug!("fallback router returned {vertices} vertices");
        Ok(geometry)
    }
}
