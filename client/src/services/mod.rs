//! Remote collaborators consumed by the core.
//!
//! Each collaborator is a trait so the components can be driven by in-memory fakes in tests;
//! the `Http*`, `Osrm*` and `Nominatim*` types are the production implementations over
//! `reqwest`.

use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use shared::{
    BoundingRegion, CalculateRequest, CalculateResponse, GeoPoint, HistoryPage, HistoryQuery,
    LatLng, PlaceResult,
};

use crate::config::ClientConfig;
use crate::error::CoreError;

pub mod calculation;
pub mod geocoding;
pub mod history;
pub mod routing;

pub use calculation::HttpCalculationService;
pub use geocoding::NominatimGeocoder;
pub use history::HttpHistoryStore;
pub use routing::OsrmRoutingService;

/// Primary calculation service (`POST /calculate`).
#[async_trait]
pub trait CalculationService: Send + Sync {
    async fn calculate(&self, request: &CalculateRequest) -> Result<CalculateResponse, CoreError>;
}

/// Fallback router, used for road geometry only.
#[async_trait]
pub trait RoutingService: Send + Sync {
    async fn route_geometry(
        &self,
        origin: &GeoPoint,
        destination: &GeoPoint,
    ) -> Result<Vec<LatLng>, CoreError>;
}

/// Free-text geocoder restricted to a region.
#[async_trait]
pub trait Geocoder: Send + Sync {
    async fn search(
        &self,
        text: &str,
        region: &BoundingRegion,
        limit: usize,
    ) -> Result<Vec<PlaceResult>, CoreError>;
}

/// Server-side store of past calculations.
#[async_trait]
pub trait HistoryStore: Send + Sync {
    async fn fetch_page(&self, query: &HistoryQuery) -> Result<HistoryPage, CoreError>;
}

/// Liveness only; failures read as "not healthy".
#[async_trait]
pub trait HealthProbe: Send + Sync {
    async fn is_healthy(&self) -> bool;
}

/// The production collaborator set, sharing one HTTP connection pool.
#[derive(Clone)]
pub struct HttpServices {
    pub calculation: Arc<HttpCalculationService>,
    pub routing: Arc<OsrmRoutingService>,
    pub geocoder: Arc<NominatimGeocoder>,
    pub history: Arc<HttpHistoryStore>,
}

impl HttpServices {
    pub fn new(config: &ClientConfig) -> Result<Self, CoreError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .user_agent(config.user_agent.clone())
            .build()?;

        Ok(Self {
            calculation: Arc::new(HttpCalculationService::new(
                client.clone(),
                &config.api_url,
            )),
            routing: Arc::new(OsrmRoutingService::new(client.clone(), &config.routing_url)),
            geocoder: Arc::new(NominatimGeocoder::new(client.clone(), &config.geocoder_url)),
            history: Arc::new(HttpHistoryStore::new(client, &config.api_url)),
        })
    }
}

const MAX_ERROR_BODY: usize = 200;

/// Turns a non-2xx answer into [`CoreError::RemoteRejection`] and parses the body otherwise.
pub(crate) async fn read_json<T: DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, CoreError> {
    let status = response.status();
    let text = response.text().await?;

    if !status.is_success() {
        let mut message = text;
        if message.len() > MAX_ERROR_BODY {
            let cut = (0..=MAX_ERROR_BODY)
                .rev()
                .find(|i| message.is_char_boundary(*i))
                .unwrap_or(0);
            message.truncate(cut);
        }
        return Err(CoreError::RemoteRejection {
            status: status.as_u16(),
            message,
        });
    }

    serde_json::from_str(&text).map_err(|err| CoreError::MalformedResponse(err.to_string()))
}

pub(crate) fn join_url(base: &str, path: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), path.trim_start_matches('/'))
}
