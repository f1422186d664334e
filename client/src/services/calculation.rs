use async_trait::async_trait;
use shared::{CalculateRequest, CalculateResponse};

use super::{CalculationService, HealthProbe, join_url, read_json};
use crate::error::CoreError;

pub struct HttpCalculationService {
    client: reqwest::Client,
    base_url: String,
}

impl HttpCalculationService {
    pub fn new(client: reqwest::Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl CalculationService for HttpCalculationService {
    async fn calculate(&self, request: &CalculateRequest) -> Result<CalculateResponse, CoreError> {
        let (from, to, units) = (&request.origin, &request.destination, request.units);
        tracing::debug!(
            "POST /calculate ({:.5},{:.5}) -> ({:.5},{:.5}) in {units}",
            from.lat,
            from.lng,
            to.lat,
            to.lng
        );
        let response = self
            .client
            .post(join_url(&self.base_url, "calculate"))
            .json(request)
            .send()
            .await?;
        read_json(response).await
    }
}

#[async_trait]
impl HealthProbe for HttpCalculationService {
    async fn is_healthy(&self) -> bool {
        match self
            .client
            .get(join_url(&self.base_url, "health"))
            .send()
            .await
        {
            Ok(response) => response.status().is_success(),
            Err(err) => {
                tracing::warn!("health check failed: {err}");
                false
            }
        }
    }
}
