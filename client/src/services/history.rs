use async_trait::async_trait;
use shared::{HistoryPage, HistoryQuery};

use super::{HistoryStore, join_url, read_json};
use crate::error::CoreError;

pub struct HttpHistoryStore {
    client: reqwest::Client,
    base_url: String,
}

impl HttpHistoryStore {
    pub fn new(client: reqwest::Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl HistoryStore for HttpHistoryStore {
    async fn fetch_page(&self, query: &HistoryQuery) -> Result<HistoryPage, CoreError> {
        let response = self
            .client
            .get(join_url(&self.base_url, "history"))
            .query(query)
            .send()
            .await?;
        let page: HistoryPage = read_json(response).await?;
        let (current, total, rows) = (page.page, page.total_pages, page.items.len());
        tracing::debug!("history page {current}/{total}: {rows} rows");
        Ok(page)
    }
}
