use async_trait::async_trait;
use reqwest::{Client, Url};
use std::sync::Arc;
use std::time::Duration;

use crate::config::CatalogConfig;
use crate::error::{PriceAgentError, Result};
use crate::models::{CatalogPage, PriceRecord};

/// Fetches a single page of the retail price catalog by absolute URL.
#[async_trait]
pub trait CatalogTransport: Send + Sync {
    async fn get_page(&self, url: &str) -> Result<CatalogPage>;
}

pub struct HttpCatalog {
    client: Client,
}

impl HttpCatalog {
    pub fn new(connect_timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: Client::builder().connect_timeout(connect_timeout).build()?,
        })
    }
}

#[async_trait]
impl CatalogTransport for HttpCatalog {
    async fn get_page(&self, url: &str) -> Result<CatalogPage> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| PriceAgentError::UpstreamFetch(format!("Request to {url} failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(PriceAgentError::UpstreamFetch(format!(
                "Price catalog returned {status} for {url}"
            )));
        }

        response.json().await.map_err(|e| {
            PriceAgentError::UpstreamFetch(format!("Failed to decode catalog page: {e}"))
        })
    }
}

/// Runs a filter predicate against the catalog and follows `NextPageLink` to the end.
pub struct PriceFetcher {
    tx: Arc<dyn CatalogTransport>,
    base_url: String,
    api_version: String,
}

impl PriceFetcher {
    pub fn new(tx: Arc<dyn CatalogTransport>, config: &CatalogConfig) -> Self {
        Self {
            tx,
            base_url: config.base_url.clone(),
            api_version: config.api_version.clone(),
        }
    }

    /// First page URL with the predicate embedded as `$filter`.
    pub fn initial_url(&self, predicate: &str) -> Result<String> {
        let mut url = Url::parse(&self.base_url).map_err(|e| {
            PriceAgentError::Config(format!("Invalid catalog URL '{}': {e}", self.base_url))
        })?;
        url.query_pairs_mut()
            .append_pair("api-version", &self.api_version)
            .append_pair("$filter", predicate);
        Ok(url.into())
    }

    /// Accumulates every page in catalog order. Any failed page aborts the whole fetch.
    pub async fn fetch_all(&self, predicate: &str) -> Result<Vec<PriceRecord>> {
        let mut next = Some(self.initial_url(predicate)?);
        let mut records = Vec::new();
        let mut pages = 0usize;

        while let Some(url) = next.take() {
            let page = self.tx.get_page(&url).await?;
            pages += 1;
            tracing::debug!(page = pages, items = page.items.len(), "Fetched catalog page");
            records.extend(page.items);
            next = page.next_page_link.filter(|link| !link.is_empty());
        }

        tracing::info!(
            pages,
            records = records.len(),
            "Fetched price records for filter: {}",
            predicate
        );
        Ok(records)
    }
}
