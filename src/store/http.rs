//! REST client for the hosted document store.
//!
//! Collection scans paginate with `pageToken`; updates PATCH a single
//! document. No automatic retry: the updater's failure semantics depend on
//! seeing every error exactly once, and HTTP 429 must surface as
//! `StoreError::RateLimited` immediately so the batch can stop.

use async_trait::async_trait;
use serde::Deserialize;
use url::Url;

use super::{RecordStore, StoreError};
use crate::types::{AttributionPatch, Identity, SaleRecord};

/// Page size for collection scans.
const PAGE_SIZE: &str = "500";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListResponse<T> {
    #[serde(default = "Vec::new")]
    items: Vec<T>,
    next_page_token: Option<String>,
}

pub struct HttpStore {
    client: reqwest::Client,
    base_url: Url,
    api_key: String,
}

impl HttpStore {
    pub fn new(base_url: Url, api_key: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url,
            api_key,
        }
    }

    fn endpoint(&self, path: &str) -> Result<Url, StoreError> {
        self.base_url.join(path).map_err(|e| StoreError::Api {
            status: 0,
            message: format!("invalid endpoint '{}': {}", path, e),
        })
    }

    /// Scan a whole collection, following `pageToken` until exhausted.
    async fn scan<T: serde::de::DeserializeOwned>(
        &self,
        collection: &str,
    ) -> Result<Vec<T>, StoreError> {
        let url = self.endpoint(collection)?;
        let mut all = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut request = self
                .client
                .get(url.clone())
                .bearer_auth(&self.api_key)
                .query(&[("maxResults", PAGE_SIZE)]);
            if let Some(ref token) = page_token {
                request = request.query(&[("pageToken", token.as_str())]);
            }

            let resp = request.send().await?;
            let resp = check_status(resp).await?;
            let body: ListResponse<T> = resp.json().await?;

            all.extend(body.items);
            match body.next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => break,
            }
        }

        log::info!("scanned {}: {} document(s)", collection, all.len());
        Ok(all)
    }
}

/// Map non-success statuses to the error taxonomy. 429 is the rate-limit
/// signal the updater fail-fasts on.
async fn check_status(resp: reqwest::Response) -> Result<reqwest::Response, StoreError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
        return Err(StoreError::RateLimited);
    }
    if status == reqwest::StatusCode::UNAUTHORIZED {
        return Err(StoreError::AuthExpired);
    }
    let message = resp.text().await.unwrap_or_default();
    Err(StoreError::Api {
        status: status.as_u16(),
        message,
    })
}

#[async_trait]
impl RecordStore for HttpStore {
    async fn fetch_identities(&self) -> Result<Vec<Identity>, StoreError> {
        self.scan("users").await
    }

    async fn fetch_sale_records(&self) -> Result<Vec<SaleRecord>, StoreError> {
        self.scan("sales").await
    }

    async fn update_attribution(
        &self,
        record_id: &str,
        patch: &AttributionPatch,
    ) -> Result<(), StoreError> {
        let url = self.endpoint(&format!("sales/{}", record_id))?;
        let resp = self
            .client
            .patch(url)
            .bearer_auth(&self.api_key)
            .json(patch)
            .send()
            .await?;
        check_status(resp).await?;
        Ok(())
    }

    async fn record_presence(&self, operator_id: &str) -> Result<(), StoreError> {
        let url = self.endpoint(&format!("presence/{}", operator_id))?;
        let resp = self
            .client
            .put(url)
            .bearer_auth(&self.api_key)
            .json(&serde_json::json!({
                "lastSeen": chrono::Utc::now().to_rfc3339(),
            }))
            .send()
            .await?;
        check_status(resp).await?;
        Ok(())
    }
}
