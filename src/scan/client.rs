//! Page sources for the vulnerability-scan API.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use tracing::debug;

use crate::config::ScanConfig;
use crate::error::ScanError;
use crate::scan::types::ScanPage;

/// Something that can return a page of scan results for a cursor.
#[async_trait]
pub trait ScanSource: Send + Sync {
    /// Fetch the page at `cursor`, or the first page when `None`.
    async fn fetch_page(&self, cursor: Option<&str>) -> Result<ScanPage, ScanError>;
}

/// HTTP implementation backed by `reqwest`.
pub struct HttpScanSource {
    client: reqwest::Client,
    url: String,
    api_key: Option<SecretString>,
}

impl HttpScanSource {
    pub fn new(config: &ScanConfig) -> Result<Self, ScanError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .danger_accept_invalid_certs(config.accept_invalid_certs)
            .build()
            .map_err(|e| ScanError::Client(e.to_string()))?;

        Ok(Self {
            client,
            url: config.endpoint(),
            api_key: config.api_key.clone(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl ScanSource for HttpScanSource {
    async fn fetch_page(&self, cursor: Option<&str>) -> Result<ScanPage, ScanError> {
        let mut request = self.client.get(&self.url);
        if let Some(cursor) = cursor {
            request = request.query(&[("cursor", cursor)]);
        }
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key.expose_secret());
        }

        let response = request
            .send()
            .await
            .map_err(|e| ScanError::RequestFailed {
                url: self.url.clone(),
                reason: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ScanError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let page: ScanPage = response
            .json()
            .await
            .map_err(|e| ScanError::InvalidResponse(e.to_string()))?;
        debug!(
            services = page.services.len(),
            has_next = page.cursor.is_some(),
            "Fetched scan page"
        );
        Ok(page)
    }
}
