use std::time::Duration;

use super::{MetadataDocument, MetadataError};

pub const METADATA_URL: &str = "http://169.254.169.254/metrics/metadata";

/// Result of the one-time metadata fetch.
#[derive(Debug)]
pub enum FetchOutcome {
    Fetched(MetadataDocument),
    /// The fetch failed; `document` is the zero-valued document.
    Degraded {
        document: MetadataDocument,
        reason: MetadataError,
    },
}

pub struct MetadataClient {
    url: String,
    inner: reqwest::Client,
}

impl MetadataClient {
    pub fn new(url: impl AsRef<str>, timeout: Duration) -> Result<Self, MetadataError> {
        let inner = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(MetadataError::Client)?;

        Ok(Self {
            url: url.as_ref().to_string(),
            inner,
        })
    }

    pub async fn fetch(&self) -> Result<MetadataDocument, MetadataError> {
        let fetch_error = |source| MetadataError::Fetch {
            url: self.url.clone(),
            source,
        };

        let resp = self
            .inner
            .get(self.url.as_str())
            .send()
            .await
            .map_err(fetch_error)?;

        let status = resp.status();
        if !status.is_success() {
            return Err(MetadataError::Status {
                url: self.url.clone(),
                status,
            });
        }

        let body = resp.bytes().await.map_err(fetch_error)?;

        Ok(serde_json::from_slice(&body)?)
    }

    /// Same as [`MetadataClient::fetch`] but never fails: errors degrade to the empty document.
    pub async fn fetch_outcome(&self) -> FetchOutcome {
        match self.fetch().await {
            Ok(document) => FetchOutcome::Fetched(document),
            Err(reason) => FetchOutcome::Degraded {
                document: MetadataDocument::default(),
                reason,
            },
        }
    }
}
