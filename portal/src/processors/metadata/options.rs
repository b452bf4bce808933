use std::time::Duration;

use serde::Deserialize;

use super::METADATA_URL;

/// What initialization does when the metadata document cannot be obtained.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FetchFailurePolicy {
    /// Log the failure and attach nothing.
    #[default]
    Continue,
    /// Fail initialization so the host refuses to start.
    Abort,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataOptions {
    pub(crate) portal_tags: Vec<String>,
    pub(crate) timeout: Duration,
    pub(crate) on_fetch_failure: FetchFailurePolicy,
    pub(crate) url: String,
}

impl Default for MetadataOptions {
    fn default() -> Self {
        Self {
            portal_tags: Vec::new(),
            timeout: Duration::from_secs(10),
            on_fetch_failure: FetchFailurePolicy::Continue,
            url: METADATA_URL.to_string(),
        }
    }
}

impl MetadataOptions {
    pub fn portal_tags<I, S>(self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            portal_tags: tags.into_iter().map(|t| t.as_ref().to_string()).collect(),
            ..self
        }
    }

    pub fn timeout(self, timeout: Duration) -> Self {
        Self { timeout, ..self }
    }

    pub fn on_fetch_failure(self, on_fetch_failure: FetchFailurePolicy) -> Self {
        Self {
            on_fetch_failure,
            ..self
        }
    }

    /// Overrides the metadata endpoint. Only meant for tests, the Portal always serves
    /// metadata on [`METADATA_URL`].
    #[doc(hidden)]
    pub fn url(self, url: impl AsRef<str>) -> Self {
        Self {
            url: url.as_ref().to_string(),
            ..self
        }
    }
}
