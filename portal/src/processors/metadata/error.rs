#[derive(Debug, thiserror::Error)]
pub enum MetadataError {
    #[error("no tags specified in configuration")]
    NoTags,

    #[error("Error when building the metadata HTTP client")]
    Client(#[source] reqwest::Error),

    #[error("Error when requesting metadata from '{url}'")]
    Fetch {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Metadata endpoint '{url}' answered with status {status}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },

    #[error("Error when decoding the metadata document")]
    Decode(#[from] serde_json::Error),
}
