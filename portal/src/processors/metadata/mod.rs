mod client;
mod document;
mod error;
mod options;
mod processor;
mod selection;

pub use client::{FetchOutcome, MetadataClient, METADATA_URL};
pub use document::{MetadataDocument, TAG_FIELDS, UNMAPPED_FIELDS};
pub use error::MetadataError;
pub use options::{FetchFailurePolicy, MetadataOptions};
pub use processor::{MetadataProcessor, SAMPLE_CONFIG};
pub use selection::TagSelection;
