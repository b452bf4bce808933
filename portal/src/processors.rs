pub mod metadata;

pub use metadata::{FetchFailurePolicy, MetadataOptions, MetadataProcessor};
