pub mod config;
pub mod line_protocol;

use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Float(f64),
    Integer(i64),
    Unsigned(u64),
    String(String),
    Boolean(bool),
}

/// A single measurement flowing through the pipeline.
///
/// Tags are kept sorted by key, which is also the order they are written back out in.
#[derive(Debug, Clone, PartialEq)]
pub struct Metric {
    pub name: String,
    pub tags: BTreeMap<String, String>,
    pub fields: BTreeMap<String, FieldValue>,
    /// Nanoseconds since the unix epoch.
    pub timestamp: i64,
}

impl Metric {
    /// Sets a tag, replacing any previous value under the same key.
    pub fn add_tag(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.tags.insert(key.into(), value.into());
    }

    pub fn get_tag(&self, key: &str) -> Option<&str> {
        self.tags.get(key).map(String::as_str)
    }

    pub fn has_tag(&self, key: &str) -> bool {
        self.tags.contains_key(key)
    }

    pub fn get_field(&self, key: &str) -> Option<&FieldValue> {
        self.fields.get(key)
    }
}

pub struct MetricBuilder {
    name: String,
    tags: BTreeMap<String, String>,
    fields: BTreeMap<String, FieldValue>,
    timestamp: Option<i64>,
}

impl MetricBuilder {
    pub fn new(name: impl AsRef<str>) -> Self {
        Self {
            name: name.as_ref().to_string(),
            tags: Default::default(),
            fields: Default::default(),
            timestamp: None,
        }
    }

    pub fn gauge(name: impl AsRef<str>, value: f64) -> Self {
        Self::new(name).field("value", FieldValue::Float(value))
    }

    pub fn tag(mut self, key: impl AsRef<str>, value: impl AsRef<str>) -> Self {
        self.tags
            .insert(key.as_ref().to_string(), value.as_ref().to_string());
        self
    }

    pub fn tags(self, tags: BTreeMap<String, String>) -> Self {
        Self { tags, ..self }
    }

    pub fn field(mut self, key: impl AsRef<str>, value: FieldValue) -> Self {
        self.fields.insert(key.as_ref().to_string(), value);
        self
    }

    pub fn timestamp(self, timestamp: i64) -> Self {
        Self {
            timestamp: Some(timestamp),
            ..self
        }
    }

    pub fn build(self) -> Metric {
        Metric {
            name: self.name,
            tags: self.tags,
            fields: self.fields,
            timestamp: self.timestamp.unwrap_or_else(now_in_nanos),
        }
    }
}

pub(crate) fn now_in_nanos() -> i64 {
    // `timestamp_nanos_opt` only fails past the year 2262.
    chrono::Utc::now().timestamp_nanos_opt().unwrap_or(i64::MAX)
}

/// A pipeline stage that enriches or transforms metrics without changing their count.
///
/// The host calls [`Processor::init`] exactly once before the first call to
/// [`Processor::apply`].
#[async_trait::async_trait]
pub trait Processor: Send + Sync {
    /// Name the processor is registered under in the configuration file.
    fn name(&self) -> &'static str;

    fn description(&self) -> &'static str;

    fn sample_config(&self) -> &'static str;

    async fn init(&mut self) -> eyre::Result<()>;

    fn apply(&self, metrics: Vec<Metric>) -> Vec<Metric>;
}
