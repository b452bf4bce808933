use std::{fmt, time::Duration};

use portal::processors::{FetchFailurePolicy, MetadataOptions};
use serde::{
    de::{Error, Visitor},
    Deserialize, Deserializer,
};

#[derive(Deserialize, Debug)]
#[serde(deny_unknown_fields)]
pub struct MetadataConfig {
    #[serde(default)]
    pub portal_tags: Vec<String>,

    #[serde(default = "default_timeout", deserialize_with = "deserialize_duration")]
    pub timeout: Duration,

    #[serde(default)]
    pub on_fetch_failure: FetchFailurePolicy,
}

fn default_timeout() -> Duration {
    Duration::from_secs(10)
}

impl MetadataConfig {
    pub fn into_options(self) -> MetadataOptions {
        MetadataOptions::default()
            .portal_tags(self.portal_tags)
            .timeout(self.timeout)
            .on_fetch_failure(self.on_fetch_failure)
    }
}

struct DurationVisitor;

impl<'de> Visitor<'de> for DurationVisitor {
    type Value = Duration;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Expecting a number of seconds or a duration like \"500ms\", \"10s\", \"1m\""
        )
    }

    fn visit_i64<E>(self, value: i64) -> Result<Self::Value, E>
    where
        E: Error,
    {
        u64::try_from(value)
            .map(Duration::from_secs)
            .map_err(|_| E::custom(format!("negative duration: {}", value)))
    }

    fn visit_u64<E>(self, value: u64) -> Result<Self::Value, E>
    where
        E: Error,
    {
        Ok(Duration::from_secs(value))
    }

    fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
    where
        E: Error,
    {
        parse_duration(value).ok_or_else(|| E::custom(format!("invalid duration '{}'", value)))
    }
}

fn deserialize_duration<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    deserializer.deserialize_any(DurationVisitor)
}

fn parse_duration(value: &str) -> Option<Duration> {
    let value = value.trim();
    let split = value.find(|c: char| !c.is_ascii_digit())?;
    let (amount, unit) = value.split_at(split);
    let amount = amount.parse::<u64>().ok()?;

    match unit {
        "ms" => Some(Duration::from_millis(amount)),
        "s" => Some(Duration::from_secs(amount)),
        "m" => Some(Duration::from_secs(amount.checked_mul(60)?)),
        "h" => Some(Duration::from_secs(amount.checked_mul(3_600)?)),
        _ => None,
    }
}
