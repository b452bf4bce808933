use portal_core::{Metric, Processor};

use super::{
    FetchFailurePolicy, FetchOutcome, MetadataClient, MetadataDocument, MetadataOptions,
    TagSelection,
};

pub const SAMPLE_CONFIG: &str = r#"[[processors.metadata]]
  ## Available tags to attach to metrics:
  ## * id
  ## * cycle
  ## * device_config
  ## * grind_cycle
  ## * steam_cycle
  ## * start_time
  ## * end_time
  ## * completed
  ## * successful
  ## `waste_type` and `type` are part of the metadata document but are not
  ## available as tags.
  portal_tags = [ "id", "grind_cycle", "steam_cycle" ]

  ## Maximum time spent fetching the metadata document at startup.
  # timeout = "10s"

  ## What to do when the metadata document cannot be fetched or decoded:
  ## "continue" starts without tags, "abort" refuses to start.
  # on_fetch_failure = "continue"
"#;

enum State {
    Uninitialized,
    Ready {
        selection: TagSelection,
        document: MetadataDocument,
    },
}

/// Attaches Portal metadata to every metric passing through.
///
/// The metadata document is fetched once, during [`Processor::init`], and is never
/// refreshed afterward.
pub struct MetadataProcessor {
    options: MetadataOptions,
    state: State,
}

impl MetadataProcessor {
    pub fn new(options: MetadataOptions) -> Self {
        Self {
            options,
            state: State::Uninitialized,
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self.state, State::Ready { .. })
    }

    pub fn document(&self) -> Option<&MetadataDocument> {
        match &self.state {
            State::Ready { document, .. } => Some(document),
            State::Uninitialized => None,
        }
    }
}

fn enrich(selection: &TagSelection, document: &MetadataDocument, metric: &mut Metric) {
    for tag in selection.iter() {
        tracing::debug!(target = "metadata", "checking tag={}", tag);

        if let Some(value) = document.lookup(tag).filter(|v| !v.is_empty()) {
            tracing::debug!(target = "metadata", "adding tag={} value={}", tag, value);
            metric.add_tag(tag, value);
        }
    }
}

#[async_trait::async_trait]
impl Processor for MetadataProcessor {
    fn name(&self) -> &'static str {
        "metadata"
    }

    fn description(&self) -> &'static str {
        "Attach Portal metadata to metrics"
    }

    fn sample_config(&self) -> &'static str {
        SAMPLE_CONFIG
    }

    async fn init(&mut self) -> eyre::Result<()> {
        tracing::debug!(
            target = "metadata",
            "Initializing Portal Metadata Processor"
        );

        let selection = TagSelection::new(self.options.portal_tags.iter().cloned())?;

        for name in selection.unexposed() {
            tracing::warn!(
                target = "metadata",
                "'{}' is part of the metadata document but is not exposed as a tag",
                name
            );
        }

        for name in selection.unknown() {
            tracing::warn!(
                target = "metadata",
                "Unknown tag '{}', it will never be attached",
                name
            );
        }

        let client = MetadataClient::new(self.options.url.as_str(), self.options.timeout)?;

        let document = match client.fetch_outcome().await {
            FetchOutcome::Fetched(document) => document,
            FetchOutcome::Degraded { document, reason } => {
                let report =
                    eyre::Report::new(reason).wrap_err("Error when fetching Portal metadata");

                match self.options.on_fetch_failure {
                    FetchFailurePolicy::Continue => {
                        tracing::warn!(
                            target = "metadata",
                            "Continuing without Portal metadata: {:#}",
                            report
                        );

                        document
                    }

                    FetchFailurePolicy::Abort => return Err(report),
                }
            }
        };

        tracing::debug!(target = "metadata", "{}", document.pretty());

        self.state = State::Ready {
            selection,
            document,
        };

        Ok(())
    }

    fn apply(&self, mut metrics: Vec<Metric>) -> Vec<Metric> {
        match &self.state {
            State::Uninitialized => {
                tracing::warn!(
                    target = "metadata",
                    "Metrics received before initialization, passing them through"
                );
            }

            State::Ready {
                selection,
                document,
            } => {
                for metric in metrics.iter_mut() {
                    enrich(selection, document, metric);
                }
            }
        }

        metrics
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use portal_core::MetricBuilder;

    fn ready(tags: &[&str], document: MetadataDocument) -> MetadataProcessor {
        MetadataProcessor {
            options: MetadataOptions::default().portal_tags(tags),
            state: State::Ready {
                selection: TagSelection::new(tags.iter().copied()).unwrap(),
                document,
            },
        }
    }

    fn document() -> MetadataDocument {
        MetadataDocument {
            id: "42".to_string(),
            grind_cycle: "G1".to_string(),
            waste_type: "organic".to_string(),
            kind: "sterilize".to_string(),
            ..Default::default()
        }
    }

    fn metric(name: &str) -> Metric {
        MetricBuilder::gauge(name, 1.0).timestamp(1).build()
    }

    #[test]
    fn adds_non_empty_mapped_fields() {
        let processor = ready(&["id", "grind_cycle", "steam_cycle"], document());

        let out = processor.apply(vec![metric("temp")]);

        assert_eq!(out[0].get_tag("id"), Some("42"));
        assert_eq!(out[0].get_tag("grind_cycle"), Some("G1"));
        assert!(!out[0].has_tag("steam_cycle"));
        assert_eq!(out[0].tags.len(), 2);
    }

    #[test]
    fn skips_unexposed_and_unknown_names() {
        let processor = ready(&["waste_type", "type", "colour"], document());

        let out = processor.apply(vec![metric("temp")]);

        assert!(out[0].tags.is_empty());
    }

    #[test]
    fn overwrites_colliding_tags() {
        let processor = ready(&["id"], document());
        let existing = MetricBuilder::gauge("temp", 1.0)
            .tag("id", "old")
            .tag("host", "h1")
            .build();

        let out = processor.apply(vec![existing]);

        assert_eq!(out[0].get_tag("id"), Some("42"));
        assert_eq!(out[0].get_tag("host"), Some("h1"));
    }

    #[test]
    fn preserves_batch_order_and_count() {
        let processor = ready(&["id"], document());
        let names = ["a", "b", "c", "d"];

        let out = processor.apply(names.iter().map(|n| metric(n)).collect());

        assert_eq!(
            out.iter().map(|m| m.name.as_str()).collect::<Vec<_>>(),
            names
        );
    }

    #[test]
    fn applying_twice_is_idempotent() {
        let processor = ready(&["id", "grind_cycle"], document());

        let once = processor.apply(vec![metric("temp")]);
        let twice = processor.apply(once.clone());

        assert_eq!(once, twice);
    }

    #[test]
    fn empty_document_adds_nothing() {
        let processor = ready(&["id"], MetadataDocument::default());

        let out = processor.apply(vec![metric("temp")]);

        assert!(out[0].tags.is_empty());
    }

    #[test]
    fn uninitialized_processor_passes_metrics_through() {
        let processor = MetadataProcessor::new(MetadataOptions::default().portal_tags(["id"]));
        let input = vec![metric("temp")];

        let out = processor.apply(input.clone());

        assert!(!processor.is_ready());
        assert!(processor.document().is_none());
        assert_eq!(out, input);
    }

    #[tokio::test]
    async fn empty_selection_fails_before_fetching() {
        let mut processor = MetadataProcessor::new(
            MetadataOptions::default().url("http://127.0.0.1:1/metrics/metadata"),
        );

        let err = processor.init().await.unwrap_err();

        assert_eq!(err.to_string(), "no tags specified in configuration");
        assert!(!processor.is_ready());
    }
}
