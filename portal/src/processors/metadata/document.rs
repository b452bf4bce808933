use serde::{Deserialize, Serialize};

/// Metadata published by the Portal on the link-local endpoint.
///
/// Every value is a string on the wire. Keys missing from the response stay empty.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetadataDocument {
    pub id: String,
    pub cycle: String,
    pub device_config: String,
    pub grind_cycle: String,
    pub steam_cycle: String,
    pub waste_type: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub start_time: String,
    pub end_time: String,
    pub completed: String,
    pub successful: String,
}

pub type FieldAccessor = fn(&MetadataDocument) -> &str;

/// Tag names that can be attached to metrics and the document field each one reads.
pub const TAG_FIELDS: [(&str, FieldAccessor); 9] = [
    ("id", |doc| doc.id.as_str()),
    ("cycle", |doc| doc.cycle.as_str()),
    ("device_config", |doc| doc.device_config.as_str()),
    ("grind_cycle", |doc| doc.grind_cycle.as_str()),
    ("steam_cycle", |doc| doc.steam_cycle.as_str()),
    ("start_time", |doc| doc.start_time.as_str()),
    ("end_time", |doc| doc.end_time.as_str()),
    ("completed", |doc| doc.completed.as_str()),
    ("successful", |doc| doc.successful.as_str()),
];

/// Document fields that are decoded but never exposed as tags.
pub const UNMAPPED_FIELDS: [&str; 2] = ["waste_type", "type"];

impl MetadataDocument {
    /// Resolves a tag name to its field value. Names are matched exactly.
    pub fn lookup(&self, tag: &str) -> Option<&str> {
        TAG_FIELDS
            .iter()
            .find(|(name, _)| *name == tag)
            .map(|(_, accessor)| accessor(self))
    }

    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    pub fn pretty(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_default()
    }
}

pub(crate) fn is_tag_field(tag: &str) -> bool {
    TAG_FIELDS.iter().any(|(name, _)| *name == tag)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_document() -> MetadataDocument {
        serde_json::from_str(
            r#"{
                "id": "42",
                "cycle": "c",
                "device_config": "dc",
                "grind_cycle": "G1",
                "steam_cycle": "S1",
                "waste_type": "organic",
                "type": "sterilize",
                "start_time": "2021-06-01T10:00:00Z",
                "end_time": "2021-06-01T11:00:00Z",
                "completed": "true",
                "successful": "false"
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn decodes_every_field() {
        let doc = full_document();

        assert_eq!(doc.id, "42");
        assert_eq!(doc.waste_type, "organic");
        assert_eq!(doc.kind, "sterilize");
        assert_eq!(doc.successful, "false");
    }

    #[test]
    fn missing_keys_decode_as_empty() {
        let doc: MetadataDocument = serde_json::from_str(r#"{"id":"7"}"#).unwrap();

        assert_eq!(doc.id, "7");
        assert_eq!(doc.cycle, "");
        assert!(!doc.is_empty());
        assert!(MetadataDocument::default().is_empty());
    }

    #[test]
    fn non_string_values_are_rejected() {
        assert!(serde_json::from_str::<MetadataDocument>(r#"{"id":42}"#).is_err());
    }

    #[test]
    fn lookup_resolves_mapped_names() {
        let doc = full_document();

        assert_eq!(doc.lookup("id"), Some("42"));
        assert_eq!(doc.lookup("cycle"), Some("c"));
        assert_eq!(doc.lookup("device_config"), Some("dc"));
        assert_eq!(doc.lookup("grind_cycle"), Some("G1"));
        assert_eq!(doc.lookup("steam_cycle"), Some("S1"));
        assert_eq!(doc.lookup("start_time"), Some("2021-06-01T10:00:00Z"));
        assert_eq!(doc.lookup("end_time"), Some("2021-06-01T11:00:00Z"));
        assert_eq!(doc.lookup("completed"), Some("true"));
        assert_eq!(doc.lookup("successful"), Some("false"));
    }

    #[test]
    fn waste_type_and_type_are_not_tags() {
        let doc = full_document();

        for name in UNMAPPED_FIELDS {
            assert_eq!(doc.lookup(name), None);
            assert!(!is_tag_field(name));
        }
    }

    #[test]
    fn lookup_is_case_sensitive() {
        let doc = full_document();

        assert_eq!(doc.lookup("ID"), None);
        assert_eq!(doc.lookup("unknown"), None);
    }

    #[test]
    fn pretty_print_uses_wire_names() {
        let pretty = full_document().pretty();

        assert!(pretty.contains("\"type\": \"sterilize\""));
        assert!(pretty.contains("\"grind_cycle\": \"G1\""));
    }
}
