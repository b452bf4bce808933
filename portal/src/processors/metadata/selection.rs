use super::{document::is_tag_field, MetadataError, UNMAPPED_FIELDS};

/// Ordered, non-empty set of tag names to copy from the metadata document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagSelection {
    names: Vec<String>,
}

impl TagSelection {
    /// Duplicates keep their first position.
    pub fn new<I, S>(names: I) -> Result<Self, MetadataError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut selected: Vec<String> = Vec::new();

        for name in names {
            let name = name.into();
            if !selected.contains(&name) {
                selected.push(name);
            }
        }

        if selected.is_empty() {
            return Err(MetadataError::NoTags);
        }

        Ok(Self { names: selected })
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    /// Names that are part of the document but cannot become tags.
    pub fn unexposed(&self) -> impl Iterator<Item = &str> {
        self.iter().filter(|name| UNMAPPED_FIELDS.contains(name))
    }

    /// Names that match nothing in the document at all.
    pub fn unknown(&self) -> impl Iterator<Item = &str> {
        self.iter()
            .filter(|name| !is_tag_field(name) && !UNMAPPED_FIELDS.contains(name))
    }
}
