mod metadata;

use std::path::Path;

use eyre::{bail, WrapErr};
use indexmap::IndexMap;
use portal::processors::MetadataProcessor;
use portal_core::config::Configuration;
use serde::Deserialize;
use toml::value::Table;

use crate::config::metadata::MetadataConfig;

#[derive(Deserialize, Debug)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Processor kinds in the order they first appear in the file.
    #[serde(default)]
    pub processors: IndexMap<String, Vec<ProcessorDefinition>>,
}

impl Config {
    pub fn load(path: &Path) -> eyre::Result<Self> {
        let content = std::fs::read_to_string(path)
            .wrap_err_with(|| format!("Error when reading configuration file {:?}", path))?;

        Self::parse(content.as_str())
            .wrap_err_with(|| format!("Invalid configuration file {:?}", path))
    }

    pub fn parse(content: &str) -> eyre::Result<Self> {
        toml::from_str(content).wrap_err("Error when parsing configuration")
    }

    pub fn build(self) -> eyre::Result<Configuration> {
        let mut config = Configuration::default();

        for (name, definitions) in self.processors {
            for definition in definitions {
                match name.as_str() {
                    "metadata" => {
                        configure_metadata_processor(&mut config, definition)?;
                    }

                    unknown => bail!("Unknown processor '{}'", unknown),
                }
            }
        }

        if config.is_empty() {
            bail!("No processor configured");
        }

        Ok(config)
    }
}

fn configure_metadata_processor(
    config: &mut Configuration,
    definition: ProcessorDefinition,
) -> eyre::Result<()> {
    let params = definition.parse_params::<MetadataConfig>()?;

    config.register_processor("metadata", MetadataProcessor::new(params.into_options()));

    Ok(())
}

#[derive(Deserialize, Debug)]
pub struct ProcessorDefinition {
    #[serde(flatten)]
    pub params: Table,
}

impl ProcessorDefinition {
    pub fn parse_params<'de, P>(self) -> eyre::Result<P>
    where
        P: Deserialize<'de>,
    {
        toml::Value::Table(self.params)
            .try_into()
            .wrap_err("Error when parsing params")
    }
}
