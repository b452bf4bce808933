use std::fmt;

use crate::Processor;

pub struct ProcessorDecl {
    pub name: String,
    pub processor: Box<dyn Processor + Send + 'static>,
}

impl fmt::Debug for ProcessorDecl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProcessorDecl")
            .field("name", &self.name)
            .field("processor", &self.processor.name())
            .finish()
    }
}

/// The ordered list of processors a metric goes through.
#[derive(Default, Debug)]
pub struct Configuration {
    pub processors: Vec<ProcessorDecl>,
}

impl Configuration {
    pub fn register_processor<P>(&mut self, name: impl AsRef<str>, processor: P) -> &mut Self
    where
        P: Processor + Send + 'static,
    {
        self.processors.push(ProcessorDecl {
            name: name.as_ref().to_string(),
            processor: Box::new(processor),
        });

        self
    }

    pub fn is_empty(&self) -> bool {
        self.processors.is_empty()
    }
}
