pub mod processors;
pub mod runtime;
