//! Scenario configuration: the TOML file layout, built-in defaults, and the
//! merge of file values with command-line overrides.

pub mod builder;
pub mod defaults;
pub mod file;
pub mod models;
