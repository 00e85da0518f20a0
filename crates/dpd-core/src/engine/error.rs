use thiserror::Error;

use super::config::ConfigError;
use crate::core::io::beads::EntityLoadError;
use crate::core::io::restart::RestartError;
use crate::core::io::samples::SampleExportError;
use crate::core::targets::error::TargetError;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Target operation failed: {source}")]
    Target {
        #[from]
        source: TargetError,
    },

    #[error("Restart data error: {source}")]
    Restart {
        #[from]
        source: RestartError,
    },

    #[error("Entity loading failed: {source}")]
    EntityLoad {
        #[from]
        source: EntityLoadError,
    },

    #[error("Sample export failed: {source}")]
    SampleExport {
        #[from]
        source: SampleExportError,
    },

    #[error("Invalid run configuration: {source}")]
    Config {
        #[from]
        source: ConfigError,
    },

    #[error("File I/O error for '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("Restore phase '{phase}' failed: {reason}")]
    PhaseFailed { phase: &'static str, reason: String },
}
