use dpdtarget::engine::commands::Command;
use dpdtarget::engine::config::RunConfig;
use std::path::PathBuf;

/// A polymer to assemble after the bead table is loaded.
#[derive(Debug, Clone, PartialEq)]
pub struct PolymerSpec {
    pub polymer_type: usize,
    pub bead_ids: Vec<usize>,
}

pub struct AppConfig {
    pub run: RunConfig,
    pub first_step: u64,
    pub beads_path: Option<PathBuf>,
    pub polymers: Vec<PolymerSpec>,
    pub commands: Vec<(u64, Command)>,
    pub restore_path: Option<PathBuf>,
    pub checkpoint_path: Option<PathBuf>,
    pub samples_dir: Option<PathBuf>,
}
