use crate::core::io::factory::TargetFactory;
use crate::core::io::fragment::{RestartFragment, write_fragment};
use crate::core::io::restart::RestartReader;
use crate::core::models::store::EntityStore;
use crate::engine::commands::Command;
use crate::engine::error::EngineError;
use crate::engine::state::SimulationState;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;
use tracing::{info, instrument};

fn io_error(path: &Path, source: std::io::Error) -> EngineError {
    EngineError::Io {
        path: path.to_string_lossy().to_string(),
        source,
    }
}

/// Writes the targets and decoration chains of `state` to `path`.
#[instrument(skip_all, name = "save_checkpoint")]
pub fn save_checkpoint(state: &SimulationState, path: &Path) -> Result<(), EngineError> {
    let file = File::create(path).map_err(|e| io_error(path, e))?;
    let mut writer = BufWriter::new(file);
    write_fragment(state.registry(), state.decorations(), &mut writer)?;
    writer.flush().map_err(|e| io_error(path, e))?;
    info!(
        path = %path.display(),
        targets = state.registry().len(),
        chains = state.decorations().len(),
        "Checkpoint written."
    );
    Ok(())
}

/// First restore phase: parses the fragment at `path` without touching any entity.
pub fn read_checkpoint(path: &Path, factory: &TargetFactory) -> Result<RestartFragment, EngineError> {
    let file = File::open(path).map_err(|e| io_error(path, e))?;
    let mut source = BufReader::new(file);
    let mut reader = RestartReader::new(&mut source);
    let fragment = RestartFragment::read(&mut reader, factory)?;
    info!(
        path = %path.display(),
        targets = fragment.target_count(),
        "Checkpoint parsed."
    );
    Ok(fragment)
}

/// Second restore phase: resolves a parsed fragment against a loaded store.
pub fn restore_state(
    fragment: RestartFragment,
    store: EntityStore,
) -> Result<SimulationState, EngineError> {
    let (registry, decorations) = fragment.resolve(&store)?;
    info!(
        targets = registry.len(),
        chains = decorations.len(),
        "Targets restored."
    );
    let expiries: Vec<(u64, String)> = decorations
        .chains()
        .flat_map(|(_, chain)| chain.decorators())
        .filter_map(|d| {
            d.window()
                .end
                .checked_add(1)
                .map(|step| (step, d.label().to_string()))
        })
        .collect();
    let mut state = SimulationState::from_parts(store, registry, decorations);
    // Overdue removals are drained by the first step of the resumed run.
    for (step, label) in expiries {
        state.schedule(step, Command::RemoveActivity { label });
    }
    Ok(state)
}

/// Both restore phases in one call.
#[instrument(skip_all, name = "load_checkpoint")]
pub fn load_checkpoint(
    path: &Path,
    store: EntityStore,
    factory: &TargetFactory,
) -> Result<SimulationState, EngineError> {
    let fragment = read_checkpoint(path, factory)?;
    restore_state(fragment, store)
}
