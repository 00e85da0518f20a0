use crate::cli::RunArgs;
use crate::config::builder::build_config;
use crate::config::models::AppConfig;
use crate::error::{CliError, Result};
use crate::utils::progress::CliProgressHandler;
use dpdtarget::{
    core::io::{
        beads::{add_polymer_by_ids, load_beads_csv},
        factory::TargetFactory,
        samples::export_samples,
    },
    core::models::store::EntityStore,
    engine::{error::EngineError, events::EventReporter, state::SimulationState},
    workflows,
};
use std::path::Path;
use tracing::{info, warn};

pub fn run(args: RunArgs) -> Result<()> {
    info!("Building configuration from {:?}", &args.config);
    let config = build_config(&args)?;

    let store = load_entities(&config)?;
    info!(
        "Entity store ready: {} bead(s), {} polymer(s).",
        store.bead_count(),
        store.polymer_count()
    );

    let mut state = match &config.restore_path {
        Some(path) => {
            info!("Restoring targets from {:?}", path);
            workflows::restore::load_checkpoint(path, store, &TargetFactory::with_builtin())?
        }
        None => SimulationState::new(store),
    };
    for (step, command) in config.commands.iter().cloned() {
        state.schedule(step, command);
    }

    let progress_handler = CliProgressHandler::new(config.run.sample_period);
    let reporter = EventReporter::with_callback(progress_handler.get_callback())
        .on_rank(config.run.rank, config.run.log_rank);

    println!(
        "Running {} step(s) from step {}...",
        config.run.total_steps, config.first_step
    );
    let summary =
        workflows::run::run_from(&mut state, config.first_step, &config.run, &reporter);

    if summary.commands_failed > 0 {
        warn!("{} command(s) failed during the run.", summary.commands_failed);
    }
    println!(
        "Run complete: {} step(s), {} command(s) succeeded, {} failed.",
        summary.steps, summary.commands_succeeded, summary.commands_failed
    );

    if let Some(path) = &config.checkpoint_path {
        ensure_parent_dir(path)?;
        workflows::restore::save_checkpoint(&state, path)?;
        println!("✓ Checkpoint written to: {}", path.display());
    }

    if let Some(dir) = &config.samples_dir {
        write_samples(&state, dir)?;
    }
    Ok(())
}

fn load_entities(config: &AppConfig) -> Result<EntityStore> {
    let mut store = EntityStore::new();
    if let Some(path) = &config.beads_path {
        load_beads_csv(path, &mut store).map_err(EngineError::from)?;
    } else if !config.polymers.is_empty() {
        return Err(CliError::Config(
            "Polymers are listed but `entities.beads` is not set.".to_string(),
        ));
    }
    for polymer in &config.polymers {
        add_polymer_by_ids(&mut store, polymer.polymer_type, &polymer.bead_ids)
            .map_err(EngineError::from)?;
    }
    Ok(store)
}

fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    Ok(())
}

fn write_samples(state: &SimulationState, dir: &Path) -> Result<()> {
    std::fs::create_dir_all(dir)?;
    let measurements = state.measurements();
    if measurements.is_empty() {
        info!("No measurements were recorded; nothing to export.");
        return Ok(());
    }
    for (label, behavior) in measurements {
        let path = dir.join(format!("{}.csv", label));
        let rows = export_samples(&path, label, behavior).map_err(EngineError::from)?;
        println!("  {} sample(s) of '{}' written to: {}", rows, label, path.display());
    }
    Ok(())
}
