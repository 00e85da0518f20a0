use crate::cli::InspectArgs;
use crate::error::Result;
use dpdtarget::{
    core::io::{beads::load_beads_csv, factory::TargetFactory},
    core::models::store::EntityStore,
    core::targets::Target,
    engine::{error::EngineError, state::SimulationState},
    workflows,
};
use tracing::info;

pub fn run(args: InspectArgs) -> Result<()> {
    let mut store = EntityStore::new();
    load_beads_csv(&args.beads, &mut store).map_err(EngineError::from)?;

    info!("Restoring checkpoint {:?}", &args.checkpoint);
    let state =
        workflows::restore::load_checkpoint(&args.checkpoint, store, &TargetFactory::with_builtin())?;

    for line in describe(&state) {
        println!("{}", line);
    }
    Ok(())
}

/// One line per target in id order, then one per decoration chain.
fn describe(state: &SimulationState) -> Vec<String> {
    let registry = state.registry();
    let store = state.store();
    let mut lines = vec![format!("{} target(s)", registry.len())];

    for (key, target) in registry.iter() {
        let detail = match target {
            Target::Simple(s) => format!(
                "type {} (original {}), {} logged change(s)",
                s.current_type(),
                s.original_type(),
                s.type_log().len()
            ),
            Target::Polymer(p) => format!(
                "polymer type {}, {} polymer(s)",
                p.polymer_type(),
                p.polymer_total()
            ),
            Target::Composite(c) => {
                let children: Vec<&str> = c.children().map(|(label, _)| label).collect();
                format!("children [{}]", children.join(", "))
            }
        };
        lines.push(format!(
            "  #{:<4} {:<10} {:<16} {:>6} bead(s)  {}",
            target.id().0,
            target.kind(),
            target.label(),
            registry.bead_total(key, store),
            detail
        ));
    }

    let decorations = state.decorations();
    lines.push(format!("{} decorated target(s)", decorations.len()));
    for (base, chain) in decorations.chains() {
        lines.push(format!("  {}: {}", base, chain.labels().join(" -> ")));
    }
    lines
}
