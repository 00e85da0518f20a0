use crate::engine::config::RunConfig;
use crate::engine::events::{EventReporter, SimEvent};
use crate::engine::state::SimulationState;
use tracing::{debug, info, instrument};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub steps: u64,
    pub commands_succeeded: usize,
    pub commands_failed: usize,
}

/// Integrates steps `1..=config.total_steps`.
#[instrument(skip_all, name = "run_workflow")]
pub fn run(state: &mut SimulationState, config: &RunConfig, reporter: &EventReporter) -> RunSummary {
    run_from(state, 1, config, reporter)
}

/// Integrates `config.total_steps` steps starting at `first_step`.
///
/// Every step first executes the commands due by then, then resets forces,
/// executes the decoration chains and moves the beads.
pub fn run_from(
    state: &mut SimulationState,
    first_step: u64,
    config: &RunConfig,
    reporter: &EventReporter,
) -> RunSummary {
    reporter.report(SimEvent::RunStart {
        total_steps: config.total_steps,
    });
    info!(
        first_step,
        steps = config.total_steps,
        dt = config.timestep,
        "Starting run."
    );

    let mut summary = RunSummary::default();
    for step in first_step..first_step.saturating_add(config.total_steps) {
        for command in state.take_due(step) {
            if command.execute(step, state, reporter) {
                summary.commands_succeeded += 1;
            } else {
                summary.commands_failed += 1;
            }
        }
        state.integrate(step, config.timestep);
        summary.steps += 1;

        if step % config.sample_period == 0 {
            debug!(step, "Step finished");
            reporter.report(SimEvent::StepFinished { step });
        }
    }

    reporter.report(SimEvent::RunFinish);
    info!(
        steps = summary.steps,
        failed = summary.commands_failed,
        "Run complete."
    );
    summary
}
