use dpdtarget::engine::events::{EventCallback, SimEvent};
use indicatif::{ProgressBar, ProgressState, ProgressStyle};
use std::sync::{Arc, Mutex};
use tracing::warn;

/// Drives a step progress bar from the events of a run.
#[derive(Clone)]
pub struct CliProgressHandler {
    pb: Arc<Mutex<ProgressBar>>,
    sample_period: u64,
}

impl CliProgressHandler {
    pub fn new(sample_period: u64) -> Self {
        let pb = ProgressBar::new(0).with_message("Initializing...");
        pb.set_draw_target(indicatif::ProgressDrawTarget::stderr());
        pb.finish_and_clear();

        Self {
            pb: Arc::new(Mutex::new(pb)),
            sample_period: sample_period.max(1),
        }
    }

    pub fn get_callback(&self) -> EventCallback<'static> {
        let pb_clone = self.pb.clone();
        let period = self.sample_period;

        Box::new(move |event: SimEvent| {
            let Ok(pb_guard) = pb_clone.lock() else {
                warn!("Progress bar mutex was poisoned. Cannot update progress.");
                return;
            };

            match event {
                SimEvent::RunStart { total_steps } => {
                    pb_guard.reset();
                    pb_guard.set_length(total_steps);
                    pb_guard.set_position(0);
                    pb_guard.set_style(Self::bar_style());
                    pb_guard.set_message("Integrating");
                }
                SimEvent::StepFinished { .. } => {
                    let length = pb_guard.length().unwrap_or(0);
                    let next = (pb_guard.position() + period).min(length);
                    pb_guard.set_position(next);
                }
                SimEvent::RunFinish => {
                    let length = pb_guard.length().unwrap_or(0);
                    pb_guard.set_position(length);
                    pb_guard.finish_with_message("✓ Done");
                }
                SimEvent::CommandFailed {
                    step,
                    command,
                    reason,
                } => {
                    pb_guard.println(format!("  ✗ step {}: {} failed: {}", step, command, reason));
                }
                SimEvent::ActivityAttached { label, target } => {
                    pb_guard.set_message(format!("{} on {}", label, target));
                }
                SimEvent::ActivityRemoved { label } => {
                    pb_guard.set_message(format!("{} finished", label));
                }
                SimEvent::Message(msg) => {
                    if !pb_guard.is_finished() {
                        pb_guard.println(format!("  {}", msg));
                    } else {
                        pb_guard.set_message(msg);
                    }
                }
                SimEvent::CommandSucceeded { .. } => {}
            }
        })
    }

    fn bar_style() -> ProgressStyle {
        ProgressStyle::with_template("{msg:<24} [{bar:40.cyan/blue}] {pos}/{len} ({eta})")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .with_key(
                "eta",
                |state: &ProgressState, w: &mut dyn std::fmt::Write| {
                    let _ = write!(w, "{:.1}s", state.eta().as_secs_f64());
                },
            )
            .progress_chars("##-")
    }
}
