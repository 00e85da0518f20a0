use super::events::{EventReporter, SimEvent};
use super::state::SimulationState;
use crate::core::decorators::ActivityWindow;
use crate::core::decorators::behavior::Behavior;
use crate::core::targets::error::TargetError;
use crate::core::utils::geometry::Region;
use tracing::{info, warn};

/// A timed instruction that creates, reshapes or decorates targets.
///
/// Commands are plain values; they are scheduled on a [`SimulationState`] and
/// executed at the start of their step. A failing command leaves the state as
/// it was and the run continues.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Creates a simple target from every bead of `bead_type`, optionally only
    /// those currently inside `region`.
    SelectBeadType {
        label: String,
        bead_type: usize,
        region: Option<Region>,
    },
    SelectPolymerType {
        label: String,
        polymer_type: usize,
    },
    CreateComposite {
        label: String,
    },
    AddTarget {
        parent: String,
        child: String,
    },
    RemoveTargetFromComposite {
        parent: String,
        child: String,
    },
    /// Deletes a target, unlinking it from every composite and dropping its decorations.
    RemoveTarget {
        label: String,
    },
    /// Retypes a simple target's beads to a freshly allocated type.
    ChangeBeadType {
        label: String,
    },
    RestorePreviousBeadType {
        label: String,
    },
    RestoreOriginalBeadTypes {
        label: String,
    },
    /// Wraps `target` in a new outermost decorator and schedules its removal
    /// for the step after the window closes.
    AttachActivity {
        label: String,
        target: String,
        window: ActivityWindow,
        behavior: Behavior,
    },
    RemoveActivity {
        label: String,
    },
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Command::SelectBeadType { .. } => "select-bead-type",
            Command::SelectPolymerType { .. } => "select-polymer-type",
            Command::CreateComposite { .. } => "create-composite",
            Command::AddTarget { .. } => "add-target",
            Command::RemoveTargetFromComposite { .. } => "remove-target-from-composite",
            Command::RemoveTarget { .. } => "remove-target",
            Command::ChangeBeadType { .. } => "change-bead-type",
            Command::RestorePreviousBeadType { .. } => "restore-previous-bead-type",
            Command::RestoreOriginalBeadTypes { .. } => "restore-original-bead-types",
            Command::AttachActivity { .. } => "attach-activity",
            Command::RemoveActivity { .. } => "remove-activity",
        }
    }

    /// Runs the command against `state` at `step`.
    ///
    /// # Return
    ///
    /// `true` on success. On failure the reason is reported as a
    /// [`SimEvent::CommandFailed`] and `false` is returned.
    pub fn execute(
        &self,
        step: u64,
        state: &mut SimulationState,
        reporter: &EventReporter,
    ) -> bool {
        match self.apply(step, state, reporter) {
            Ok(()) => {
                info!(step, command = self.name(), "Command executed");
                reporter.report(SimEvent::CommandSucceeded {
                    step,
                    command: self.name(),
                });
                true
            }
            Err(e) => {
                warn!(step, command = self.name(), error = %e, "Command failed");
                reporter.report(SimEvent::CommandFailed {
                    step,
                    command: self.name(),
                    reason: e.to_string(),
                });
                false
            }
        }
    }

    fn apply(
        &self,
        step: u64,
        state: &mut SimulationState,
        reporter: &EventReporter,
    ) -> Result<(), TargetError> {
        match self {
            Command::SelectBeadType {
                label,
                bead_type,
                region,
            } => {
                let beads = state
                    .store
                    .beads_of_type(*bead_type)
                    .into_iter()
                    .filter(|&b| match (region, state.store.bead(b)) {
                        (Some(r), Some(bead)) => r.contains(&bead.position),
                        (None, Some(_)) => true,
                        (_, None) => false,
                    })
                    .collect();
                state.registry.create_simple(label, *bead_type, beads)?;
            }
            Command::SelectPolymerType {
                label,
                polymer_type,
            } => {
                let polymers = state.store.polymers_of_type(*polymer_type);
                state
                    .registry
                    .create_polymer(label, *polymer_type, polymers)?;
            }
            Command::CreateComposite { label } => {
                state.registry.create_composite(label)?;
            }
            Command::AddTarget { parent, child } => state.registry.add_target(parent, child)?,
            Command::RemoveTargetFromComposite { parent, child } => {
                state.registry.remove_target(parent, child)?
            }
            Command::RemoveTarget { label } => {
                state.registry.remove(label)?;
                let dropped = state.decorations.detach_all(label);
                for d in dropped {
                    reporter.report(SimEvent::ActivityRemoved {
                        label: d.label().to_string(),
                    });
                    state.retire(d);
                }
            }
            Command::ChangeBeadType { label } => {
                let target = state.registry.simple_mut(label)?;
                let new_type = state.store.next_bead_type();
                target.change_all_bead_types(new_type, &mut state.store, state.display.as_mut())?;
            }
            Command::RestorePreviousBeadType { label } => {
                let target = state.registry.simple_mut(label)?;
                target.revert_bead_types(&mut state.store)?;
            }
            Command::RestoreOriginalBeadTypes { label } => {
                let target = state.registry.simple_mut(label)?;
                target.restore_original_bead_types(&mut state.store);
            }
            Command::AttachActivity {
                label,
                target,
                window,
                behavior,
            } => {
                let base = state.registry.require(target)?;
                state
                    .decorations
                    .attach(label, base, target, *window, behavior.clone())?;
                if let Some(expiry) = window.end.checked_add(1) {
                    state.schedule(
                        expiry.max(step + 1),
                        Command::RemoveActivity {
                            label: label.clone(),
                        },
                    );
                }
                reporter.report(SimEvent::ActivityAttached {
                    label: label.clone(),
                    target: target.clone(),
                });
            }
            Command::RemoveActivity { label } => {
                let decorator = state.decorations.detach(label)?;
                state.retire(decorator);
                reporter.report(SimEvent::ActivityRemoved {
                    label: label.clone(),
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::decorators::behavior::{ConstantForce, WorkMeter};
    use crate::core::models::store::EntityStore;
    use crate::core::targets::display::RecordedDisplay;
    use crate::core::utils::geometry::Axis;
    use nalgebra::{Point3, Vector3};
    use std::sync::{Arc, Mutex};

    fn state() -> SimulationState {
        let mut store = EntityStore::new();
        store.add_bead(3, Point3::new(0.0, 0.0, 0.0));
        store.add_bead(3, Point3::new(5.0, 0.0, 0.0));
        store.add_bead(4, Point3::new(0.0, 0.0, 0.0));
        SimulationState::new(store)
    }

    fn run(state: &mut SimulationState, command: Command) -> bool {
        command.execute(0, state, &EventReporter::new())
    }

    fn select(label: &str, bead_type: usize) -> Command {
        Command::SelectBeadType {
            label: label.into(),
            bead_type,
            region: None,
        }
    }

    #[test]
    fn select_bead_type_honours_region() {
        let mut state = state();
        let command = Command::SelectBeadType {
            label: "left".into(),
            bead_type: 3,
            region: Some(Region::Slab {
                axis: Axis::X,
                lower: -1.0,
                upper: 1.0,
            }),
        };
        assert!(run(&mut state, command));
        let target = state.registry().by_label("left").unwrap().as_simple().unwrap();
        assert_eq!(target.bead_total(), 1);
    }

    #[test]
    fn failed_command_reports_and_keeps_state() {
        let sink = Arc::new(Mutex::new(Vec::<SimEvent>::new()));
        let events = sink.clone();
        let reporter = EventReporter::with_callback(Box::new(move |e: SimEvent| {
            events.lock().unwrap().push(e)
        }));
        let mut state = state();

        assert!(select("T", 3).execute(1, &mut state, &reporter));
        assert!(!select("T", 4).execute(2, &mut state, &reporter));
        assert_eq!(state.registry().len(), 1);

        let events = sink.lock().unwrap();
        assert!(matches!(
            events.last(),
            Some(SimEvent::CommandFailed {
                step: 2,
                command: "select-bead-type",
                ..
            })
        ));
    }

    #[test]
    fn change_and_restore_bead_types_round_trip() {
        let mut state = state().with_display(Box::new(RecordedDisplay::default()));
        assert!(run(&mut state, select("T", 3)));
        assert!(run(&mut state, Command::ChangeBeadType { label: "T".into() }));

        let target = state.registry().by_label("T").unwrap().as_simple().unwrap();
        assert_eq!(target.current_type(), 5);
        assert_eq!(target.type_log().get(&5), Some(&3));
        assert_eq!(state.store().beads_of_type(5).len(), 2);

        assert!(run(
            &mut state,
            Command::RestorePreviousBeadType { label: "T".into() }
        ));
        assert_eq!(state.store().beads_of_type(3).len(), 2);
        assert!(!run(
            &mut state,
            Command::RestorePreviousBeadType { label: "T".into() }
        ));
    }

    #[test]
    fn change_bead_type_requires_simple_target() {
        let mut state = state();
        assert!(run(&mut state, Command::CreateComposite { label: "C".into() }));
        assert!(!run(&mut state, Command::ChangeBeadType { label: "C".into() }));
        assert_eq!(state.store().next_bead_type(), 5);
    }

    #[test]
    fn failed_type_change_leaves_type_counter_alone() {
        let mut state = state();
        assert!(run(&mut state, select("empty", 9)));
        assert!(!run(&mut state, Command::ChangeBeadType { label: "empty".into() }));
        assert_eq!(state.store().next_bead_type(), 5);

        assert!(run(&mut state, select("T", 3)));
        assert!(run(&mut state, Command::ChangeBeadType { label: "T".into() }));
        let target = state.registry().by_label("T").unwrap().as_simple().unwrap();
        assert_eq!(target.current_type(), 5);
        assert_eq!(state.store().next_bead_type(), 6);
    }

    #[test]
    fn select_polymer_type_collects_matching_polymers() {
        let mut store = EntityStore::new();
        let beads: Vec<_> = (0..3)
            .map(|i| store.add_bead(3, Point3::new(i as f64, 0.0, 0.0)))
            .collect();
        store.add_polymer(1, vec![beads[0], beads[1]]).unwrap();
        store.add_polymer(2, vec![beads[2]]).unwrap();
        let mut state = SimulationState::new(store);

        assert!(run(
            &mut state,
            Command::SelectPolymerType {
                label: "chains".into(),
                polymer_type: 1,
            }
        ));
        let key = state.registry().find("chains").unwrap();
        assert_eq!(state.registry().polymer_total(key), 1);
        assert_eq!(state.registry().bead_total(key, state.store()), 2);
        assert!(!run(
            &mut state,
            Command::SelectPolymerType {
                label: "chains".into(),
                polymer_type: 2,
            }
        ));
    }

    #[test]
    fn attach_activity_schedules_its_removal() {
        let mut state = state();
        assert!(run(&mut state, select("T", 3)));
        let attach = Command::AttachActivity {
            label: "push".into(),
            target: "T".into(),
            window: ActivityWindow::new(1, 10),
            behavior: Behavior::ConstantForce(ConstantForce::new(Vector3::x(), 1.0)),
        };
        assert!(run(&mut state, attach.clone()));
        assert!(state.decorations().is_active("push"));
        assert!(!run(&mut state, attach));

        assert!(state.take_due(10).is_empty());
        let due = state.take_due(11);
        assert_eq!(due, vec![Command::RemoveActivity { label: "push".into() }]);
        assert!(run(&mut state, due[0].clone()));
        assert!(!state.decorations().is_active("push"));
        assert!(state.measurements().is_empty());
    }

    #[test]
    fn detached_measurements_stay_exportable() {
        let mut state = state();
        assert!(run(&mut state, select("T", 3)));
        assert!(run(
            &mut state,
            Command::AttachActivity {
                label: "work".into(),
                target: "T".into(),
                window: ActivityWindow::new(0, 5),
                behavior: Behavior::WorkDone(WorkMeter::new()),
            }
        ));
        assert_eq!(state.measurements().len(), 1);
        assert!(run(&mut state, Command::RemoveActivity { label: "work".into() }));
        let measurements = state.measurements();
        assert_eq!(measurements.len(), 1);
        assert_eq!(measurements[0].0, "work");
    }

    #[test]
    fn remove_target_unlinks_and_detaches() {
        let mut state = state();
        assert!(run(&mut state, select("T", 3)));
        assert!(run(&mut state, Command::CreateComposite { label: "C".into() }));
        assert!(run(
            &mut state,
            Command::AddTarget {
                parent: "C".into(),
                child: "T".into()
            }
        ));
        assert!(run(
            &mut state,
            Command::AttachActivity {
                label: "push".into(),
                target: "T".into(),
                window: ActivityWindow::new(0, 5),
                behavior: Behavior::ConstantForce(ConstantForce::new(Vector3::x(), 1.0)),
            }
        ));

        assert!(run(&mut state, Command::RemoveTarget { label: "T".into() }));
        let composite = state.registry().by_label("C").unwrap().as_composite().unwrap();
        assert_eq!(composite.child_count(), 0);
        assert!(state.decorations().is_empty());
    }

    #[test]
    fn composite_membership_commands() {
        let mut state = state();
        assert!(run(&mut state, select("A", 3)));
        assert!(run(&mut state, Command::CreateComposite { label: "C".into() }));
        let add = Command::AddTarget {
            parent: "C".into(),
            child: "A".into(),
        };
        assert!(run(&mut state, add.clone()));
        assert!(!run(&mut state, add));
        let remove = Command::RemoveTargetFromComposite {
            parent: "C".into(),
            child: "A".into(),
        };
        assert!(run(&mut state, remove.clone()));
        assert!(!run(&mut state, remove));
    }
}
