use super::commands::Command;
use crate::core::decorators::behavior::Behavior;
use crate::core::decorators::set::DecorationSet;
use crate::core::decorators::{Decorator, StepContext};
use crate::core::models::store::EntityStore;
use crate::core::targets::display::{DisplayMapping, NullDisplay};
use crate::core::targets::registry::TargetRegistry;
use std::collections::BTreeMap;

/// Everything one rank knows about its simulation: the entities, the targets
/// addressing them, the active decorations, and the commands still to run.
pub struct SimulationState {
    pub(crate) store: EntityStore,
    pub(crate) registry: TargetRegistry,
    pub(crate) decorations: DecorationSet,
    pub(crate) display: Box<dyn DisplayMapping + Send>,
    schedule: BTreeMap<u64, Vec<Command>>,
    retired: Vec<(String, Behavior)>,
}

impl SimulationState {
    pub fn new(store: EntityStore) -> Self {
        Self::from_parts(store, TargetRegistry::new(), DecorationSet::new())
    }

    /// Rebuilds a state from restored targets and decorations.
    pub fn from_parts(
        store: EntityStore,
        registry: TargetRegistry,
        decorations: DecorationSet,
    ) -> Self {
        Self {
            store,
            registry,
            decorations,
            display: Box::new(NullDisplay),
            schedule: BTreeMap::new(),
            retired: Vec::new(),
        }
    }

    pub fn with_display(mut self, display: Box<dyn DisplayMapping + Send>) -> Self {
        self.display = display;
        self
    }

    pub fn store(&self) -> &EntityStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut EntityStore {
        &mut self.store
    }

    pub fn registry(&self) -> &TargetRegistry {
        &self.registry
    }

    pub fn decorations(&self) -> &DecorationSet {
        &self.decorations
    }

    /// Queues `command` to run at the start of `step`. Commands sharing a step
    /// run in the order they were scheduled.
    pub fn schedule(&mut self, step: u64, command: Command) {
        self.schedule.entry(step).or_default().push(command);
    }

    pub fn pending_commands(&self) -> usize {
        self.schedule.values().map(Vec::len).sum()
    }

    /// Removes and returns every command due at or before `step`, earliest first.
    pub fn take_due(&mut self, step: u64) -> Vec<Command> {
        let later = match step.checked_add(1) {
            Some(next) => self.schedule.split_off(&next),
            None => BTreeMap::new(),
        };
        std::mem::replace(&mut self.schedule, later)
            .into_values()
            .flatten()
            .collect()
    }

    /// Keeps the results of a detached measurement so they can still be exported.
    pub(crate) fn retire(&mut self, decorator: Decorator) {
        if decorator.behavior().kind().is_measurement() {
            let label = decorator.label().to_string();
            self.retired.push((label, decorator.into_behavior()));
        }
    }

    /// Every measurement of the run so far, detached ones first, then the
    /// active ones in chain order.
    pub fn measurements(&self) -> Vec<(&str, &Behavior)> {
        let retired = self.retired.iter().map(|(l, b)| (l.as_str(), b));
        let active = self
            .decorations
            .chains()
            .flat_map(|(_, chain)| chain.decorators())
            .filter(|d| d.behavior().kind().is_measurement())
            .map(|d| (d.label(), d.behavior()));
        retired.chain(active).collect()
    }

    /// Resets forces, runs every decoration chain, then moves the beads.
    pub fn integrate(&mut self, step: u64, dt: f64) {
        self.store.clear_forces();
        let mut ctx = StepContext {
            step,
            dt,
            registry: &self.registry,
            store: &mut self.store,
        };
        self.decorations.execute(&mut ctx);
        self.store.advance(dt);
    }

    pub fn into_parts(self) -> (EntityStore, TargetRegistry, DecorationSet) {
        (self.store, self.registry, self.decorations)
    }
}
