use super::fragment::{self, UnresolvedPayload};
use super::restart::{RestartError, RestartReader};
use crate::core::decorators::behavior::{ActivityKind, Behavior};
use crate::core::targets::TargetKind;
use std::collections::HashMap;

pub(crate) type PayloadReader =
    fn(&mut RestartReader<'_>) -> Result<UnresolvedPayload, RestartError>;
pub(crate) type ActivityReader = fn(&mut RestartReader<'_>) -> Result<Behavior, RestartError>;

/// Maps the kind tags found in restart data to the readers that parse their payloads.
///
/// Built explicitly at start-up and handed to the loader; nothing registers
/// itself behind the caller's back.
#[derive(Clone, Default)]
pub struct TargetFactory {
    targets: HashMap<TargetKind, PayloadReader>,
    activities: HashMap<ActivityKind, ActivityReader>,
}

impl TargetFactory {
    /// An empty factory that recognizes no kinds.
    pub fn new() -> Self {
        Self::default()
    }

    /// A factory that knows every target and activity kind of this crate.
    pub fn with_builtin() -> Self {
        let mut factory = Self::new();
        factory
            .register_target(TargetKind::Simple, fragment::read_simple_payload)
            .register_target(TargetKind::Polymer, fragment::read_polymer_payload)
            .register_target(TargetKind::Composite, fragment::read_composite_payload);
        factory
            .register_activity(ActivityKind::ConstantForce, fragment::read_constant_force)
            .register_activity(ActivityKind::LinearForce, fragment::read_linear_force)
            .register_activity(ActivityKind::SineForce, fragment::read_sine_force)
            .register_activity(ActivityKind::SpringForce, fragment::read_spring_force)
            .register_activity(ActivityKind::RadialForce, fragment::read_radial_force)
            .register_activity(ActivityKind::WorkDone, fragment::read_work_done)
            .register_activity(ActivityKind::CentreOfMass, fragment::read_centre_of_mass);
        factory
    }

    pub(crate) fn register_target(&mut self, kind: TargetKind, reader: PayloadReader) -> &mut Self {
        self.targets.insert(kind, reader);
        self
    }

    pub(crate) fn register_activity(
        &mut self,
        kind: ActivityKind,
        reader: ActivityReader,
    ) -> &mut Self {
        self.activities.insert(kind, reader);
        self
    }

    pub(crate) fn target_reader(&self, kind: TargetKind) -> Option<PayloadReader> {
        self.targets.get(&kind).copied()
    }

    pub(crate) fn activity_reader(&self, kind: ActivityKind) -> Option<ActivityReader> {
        self.activities.get(&kind).copied()
    }

    pub fn knows_target(&self, kind: TargetKind) -> bool {
        self.targets.contains_key(&kind)
    }

    pub fn knows_activity(&self, kind: ActivityKind) -> bool {
        self.activities.contains_key(&kind)
    }
}
