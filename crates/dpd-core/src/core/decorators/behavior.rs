use super::{ActivityWindow, StepContext};
use crate::core::models::ids::BeadRef;
use nalgebra::{Point3, Vector3};
use std::f64::consts::TAU;
use std::fmt;

/// The kinds of behaviour a decorator can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActivityKind {
    ConstantForce,
    LinearForce,
    SineForce,
    SpringForce,
    RadialForce,
    WorkDone,
    CentreOfMass,
}

impl ActivityKind {
    pub fn keyword(self) -> &'static str {
        match self {
            ActivityKind::ConstantForce => "constant-force",
            ActivityKind::LinearForce => "linear-force",
            ActivityKind::SineForce => "sine-force",
            ActivityKind::SpringForce => "spring-force",
            ActivityKind::RadialForce => "radial-force",
            ActivityKind::WorkDone => "work-done",
            ActivityKind::CentreOfMass => "centre-of-mass",
        }
    }

    pub fn is_measurement(self) -> bool {
        matches!(self, ActivityKind::WorkDone | ActivityKind::CentreOfMass)
    }
}

impl fmt::Display for ActivityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.keyword())
    }
}

/// A measurement taken at one step.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    pub step: u64,
    pub values: Vec<f64>,
}

fn unit_or_zero(v: Vector3<f64>) -> Vector3<f64> {
    v.try_normalize(f64::EPSILON).unwrap_or_else(Vector3::zeros)
}

/// Adds the same force vector to every bead of the target.
#[derive(Debug, Clone, PartialEq)]
pub struct ConstantForce {
    pub(crate) direction: Vector3<f64>,
    pub(crate) magnitude: f64,
}

impl ConstantForce {
    pub fn new(direction: Vector3<f64>, magnitude: f64) -> Self {
        Self {
            direction: unit_or_zero(direction),
            magnitude,
        }
    }

    pub fn force(&self) -> Vector3<f64> {
        self.direction * self.magnitude
    }
}

/// A force along a fixed direction whose magnitude grows linearly with the
/// time elapsed since the window opened.
#[derive(Debug, Clone, PartialEq)]
pub struct LinearForce {
    pub(crate) direction: Vector3<f64>,
    pub(crate) rate: f64,
}

impl LinearForce {
    pub fn new(direction: Vector3<f64>, rate: f64) -> Self {
        Self {
            direction: unit_or_zero(direction),
            rate,
        }
    }
}

/// A force along a fixed direction with sinusoidal magnitude; `period` is in steps.
#[derive(Debug, Clone, PartialEq)]
pub struct SineForce {
    pub(crate) direction: Vector3<f64>,
    pub(crate) amplitude: f64,
    pub(crate) period: u64,
}

impl SineForce {
    pub fn new(direction: Vector3<f64>, amplitude: f64, period: u64) -> Self {
        Self {
            direction: unit_or_zero(direction),
            amplitude,
            period: period.max(1),
        }
    }
}

/// Tethers each bead to the position it occupied when the spring first acted.
#[derive(Debug, Clone, PartialEq)]
pub struct SpringForce {
    pub(crate) stiffness: f64,
    pub(crate) anchors: Vec<Point3<f64>>,
}

impl SpringForce {
    pub fn new(stiffness: f64) -> Self {
        Self {
            stiffness,
            anchors: Vec::new(),
        }
    }

    pub fn anchors(&self) -> &[Point3<f64>] {
        &self.anchors
    }
}

/// Pushes beads along the unit vector from `centre` to their position.
/// A negative magnitude pulls them inward.
#[derive(Debug, Clone, PartialEq)]
pub struct RadialForce {
    pub(crate) centre: Point3<f64>,
    pub(crate) magnitude: f64,
}

impl RadialForce {
    pub fn new(centre: Point3<f64>, magnitude: f64) -> Self {
        Self { centre, magnitude }
    }
}

/// Accumulates the power `Σ f·v` delivered to the target beads, integrated over
/// the timestep. Reads the force accumulated so far this step, so it must be
/// attached after the forces it should account for.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WorkMeter {
    pub(crate) total: f64,
    pub(crate) samples: Vec<Sample>,
}

impl WorkMeter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn total(&self) -> f64 {
        self.total
    }
}

/// Samples the target centre of mass every `period` steps.
#[derive(Debug, Clone, PartialEq)]
pub struct CentreOfMassProbe {
    pub(crate) period: u64,
    pub(crate) samples: Vec<Sample>,
}

impl CentreOfMassProbe {
    pub fn new(period: u64) -> Self {
        Self {
            period: period.max(1),
            samples: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Behavior {
    ConstantForce(ConstantForce),
    LinearForce(LinearForce),
    SineForce(SineForce),
    SpringForce(SpringForce),
    RadialForce(RadialForce),
    WorkDone(WorkMeter),
    CentreOfMass(CentreOfMassProbe),
}

impl Behavior {
    pub fn kind(&self) -> ActivityKind {
        match self {
            Behavior::ConstantForce(_) => ActivityKind::ConstantForce,
            Behavior::LinearForce(_) => ActivityKind::LinearForce,
            Behavior::SineForce(_) => ActivityKind::SineForce,
            Behavior::SpringForce(_) => ActivityKind::SpringForce,
            Behavior::RadialForce(_) => ActivityKind::RadialForce,
            Behavior::WorkDone(_) => ActivityKind::WorkDone,
            Behavior::CentreOfMass(_) => ActivityKind::CentreOfMass,
        }
    }

    /// Recorded samples; empty for force behaviours.
    pub fn samples(&self) -> &[Sample] {
        match self {
            Behavior::WorkDone(m) => &m.samples,
            Behavior::CentreOfMass(p) => &p.samples,
            _ => &[],
        }
    }

    /// Column names of the values in each [`Sample`].
    pub fn sample_columns(&self) -> &'static [&'static str] {
        match self {
            Behavior::WorkDone(_) => &["work"],
            Behavior::CentreOfMass(_) => &["x", "y", "z"],
            _ => &[],
        }
    }

    /// Applies the behaviour to `beads` for the step in `ctx`.
    pub(crate) fn apply(
        &mut self,
        beads: &[BeadRef],
        window: ActivityWindow,
        ctx: &mut StepContext<'_>,
    ) {
        let elapsed = window.elapsed(ctx.step);
        match self {
            Behavior::ConstantForce(f) => add_uniform_force(beads, f.force(), ctx),
            Behavior::LinearForce(f) => {
                let magnitude = f.rate * elapsed as f64 * ctx.dt;
                add_uniform_force(beads, f.direction * magnitude, ctx);
            }
            Behavior::SineForce(f) => {
                let phase = TAU * (elapsed % f.period) as f64 / f.period as f64;
                add_uniform_force(beads, f.direction * (f.amplitude * phase.sin()), ctx);
            }
            Behavior::SpringForce(spring) => {
                if spring.anchors.len() != beads.len() {
                    spring.anchors = beads
                        .iter()
                        .map(|&b| ctx.store.bead(b).map_or(Point3::origin(), |b| b.position))
                        .collect();
                }
                for (&bead, anchor) in beads.iter().zip(&spring.anchors) {
                    if let Some(b) = ctx.store.bead_mut(bead) {
                        b.force -= (b.position - *anchor) * spring.stiffness;
                    }
                }
            }
            Behavior::RadialForce(f) => {
                for &bead in beads {
                    if let Some(b) = ctx.store.bead_mut(bead) {
                        b.force += unit_or_zero(b.position - f.centre) * f.magnitude;
                    }
                }
            }
            Behavior::WorkDone(meter) => {
                let power: f64 = beads
                    .iter()
                    .filter_map(|&b| ctx.store.bead(b))
                    .map(|b| b.force.dot(&b.velocity))
                    .sum();
                meter.total += power * ctx.dt;
                meter.samples.push(Sample {
                    step: ctx.step,
                    values: vec![meter.total],
                });
            }
            Behavior::CentreOfMass(probe) => {
                if elapsed % probe.period != 0 {
                    return;
                }
                let mut mass = 0.0;
                let mut weighted = Vector3::zeros();
                for b in beads.iter().filter_map(|&b| ctx.store.bead(b)) {
                    mass += b.mass;
                    weighted += b.position.coords * b.mass;
                }
                if mass > 0.0 {
                    let centre = weighted / mass;
                    probe.samples.push(Sample {
                        step: ctx.step,
                        values: vec![centre.x, centre.y, centre.z],
                    });
                }
            }
        }
    }
}

fn add_uniform_force(beads: &[BeadRef], force: Vector3<f64>, ctx: &mut StepContext<'_>) {
    for &bead in beads {
        if let Some(b) = ctx.store.bead_mut(bead) {
            b.force += force;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::store::EntityStore;
    use crate::core::targets::registry::TargetRegistry;

    fn apply_once(behavior: &mut Behavior, store: &mut EntityStore, step: u64, dt: f64) {
        let registry = TargetRegistry::new();
        let beads: Vec<BeadRef> = store.beads_iter().map(|(r, _)| r).collect();
        let mut ctx = StepContext {
            step,
            dt,
            registry: &registry,
            store,
        };
        behavior.apply(&beads, ActivityWindow::new(0, 100), &mut ctx);
    }

    fn single_bead_store(position: Point3<f64>) -> EntityStore {
        let mut store = EntityStore::new();
        store.add_bead(0, position);
        store
    }

    fn force_on_first(store: &EntityStore) -> Vector3<f64> {
        store.beads_iter().next().unwrap().1.force
    }

    #[test]
    fn constant_force_normalizes_direction() {
        let f = ConstantForce::new(Vector3::new(0.0, 3.0, 0.0), 2.0);
        assert_eq!(f.force(), Vector3::new(0.0, 2.0, 0.0));
        assert_eq!(
            ConstantForce::new(Vector3::zeros(), 5.0).force(),
            Vector3::zeros()
        );
    }

    #[test]
    fn linear_force_grows_with_elapsed_time() {
        let mut store = single_bead_store(Point3::origin());
        let mut b = Behavior::LinearForce(LinearForce::new(Vector3::x(), 2.0));
        apply_once(&mut b, &mut store, 0, 0.5);
        assert_eq!(force_on_first(&store), Vector3::zeros());
        apply_once(&mut b, &mut store, 4, 0.5);
        assert_eq!(force_on_first(&store), Vector3::new(4.0, 0.0, 0.0));
    }

    #[test]
    fn sine_force_peaks_at_quarter_period() {
        let mut store = single_bead_store(Point3::origin());
        let mut b = Behavior::SineForce(SineForce::new(Vector3::z(), 3.0, 8));
        apply_once(&mut b, &mut store, 2, 1.0);
        assert!((force_on_first(&store).z - 3.0).abs() < 1e-12);
    }

    #[test]
    fn spring_force_pulls_back_to_captured_anchor() {
        let mut store = single_bead_store(Point3::new(1.0, 0.0, 0.0));
        let mut b = Behavior::SpringForce(SpringForce::new(2.0));
        apply_once(&mut b, &mut store, 0, 1.0);
        assert_eq!(force_on_first(&store), Vector3::zeros());

        store.clear_forces();
        store.beads_iter_mut().next().unwrap().1.position = Point3::new(1.5, 0.0, 0.0);
        apply_once(&mut b, &mut store, 1, 1.0);
        assert_eq!(force_on_first(&store), Vector3::new(-1.0, 0.0, 0.0));
    }

    #[test]
    fn radial_force_points_away_from_centre() {
        let mut store = single_bead_store(Point3::new(0.0, -2.0, 0.0));
        let mut b = Behavior::RadialForce(RadialForce::new(Point3::origin(), 1.5));
        apply_once(&mut b, &mut store, 0, 1.0);
        assert_eq!(force_on_first(&store), Vector3::new(0.0, -1.5, 0.0));
    }

    #[test]
    fn work_meter_integrates_force_dot_velocity() {
        let mut store = single_bead_store(Point3::origin());
        {
            let bead = store.beads_iter_mut().next().unwrap().1;
            bead.velocity = Vector3::new(2.0, 0.0, 0.0);
            bead.force = Vector3::new(3.0, 1.0, 0.0);
        }
        let mut b = Behavior::WorkDone(WorkMeter::new());
        apply_once(&mut b, &mut store, 0, 0.5);
        apply_once(&mut b, &mut store, 1, 0.5);

        let Behavior::WorkDone(meter) = &b else {
            unreachable!()
        };
        assert_eq!(meter.total(), 6.0);
        assert_eq!(b.samples().len(), 2);
        assert_eq!(b.samples()[0].values, vec![3.0]);
    }

    #[test]
    fn centre_of_mass_probe_respects_period() {
        let mut store = single_bead_store(Point3::new(1.0, 2.0, 3.0));
        let mut b = Behavior::CentreOfMass(CentreOfMassProbe::new(2));
        for step in 0..5 {
            apply_once(&mut b, &mut store, step, 1.0);
        }
        let steps: Vec<u64> = b.samples().iter().map(|s| s.step).collect();
        assert_eq!(steps, vec![0, 2, 4]);
        assert_eq!(b.samples()[0].values, vec![1.0, 2.0, 3.0]);
        assert_eq!(b.sample_columns(), &["x", "y", "z"]);
    }
}
