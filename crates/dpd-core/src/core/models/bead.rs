use nalgebra::{Point3, Vector3};

/// A single simulation particle.
///
/// Beads are owned by the [`EntityStore`](super::store::EntityStore); targets only
/// hold [`BeadRef`](super::ids::BeadRef) handles into it.
#[derive(Debug, Clone, PartialEq)]
pub struct Bead {
    /// The 1-based id used at the persistence boundary.
    pub id: usize,
    /// The logical (force-field) type of the bead.
    pub bead_type: usize,
    /// Whether the bead is shown by the display collaborator.
    pub visible: bool,
    pub mass: f64,
    pub position: Point3<f64>,
    pub velocity: Vector3<f64>,
    /// Force accumulated during the current step.
    pub force: Vector3<f64>,
}

impl Bead {
    /// Creates a visible, unit-mass bead at rest.
    pub fn new(id: usize, bead_type: usize, position: Point3<f64>) -> Self {
        Self {
            id,
            bead_type,
            visible: true,
            mass: 1.0,
            position,
            velocity: Vector3::zeros(),
            force: Vector3::zeros(),
        }
    }

    pub fn with_velocity(mut self, velocity: Vector3<f64>) -> Self {
        self.velocity = velocity;
        self
    }

    pub fn with_mass(mut self, mass: f64) -> Self {
        self.mass = mass;
        self
    }
}
