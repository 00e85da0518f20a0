use nalgebra::Point3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    pub fn component(self, point: &Point3<f64>) -> f64 {
        match self {
            Axis::X => point.x,
            Axis::Y => point.y,
            Axis::Z => point.z,
        }
    }
}

/// A spatial region used to restrict bead selections.
#[derive(Debug, Clone, PartialEq)]
pub enum Region {
    /// Everything between two planes normal to `axis`, bounds inclusive.
    Slab { axis: Axis, lower: f64, upper: f64 },
    /// A closed ball.
    Sphere { centre: Point3<f64>, radius: f64 },
}

impl Region {
    pub fn contains(&self, point: &Point3<f64>) -> bool {
        match self {
            Region::Slab { axis, lower, upper } => {
                let c = axis.component(point);
                *lower <= c && c <= *upper
            }
            Region::Sphere { centre, radius } => {
                nalgebra::distance_squared(centre, point) <= radius * radius
            }
        }
    }
}
