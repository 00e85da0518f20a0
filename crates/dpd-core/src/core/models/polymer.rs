use super::ids::BeadRef;

/// An ordered chain of beads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Polymer {
    /// The 1-based id used at the persistence boundary.
    pub id: usize,
    pub polymer_type: usize,
    pub(crate) beads: Vec<BeadRef>,
}

impl Polymer {
    pub(crate) fn new(id: usize, polymer_type: usize, beads: Vec<BeadRef>) -> Self {
        Self {
            id,
            polymer_type,
            beads,
        }
    }

    pub fn beads(&self) -> &[BeadRef] {
        &self.beads
    }

    pub fn len(&self) -> usize {
        self.beads.len()
    }

    pub fn is_empty(&self) -> bool {
        self.beads.is_empty()
    }
}
