use crate::core::models::ids::{BeadRef, PolymerRef, TargetId};
use crate::core::models::store::EntityStore;

/// A named set of polymer chains.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolymerTarget {
    pub(crate) id: TargetId,
    pub(crate) label: String,
    polymer_type: usize,
    polymers: Vec<PolymerRef>,
}

impl PolymerTarget {
    pub(crate) fn new(
        id: TargetId,
        label: &str,
        polymer_type: usize,
        polymers: Vec<PolymerRef>,
    ) -> Self {
        Self {
            id,
            label: label.to_string(),
            polymer_type,
            polymers,
        }
    }

    pub fn id(&self) -> TargetId {
        self.id
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn polymer_type(&self) -> usize {
        self.polymer_type
    }

    pub fn polymers(&self) -> &[PolymerRef] {
        &self.polymers
    }

    pub fn polymer_total(&self) -> usize {
        self.polymers.len()
    }

    /// Every bead of every polymer, chain by chain in polymer order.
    pub fn beads(&self, store: &EntityStore) -> Vec<BeadRef> {
        self.polymers
            .iter()
            .filter_map(|&p| store.polymer(p))
            .flat_map(|p| p.beads().iter().copied())
            .collect()
    }
}
