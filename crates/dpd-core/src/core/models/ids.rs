use slotmap::new_key_type;
use std::fmt;

new_key_type! {
    pub struct TargetKey;
}

/// Zero-based handle to a bead slot in the [`EntityStore`](super::store::EntityStore).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BeadRef(pub(crate) usize);

/// Zero-based handle to a polymer slot in the [`EntityStore`](super::store::EntityStore).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PolymerRef(pub(crate) usize);

impl BeadRef {
    pub fn index(self) -> usize {
        self.0
    }

    /// The 1-based id under which this bead is persisted.
    pub fn persisted_id(self) -> usize {
        self.0 + 1
    }
}

impl PolymerRef {
    pub fn index(self) -> usize {
        self.0
    }

    pub fn persisted_id(self) -> usize {
        self.0 + 1
    }
}

/// Stable integer identity of a target, assigned once at creation.
///
/// Only used as the key that links composite targets to their children when a
/// checkpoint is restored; commands always address targets by label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TargetId(pub usize);

impl fmt::Display for TargetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
