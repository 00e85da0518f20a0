//! # Targets
//!
//! Named, addressable aggregates of simulation entities.
//!
//! - [`simple`] – a set of beads of one logical type, with an undoable type-change log.
//! - [`polymer`] – a set of polymer chains.
//! - [`composite`] – a cycle-checked container of other targets.
//! - [`registry`] – the flat, label-addressed arena owning every target and
//!   answering the recursive queries (bead totals, centres of mass, lookups).
//!
//! A target is a closed [`Target`] enum; callers match on it instead of probing
//! capabilities at run time.

pub mod composite;
pub mod display;
pub mod error;
pub mod polymer;
pub mod registry;
pub mod simple;

use crate::core::models::ids::TargetId;
use composite::CompositeTarget;
use polymer::PolymerTarget;
use simple::SimpleTarget;
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum Target {
    Simple(SimpleTarget),
    Polymer(PolymerTarget),
    Composite(CompositeTarget),
}

/// Discriminant of a [`Target`], also used as the kind tag in restart data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TargetKind {
    Simple,
    Polymer,
    Composite,
}

impl TargetKind {
    pub fn keyword(self) -> &'static str {
        match self {
            TargetKind::Simple => "simple",
            TargetKind::Polymer => "polymer",
            TargetKind::Composite => "composite",
        }
    }
}

impl fmt::Display for TargetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.keyword())
    }
}

impl Target {
    pub fn id(&self) -> TargetId {
        match self {
            Target::Simple(t) => t.id,
            Target::Polymer(t) => t.id,
            Target::Composite(t) => t.id,
        }
    }

    pub fn label(&self) -> &str {
        match self {
            Target::Simple(t) => &t.label,
            Target::Polymer(t) => &t.label,
            Target::Composite(t) => &t.label,
        }
    }

    pub fn kind(&self) -> TargetKind {
        match self {
            Target::Simple(_) => TargetKind::Simple,
            Target::Polymer(_) => TargetKind::Polymer,
            Target::Composite(_) => TargetKind::Composite,
        }
    }

    pub fn is_composite(&self) -> bool {
        matches!(self, Target::Composite(_))
    }

    pub fn as_simple(&self) -> Option<&SimpleTarget> {
        match self {
            Target::Simple(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_simple_mut(&mut self) -> Option<&mut SimpleTarget> {
        match self {
            Target::Simple(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_polymer(&self) -> Option<&PolymerTarget> {
        match self {
            Target::Polymer(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_composite(&self) -> Option<&CompositeTarget> {
        match self {
            Target::Composite(t) => Some(t),
            _ => None,
        }
    }
}
