//! # Core Models Module
//!
//! The entity store that targets aggregate over.
//!
//! - [`bead`] - a single particle with type, mass and kinematic state
//! - [`polymer`] - an ordered chain of beads
//! - [`store`] - dense owner of every bead and polymer of a rank
//! - [`ids`] - handle types and the 1-based persisted id convention
//!
//! Targets never own entities; they hold [`ids::BeadRef`] and
//! [`ids::PolymerRef`] handles that are resolved against the
//! [`store::EntityStore`] on every query.

pub mod bead;
pub mod ids;
pub mod polymer;
pub mod store;
