//! # Workflows Module
//!
//! Top-level entry points tying the [`crate::engine`] and [`crate::core`] layers together.
//!
//! - **Run** ([`run`]) - the step driver: scheduled commands, force reset,
//!   decoration chains, then the position update.
//! - **Restore** ([`restore`]) - saving targets to a checkpoint and restoring
//!   them in two phases, parse first and resolve once the entity store is loaded.

pub mod restore;
pub mod run;
