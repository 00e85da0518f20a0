//! # dpdtarget
//!
//! Named, nestable groups of simulation entities ("targets") and time-windowed
//! behaviours layered over them, for mesoscale particle simulations.
//!
//! ## Architectural Philosophy
//!
//! The library follows a three-layer architecture.
//!
//! - **[`core`]: The Foundation.** The entity store, the target arena and its
//!   recursive queries, the decorator chains, and checkpoint I/O.
//!
//! - **[`engine`]: The Logic Core.** The per-rank simulation state, timed
//!   commands, run configuration and rank-aware event reporting.
//!
//! - **[`workflows`]: The Public API.** Running a scenario step by step and
//!   saving or restoring its targets.

pub mod core;
pub mod engine;
pub mod workflows;
