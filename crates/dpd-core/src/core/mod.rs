//! # Core Module
//!
//! Data structures and algorithms for addressing groups of simulation entities.
//!
//! ## Architecture
//!
//! - **Entities** ([`models`]) - beads, polymers and the store owning them
//! - **Targets** ([`targets`]) - named simple, polymer and composite aggregates
//! - **Decorators** ([`decorators`]) - time-windowed behaviours layered over targets
//! - **File I/O** ([`io`]) - checkpoint fragments, bead tables and sample export
//! - **Utilities** ([`utils`]) - keyword tables and spatial regions

pub mod decorators;
pub mod io;
pub mod models;
pub mod targets;
pub mod utils;
