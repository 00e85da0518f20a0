//! Reading and writing target state and simulation entities.
//!
//! - [`restart`] – the whitespace-token reader with its stream-bad state.
//! - [`fragment`] – the target/decoration section of a checkpoint.
//! - [`factory`] – maps kind keywords to fragment readers.
//! - [`beads`] – bead table import and polymer assembly.
//! - [`samples`] – CSV export of measurement samples.

pub mod beads;
pub mod factory;
pub mod fragment;
pub mod restart;
pub mod samples;
