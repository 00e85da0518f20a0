//! # Engine Module
//!
//! The stateful layer that drives targets and decorations through a run.
//!
//! - **Configuration** ([`config`]) - timestep, step count and rank settings
//! - **State** ([`state`]) - the entity store, targets, decorations and command schedule of a rank
//! - **Commands** ([`commands`]) - timed instructions that create, reshape and decorate targets
//! - **Events** ([`events`]) - rank-aware reporting of what happened
//! - **Error Handling** ([`error`]) - the umbrella error of the engine and workflows

pub mod commands;
pub mod config;
pub mod error;
pub mod events;
pub mod state;
