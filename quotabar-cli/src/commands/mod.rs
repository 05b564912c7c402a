//! CLI command implementations.

pub mod cache;
pub mod cycle;
pub mod detect;
pub mod entries;
pub mod providers;
pub mod usage;
