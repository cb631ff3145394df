//! Quality gate library crate
//!
//! Normalizes CI test and coverage reports, applies the deterministic gate
//! rules, renders the reports and optionally attaches an AI narrative.
//! Exposed as a library so benchmarks and tests can drive each stage
//! without going through the CLI.

pub mod config;
pub mod error;
pub mod gate;
pub mod insight;
pub mod model;
pub mod normalize;
pub mod pipeline;
pub mod render;
pub mod util;
