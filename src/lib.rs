//! Decision tree evaluator
//!
//! Scenarios with weighted outcomes, their expected values, an aggregate
//! across scenarios, and JSON persistence of whole trees.

pub mod application;
pub mod cli;
pub mod config;
pub mod domain;
pub mod exitcode;
pub mod infrastructure;
pub mod util;
