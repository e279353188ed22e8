//! Command implementations for the chlog CLI
//!
//! Each command module provides a `run` function that executes the command logic.

pub mod completions;
pub mod languages;
pub mod prepare;
