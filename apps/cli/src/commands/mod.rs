//! Command implementations for the Relay CLI.

pub mod artifact;
pub mod script;
