//! Core domain types: errors, manuscripts, phases.

pub mod error;
pub mod manuscript;
pub mod phase;
