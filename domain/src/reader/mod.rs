//! Reader personas and their structured judgments.

pub mod analysis;
pub mod parsing;
pub mod persona;
