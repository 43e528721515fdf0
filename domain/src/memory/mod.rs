//! Cross-draft reader memory records and their prompt rendering.

pub mod context;
pub mod record;
