//! Use cases orchestrating the panel, memory, focus-group, and executive
//! flows.

pub mod memorize;
pub mod recall;
pub mod run_executive;
pub mod run_focus_group;
pub mod run_panel;
