//! Focus-group session model: messages, state machine, speaking order,
//! and reaction parsing.

pub mod order;
pub mod reaction;
pub mod session;
