//! The FESS search layer: macro-move generation, feature projection,
//! advisors, budgets, and the engine's main loop.

pub mod advisors;
pub mod features;
pub mod fess;
pub mod limits;
pub mod movegen;
