//! Card module - Data model and lifecycle
//!
//! Implements the persistent state of a study item:
//! - Cards with oracle-owned memory models
//! - The New / Learning / Review / Relearning state machine
//! - Suspend, bury and reset lifecycle operations

mod lifecycle;
mod types;

pub use lifecycle::{Card, NewCard};
pub use types::{CardState, Grade, MemoryModel};
