//! Cadence end-to-end test support
//!
//! - `harness`: isolated SQLite-backed engines in temporary directories
//! - `mocks`: a reference scheduling oracle and test data factories

pub mod mocks;

pub use harness::{init_tracing, TestDatabaseManager};
pub use mocks::{LadderOracle, TestClock, TestDataFactory};
