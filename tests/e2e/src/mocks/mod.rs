//! Test doubles and data factories

mod fixtures;

pub use fixtures::{TestClock, TestDataFactory};
pub use oracle::LadderOracle;
