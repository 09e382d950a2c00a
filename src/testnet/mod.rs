//! Test fixtures: temporary ledgers, a mock peer client and prebuilt chains.

pub mod test_utils;

pub use test_utils::*;
