//! Shared fixtures for termferry integration tests.

pub mod fixtures;
