//! Shared fixtures for integration tests.

pub mod trace_store;
