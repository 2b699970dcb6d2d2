//! Test-only helpers shared across crate unit tests.

pub mod collecting_sink;
