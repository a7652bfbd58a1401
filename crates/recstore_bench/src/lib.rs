//! Shared helpers for the recstore benchmarks.

pub mod utils;
