//! # recstore Testkit
//!
//! Test utilities for recstore.
//!
//! This crate provides:
//! - Test fixtures that open every driver the same way
//! - A conformance suite any [`Database`](recstore_core::Database) driver
//!   must pass
//! - A fault-injecting key/value backend
//! - Property-based test generators using proptest
//! - Operation-sequence fuzzing that compares drivers against each other
//! - Stress testing utilities
//!
//! ## Usage
//!
//! ```rust
//! use recstore_testkit::prelude::*;
//!
//! for driver in Driver::ALL {
//!     conformance::run_all(|| driver.open());
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod conformance;
pub mod fault;
pub mod fixtures;
pub mod fuzz;
pub mod generators;
pub mod stress;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::conformance;
    pub use crate::fault::*;
    pub use crate::fixtures::*;
    pub use crate::fuzz::*;
    pub use crate::generators::*;
    pub use crate::stress::*;
}

pub use fault::*;
pub use fixtures::*;
pub use fuzz::*;
pub use generators::*;
pub use stress::*;
