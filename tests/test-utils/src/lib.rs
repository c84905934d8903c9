//! Test utilities for the LOB replay workspace
//!
//! - ITCH byte-stream factories
//! - rstest fixtures with a small multi-symbol session
//! - Book and numeric assertions
//! - Logging setup for tests

pub mod assertions;
pub mod factories;
pub mod fixtures;
pub mod helpers;

pub use assertions::*;
pub use factories::*;
pub use fixtures::*;
pub use helpers::*;
