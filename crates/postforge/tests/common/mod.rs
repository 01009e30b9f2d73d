//! Shared test utilities for postforge integration tests.
//!
//! This module provides:
//! - fake capabilities with canned responses and call recording
//! - builders for site configurations
//! - `TestHarness` for runs isolated in temp directories

pub mod builders;
pub mod fakes;
pub mod harness;

pub use builders::*;
pub use fakes::*;
pub use harness::TestHarness;
