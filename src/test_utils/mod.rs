//! Test utilities shared by the unit tests.
//!
//! This module provides:
//! - Test data factories for creating valid test fixtures
//! - A scripted billing provider with a call log and failure injection
//! - Hooks that record every call

mod billing_mocks;
mod factories;
mod hook_mocks;

pub use billing_mocks::*;
pub use factories::*;
pub use hook_mocks::*;
