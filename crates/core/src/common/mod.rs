//! Common utilities and types used throughout the harness.
//!
//! This module provides the building blocks shared by every component:
//! 1. **Constants:** Address-space layout, vectors, image header values, default budgets.
//! 2. **Error Handling:** Load errors, CPU faults, shim mismatches and transcript mismatches.

/// Common constants used throughout the harness.
pub mod constants;

/// Error, fault and mismatch types.
pub mod error;

pub use constants::{MEMORY_SIZE, PAGE_MASK};
pub use error::{Error, Fault, FaultKind, LoadError, Mismatch, ShimMismatch};
