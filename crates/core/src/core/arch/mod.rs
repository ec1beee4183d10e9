//! 6502 architecture-specific components.
//!
//! This module contains the architectural register state. It includes the following modules:
//! 1. **Registers:** `A`, `X`, `Y`, `S` and `PC`.
//! 2. **Status:** The `P` flag register and its stack images.

/// Register set.
pub mod regs;

/// Processor status flags.
pub mod status;

pub use regs::Registers;
pub use status::Status;
