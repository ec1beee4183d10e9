//! Core processor implementation.
//!
//! This module contains the 6502 CPU: its architectural registers, the execution units, and
//! the fetch-decode-execute loop that coordinates them.

/// Architecture-specific components (register set, status flags).
pub mod arch;

/// CPU core implementation and execution loop.
pub mod cpu;

/// Execution units (ALU).
pub mod units;

pub use self::cpu::{Cpu, CpuState};
