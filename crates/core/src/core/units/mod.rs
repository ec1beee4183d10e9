//! Execution units.
//!
//! The 6502 has a single functional unit worth modelling separately: the 8-bit ALU with its
//! binary and decimal arithmetic.

/// Arithmetic Logic Unit for 8-bit operations.
pub mod alu;
