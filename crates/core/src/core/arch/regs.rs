//! 6502 Register Set.
//!
//! Holds the programmer-visible registers and the `A/X` pairing cc65 uses for 16-bit
//! arguments and return values.

use std::fmt;

use super::status::Status;
use crate::common::constants::STACK_TOP;

/// Programmer-visible 6502 registers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Registers {
    /// Accumulator.
    pub a: u8,
    /// X index.
    pub x: u8,
    /// Y index.
    pub y: u8,
    /// Hardware stack pointer (offset into page 1).
    pub s: u8,
    /// Program counter.
    pub pc: u16,
    /// Processor status.
    pub p: Status,
}

impl Registers {
    /// Creates the power-on register set used by the loader.
    ///
    /// # Arguments
    ///
    /// * `pc` - Entry point.
    /// * `s` - Initial hardware stack pointer.
    pub fn new(pc: u16, s: u8) -> Self {
        Self {
            a: 0,
            x: 0,
            y: 0,
            s,
            pc,
            p: Status::from_bits(Status::INTERRUPT),
        }
    }

    /// `A` as the low byte and `X` as the high byte of a 16-bit value.
    #[inline]
    pub fn ax(&self) -> u16 {
        u16::from_le_bytes([self.a, self.x])
    }

    /// Stores a 16-bit value into `A` (low) and `X` (high).
    #[inline]
    pub fn set_ax(&mut self, value: u16) {
        [self.a, self.x] = value.to_le_bytes();
    }
}

impl Default for Registers {
    fn default() -> Self {
        Self::new(0, STACK_TOP)
    }
}

impl fmt::Display for Registers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "PC=${:04X} A=${:02X} X=${:02X} Y=${:02X} S=${:02X} P={}",
            self.pc, self.a, self.x, self.y, self.s, self.p
        )
    }
}
