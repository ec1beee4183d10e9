//! 6502 Processor Status Register.
//!
//! This module implements the `P` register. It performs the following:
//! 1. **Flag Access:** Named bit constants and get/set helpers.
//! 2. **Stack Images:** The value pushed by `PHP`/`BRK` (B and unused set) and the value
//!    restored by `PLP`/`RTI` (B and unused ignored).
//! 3. **Observability:** `NV-BDIZC` display for traces and state dumps.

use std::fmt;

/// Processor status flags.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Status(u8);

impl Status {
    /// Carry.
    pub const CARRY: u8 = 0x01;
    /// Zero.
    pub const ZERO: u8 = 0x02;
    /// IRQ disable.
    pub const INTERRUPT: u8 = 0x04;
    /// Decimal mode.
    pub const DECIMAL: u8 = 0x08;
    /// Break; exists only in pushed copies of `P`.
    pub const BREAK: u8 = 0x10;
    /// Unused; always reads as one.
    pub const UNUSED: u8 = 0x20;
    /// Overflow.
    pub const OVERFLOW: u8 = 0x40;
    /// Negative.
    pub const NEGATIVE: u8 = 0x80;

    /// Creates a status register from a raw value.
    pub const fn from_bits(bits: u8) -> Self {
        Self(bits | Self::UNUSED)
    }

    /// Raw register value.
    pub const fn bits(self) -> u8 {
        self.0 | Self::UNUSED
    }

    /// Returns true if every bit in `flag` is set.
    #[inline]
    pub const fn get(self, flag: u8) -> bool {
        self.0 & flag == flag
    }

    /// Sets or clears `flag`.
    #[inline]
    pub fn set(&mut self, flag: u8, on: bool) {
        if on {
            self.0 |= flag;
        } else {
            self.0 &= !flag;
        }
    }

    /// Updates N and Z from `value`.
    #[inline]
    pub fn set_nz(&mut self, value: u8) {
        self.set(Self::ZERO, value == 0);
        self.set(Self::NEGATIVE, value & 0x80 != 0);
    }

    /// Carry flag as 0 or 1.
    #[inline]
    pub const fn carry(self) -> u8 {
        self.0 & Self::CARRY
    }

    /// Value pushed by `PHP` and `BRK`.
    pub const fn to_stack(self) -> u8 {
        self.0 | Self::BREAK | Self::UNUSED
    }

    /// Value restored by `PLP` and `RTI`.
    pub const fn from_stack(byte: u8) -> Self {
        Self((byte & !Self::BREAK) | Self::UNUSED)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const NAMES: &[u8; 8] = b"NV-BDIZC";
        let text: String = NAMES
            .iter()
            .enumerate()
            .map(|(i, &name)| {
                let bit = 0x80 >> i;
                if self.bits() & bit != 0 {
                    name as char
                } else {
                    name.to_ascii_lowercase() as char
                }
            })
            .collect();
        f.write_str(&text)
    }
}
