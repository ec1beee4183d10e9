//! Instruction Set Architecture (ISA) Definitions.
//!
//! Contains the 6502 opcode dispatch table, the cc65/`sim65` calling-convention constants, and
//! a disassembler for tracing.
//!
//! # Variants
//!
//! * `Nmos6502`: The documented NMOS 6502 instruction set.
//! * `Cmos65C02`: The NMOS set plus the WDC/Rockwell-independent 65C02 additions.

use serde::Deserialize;

/// cc65 and `sim65` calling-convention constants.
pub mod abi;

/// Instruction disassembler for debug tracing and diagnostics.
pub mod disasm;

/// Mnemonics, addressing modes and the 256-entry dispatch table.
pub mod opcodes;

/// Processor model executed by the emulator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
pub enum CpuVariant {
    /// Original NMOS 6502.
    #[default]
    #[serde(alias = "6502")]
    Nmos6502,
    /// CMOS 65C02.
    #[serde(alias = "65C02")]
    Cmos65C02,
}

impl CpuVariant {
    /// Maps the CPU type byte of a `sim65` header to a variant.
    pub fn from_header(byte: u8) -> Option<Self> {
        match byte {
            0 => Some(Self::Nmos6502),
            1 => Some(Self::Cmos65C02),
            _ => None,
        }
    }

    /// Returns the CPU type byte written into a `sim65` header.
    pub fn header_byte(self) -> u8 {
        match self {
            Self::Nmos6502 => 0,
            Self::Cmos65C02 => 1,
        }
    }

    /// Returns true for the 65C02.
    pub fn is_cmos(self) -> bool {
        self == Self::Cmos65C02
    }
}
