//! Arithmetic Logic Unit (ALU).
//!
//! This module implements the 8-bit ALU used by the executor. It handles binary and BCD
//! arithmetic, comparisons, logical operations, and shifts, and updates the status flags
//! each operation defines.
//!
//! Operations are organized into submodules by category:
//! - [`arithmetic`]: Adc, Sbc, Cmp
//! - [`logic`]:      And, Ora, Eor, plus the BIT/TRB/TSB tests
//! - [`shifts`]:     Asl, Lsr, Rol, Ror

/// Binary and decimal addition, subtraction and comparison.
pub mod arithmetic;

/// Bitwise logical operations and bit tests.
pub mod logic;

/// Shift and rotate operations.
pub mod shifts;

use crate::core::arch::Status;
use crate::isa::CpuVariant;

/// ALU operation selector.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AluOp {
    /// Add with carry.
    Adc,
    /// Subtract with borrow.
    Sbc,
    /// Compare (subtract without storing or borrowing).
    Cmp,
    /// Bitwise AND.
    And,
    /// Bitwise OR.
    Ora,
    /// Bitwise exclusive OR.
    Eor,
    /// Arithmetic shift left.
    Asl,
    /// Logical shift right.
    Lsr,
    /// Rotate left through carry.
    Rol,
    /// Rotate right through carry.
    Ror,
}

/// Arithmetic Logic Unit for 8-bit operations.
#[derive(Debug)]
pub struct Alu;

impl Alu {
    /// Executes an ALU operation and updates `p`.
    ///
    /// # Arguments
    ///
    /// * `op`      - The ALU operation to perform.
    /// * `p`       - Status register; read for carry and decimal mode, updated with results.
    /// * `a`       - First operand (the register, or the value being shifted).
    /// * `b`       - Second operand (ignored by shifts).
    /// * `variant` - CPU variant; selects NMOS or 65C02 decimal-mode flag behavior.
    ///
    /// # Returns
    ///
    /// The 8-bit result. For `Cmp` this is the difference, which callers discard.
    ///
    /// # Examples
    ///
    /// ```
    /// use bug65_core::core::arch::Status;
    /// use bug65_core::core::units::alu::{Alu, AluOp};
    /// use bug65_core::isa::CpuVariant;
    ///
    /// let mut p = Status::default();
    /// let r = Alu::execute(AluOp::Adc, &mut p, 0x7F, 0x01, CpuVariant::Nmos6502);
    /// assert_eq!(r, 0x80);
    /// assert!(p.get(Status::OVERFLOW));
    ///
    /// let mut p = Status::from_bits(Status::DECIMAL);
    /// let r = Alu::execute(AluOp::Adc, &mut p, 0x19, 0x01, CpuVariant::Nmos6502);
    /// assert_eq!(r, 0x20);
    /// ```
    pub fn execute(op: AluOp, p: &mut Status, a: u8, b: u8, variant: CpuVariant) -> u8 {
        match op {
            AluOp::Adc | AluOp::Sbc | AluOp::Cmp => arithmetic::execute(op, p, a, b, variant),
            AluOp::And | AluOp::Ora | AluOp::Eor => logic::execute(op, p, a, b),
            AluOp::Asl | AluOp::Lsr | AluOp::Rol | AluOp::Ror => shifts::execute(op, p, a),
        }
    }
}
