//! ALU logical operations and bit tests.
//!
//! Implements AND, OR and exclusive OR on the accumulator, and the flag-only tests performed
//! by `BIT`, `TRB` and `TSB`.

use super::AluOp;
use crate::core::arch::Status;

/// Executes a logical operation and sets N and Z from the result.
///
/// Returns `a` unchanged for non-logic opcodes.
pub fn execute(op: AluOp, p: &mut Status, a: u8, b: u8) -> u8 {
    let r = match op {
        AluOp::And => a & b,
        AluOp::Ora => a | b,
        AluOp::Eor => a ^ b,
        _ => return a,
    };
    p.set_nz(r);
    r
}

/// `BIT`: Z from `a & m`; N and V copied from bits 7 and 6 of `m` except in the 65C02
/// immediate form, which only touches Z.
pub fn bit(p: &mut Status, a: u8, m: u8, immediate: bool) {
    p.set(Status::ZERO, a & m == 0);
    if !immediate {
        p.set(Status::NEGATIVE, m & 0x80 != 0);
        p.set(Status::OVERFLOW, m & 0x40 != 0);
    }
}

/// `TRB`: Z from `a & m`; returns `m` with the bits of `a` cleared.
pub fn test_and_reset(p: &mut Status, a: u8, m: u8) -> u8 {
    p.set(Status::ZERO, a & m == 0);
    m & !a
}

/// `TSB`: Z from `a & m`; returns `m` with the bits of `a` set.
pub fn test_and_set(p: &mut Status, a: u8, m: u8) -> u8 {
    p.set(Status::ZERO, a & m == 0);
    m | a
}
