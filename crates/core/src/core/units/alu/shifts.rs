//! ALU shift operations.
//!
//! Implements the one-bit shifts and rotates. The bit shifted out lands in carry; rotates
//! shift the previous carry in.

use super::AluOp;
use crate::core::arch::Status;

/// Executes a shift or rotate of `a` by one bit.
///
/// # Returns
///
/// The shifted value. Returns `a` unchanged for non-shift opcodes.
pub fn execute(op: AluOp, p: &mut Status, a: u8) -> u8 {
    let carry_in = p.carry();
    let (r, carry_out) = match op {
        AluOp::Asl => (a << 1, a & 0x80 != 0),
        AluOp::Lsr => (a >> 1, a & 0x01 != 0),
        AluOp::Rol => ((a << 1) | carry_in, a & 0x80 != 0),
        AluOp::Ror => ((a >> 1) | (carry_in << 7), a & 0x01 != 0),
        _ => return a,
    };
    p.set(Status::CARRY, carry_out);
    p.set_nz(r);
    r
}
