//! ALU arithmetic operations.
//!
//! Implements add-with-carry, subtract-with-borrow and compare. In decimal mode the NMOS
//! part derives Z from the binary sum and N/V from an intermediate value, and sets all
//! subtraction flags from the binary difference; the 65C02 derives N and Z from the
//! corrected BCD result.

use super::AluOp;
use crate::core::arch::Status;
use crate::isa::CpuVariant;

/// Executes an arithmetic operation.
///
/// # Arguments
///
/// * `op`      - `Adc`, `Sbc` or `Cmp`.
/// * `p`       - Status register to read and update.
/// * `a`       - Register operand.
/// * `b`       - Memory operand.
/// * `variant` - CPU variant for decimal-mode flag semantics.
///
/// # Returns
///
/// The 8-bit result. Returns `a` unchanged for non-arithmetic opcodes.
pub fn execute(op: AluOp, p: &mut Status, a: u8, b: u8, variant: CpuVariant) -> u8 {
    match op {
        AluOp::Adc if p.get(Status::DECIMAL) => adc_decimal(p, a, b, variant),
        AluOp::Adc => adc_binary(p, a, b),
        AluOp::Sbc if p.get(Status::DECIMAL) => sbc_decimal(p, a, b, variant),
        AluOp::Sbc => adc_binary(p, a, !b),
        AluOp::Cmp => {
            let r = a.wrapping_sub(b);
            p.set(Status::CARRY, a >= b);
            p.set_nz(r);
            r
        }
        _ => a,
    }
}

fn adc_binary(p: &mut Status, a: u8, b: u8) -> u8 {
    let sum = u16::from(a) + u16::from(b) + u16::from(p.carry());
    let r = sum as u8;
    p.set(Status::CARRY, sum > 0xFF);
    p.set(Status::OVERFLOW, (!(a ^ b) & (a ^ r) & 0x80) != 0);
    p.set_nz(r);
    r
}

fn adc_decimal(p: &mut Status, a: u8, b: u8, variant: CpuVariant) -> u8 {
    let carry = u16::from(p.carry());
    let binary = (u16::from(a) + u16::from(b) + carry) as u8;

    let mut lo = u16::from(a & 0x0F) + u16::from(b & 0x0F) + carry;
    let mut hi = u16::from(a >> 4) + u16::from(b >> 4);
    if lo > 9 {
        lo += 6;
    }
    if lo > 0x0F {
        hi += 1;
    }

    let intermediate = ((hi << 4) & 0xFF) as u8;
    p.set(Status::ZERO, binary == 0);
    p.set(Status::NEGATIVE, intermediate & 0x80 != 0);
    p.set(Status::OVERFLOW, (!(a ^ b) & (a ^ intermediate) & 0x80) != 0);

    if hi > 9 {
        hi += 6;
    }
    p.set(Status::CARRY, hi > 0x0F);

    let r = (((hi << 4) | (lo & 0x0F)) & 0xFF) as u8;
    if variant.is_cmos() {
        p.set_nz(r);
    }
    r
}

fn sbc_decimal(p: &mut Status, a: u8, b: u8, variant: CpuVariant) -> u8 {
    let borrow = i16::from(1 - p.carry());
    // Binary flags first; NMOS keeps all four.
    let _ = adc_binary(p, a, !b);

    let mut lo = i16::from(a & 0x0F) - i16::from(b & 0x0F) - borrow;
    let mut hi = i16::from(a >> 4) - i16::from(b >> 4);
    if lo < 0 {
        lo -= 6;
        hi -= 1;
    }
    if hi < 0 {
        hi -= 6;
    }

    let r = (((hi << 4) | (lo & 0x0F)) & 0xFF) as u8;
    if variant.is_cmos() {
        p.set_nz(r);
    }
    r
}
