//! ALU tests.
//!
//! Binary arithmetic flag edge cases, BCD arithmetic on both variants, comparisons,
//! logic and shifts.

use bug65_core::core::arch::Status;
use bug65_core::core::units::alu::{Alu, AluOp, logic};
use bug65_core::isa::CpuVariant;

const NMOS: CpuVariant = CpuVariant::Nmos6502;
const CMOS: CpuVariant = CpuVariant::Cmos65C02;

fn flags(bits: u8) -> Status {
    Status::from_bits(bits)
}

// ─── Binary ADC / SBC ────────────────────────────────────────────────────────

#[test]
fn adc_signed_overflow() {
    let mut p = flags(0);
    assert_eq!(Alu::execute(AluOp::Adc, &mut p, 0x50, 0x50, NMOS), 0xA0);
    assert!(p.get(Status::OVERFLOW));
    assert!(p.get(Status::NEGATIVE));
    assert!(!p.get(Status::CARRY));
}

#[test]
fn adc_carry_out_and_zero() {
    let mut p = flags(Status::CARRY);
    assert_eq!(Alu::execute(AluOp::Adc, &mut p, 0xFF, 0x00, NMOS), 0x00);
    assert!(p.get(Status::CARRY));
    assert!(p.get(Status::ZERO));
    assert!(!p.get(Status::OVERFLOW));
}

#[test]
fn sbc_borrow_clears_carry() {
    let mut p = flags(Status::CARRY);
    assert_eq!(Alu::execute(AluOp::Sbc, &mut p, 0x00, 0x01, NMOS), 0xFF);
    assert!(!p.get(Status::CARRY));
    assert!(p.get(Status::NEGATIVE));
}

#[test]
fn sbc_signed_overflow() {
    let mut p = flags(Status::CARRY);
    assert_eq!(Alu::execute(AluOp::Sbc, &mut p, 0x80, 0x01, NMOS), 0x7F);
    assert!(p.get(Status::OVERFLOW));
    assert!(p.get(Status::CARRY));
}

// ─── Decimal mode ────────────────────────────────────────────────────────────

#[test]
fn decimal_adc_carries_between_digits() {
    let mut p = flags(Status::DECIMAL);
    assert_eq!(Alu::execute(AluOp::Adc, &mut p, 0x58, 0x46, NMOS), 0x04);
    assert!(p.get(Status::CARRY));
}

#[test]
fn decimal_adc_zero_flag_differs_between_variants() {
    let mut p = flags(Status::DECIMAL);
    assert_eq!(Alu::execute(AluOp::Adc, &mut p, 0x99, 0x01, NMOS), 0x00);
    assert!(p.get(Status::CARRY));
    assert!(!p.get(Status::ZERO), "NMOS takes Z from the binary sum");
    assert!(p.get(Status::NEGATIVE), "NMOS takes N from the intermediate result");

    let mut p = flags(Status::DECIMAL);
    assert_eq!(Alu::execute(AluOp::Adc, &mut p, 0x99, 0x01, CMOS), 0x00);
    assert!(p.get(Status::ZERO));
    assert!(!p.get(Status::NEGATIVE));
}

#[test]
fn decimal_sbc_borrows_between_digits() {
    let mut p = flags(Status::DECIMAL | Status::CARRY);
    assert_eq!(Alu::execute(AluOp::Sbc, &mut p, 0x46, 0x12, NMOS), 0x34);
    assert!(p.get(Status::CARRY));

    let mut p = flags(Status::DECIMAL | Status::CARRY);
    assert_eq!(Alu::execute(AluOp::Sbc, &mut p, 0x10, 0x01, CMOS), 0x09);
    assert!(p.get(Status::CARRY));
    assert!(!p.get(Status::ZERO));
}

// ─── Compare ─────────────────────────────────────────────────────────────────

#[test]
fn cmp_sets_carry_when_register_not_less() {
    let mut p = flags(0);
    let _ = Alu::execute(AluOp::Cmp, &mut p, 0x40, 0x40, NMOS);
    assert!(p.get(Status::CARRY));
    assert!(p.get(Status::ZERO));

    let _ = Alu::execute(AluOp::Cmp, &mut p, 0x10, 0x20, NMOS);
    assert!(!p.get(Status::CARRY));
    assert!(p.get(Status::NEGATIVE));
}

#[test]
fn cmp_ignores_decimal_mode() {
    let mut p = flags(Status::DECIMAL);
    assert_eq!(Alu::execute(AluOp::Cmp, &mut p, 0x10, 0x01, NMOS), 0x0F);
}

// ─── Logic / shifts ──────────────────────────────────────────────────────────

#[test]
fn logic_ops_set_n_and_z() {
    let mut p = flags(0);
    assert_eq!(Alu::execute(AluOp::And, &mut p, 0xF0, 0x0F, NMOS), 0x00);
    assert!(p.get(Status::ZERO));
    assert_eq!(Alu::execute(AluOp::Ora, &mut p, 0x80, 0x01, NMOS), 0x81);
    assert!(p.get(Status::NEGATIVE));
    assert_eq!(Alu::execute(AluOp::Eor, &mut p, 0xFF, 0xFF, NMOS), 0x00);
    assert!(p.get(Status::ZERO));
}

#[test]
fn shifts_move_bits_through_carry() {
    let mut p = flags(0);
    assert_eq!(Alu::execute(AluOp::Asl, &mut p, 0x81, 0, NMOS), 0x02);
    assert!(p.get(Status::CARRY));
    assert_eq!(Alu::execute(AluOp::Rol, &mut p, 0x40, 0, NMOS), 0x81);
    assert!(!p.get(Status::CARRY));
    assert_eq!(Alu::execute(AluOp::Lsr, &mut p, 0x01, 0, NMOS), 0x00);
    assert!(p.get(Status::CARRY));
    assert!(p.get(Status::ZERO));
    assert_eq!(Alu::execute(AluOp::Ror, &mut p, 0x00, 0, NMOS), 0x80);
    assert!(p.get(Status::NEGATIVE));
}

#[test]
fn bit_immediate_only_touches_zero() {
    let mut p = flags(0);
    logic::bit(&mut p, 0x01, 0xC0, false);
    assert!(p.get(Status::ZERO));
    assert!(p.get(Status::NEGATIVE));
    assert!(p.get(Status::OVERFLOW));

    let mut p = flags(0);
    logic::bit(&mut p, 0x01, 0xC0, true);
    assert!(p.get(Status::ZERO));
    assert!(!p.get(Status::NEGATIVE));
    assert!(!p.get(Status::OVERFLOW));
}

#[test]
fn trb_and_tsb_test_then_modify() {
    let mut p = flags(0);
    assert_eq!(logic::test_and_reset(&mut p, 0x0F, 0xFF), 0xF0);
    assert!(!p.get(Status::ZERO));
    assert_eq!(logic::test_and_set(&mut p, 0x0F, 0xF0), 0xFF);
    assert!(p.get(Status::ZERO));
}
