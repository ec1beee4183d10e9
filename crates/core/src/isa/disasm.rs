//! Instruction Disassembler for the 6502.
//!
//! Converts the bytes of one instruction into a human-readable string for debug tracing,
//! logging, and test diagnostics.
//!
//! # Usage
//!
//! ```
//! use bug65_core::isa::CpuVariant;
//! use bug65_core::isa::disasm::disassemble;
//! use bug65_core::isa::opcodes::OpcodeTable;
//!
//! let table = OpcodeTable::new(CpuVariant::Nmos6502);
//! assert_eq!(disassemble(&table, &[0xA9, 0x41], 0x0200), "lda #$41");
//! assert_eq!(disassemble(&table, &[0xD0, 0xFE], 0x0200), "bne $0200");
//! ```

use super::opcodes::{AddrMode, OpcodeTable};

/// Disassembles the instruction starting at `bytes[0]`.
///
/// Returns `".byte $nn"` when the opcode is undefined for the table's variant or when
/// `bytes` is too short to hold the operand.
///
/// # Arguments
///
/// * `table` - Dispatch table of the CPU variant being traced.
/// * `bytes` - The opcode followed by at least its operand bytes.
/// * `pc` - Address of the opcode, used to resolve branch targets.
pub fn disassemble(table: &OpcodeTable, bytes: &[u8], pc: u16) -> String {
    let Some(&opcode) = bytes.first() else {
        return String::from(".byte");
    };
    let Some(info) = table.lookup(opcode) else {
        return format!(".byte ${opcode:02x}");
    };
    let len = info.mode.operand_len() as usize;
    if bytes.len() <= len {
        return format!(".byte ${opcode:02x}");
    }

    let b = bytes[1..=len].to_vec();
    let byte = || b[0];
    let word = || u16::from_le_bytes([b[0], b[1]]);
    let name = info.mnemonic.name();

    let operand = match info.mode {
        AddrMode::Implied => return name.to_string(),
        AddrMode::Accumulator => "a".to_string(),
        AddrMode::Immediate => format!("#${:02x}", byte()),
        AddrMode::ZeroPage => format!("${:02x}", byte()),
        AddrMode::ZeroPageX => format!("${:02x},x", byte()),
        AddrMode::ZeroPageY => format!("${:02x},y", byte()),
        AddrMode::Absolute => format!("${:04x}", word()),
        AddrMode::AbsoluteX => format!("${:04x},x", word()),
        AddrMode::AbsoluteY => format!("${:04x},y", word()),
        AddrMode::Indirect => format!("(${:04x})", word()),
        AddrMode::IndexedIndirect => format!("(${:02x},x)", byte()),
        AddrMode::IndirectIndexed => format!("(${:02x}),y", byte()),
        AddrMode::ZeroPageIndirect => format!("(${:02x})", byte()),
        AddrMode::AbsoluteIndexedIndirect => format!("(${:04x},x)", word()),
        AddrMode::Relative => {
            let target = pc.wrapping_add(2).wrapping_add(byte() as i8 as u16);
            format!("${target:04x}")
        }
    };
    format!("{name} {operand}")
}
