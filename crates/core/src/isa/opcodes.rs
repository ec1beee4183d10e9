//! 6502 opcode dispatch table.
//!
//! Every opcode byte maps to at most one `(mnemonic, addressing mode, base cycles)` entry.
//! The NMOS table holds the 151 documented opcodes; the 65C02 table adds 27 more. Bytes with
//! no entry are illegal instructions for the selected variant.

use super::CpuVariant;

macro_rules! mnemonics {
    ($($variant:ident => $name:literal),+ $(,)?) => {
        /// Instruction mnemonic; one handler per variant in the executor.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        #[allow(missing_docs)]
        pub enum Mnemonic {
            $($variant),+
        }

        impl Mnemonic {
            /// Lower-case assembler name, as printed by the disassembler.
            pub fn name(self) -> &'static str {
                match self {
                    $(Self::$variant => $name),+
                }
            }
        }
    };
}

mnemonics! {
    Adc => "adc", And => "and", Asl => "asl", Bcc => "bcc", Bcs => "bcs", Beq => "beq",
    Bit => "bit", Bmi => "bmi", Bne => "bne", Bpl => "bpl", Brk => "brk", Bvc => "bvc",
    Bvs => "bvs", Clc => "clc", Cld => "cld", Cli => "cli", Clv => "clv", Cmp => "cmp",
    Cpx => "cpx", Cpy => "cpy", Dec => "dec", Dex => "dex", Dey => "dey", Eor => "eor",
    Inc => "inc", Inx => "inx", Iny => "iny", Jmp => "jmp", Jsr => "jsr", Lda => "lda",
    Ldx => "ldx", Ldy => "ldy", Lsr => "lsr", Nop => "nop", Ora => "ora", Pha => "pha",
    Php => "php", Pla => "pla", Plp => "plp", Rol => "rol", Ror => "ror", Rti => "rti",
    Rts => "rts", Sbc => "sbc", Sec => "sec", Sed => "sed", Sei => "sei", Sta => "sta",
    Stx => "stx", Sty => "sty", Tax => "tax", Tay => "tay", Tsx => "tsx", Txa => "txa",
    Txs => "txs", Tya => "tya",
    // 65C02
    Bra => "bra", Phx => "phx", Phy => "phy", Plx => "plx", Ply => "ply", Stz => "stz",
    Trb => "trb", Tsb => "tsb",
}

impl Mnemonic {
    /// True for instructions that only read their operand and pay a cycle when indexing
    /// crosses a page.
    pub fn pays_page_penalty(self) -> bool {
        matches!(
            self,
            Self::Adc
                | Self::And
                | Self::Bit
                | Self::Cmp
                | Self::Eor
                | Self::Lda
                | Self::Ldx
                | Self::Ldy
                | Self::Ora
                | Self::Sbc
        )
    }

    /// True for conditional and unconditional relative branches.
    pub fn is_branch(self) -> bool {
        matches!(
            self,
            Self::Bcc
                | Self::Bcs
                | Self::Beq
                | Self::Bmi
                | Self::Bne
                | Self::Bpl
                | Self::Bvc
                | Self::Bvs
                | Self::Bra
        )
    }
}

/// Operand addressing mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AddrMode {
    /// No operand.
    Implied,
    /// Operates on the accumulator (`asl a`).
    Accumulator,
    /// `#$nn`
    Immediate,
    /// `$nn`
    ZeroPage,
    /// `$nn,x` (wraps within zero page)
    ZeroPageX,
    /// `$nn,y` (wraps within zero page)
    ZeroPageY,
    /// `$nnnn`
    Absolute,
    /// `$nnnn,x`
    AbsoluteX,
    /// `$nnnn,y`
    AbsoluteY,
    /// `($nnnn)`, JMP only
    Indirect,
    /// `($nn,x)`
    IndexedIndirect,
    /// `($nn),y`
    IndirectIndexed,
    /// Signed 8-bit branch displacement.
    Relative,
    /// `($nn)`, 65C02
    ZeroPageIndirect,
    /// `($nnnn,x)`, 65C02 JMP only
    AbsoluteIndexedIndirect,
}

impl AddrMode {
    /// Number of operand bytes following the opcode.
    pub fn operand_len(self) -> u16 {
        match self {
            Self::Implied | Self::Accumulator => 0,
            Self::Immediate
            | Self::ZeroPage
            | Self::ZeroPageX
            | Self::ZeroPageY
            | Self::IndexedIndirect
            | Self::IndirectIndexed
            | Self::Relative
            | Self::ZeroPageIndirect => 1,
            Self::Absolute
            | Self::AbsoluteX
            | Self::AbsoluteY
            | Self::Indirect
            | Self::AbsoluteIndexedIndirect => 2,
        }
    }
}

/// One decoded dispatch-table entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpInfo {
    /// Opcode byte.
    pub opcode: u8,
    /// Instruction mnemonic.
    pub mnemonic: Mnemonic,
    /// Addressing mode.
    pub mode: AddrMode,
    /// Base cycle count, before page-cross and branch penalties.
    pub cycles: u8,
}

impl OpInfo {
    /// Total instruction length in bytes.
    pub fn byte_len(&self) -> u16 {
        1 + self.mode.operand_len()
    }
}

use self::AddrMode::{
    Absolute as Abs, AbsoluteIndexedIndirect as AbsInd, AbsoluteX as AbsX, AbsoluteY as AbsY,
    Accumulator as Acc, Immediate as Imm, Implied as Imp, IndexedIndirect as IndX,
    Indirect as Ind, IndirectIndexed as IndY, Relative as Rel, ZeroPage as Zp,
    ZeroPageIndirect as ZpInd, ZeroPageX as ZpX, ZeroPageY as ZpY,
};
use self::Mnemonic::{
    Adc, And, Asl, Bcc, Bcs, Beq, Bit, Bmi, Bne, Bpl, Bra, Brk, Bvc, Bvs, Clc, Cld, Cli, Clv, Cmp,
    Cpx, Cpy, Dec, Dex, Dey, Eor, Inc, Inx, Iny, Jmp, Jsr, Lda, Ldx, Ldy, Lsr, Nop, Ora, Pha, Phx,
    Phy, Php, Pla, Plp, Plx, Ply, Rol, Ror, Rti, Rts, Sbc, Sec, Sed, Sei, Sta, Stx, Sty, Stz, Tax,
    Tay, Trb, Tsb, Tsx, Txa, Txs, Tya,
};

/// Documented NMOS 6502 opcodes.
#[rustfmt::skip]
const NMOS: &[(u8, Mnemonic, AddrMode, u8)] = &[
    (0x69, Adc, Imm, 2), (0x65, Adc, Zp, 3), (0x75, Adc, ZpX, 4), (0x6D, Adc, Abs, 4),
    (0x7D, Adc, AbsX, 4), (0x79, Adc, AbsY, 4), (0x61, Adc, IndX, 6), (0x71, Adc, IndY, 5),
    (0x29, And, Imm, 2), (0x25, And, Zp, 3), (0x35, And, ZpX, 4), (0x2D, And, Abs, 4),
    (0x3D, And, AbsX, 4), (0x39, And, AbsY, 4), (0x21, And, IndX, 6), (0x31, And, IndY, 5),
    (0x0A, Asl, Acc, 2), (0x06, Asl, Zp, 5), (0x16, Asl, ZpX, 6), (0x0E, Asl, Abs, 6),
    (0x1E, Asl, AbsX, 7),
    (0x90, Bcc, Rel, 2), (0xB0, Bcs, Rel, 2), (0xF0, Beq, Rel, 2), (0x30, Bmi, Rel, 2),
    (0xD0, Bne, Rel, 2), (0x10, Bpl, Rel, 2), (0x50, Bvc, Rel, 2), (0x70, Bvs, Rel, 2),
    (0x24, Bit, Zp, 3), (0x2C, Bit, Abs, 4),
    (0x00, Brk, Imp, 7),
    (0x18, Clc, Imp, 2), (0xD8, Cld, Imp, 2), (0x58, Cli, Imp, 2), (0xB8, Clv, Imp, 2),
    (0xC9, Cmp, Imm, 2), (0xC5, Cmp, Zp, 3), (0xD5, Cmp, ZpX, 4), (0xCD, Cmp, Abs, 4),
    (0xDD, Cmp, AbsX, 4), (0xD9, Cmp, AbsY, 4), (0xC1, Cmp, IndX, 6), (0xD1, Cmp, IndY, 5),
    (0xE0, Cpx, Imm, 2), (0xE4, Cpx, Zp, 3), (0xEC, Cpx, Abs, 4),
    (0xC0, Cpy, Imm, 2), (0xC4, Cpy, Zp, 3), (0xCC, Cpy, Abs, 4),
    (0xC6, Dec, Zp, 5), (0xD6, Dec, ZpX, 6), (0xCE, Dec, Abs, 6), (0xDE, Dec, AbsX, 7),
    (0xCA, Dex, Imp, 2), (0x88, Dey, Imp, 2),
    (0x49, Eor, Imm, 2), (0x45, Eor, Zp, 3), (0x55, Eor, ZpX, 4), (0x4D, Eor, Abs, 4),
    (0x5D, Eor, AbsX, 4), (0x59, Eor, AbsY, 4), (0x41, Eor, IndX, 6), (0x51, Eor, IndY, 5),
    (0xE6, Inc, Zp, 5), (0xF6, Inc, ZpX, 6), (0xEE, Inc, Abs, 6), (0xFE, Inc, AbsX, 7),
    (0xE8, Inx, Imp, 2), (0xC8, Iny, Imp, 2),
    (0x4C, Jmp, Abs, 3), (0x6C, Jmp, Ind, 5),
    (0x20, Jsr, Abs, 6),
    (0xA9, Lda, Imm, 2), (0xA5, Lda, Zp, 3), (0xB5, Lda, ZpX, 4), (0xAD, Lda, Abs, 4),
    (0xBD, Lda, AbsX, 4), (0xB9, Lda, AbsY, 4), (0xA1, Lda, IndX, 6), (0xB1, Lda, IndY, 5),
    (0xA2, Ldx, Imm, 2), (0xA6, Ldx, Zp, 3), (0xB6, Ldx, ZpY, 4), (0xAE, Ldx, Abs, 4),
    (0xBE, Ldx, AbsY, 4),
    (0xA0, Ldy, Imm, 2), (0xA4, Ldy, Zp, 3), (0xB4, Ldy, ZpX, 4), (0xAC, Ldy, Abs, 4),
    (0xBC, Ldy, AbsX, 4),
    (0x4A, Lsr, Acc, 2), (0x46, Lsr, Zp, 5), (0x56, Lsr, ZpX, 6), (0x4E, Lsr, Abs, 6),
    (0x5E, Lsr, AbsX, 7),
    (0xEA, Nop, Imp, 2),
    (0x09, Ora, Imm, 2), (0x05, Ora, Zp, 3), (0x15, Ora, ZpX, 4), (0x0D, Ora, Abs, 4),
    (0x1D, Ora, AbsX, 4), (0x19, Ora, AbsY, 4), (0x01, Ora, IndX, 6), (0x11, Ora, IndY, 5),
    (0x48, Pha, Imp, 3), (0x08, Php, Imp, 3), (0x68, Pla, Imp, 4), (0x28, Plp, Imp, 4),
    (0x2A, Rol, Acc, 2), (0x26, Rol, Zp, 5), (0x36, Rol, ZpX, 6), (0x2E, Rol, Abs, 6),
    (0x3E, Rol, AbsX, 7),
    (0x6A, Ror, Acc, 2), (0x66, Ror, Zp, 5), (0x76, Ror, ZpX, 6), (0x6E, Ror, Abs, 6),
    (0x7E, Ror, AbsX, 7),
    (0x40, Rti, Imp, 6), (0x60, Rts, Imp, 6),
    (0xE9, Sbc, Imm, 2), (0xE5, Sbc, Zp, 3), (0xF5, Sbc, ZpX, 4), (0xED, Sbc, Abs, 4),
    (0xFD, Sbc, AbsX, 4), (0xF9, Sbc, AbsY, 4), (0xE1, Sbc, IndX, 6), (0xF1, Sbc, IndY, 5),
    (0x38, Sec, Imp, 2), (0xF8, Sed, Imp, 2), (0x78, Sei, Imp, 2),
    (0x85, Sta, Zp, 3), (0x95, Sta, ZpX, 4), (0x8D, Sta, Abs, 4), (0x9D, Sta, AbsX, 5),
    (0x99, Sta, AbsY, 5), (0x81, Sta, IndX, 6), (0x91, Sta, IndY, 6),
    (0x86, Stx, Zp, 3), (0x96, Stx, ZpY, 4), (0x8E, Stx, Abs, 4),
    (0x84, Sty, Zp, 3), (0x94, Sty, ZpX, 4), (0x8C, Sty, Abs, 4),
    (0xAA, Tax, Imp, 2), (0xA8, Tay, Imp, 2), (0xBA, Tsx, Imp, 2), (0x8A, Txa, Imp, 2),
    (0x9A, Txs, Imp, 2), (0x98, Tya, Imp, 2),
];

/// 65C02 additions on top of [`NMOS`].
#[rustfmt::skip]
const CMOS: &[(u8, Mnemonic, AddrMode, u8)] = &[
    (0x80, Bra, Rel, 3),
    (0xDA, Phx, Imp, 3), (0x5A, Phy, Imp, 3), (0xFA, Plx, Imp, 4), (0x7A, Ply, Imp, 4),
    (0x64, Stz, Zp, 3), (0x74, Stz, ZpX, 4), (0x9C, Stz, Abs, 4), (0x9E, Stz, AbsX, 5),
    (0x14, Trb, Zp, 5), (0x1C, Trb, Abs, 6),
    (0x04, Tsb, Zp, 5), (0x0C, Tsb, Abs, 6),
    (0x1A, Inc, Acc, 2), (0x3A, Dec, Acc, 2),
    (0x12, Ora, ZpInd, 5), (0x32, And, ZpInd, 5), (0x52, Eor, ZpInd, 5), (0x72, Adc, ZpInd, 5),
    (0x92, Sta, ZpInd, 5), (0xB2, Lda, ZpInd, 5), (0xD2, Cmp, ZpInd, 5), (0xF2, Sbc, ZpInd, 5),
    (0x89, Bit, Imm, 2), (0x34, Bit, ZpX, 4), (0x3C, Bit, AbsX, 4),
    (0x7C, Jmp, AbsInd, 6),
];

/// 256-entry dispatch table for one CPU variant.
#[derive(Debug, Clone)]
pub struct OpcodeTable {
    entries: [Option<OpInfo>; 256],
}

impl OpcodeTable {
    /// Builds the table for `variant`.
    ///
    /// On the 65C02 `JMP ($nnnn)` takes one extra cycle because the page-wrap bug is fixed.
    pub fn new(variant: CpuVariant) -> Self {
        let mut entries = [None; 256];
        let extras: &[_] = if variant.is_cmos() { CMOS } else { &[] };
        for &(opcode, mnemonic, mode, cycles) in NMOS.iter().chain(extras) {
            let cycles = if variant.is_cmos() && mode == Ind { cycles + 1 } else { cycles };
            entries[opcode as usize] = Some(OpInfo {
                opcode,
                mnemonic,
                mode,
                cycles,
            });
        }
        Self { entries }
    }

    /// Returns the entry for `opcode`, or `None` if it is illegal for this variant.
    #[inline]
    pub fn lookup(&self, opcode: u8) -> Option<&OpInfo> {
        self.entries[opcode as usize].as_ref()
    }

    /// Iterates over all defined entries in opcode order.
    pub fn iter(&self) -> impl Iterator<Item = &OpInfo> {
        self.entries.iter().flatten()
    }

    /// Number of defined opcodes.
    pub fn len(&self) -> usize {
        self.iter().count()
    }

    /// True if no opcode is defined, which never happens for a built table.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
