//! Memory Access Helpers.
//!
//! This module provides the interface between the CPU and the bus. It performs the following:
//! 1. **Operand Resolution:** Turns an addressing mode and its operand bytes into a value or
//!    an effective address, noting page crossings for cycle accounting.
//! 2. **Hardware Stack:** Push and pull through page 1.
//! 3. **Operand Access:** Reads and writes the resolved operand, whether it is memory or the
//!    accumulator.

use super::Cpu;
use crate::common::constants::{PAGE_MASK, STACK_BASE};
use crate::isa::opcodes::AddrMode;
use crate::soc::traits::Bus;

/// A resolved instruction operand.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Operand {
    /// The instruction takes no operand.
    None,
    /// The accumulator.
    Accumulator,
    /// An immediate byte.
    Immediate(u8),
    /// A memory location (or a branch/jump target).
    Address {
        /// Effective address.
        addr: u16,
        /// Indexing or branching crossed a page boundary.
        crossed: bool,
    },
}

/// True if `a` and `b` lie on different pages.
#[inline]
fn crosses(a: u16, b: u16) -> bool {
    (a & PAGE_MASK) != (b & PAGE_MASK)
}

/// Reads a pointer from zero page; the high byte wraps to `$00`.
fn read_zp_word(bus: &mut dyn Bus, zp: u8) -> u16 {
    let lo = bus.read(u16::from(zp));
    let hi = bus.read(u16::from(zp.wrapping_add(1)));
    u16::from_le_bytes([lo, hi])
}

impl Cpu {
    /// Resolves the operand of the instruction at `pc`.
    ///
    /// # Arguments
    ///
    /// * `bus` - The address space.
    /// * `mode` - Addressing mode from the dispatch table.
    /// * `pc` - Address of the opcode byte.
    ///
    /// # Returns
    ///
    /// The operand. For `Relative`, the branch target computed from the address following
    /// the instruction.
    pub fn resolve_operand(&self, bus: &mut dyn Bus, mode: AddrMode, pc: u16) -> Operand {
        let arg = pc.wrapping_add(1);
        let indexed = |base: u16, index: u8| {
            let addr = base.wrapping_add(u16::from(index));
            Operand::Address {
                addr,
                crossed: crosses(base, addr),
            }
        };
        let at = |addr: u16| Operand::Address {
            addr,
            crossed: false,
        };

        match mode {
            AddrMode::Implied => Operand::None,
            AddrMode::Accumulator => Operand::Accumulator,
            AddrMode::Immediate => Operand::Immediate(bus.read(arg)),
            AddrMode::ZeroPage => at(u16::from(bus.read(arg))),
            AddrMode::ZeroPageX => at(u16::from(bus.read(arg).wrapping_add(self.regs.x))),
            AddrMode::ZeroPageY => at(u16::from(bus.read(arg).wrapping_add(self.regs.y))),
            AddrMode::Absolute => at(bus.read_u16(arg)),
            AddrMode::AbsoluteX => indexed(bus.read_u16(arg), self.regs.x),
            AddrMode::AbsoluteY => indexed(bus.read_u16(arg), self.regs.y),
            AddrMode::Indirect => {
                let ptr = bus.read_u16(arg);
                if self.variant().is_cmos() {
                    at(bus.read_u16(ptr))
                } else {
                    // NMOS fetches the high byte without carrying into the page.
                    let lo = bus.read(ptr);
                    let hi = bus.read((ptr & PAGE_MASK) | (ptr.wrapping_add(1) & 0x00FF));
                    at(u16::from_le_bytes([lo, hi]))
                }
            }
            AddrMode::IndexedIndirect => {
                let zp = bus.read(arg).wrapping_add(self.regs.x);
                at(read_zp_word(bus, zp))
            }
            AddrMode::IndirectIndexed => {
                let zp = bus.read(arg);
                let base = read_zp_word(bus, zp);
                indexed(base, self.regs.y)
            }
            AddrMode::ZeroPageIndirect => {
                let zp = bus.read(arg);
                at(read_zp_word(bus, zp))
            }
            AddrMode::AbsoluteIndexedIndirect => {
                let ptr = bus.read_u16(arg).wrapping_add(u16::from(self.regs.x));
                at(bus.read_u16(ptr))
            }
            AddrMode::Relative => {
                let offset = bus.read(arg) as i8;
                let next = pc.wrapping_add(2);
                let addr = next.wrapping_add(offset as u16);
                Operand::Address {
                    addr,
                    crossed: crosses(next, addr),
                }
            }
        }
    }

    /// Reads the value an operand denotes.
    pub fn read_operand(&self, bus: &mut dyn Bus, operand: Operand) -> u8 {
        match operand {
            Operand::None => 0,
            Operand::Accumulator => self.regs.a,
            Operand::Immediate(v) => v,
            Operand::Address { addr, .. } => bus.read(addr),
        }
    }

    /// Writes a value to the location an operand denotes.
    pub fn write_operand(&mut self, bus: &mut dyn Bus, operand: Operand, val: u8) {
        match operand {
            Operand::Accumulator => self.regs.a = val,
            Operand::Address { addr, .. } => bus.write(addr, val),
            Operand::None | Operand::Immediate(_) => {}
        }
    }

    /// Pushes a byte onto the hardware stack.
    #[inline]
    pub fn push(&mut self, bus: &mut dyn Bus, val: u8) {
        bus.write(STACK_BASE | u16::from(self.regs.s), val);
        self.regs.s = self.regs.s.wrapping_sub(1);
    }

    /// Pulls a byte from the hardware stack.
    #[inline]
    pub fn pull(&mut self, bus: &mut dyn Bus) -> u8 {
        self.regs.s = self.regs.s.wrapping_add(1);
        bus.read(STACK_BASE | u16::from(self.regs.s))
    }

    /// Pushes a word, high byte first.
    pub fn push_u16(&mut self, bus: &mut dyn Bus, val: u16) {
        let [lo, hi] = val.to_le_bytes();
        self.push(bus, hi);
        self.push(bus, lo);
    }

    /// Pulls a word pushed by [`Cpu::push_u16`].
    pub fn pull_u16(&mut self, bus: &mut dyn Bus) -> u16 {
        let lo = self.pull(bus);
        let hi = self.pull(bus);
        u16::from_le_bytes([lo, hi])
    }
}
