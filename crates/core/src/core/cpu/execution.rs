//! Main Execution Loop.
//!
//! This module implements the fetch-decode-execute cycle of the CPU. It performs the
//! following:
//! 1. **Budget and Trap Checks:** Faults on an exhausted step budget and stops at registered
//!    shim addresses before fetching.
//! 2. **Dispatch:** Looks the opcode up in the 256-entry table and runs the handler for its
//!    mnemonic; undefined opcodes fault.
//! 3. **Timing Management:** Adds base cycles plus page-cross and taken-branch penalties.
//! 4. **Observability:** Per-instruction tracing and tight-loop detection.

use super::memory::Operand;
use super::{Cpu, CpuState};
use crate::common::error::Fault;
use crate::core::arch::Status;
use crate::core::units::alu::{Alu, AluOp, logic};
use crate::isa::disasm::disassemble;
use crate::isa::opcodes::{AddrMode, Mnemonic, OpInfo};
use crate::soc::traits::{Bus, TrapTable};

/// Consecutive steps at the same PC before a possible hang is logged.
const HANG_DETECTION_THRESHOLD: u64 = 100_000;

impl Cpu {
    /// Advances execution by one step.
    ///
    /// Does nothing once the CPU is `Trapped`, `Halted` or `Faulted`; the caller services
    /// the trap (and calls [`Cpu::resume`] or [`Cpu::return_from_subroutine`]) before
    /// stepping again.
    ///
    /// # Arguments
    ///
    /// * `bus` - The address space.
    /// * `traps` - Registered shim addresses.
    pub fn step(&mut self, bus: &mut dyn Bus, traps: &dyn TrapTable) {
        match self.state {
            CpuState::Trapped(_) | CpuState::Halted(_) | CpuState::Faulted(_) => return,
            CpuState::Ready => self.state = CpuState::Running,
            CpuState::Running => {}
        }

        if self.steps >= self.step_budget {
            self.fault(Fault::Timeout { steps: self.steps });
            return;
        }

        let pc = self.regs.pc;
        self.check_hang(pc);

        if traps.is_trap(pc) {
            self.steps += 1;
            self.state = CpuState::Trapped(pc);
            tracing::trace!(addr = pc, "shim trap");
            return;
        }

        let opcode = bus.read(pc);
        let Some(info) = self.table().lookup(opcode).copied() else {
            self.fault(Fault::IllegalInstruction { addr: pc, opcode });
            return;
        };

        if self.trace {
            self.trace_instruction(bus, &info, pc);
        }

        let operand = self.resolve_operand(bus, info.mode, pc);
        self.regs.pc = pc.wrapping_add(info.byte_len());
        let penalty = self.execute(bus, &info, operand, pc);

        self.steps += 1;
        self.cycles += u64::from(info.cycles) + penalty;
    }

    /// Runs the handler for one decoded instruction.
    ///
    /// # Returns
    ///
    /// Extra cycles beyond the base count.
    fn execute(&mut self, bus: &mut dyn Bus, info: &OpInfo, operand: Operand, pc: u16) -> u64 {
        let variant = self.variant();
        let crossed = matches!(operand, Operand::Address { crossed: true, .. });
        let mut penalty = u64::from(info.mnemonic.pays_page_penalty() && crossed);

        match info.mnemonic {
            Mnemonic::Adc | Mnemonic::Sbc | Mnemonic::And | Mnemonic::Ora | Mnemonic::Eor => {
                let op = match info.mnemonic {
                    Mnemonic::Adc => AluOp::Adc,
                    Mnemonic::Sbc => AluOp::Sbc,
                    Mnemonic::And => AluOp::And,
                    Mnemonic::Ora => AluOp::Ora,
                    _ => AluOp::Eor,
                };
                let m = self.read_operand(bus, operand);
                self.regs.a = Alu::execute(op, &mut self.regs.p, self.regs.a, m, variant);
            }
            Mnemonic::Cmp | Mnemonic::Cpx | Mnemonic::Cpy => {
                let reg = match info.mnemonic {
                    Mnemonic::Cmp => self.regs.a,
                    Mnemonic::Cpx => self.regs.x,
                    _ => self.regs.y,
                };
                let m = self.read_operand(bus, operand);
                let _ = Alu::execute(AluOp::Cmp, &mut self.regs.p, reg, m, variant);
            }
            Mnemonic::Asl | Mnemonic::Lsr | Mnemonic::Rol | Mnemonic::Ror => {
                let op = match info.mnemonic {
                    Mnemonic::Asl => AluOp::Asl,
                    Mnemonic::Lsr => AluOp::Lsr,
                    Mnemonic::Rol => AluOp::Rol,
                    _ => AluOp::Ror,
                };
                let m = self.read_operand(bus, operand);
                let r = Alu::execute(op, &mut self.regs.p, m, 0, variant);
                self.write_operand(bus, operand, r);
            }
            Mnemonic::Inc | Mnemonic::Dec => {
                let m = self.read_operand(bus, operand);
                let r = if info.mnemonic == Mnemonic::Inc {
                    m.wrapping_add(1)
                } else {
                    m.wrapping_sub(1)
                };
                self.regs.p.set_nz(r);
                self.write_operand(bus, operand, r);
            }
            Mnemonic::Inx => self.regs.x = self.set_nz(self.regs.x.wrapping_add(1)),
            Mnemonic::Iny => self.regs.y = self.set_nz(self.regs.y.wrapping_add(1)),
            Mnemonic::Dex => self.regs.x = self.set_nz(self.regs.x.wrapping_sub(1)),
            Mnemonic::Dey => self.regs.y = self.set_nz(self.regs.y.wrapping_sub(1)),

            Mnemonic::Bit => {
                let m = self.read_operand(bus, operand);
                let immediate = info.mode == AddrMode::Immediate;
                logic::bit(&mut self.regs.p, self.regs.a, m, immediate);
            }
            Mnemonic::Trb | Mnemonic::Tsb => {
                let m = self.read_operand(bus, operand);
                let r = if info.mnemonic == Mnemonic::Trb {
                    logic::test_and_reset(&mut self.regs.p, self.regs.a, m)
                } else {
                    logic::test_and_set(&mut self.regs.p, self.regs.a, m)
                };
                self.write_operand(bus, operand, r);
            }

            Mnemonic::Lda => {
                let m = self.read_operand(bus, operand);
                self.regs.a = self.set_nz(m);
            }
            Mnemonic::Ldx => {
                let m = self.read_operand(bus, operand);
                self.regs.x = self.set_nz(m);
            }
            Mnemonic::Ldy => {
                let m = self.read_operand(bus, operand);
                self.regs.y = self.set_nz(m);
            }
            Mnemonic::Sta => self.write_operand(bus, operand, self.regs.a),
            Mnemonic::Stx => self.write_operand(bus, operand, self.regs.x),
            Mnemonic::Sty => self.write_operand(bus, operand, self.regs.y),
            Mnemonic::Stz => self.write_operand(bus, operand, 0),

            Mnemonic::Tax => self.regs.x = self.set_nz(self.regs.a),
            Mnemonic::Tay => self.regs.y = self.set_nz(self.regs.a),
            Mnemonic::Txa => self.regs.a = self.set_nz(self.regs.x),
            Mnemonic::Tya => self.regs.a = self.set_nz(self.regs.y),
            Mnemonic::Tsx => self.regs.x = self.set_nz(self.regs.s),
            Mnemonic::Txs => self.regs.s = self.regs.x,

            Mnemonic::Pha => self.push(bus, self.regs.a),
            Mnemonic::Phx => self.push(bus, self.regs.x),
            Mnemonic::Phy => self.push(bus, self.regs.y),
            Mnemonic::Php => self.push(bus, self.regs.p.to_stack()),
            Mnemonic::Pla => {
                let v = self.pull(bus);
                self.regs.a = self.set_nz(v);
            }
            Mnemonic::Plx => {
                let v = self.pull(bus);
                self.regs.x = self.set_nz(v);
            }
            Mnemonic::Ply => {
                let v = self.pull(bus);
                self.regs.y = self.set_nz(v);
            }
            Mnemonic::Plp => {
                let v = self.pull(bus);
                self.regs.p = Status::from_stack(v);
            }

            Mnemonic::Clc => self.regs.p.set(Status::CARRY, false),
            Mnemonic::Cld => self.regs.p.set(Status::DECIMAL, false),
            Mnemonic::Cli => self.regs.p.set(Status::INTERRUPT, false),
            Mnemonic::Clv => self.regs.p.set(Status::OVERFLOW, false),
            Mnemonic::Sec => self.regs.p.set(Status::CARRY, true),
            Mnemonic::Sed => self.regs.p.set(Status::DECIMAL, true),
            Mnemonic::Sei => self.regs.p.set(Status::INTERRUPT, true),

            Mnemonic::Bcc
            | Mnemonic::Bcs
            | Mnemonic::Beq
            | Mnemonic::Bne
            | Mnemonic::Bmi
            | Mnemonic::Bpl
            | Mnemonic::Bvc
            | Mnemonic::Bvs
            | Mnemonic::Bra => {
                let p = self.regs.p;
                let taken = match info.mnemonic {
                    Mnemonic::Bcc => !p.get(Status::CARRY),
                    Mnemonic::Bcs => p.get(Status::CARRY),
                    Mnemonic::Bne => !p.get(Status::ZERO),
                    Mnemonic::Beq => p.get(Status::ZERO),
                    Mnemonic::Bpl => !p.get(Status::NEGATIVE),
                    Mnemonic::Bmi => p.get(Status::NEGATIVE),
                    Mnemonic::Bvc => !p.get(Status::OVERFLOW),
                    Mnemonic::Bvs => p.get(Status::OVERFLOW),
                    _ => true,
                };
                if let (true, Operand::Address { addr, crossed }) = (taken, operand) {
                    self.regs.pc = addr;
                    // BRA's base count already includes the taken cycle.
                    if info.mnemonic != Mnemonic::Bra {
                        penalty += 1;
                    }
                    penalty += u64::from(crossed);
                }
            }

            Mnemonic::Jmp => {
                if let Operand::Address { addr, .. } = operand {
                    self.regs.pc = addr;
                }
            }
            Mnemonic::Jsr => {
                if let Operand::Address { addr, .. } = operand {
                    let ret = self.regs.pc.wrapping_sub(1);
                    self.push_u16(bus, ret);
                    self.regs.pc = addr;
                }
            }
            Mnemonic::Rts => {
                let ret = self.pull_u16(bus);
                self.regs.pc = ret.wrapping_add(1);
            }
            Mnemonic::Rti => self.return_from_interrupt(bus),
            Mnemonic::Brk => self.software_interrupt(bus, pc),
            Mnemonic::Nop => {}
        }
        penalty
    }

    /// Sets N and Z from `v` and returns it.
    #[inline]
    fn set_nz(&mut self, v: u8) -> u8 {
        self.regs.p.set_nz(v);
        v
    }

    /// Emits one `trace!` event with the disassembled instruction and the registers.
    fn trace_instruction(&self, bus: &mut dyn Bus, info: &OpInfo, pc: u16) {
        let bytes: Vec<u8> = (0..info.byte_len())
            .map(|i| bus.read(pc.wrapping_add(i)))
            .collect();
        let text = disassemble(self.table(), &bytes, pc);
        tracing::trace!(target: "bug65::cpu", "{:04X}  {:<14} {}", pc, text, self.regs);
    }

    /// Logs once when execution sits on the same PC for a long time.
    fn check_hang(&mut self, pc: u16) {
        if pc == self.last_pc {
            self.same_pc_count += 1;
            if self.same_pc_count == HANG_DETECTION_THRESHOLD {
                tracing::debug!(pc, steps = self.steps, "possible hang: PC unchanged");
            }
        } else {
            self.last_pc = pc;
            self.same_pc_count = 0;
        }
    }
}
