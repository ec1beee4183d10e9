//! Trap Handling Logic.
//!
//! This module implements the CPU side of control transfers that leave normal sequential
//! execution. It performs the following:
//! 1. **Shim Traps:** Reports the trapped address and resumes after the shim layer has
//!    emulated the routine.
//! 2. **Return Handling:** Implements the `RTS` return the shim layer performs on behalf of
//!    an emulated routine.
//! 3. **Software Interrupts:** Implements `BRK` and `RTI`.

use super::{Cpu, CpuState};
use crate::common::constants::IRQ_VECTOR;
use crate::core::arch::Status;
use crate::soc::traits::Bus;

impl Cpu {
    /// Address of the pending shim trap, if the CPU is trapped.
    pub fn trapped_at(&self) -> Option<u16> {
        match self.state {
            CpuState::Trapped(addr) => Some(addr),
            _ => None,
        }
    }

    /// Leaves the `Trapped` state without changing the program counter.
    pub fn resume(&mut self) {
        if matches!(self.state, CpuState::Trapped(_)) {
            self.state = CpuState::Running;
        }
    }

    /// Returns from the trapped routine as `RTS` would and resumes execution.
    ///
    /// Pulls the return address pushed by `JSR` and continues at the byte after it.
    pub fn return_from_subroutine(&mut self, bus: &mut dyn Bus) {
        let ret = self.pull_u16(bus);
        self.regs.pc = ret.wrapping_add(1);
        self.resume();
    }

    /// Enters the `BRK` handler.
    ///
    /// Pushes the address two bytes past the `BRK` opcode and the status with B set, masks
    /// interrupts, and jumps through the IRQ vector. The 65C02 also clears decimal mode.
    ///
    /// # Arguments
    ///
    /// * `bus` - The address space.
    /// * `brk_pc` - Address of the `BRK` opcode.
    pub fn software_interrupt(&mut self, bus: &mut dyn Bus, brk_pc: u16) {
        self.push_u16(bus, brk_pc.wrapping_add(2));
        let pushed = self.regs.p.to_stack();
        self.push(bus, pushed);
        self.regs.p.set(Status::INTERRUPT, true);
        if self.variant().is_cmos() {
            self.regs.p.set(Status::DECIMAL, false);
        }
        self.regs.pc = bus.read_u16(IRQ_VECTOR);
    }

    /// Returns from an interrupt handler (`RTI`).
    pub fn return_from_interrupt(&mut self, bus: &mut dyn Bus) {
        let p = self.pull(bus);
        self.regs.p = Status::from_stack(p);
        self.regs.pc = self.pull_u16(bus);
    }
}
