//! CPU Core Definition and Initialization.
//!
//! This module defines the central `Cpu` structure, which holds the processor state. It
//! coordinates the following:
//! 1. **State Management:** Maintains registers and the run state (`Ready`, `Running`,
//!    `Trapped`, `Halted`, `Faulted`).
//! 2. **Accounting:** Counts steps and cycles and enforces the step budget.
//! 3. **Dispatch:** Owns the opcode table of the selected CPU variant.

/// Fetch-decode-execute loop and instruction handlers.
pub mod execution;

/// Operand resolution and hardware stack access.
pub mod memory;

/// Shim traps, subroutine return and software interrupts.
pub mod trap;

use crate::common::error::Fault;
use crate::config::Config;
use crate::core::arch::Registers;
use crate::isa::CpuVariant;
use crate::isa::opcodes::OpcodeTable;

/// Run state of the CPU.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CpuState {
    /// Loaded; no instruction executed yet.
    Ready,
    /// Executing instructions.
    Running,
    /// Stopped at a registered shim address, waiting for the shim to be serviced.
    Trapped(u16),
    /// Terminated by an exit call with the given status.
    Halted(i32),
    /// Terminated abnormally.
    Faulted(Fault),
}

impl CpuState {
    /// True for `Halted` and `Faulted`.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Halted(_) | Self::Faulted(_))
    }
}

/// 6502 processor.
///
/// The CPU never owns memory; every step borrows a bus and a trap table, which keeps the
/// memory image available to the shim layer between steps.
#[derive(Debug, Clone)]
pub struct Cpu {
    /// Programmer-visible registers.
    pub regs: Registers,
    /// Current run state.
    pub state: CpuState,
    /// Steps taken (instructions executed plus traps entered).
    pub steps: u64,
    /// Cycles consumed, including page-cross and branch penalties.
    pub cycles: u64,
    /// Steps allowed before the run faults with a timeout.
    pub step_budget: u64,
    /// Emit a `trace!` event per executed instruction.
    pub trace: bool,
    variant: CpuVariant,
    table: OpcodeTable,
    last_pc: u16,
    same_pc_count: u64,
}

impl Cpu {
    /// Creates a CPU in the `Ready` state.
    ///
    /// # Arguments
    ///
    /// * `variant` - Instruction set to execute.
    /// * `regs` - Initial register values prepared by the loader.
    /// * `config` - Supplies the step budget and the tracing switch.
    pub fn new(variant: CpuVariant, regs: Registers, config: &Config) -> Self {
        Self {
            regs,
            state: CpuState::Ready,
            steps: 0,
            cycles: 0,
            step_budget: config.general.step_budget,
            trace: config.general.trace_instructions,
            variant,
            table: OpcodeTable::new(variant),
            last_pc: regs.pc,
            same_pc_count: 0,
        }
    }

    /// Instruction set being executed.
    pub fn variant(&self) -> CpuVariant {
        self.variant
    }

    /// Dispatch table of the current variant.
    pub fn table(&self) -> &OpcodeTable {
        &self.table
    }

    /// Stops the run with an exit status.
    pub fn halt(&mut self, status: i32) {
        tracing::debug!(status, steps = self.steps, "cpu halted");
        self.state = CpuState::Halted(status);
    }

    /// Stops the run abnormally.
    pub fn fault(&mut self, fault: Fault) {
        tracing::debug!(%fault, pc = self.regs.pc, steps = self.steps, "cpu faulted");
        self.state = CpuState::Faulted(fault);
    }

    /// Exit status if the CPU has halted.
    pub fn exit_status(&self) -> Option<i32> {
        match self.state {
            CpuState::Halted(status) => Some(status),
            _ => None,
        }
    }

    /// The fault that stopped the CPU, if any.
    pub fn fault_info(&self) -> Option<&Fault> {
        match &self.state {
            CpuState::Faulted(fault) => Some(fault),
            _ => None,
        }
    }

    /// True once the CPU has halted or faulted.
    pub fn is_finished(&self) -> bool {
        self.state.is_terminal()
    }

    /// Formats the current CPU state (registers, counters, run state) for diagnostics.
    pub fn dump_state(&self) -> String {
        format!(
            "{} steps={} cycles={} state={:?}",
            self.regs, self.steps, self.cycles, self.state
        )
    }
}
