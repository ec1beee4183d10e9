//! Simulator: owns the CPU, memory, console and shim registry side by side.
//!
//! Keeping the CPU and its memory as sibling fields lets a trapped shim borrow the
//! registers, the memory image and the console at the same time without any shared
//! mutable state.

use crate::common::error::Fault;
use crate::core::{Cpu, CpuState};
use crate::shim::cc65::CStack;
use crate::shim::{self, ShimAction, ShimContext, ShimRegistry};
use crate::sim::argv::ArgVector;
use crate::sim::harness::RunOutcome;
use crate::sim::loader::LoadedProgram;
use crate::soc::console::{Console, FailureInjection, InputScript, Transcript};
use crate::soc::memory::MemoryImage;
use crate::stats::RunStats;

/// One emulated run.
#[derive(Debug)]
pub struct Simulator {
    /// CPU architectural state.
    pub cpu: Cpu,
    /// The 64 KiB memory image.
    pub memory: MemoryImage,
    /// Scripted console.
    pub console: Console,
    /// Registered shim addresses.
    pub shims: ShimRegistry,
    /// Argument vector written by the loader.
    pub argv: ArgVector,
    /// The C stack.
    pub c_stack: CStack,
    /// Run counters.
    pub stats: RunStats,
}

impl Simulator {
    /// Creates a simulator over a loaded program.
    ///
    /// # Arguments
    ///
    /// * `program` - Output of the loader.
    /// * `script` - Bytes delivered to the program's input calls.
    /// * `failures` - Write calls that fail.
    pub fn new(program: LoadedProgram, script: InputScript, failures: FailureInjection) -> Self {
        let LoadedProgram {
            cpu,
            memory,
            shims,
            argv,
            c_stack,
        } = program;
        Self {
            cpu,
            memory,
            console: Console::new(script, failures),
            shims,
            argv,
            c_stack,
            stats: RunStats::default(),
        }
    }

    /// Advances by one step, servicing a shim trap if the step entered one.
    pub fn step(&mut self) {
        self.cpu.step(&mut self.memory, &self.shims);
        if let Some(addr) = self.cpu.trapped_at() {
            self.service_trap(addr);
        }
        self.stats.steps = self.cpu.steps;
        self.stats.cycles = self.cpu.cycles;
    }

    /// Steps until the CPU halts or faults.
    ///
    /// # Returns
    ///
    /// How the run ended.
    pub fn run(&mut self) -> RunOutcome {
        loop {
            match &self.cpu.state {
                CpuState::Halted(status) => return RunOutcome::Exited(*status),
                CpuState::Faulted(fault) => return RunOutcome::Faulted(fault.clone()),
                CpuState::Ready | CpuState::Running | CpuState::Trapped(_) => self.step(),
            }
        }
    }

    /// Exit status once the program has halted.
    pub fn exit_status(&self) -> Option<i32> {
        self.cpu.exit_status()
    }

    /// The fault that ended the run, if any.
    pub fn fault(&self) -> Option<&Fault> {
        self.cpu.fault_info()
    }

    /// The transcript recorded so far.
    pub fn transcript(&self) -> &Transcript {
        self.console.transcript()
    }

    /// Emulates the routine registered at `addr` and applies its outcome to the CPU.
    fn service_trap(&mut self, addr: u16) {
        let Some(call) = self.shims.lookup(addr) else {
            self.cpu.resume();
            return;
        };

        let mut ctx = ShimContext {
            regs: &mut self.cpu.regs,
            memory: &mut self.memory,
            console: &mut self.console,
            stats: &mut self.stats,
            c_stack: self.c_stack,
            argv: &self.argv,
            step: self.cpu.steps,
        };

        match shim::dispatch(call, &mut ctx) {
            Ok(ShimAction::Return) => self.cpu.return_from_subroutine(&mut self.memory),
            Ok(ShimAction::Exit(status)) => self.cpu.halt(status),
            Err(mismatch) => {
                tracing::debug!(%mismatch, addr, "shim contract violated");
                self.cpu.fault(Fault::ShimMismatch { addr, mismatch });
            }
        }
    }
}
