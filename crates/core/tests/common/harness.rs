use bug65_core::Simulator;
use bug65_core::common::error::ShimMismatch;
use bug65_core::config::Config;
use bug65_core::core::Cpu;
use bug65_core::core::arch::Registers;
use bug65_core::shim::cc65::CStack;
use bug65_core::shim::{self, LibraryCall, ShimAction, ShimContext};
use bug65_core::sim::argv::ArgVector;
use bug65_core::sim::image::ProgramImage;
use bug65_core::sim::loader;
use bug65_core::soc::console::{Console, FailureInjection, InputScript};
use bug65_core::soc::memory::MemoryImage;
use bug65_core::stats::RunStats;
use tracing_subscriber::EnvFilter;

use super::builder::program::ProgramBuilder;

/// Installs a test-friendly subscriber once; `RUST_LOG` selects what is shown.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub struct TestContext {
    pub sim: Simulator,
}

impl TestContext {
    /// Loads `image` with the given arguments and input under `config`.
    pub fn load(
        image: &ProgramImage,
        args: &[Vec<u8>],
        input: impl Into<InputScript>,
        failures: FailureInjection,
        config: &Config,
    ) -> Self {
        init_tracing();
        let program = loader::load(image, args, config).expect("test image must load");
        Self {
            sim: Simulator::new(program, input.into(), failures),
        }
    }

    /// Loads a builder's program with argv `["test"]`, no input, default config.
    pub fn from_program(program: &ProgramBuilder) -> Self {
        Self::load(
            &program.image(),
            &[b"test".to_vec()],
            InputScript::default(),
            FailureInjection::default(),
            &Config::default(),
        )
    }

    /// Convenience accessor for the CPU.
    pub fn cpu(&self) -> &Cpu {
        &self.sim.cpu
    }

    /// Mutable convenience accessor for the CPU.
    pub fn cpu_mut(&mut self) -> &mut Cpu {
        &mut self.sim.cpu
    }

    pub fn memory(&self) -> &MemoryImage {
        &self.sim.memory
    }

    pub fn memory_mut(&mut self) -> &mut MemoryImage {
        &mut self.sim.memory
    }

    /// Execute `n` steps (or fewer if the run ends first).
    pub fn step_n(&mut self, n: usize) {
        for _ in 0..n {
            if self.sim.cpu.is_finished() {
                break;
            }
            self.sim.step();
        }
    }

    /// Run until the CPU halts or faults.
    pub fn run(&mut self) {
        let _ = self.sim.run();
    }

    pub fn stdout(&self) -> Vec<u8> {
        self.sim.transcript().stdout()
    }

    pub fn stdout_text(&self) -> String {
        String::from_utf8_lossy(&self.stdout()).into_owned()
    }
}

/// Drives single shim calls against hand-prepared registers and memory.
pub struct ShimBench {
    pub regs: Registers,
    pub memory: MemoryImage,
    pub console: Console,
    pub stats: RunStats,
    pub c_stack: CStack,
    pub argv: ArgVector,
}

/// Initial C stack pointer of a bench; the argument block sits above it.
pub const BENCH_SP: u16 = 0xC000;

impl ShimBench {
    pub fn new(input: impl Into<InputScript>, failures: FailureInjection) -> Self {
        init_tracing();
        let mut memory = MemoryImage::new(0);
        let args = [b"prog".to_vec(), b"x".to_vec()];
        let argv = ArgVector::serialize(&mut memory, &args, 0xFFF0, 0x0200)
            .expect("bench arguments fit");
        let c_stack = CStack::new(0x00);
        c_stack.set_sp(&mut memory, BENCH_SP);
        Self {
            regs: Registers::default(),
            memory,
            console: Console::new(input.into(), failures),
            stats: RunStats::default(),
            c_stack,
            argv,
        }
    }

    /// Places a NUL-terminated string at `addr`.
    pub fn string(&mut self, addr: u16, text: &[u8]) {
        self.memory.write_bytes(addr, text);
        self.memory.write_u8(addr + text.len() as u16, 0);
    }

    /// Pushes words onto the C stack in call order, as `pushax` would.
    pub fn push(&mut self, words: &[u16]) {
        for &w in words {
            self.c_stack.push_u16(&mut self.memory, w);
        }
    }

    pub fn sp(&self) -> u16 {
        self.c_stack.sp(&self.memory)
    }

    pub fn call(&mut self, call: LibraryCall) -> Result<ShimAction, ShimMismatch> {
        let mut ctx = ShimContext {
            regs: &mut self.regs,
            memory: &mut self.memory,
            console: &mut self.console,
            stats: &mut self.stats,
            c_stack: self.c_stack,
            argv: &self.argv,
            step: 1,
        };
        shim::dispatch(call, &mut ctx)
    }

    pub fn stdout_text(&self) -> String {
        String::from_utf8_lossy(&self.console.transcript().stdout()).into_owned()
    }
}
