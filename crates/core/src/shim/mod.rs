//! Library Shim Layer.
//!
//! Emulates the contract of selected C library routines and the `sim65`
//! paravirtualization hooks without executing target code. It provides:
//! 1. **Registry:** An address-to-routine map built at load time and queried once per step.
//! 2. **Context:** An explicit bundle of the registers, memory, console and argument vector a
//!    routine may touch.
//! 3. **Dispatch:** One handler per routine, returning either "return to caller" or "exit".

/// cc65 C stack and variadic argument frames.
pub mod cc65;

/// `printf`-family formatting.
pub mod format;

/// `printf`, `puts`, `putchar`, `getchar`, `exit`.
pub mod libc;

/// `sim65` paravirtualization hooks.
pub mod paravirt;

use std::collections::BTreeMap;

use self::cc65::CStack;
use crate::common::error::{LoadError, ShimMismatch};
use crate::core::arch::Registers;
use crate::isa::abi;
use crate::sim::argv::ArgVector;
use crate::soc::console::{Console, Stream, WriteError};
use crate::soc::memory::MemoryImage;
use crate::soc::traits::TrapTable;
use crate::stats::RunStats;

/// An emulated routine.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LibraryCall {
    /// `int printf(const char *fmt, ...)`
    Printf,
    /// `int puts(const char *s)`
    Puts,
    /// `int putchar(int c)`
    Putchar,
    /// `int getchar(void)`
    Getchar,
    /// `void exit(int status)`
    Exit,
    /// `sim65` open hook.
    PvOpen,
    /// `sim65` close hook.
    PvClose,
    /// `sim65` read hook.
    PvRead,
    /// `sim65` write hook.
    PvWrite,
    /// `sim65` args hook.
    PvArgs,
    /// `sim65` exit hook.
    PvExit,
}

impl LibraryCall {
    /// Every paravirtualization hook with its fixed address.
    pub const PARAVIRT: [(u16, Self); 6] = [
        (abi::PV_OPEN, Self::PvOpen),
        (abi::PV_CLOSE, Self::PvClose),
        (abi::PV_READ, Self::PvRead),
        (abi::PV_WRITE, Self::PvWrite),
        (abi::PV_ARGS, Self::PvArgs),
        (abi::PV_EXIT, Self::PvExit),
    ];

    /// Routine name used in logs and mismatch reports.
    pub fn name(self) -> &'static str {
        match self {
            Self::Printf => "printf",
            Self::Puts => "puts",
            Self::Putchar => "putchar",
            Self::Getchar => "getchar",
            Self::Exit => "exit",
            Self::PvOpen => "pv_open",
            Self::PvClose => "pv_close",
            Self::PvRead => "pv_read",
            Self::PvWrite => "pv_write",
            Self::PvArgs => "pv_args",
            Self::PvExit => "pv_exit",
        }
    }

    /// Maps an ld65 label to the library routine it names.
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        match symbol {
            abi::SYM_PRINTF => Some(Self::Printf),
            abi::SYM_PUTS => Some(Self::Puts),
            abi::SYM_PUTCHAR => Some(Self::Putchar),
            abi::SYM_GETCHAR => Some(Self::Getchar),
            abi::SYM_EXIT => Some(Self::Exit),
            _ => None,
        }
    }
}

/// What the simulator does after a routine has been emulated.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ShimAction {
    /// Return to the caller as `RTS` would.
    Return,
    /// Halt the run with this exit status.
    Exit(i32),
}

/// Address-to-routine map.
#[derive(Clone, Debug, Default)]
pub struct ShimRegistry {
    routines: BTreeMap<u16, LibraryCall>,
}

impl ShimRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry holding the `sim65` paravirtualization hooks.
    pub fn with_paravirt() -> Self {
        let mut registry = Self::new();
        for (addr, call) in LibraryCall::PARAVIRT {
            let _ = registry.routines.insert(addr, call);
        }
        registry
    }

    /// Registers `call` at `addr`.
    ///
    /// Registering the same routine twice at one address is harmless; a different routine
    /// fails with `LoadError::ShimConflict`.
    pub fn register(&mut self, addr: u16, call: LibraryCall) -> Result<(), LoadError> {
        match self.routines.get(&addr) {
            Some(&existing) if existing != call => Err(LoadError::ShimConflict {
                addr,
                first: existing.name(),
                second: call.name(),
            }),
            Some(_) => Ok(()),
            None => {
                let _ = self.routines.insert(addr, call);
                Ok(())
            }
        }
    }

    /// Routine registered at `addr`.
    #[inline]
    pub fn lookup(&self, addr: u16) -> Option<LibraryCall> {
        self.routines.get(&addr).copied()
    }

    /// All registrations in address order.
    pub fn iter(&self) -> impl Iterator<Item = (u16, LibraryCall)> + '_ {
        self.routines.iter().map(|(&a, &c)| (a, c))
    }

    /// Number of registered addresses.
    pub fn len(&self) -> usize {
        self.routines.len()
    }

    /// True if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.routines.is_empty()
    }
}

impl TrapTable for ShimRegistry {
    #[inline]
    fn is_trap(&self, addr: u16) -> bool {
        self.routines.contains_key(&addr)
    }
}

/// Everything a routine may read or modify.
#[derive(Debug)]
pub struct ShimContext<'a> {
    /// CPU registers; arguments arrive and results leave through `A`, `X` and `Y`.
    pub regs: &'a mut Registers,
    /// The memory image.
    pub memory: &'a mut MemoryImage,
    /// The scripted console.
    pub console: &'a mut Console,
    /// Run counters.
    pub stats: &'a mut RunStats,
    /// The C stack.
    pub c_stack: CStack,
    /// The argument vector built by the loader.
    pub argv: &'a ArgVector,
    /// Step at which the trap was taken.
    pub step: u64,
}

impl ShimContext<'_> {
    /// Places a C `int` result in `A/X`.
    pub fn return_int(&mut self, value: i16) {
        self.regs.set_ax(value as u16);
    }

    /// Writes `bytes` to the console as one call and updates the counters.
    pub fn write(&mut self, stream: Stream, bytes: &[u8]) -> Result<usize, WriteError> {
        match self.console.write(self.step, stream, bytes) {
            Ok(n) => {
                self.stats.bytes_written += n as u64;
                Ok(n)
            }
            Err(e) => {
                self.stats.write_failures += 1;
                Err(e)
            }
        }
    }
}

/// Emulates `call` against `ctx`.
///
/// # Returns
///
/// The action the simulator must take next, or `ShimMismatch` if the caller violated the
/// routine's calling convention.
pub fn dispatch(call: LibraryCall, ctx: &mut ShimContext<'_>) -> Result<ShimAction, ShimMismatch> {
    tracing::debug!(
        routine = call.name(),
        step = ctx.step,
        a = ctx.regs.a,
        x = ctx.regs.x,
        y = ctx.regs.y,
        "shim call"
    );
    ctx.stats.record_call(call.name());
    match call {
        LibraryCall::Printf => libc::printf(ctx),
        LibraryCall::Puts => libc::puts(ctx),
        LibraryCall::Putchar => libc::putchar(ctx),
        LibraryCall::Getchar => libc::getchar(ctx),
        LibraryCall::Exit => Ok(libc::exit(ctx)),
        LibraryCall::PvOpen => paravirt::open(ctx),
        LibraryCall::PvClose => Ok(paravirt::close(ctx)),
        LibraryCall::PvRead => Ok(paravirt::read(ctx)),
        LibraryCall::PvWrite => Ok(paravirt::write(ctx)),
        LibraryCall::PvArgs => Ok(paravirt::args(ctx)),
        LibraryCall::PvExit => Ok(paravirt::exit(ctx)),
    }
}
