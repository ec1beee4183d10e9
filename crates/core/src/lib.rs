//! Deterministic 6502 execution harness library.
//!
//! This crate runs cc65-compiled 6502 programs against a scripted console and checks their
//! observable behavior exactly. It provides:
//! 1. **Core:** The 6502/65C02 register set, status flags, ALU and fetch-decode-execute loop.
//! 2. **ISA:** The 256-entry opcode dispatch table, cc65 ABI constants, and a disassembler.
//! 3. **SoC:** The 64 KiB memory image and the scripted console with failure injection.
//! 4. **Shims:** Emulated `printf`, `puts`, `putchar`, `getchar`, `exit` and the `sim65`
//!    paravirtualization hooks.
//! 5. **Simulation:** Image loading, the run loop, transcript comparison, suites and
//!    manifests, plus configuration and run statistics.
//!
//! # Examples
//!
//! ```
//! use bug65_core::isa::CpuVariant;
//! use bug65_core::sim::harness::{self, RunOutcome};
//! use bug65_core::sim::image::ProgramImage;
//!
//! // lda #$07 ; jsr $FFF9 (sim65 exit hook)
//! let code = vec![0xA9, 0x07, 0x20, 0xF9, 0xFF];
//! let image = ProgramImage::raw(code, 0x0200, 0x0200, CpuVariant::Nmos6502);
//! let result = harness::run(&image, &[b"demo".to_vec()], "".into(), None).unwrap();
//! assert_eq!(result.outcome, RunOutcome::Exited(7));
//! ```

/// Common types and constants (memory map, image format, errors).
pub mod common;
/// Harness configuration (defaults and hierarchical config structures).
pub mod config;
/// CPU core (registers, status flags, ALU, execution, traps).
pub mod core;
/// Instruction set (opcode table, cc65 ABI, disassembler).
pub mod isa;
/// Library shim layer (C library routines and paravirtualization hooks).
pub mod shim;
/// Loader, simulator, comparator and manifests.
pub mod sim;
/// Memory image, console and bus traits.
pub mod soc;
/// Run statistics collection and reporting.
pub mod stats;

/// Root configuration type; use `Config::default()` or deserialize from JSON.
pub use crate::config::Config;
/// Main CPU type; holds registers, run state and counters.
pub use crate::core::Cpu;
/// One emulated run; construct from a loaded program.
pub use crate::sim::simulator::Simulator;
