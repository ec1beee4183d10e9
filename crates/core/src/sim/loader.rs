//! Program Loader and System Initialization.
//!
//! This module turns a program image and an argument list into a machine ready to run. It
//! performs:
//! 1. **Validation:** Checks the C stack location, payload placement and entry point.
//! 2. **Memory setup:** Copies the payload, points the reset vector at the entry, and
//!    serializes the argument vector below `args_top`.
//! 3. **Shim registry:** Registers the paravirtualization hooks and library routines named
//!    in the image's symbol table.
//! 4. **Register reset:** `S = stack_top`, `P = I | unused`, `PC = entry`; the C stack
//!    pointer starts at the bottom of the argument block.

use std::path::Path;

use crate::common::constants::{PROGRAM_FLOOR, RESET_VECTOR};
use crate::common::error::LoadError;
use crate::config::Config;
use crate::core::Cpu;
use crate::core::arch::Registers;
use crate::shim::cc65::CStack;
use crate::shim::{LibraryCall, ShimRegistry};
use crate::sim::argv::ArgVector;
use crate::sim::image::ProgramImage;
use crate::soc::memory::{MemoryImage, MemoryLayout};

/// Everything the loader produces; execution has not begun.
#[derive(Debug)]
pub struct LoadedProgram {
    /// CPU in the `Ready` state.
    pub cpu: Cpu,
    /// Initialized memory.
    pub memory: MemoryImage,
    /// Registered shim addresses.
    pub shims: ShimRegistry,
    /// Serialized argument vector.
    pub argv: ArgVector,
    /// The C stack.
    pub c_stack: CStack,
}

/// Reads a file from disk into a byte vector.
///
/// # Arguments
///
/// * `path` - Path to the file.
///
/// # Returns
///
/// The raw bytes of the file, or `LoadError::Io`.
pub fn load_binary(path: &Path) -> Result<Vec<u8>, LoadError> {
    std::fs::read(path).map_err(|e| LoadError::Io {
        path: path.display().to_string(),
        reason: e.to_string(),
    })
}

/// Loads `image` with `args` according to `config`.
///
/// # Arguments
///
/// * `image` - The program; its symbol table selects the library shims.
/// * `args` - Program name followed by the arguments.
/// * `config` - Memory layout, CPU override, step budget and shim selection.
///
/// # Returns
///
/// The initialized machine, or the first `LoadError` encountered.
pub fn load(
    image: &ProgramImage,
    args: &[Vec<u8>],
    config: &Config,
) -> Result<LoadedProgram, LoadError> {
    let header = &image.header;
    let args_top = config.memory.args_top;

    if image.payload.is_empty() {
        return Err(LoadError::EmptyPayload);
    }
    if header.sp_addr == 0xFF {
        return Err(LoadError::BadStackPointer(header.sp_addr));
    }
    let end = image.end();
    if header.load < PROGRAM_FLOOR || end > u32::from(args_top) {
        return Err(LoadError::ImageOutOfBounds {
            load: header.load,
            len: image.payload.len(),
            floor: PROGRAM_FLOOR,
            limit: u32::from(args_top),
        });
    }
    let entry = u32::from(header.entry);
    if entry < u32::from(header.load) || entry >= end {
        return Err(LoadError::EntryOutOfBounds {
            entry: header.entry,
            start: header.load,
            end,
        });
    }

    let mut memory = MemoryImage::new(config.memory.fill);
    memory.load(&image.payload, header.load)?;
    memory.write_u16(RESET_VECTOR, header.entry);

    let argv = ArgVector::serialize(&mut memory, args, args_top, end)?;
    let c_stack = CStack::new(header.sp_addr);
    c_stack.set_sp(&mut memory, argv.block_start);

    memory.set_layout(MemoryLayout {
        program_start: header.load,
        program_end: end,
        args_start: argv.block_start,
        args_top,
    });

    let shims = build_registry(image, config)?;
    let variant = config.cpu.variant.unwrap_or(header.variant);
    let regs = Registers::new(header.entry, config.memory.stack_top);
    let cpu = Cpu::new(variant, regs, config);

    tracing::debug!(
        ?variant,
        load = header.load,
        entry = header.entry,
        len = image.payload.len(),
        argc = argv.argc,
        shims = shims.len(),
        "program loaded"
    );

    Ok(LoadedProgram {
        cpu,
        memory,
        shims,
        argv,
        c_stack,
    })
}

/// Builds the shim registry for `image`.
fn build_registry(image: &ProgramImage, config: &Config) -> Result<ShimRegistry, LoadError> {
    let mut shims = if config.shims.paravirt {
        ShimRegistry::with_paravirt()
    } else {
        ShimRegistry::new()
    };
    if config.shims.library {
        for (name, addr) in image.symbols.iter() {
            if let Some(call) = LibraryCall::from_symbol(name) {
                tracing::debug!(routine = call.name(), addr, "library shim registered");
                shims.register(addr, call)?;
            }
        }
    }
    Ok(shims)
}
