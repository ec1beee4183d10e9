//! Global System Constants.
//!
//! This module defines system-wide constants used across the harness. It includes:
//! 1. **Memory Constants:** Address-space size, page boundaries, and fixed regions.
//! 2. **Vector Constants:** Locations of the 6502 interrupt and reset vectors.
//! 3. **Image Constants:** The `sim65` header magic, version, and length.
//! 4. **Simulation Constants:** Default budgets and safety limits.

/// Size of the 6502 address space in bytes (64 KiB).
pub const MEMORY_SIZE: usize = 0x1_0000;

/// Size of one 6502 page in bytes.
pub const PAGE_SIZE: u16 = 0x100;

/// Mask selecting the page number of an address.
pub const PAGE_MASK: u16 = 0xFF00;

/// First address of the hardware stack page.
pub const STACK_BASE: u16 = 0x0100;

/// Initial hardware stack pointer (top of page 1).
pub const STACK_TOP: u8 = 0xFF;

/// First address available for program images; below it live zero page and the stack.
pub const PROGRAM_FLOOR: u16 = 0x0200;

/// Exclusive upper bound of the argument block; the page above holds hooks and vectors.
pub const DEFAULT_ARGS_TOP: u16 = 0xFFF0;

/// Reset vector; the loader points it at the image entry.
pub const RESET_VECTOR: u16 = 0xFFFC;

/// IRQ/BRK vector.
pub const IRQ_VECTOR: u16 = 0xFFFE;

/// Magic bytes at the start of a `sim65` image.
pub const SIM65_MAGIC: &[u8; 5] = b"sim65";

/// Supported `sim65` header version.
pub const SIM65_VERSION: u8 = 2;

/// Length of the version-2 `sim65` header in bytes.
pub const SIM65_HEADER_LEN: usize = 12;

/// Default number of steps a run may take before it is declared a timeout.
pub const DEFAULT_STEP_BUDGET: u64 = 20_000_000;

/// Longest C string a shim will scan for before reporting it as unterminated.
pub const MAX_CSTRING_LEN: usize = 0x1000;
