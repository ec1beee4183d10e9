//! System Components.
//!
//! This module organizes what the CPU runs against: the memory image, the scripted console,
//! and the traits that connect them to the instruction emulator.

/// Scripted console I/O and transcript recording.
pub mod console;

/// 64 KiB memory image and region map.
pub mod memory;

/// Bus and trap-table traits.
pub mod traits;

pub use console::Console;
pub use memory::MemoryImage;
