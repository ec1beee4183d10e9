//! Memory Image.
//!
//! This module implements the flat 64 KiB store the emulator runs on. It provides:
//! 1. **Storage:** Byte and little-endian word access with 16-bit wrap-around.
//! 2. **Loading:** Bounds-checked placement of image payloads.
//! 3. **Layout:** The region map (zero page, stack, program, argument block, hooks) recorded
//!    by the loader, used for diagnostics and for keeping the argument block reserved.
//! 4. **C strings:** Bounded NUL-terminated string reads for the shim layer.

use std::fmt;

use crate::common::constants::{DEFAULT_ARGS_TOP, MEMORY_SIZE, PROGRAM_FLOOR, STACK_BASE};
use crate::common::error::LoadError;
use crate::soc::traits::Bus;

/// Named region of the address space.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Region {
    /// `$0000-$00FF`
    ZeroPage,
    /// `$0100-$01FF`
    Stack,
    /// Loaded code and static data.
    Program,
    /// Unallocated memory between the program and the argument block; BSS and heap.
    Free,
    /// Serialized argument vector.
    Arguments,
    /// Paravirtualization hooks and CPU vectors above the argument block.
    Hooks,
}

/// Boundaries recorded by the loader.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MemoryLayout {
    /// First byte of the loaded payload.
    pub program_start: u16,
    /// One past the last byte of the loaded payload.
    pub program_end: u32,
    /// First byte of the argument block.
    pub args_start: u16,
    /// One past the last byte of the argument block.
    pub args_top: u16,
}

impl Default for MemoryLayout {
    fn default() -> Self {
        Self {
            program_start: PROGRAM_FLOOR,
            program_end: u32::from(PROGRAM_FLOOR),
            args_start: DEFAULT_ARGS_TOP,
            args_top: DEFAULT_ARGS_TOP,
        }
    }
}

/// 64 KiB byte-addressable memory.
pub struct MemoryImage {
    bytes: Box<[u8]>,
    layout: MemoryLayout,
}

impl MemoryImage {
    /// Creates a memory image with every byte set to `fill`.
    pub fn new(fill: u8) -> Self {
        Self {
            bytes: vec![fill; MEMORY_SIZE].into_boxed_slice(),
            layout: MemoryLayout::default(),
        }
    }

    /// Reads one byte.
    #[inline]
    pub fn read_u8(&self, addr: u16) -> u8 {
        self.bytes[addr as usize]
    }

    /// Writes one byte.
    #[inline]
    pub fn write_u8(&mut self, addr: u16, val: u8) {
        self.bytes[addr as usize] = val;
    }

    /// Reads a little-endian word, wrapping at `$FFFF`.
    #[inline]
    pub fn read_u16(&self, addr: u16) -> u16 {
        u16::from_le_bytes([self.read_u8(addr), self.read_u8(addr.wrapping_add(1))])
    }

    /// Writes a little-endian word, wrapping at `$FFFF`.
    #[inline]
    pub fn write_u16(&mut self, addr: u16, val: u16) {
        let [lo, hi] = val.to_le_bytes();
        self.write_u8(addr, lo);
        self.write_u8(addr.wrapping_add(1), hi);
    }

    /// Copies `len` bytes starting at `addr`, wrapping at `$FFFF`.
    pub fn read_bytes(&self, addr: u16, len: usize) -> Vec<u8> {
        (0..len)
            .map(|i| self.read_u8(addr.wrapping_add(i as u16)))
            .collect()
    }

    /// Writes `data` starting at `addr`, wrapping at `$FFFF`.
    pub fn write_bytes(&mut self, addr: u16, data: &[u8]) {
        for (i, &b) in data.iter().enumerate() {
            self.write_u8(addr.wrapping_add(i as u16), b);
        }
    }

    /// Loads an image payload without wrap-around.
    ///
    /// # Arguments
    ///
    /// * `data` - The payload bytes.
    /// * `addr` - Load address of the first byte.
    ///
    /// # Returns
    ///
    /// `Err(LoadError::ImageOutOfBounds)` if the payload would run past `$FFFF`.
    pub fn load(&mut self, data: &[u8], addr: u16) -> Result<(), LoadError> {
        let start = addr as usize;
        let end = start + data.len();
        if end > MEMORY_SIZE {
            return Err(LoadError::ImageOutOfBounds {
                load: addr,
                len: data.len(),
                floor: 0,
                limit: MEMORY_SIZE as u32,
            });
        }
        self.bytes[start..end].copy_from_slice(data);
        Ok(())
    }

    /// Reads a NUL-terminated string starting at `addr`.
    ///
    /// Returns the bytes before the terminator, or `None` if no NUL appears within `limit`
    /// bytes.
    pub fn read_cstring(&self, addr: u16, limit: usize) -> Option<Vec<u8>> {
        let mut out = Vec::new();
        for i in 0..limit {
            let b = self.read_u8(addr.wrapping_add(i as u16));
            if b == 0 {
                return Some(out);
            }
            out.push(b);
        }
        None
    }

    /// Region boundaries recorded by the loader.
    pub fn layout(&self) -> &MemoryLayout {
        &self.layout
    }

    /// Records region boundaries.
    pub fn set_layout(&mut self, layout: MemoryLayout) {
        self.layout = layout;
    }

    /// Classifies `addr` according to the current layout.
    pub fn region_of(&self, addr: u16) -> Region {
        let l = &self.layout;
        let a = u32::from(addr);
        if addr < STACK_BASE {
            Region::ZeroPage
        } else if addr < PROGRAM_FLOOR {
            Region::Stack
        } else if addr >= l.args_top {
            Region::Hooks
        } else if addr >= l.args_start {
            Region::Arguments
        } else if a >= u32::from(l.program_start) && a < l.program_end {
            Region::Program
        } else {
            Region::Free
        }
    }
}

impl Default for MemoryImage {
    fn default() -> Self {
        Self::new(0)
    }
}

impl fmt::Debug for MemoryImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryImage")
            .field("size", &self.bytes.len())
            .field("layout", &self.layout)
            .finish_non_exhaustive()
    }
}

impl Bus for MemoryImage {
    #[inline]
    fn read(&mut self, addr: u16) -> u8 {
        self.read_u8(addr)
    }

    #[inline]
    fn write(&mut self, addr: u16, val: u8) {
        self.write_u8(addr, val);
    }
}
