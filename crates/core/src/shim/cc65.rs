//! cc65 calling convention.
//!
//! cc65 keeps a 16-bit software stack pointer in zero page; the stack grows downward and
//! each argument is pushed as a little-endian word (`long` as four bytes). The last fixed
//! argument travels in `A/X` instead. Variadic callers push every argument, including the
//! fixed ones, and pass the total byte count in `Y`; the callee removes them.

use crate::common::error::ShimMismatch;
use crate::soc::memory::MemoryImage;

/// The C stack, addressed through its zero-page pointer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CStack {
    sp_addr: u8,
}

impl CStack {
    /// Creates a handle for the pointer stored at `sp_addr`/`sp_addr + 1`.
    pub fn new(sp_addr: u8) -> Self {
        Self { sp_addr }
    }

    /// Zero-page address of the pointer.
    pub fn sp_addr(&self) -> u8 {
        self.sp_addr
    }

    /// Current stack pointer.
    pub fn sp(&self, mem: &MemoryImage) -> u16 {
        mem.read_u16(u16::from(self.sp_addr))
    }

    /// Replaces the stack pointer.
    pub fn set_sp(&self, mem: &mut MemoryImage, sp: u16) {
        mem.write_u16(u16::from(self.sp_addr), sp);
    }

    /// Pops one word.
    pub fn pop_u16(&self, mem: &mut MemoryImage) -> u16 {
        let sp = self.sp(mem);
        let val = mem.read_u16(sp);
        self.set_sp(mem, sp.wrapping_add(2));
        val
    }

    /// Pushes one word.
    pub fn push_u16(&self, mem: &mut MemoryImage, val: u16) {
        let sp = self.sp(mem).wrapping_sub(2);
        mem.write_u16(sp, val);
        self.set_sp(mem, sp);
    }

    /// Discards `count` bytes.
    pub fn drop_bytes(&self, mem: &mut MemoryImage, count: u16) {
        let sp = self.sp(mem);
        self.set_sp(mem, sp.wrapping_add(count));
    }
}

/// Argument bytes pushed by a variadic caller.
///
/// Arguments are read from the highest address (the first parameter) downward. Reading
/// more bytes than the caller supplied is a calling-convention mismatch.
#[derive(Debug)]
pub struct VariadicFrame {
    routine: &'static str,
    sp: u16,
    size: u8,
    cursor: u8,
}

impl VariadicFrame {
    /// Opens the frame of a variadic call.
    ///
    /// # Arguments
    ///
    /// * `routine` - Name of the emulated routine, for mismatch reports.
    /// * `mem` - Memory holding the C stack.
    /// * `stack` - The C stack.
    /// * `y` - Argument byte count passed by the caller.
    /// * `fixed` - Bytes the routine's fixed parameters occupy.
    ///
    /// # Returns
    ///
    /// The frame, or `ShimMismatch` if `y` is odd or smaller than `fixed`.
    pub fn open(
        routine: &'static str,
        mem: &MemoryImage,
        stack: CStack,
        y: u8,
        fixed: u8,
    ) -> Result<Self, ShimMismatch> {
        if y % 2 != 0 {
            return Err(ShimMismatch::new(
                routine,
                format!("odd argument byte count {y} in Y"),
            ));
        }
        if y < fixed {
            return Err(ShimMismatch::new(
                routine,
                format!("Y = {y} is smaller than the {fixed} bytes of fixed arguments"),
            ));
        }
        Ok(Self {
            routine,
            sp: stack.sp(mem),
            size: y,
            cursor: y,
        })
    }

    /// Takes the next word-sized argument.
    pub fn next_u16(&mut self, mem: &MemoryImage) -> Result<u16, ShimMismatch> {
        let addr = self.take(2)?;
        Ok(mem.read_u16(addr))
    }

    /// Takes the next `long` argument.
    pub fn next_u32(&mut self, mem: &MemoryImage) -> Result<u32, ShimMismatch> {
        let addr = self.take(4)?;
        let lo = mem.read_u16(addr);
        let hi = mem.read_u16(addr.wrapping_add(2));
        Ok(u32::from(lo) | (u32::from(hi) << 16))
    }

    /// Argument bytes not yet consumed.
    pub fn remaining(&self) -> u8 {
        self.cursor
    }

    /// Removes the whole frame from the C stack, whatever was consumed.
    pub fn close(self, mem: &mut MemoryImage, stack: CStack) {
        stack.set_sp(mem, self.sp.wrapping_add(u16::from(self.size)));
    }

    fn take(&mut self, bytes: u8) -> Result<u16, ShimMismatch> {
        if self.cursor < bytes {
            return Err(ShimMismatch::new(
                self.routine,
                format!(
                    "conversion needs {bytes} more argument bytes but only {} of {} remain",
                    self.cursor, self.size
                ),
            ));
        }
        self.cursor -= bytes;
        Ok(self.sp.wrapping_add(u16::from(self.cursor)))
    }
}
