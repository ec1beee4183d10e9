//! Argument vector serialization.
//!
//! The block sits directly below `args_top` and is laid out as
//! `[argc: u16][argv[0]..argv[argc-1]: u16][NULL: u16][strings, each NUL-terminated]`,
//! with every pointer aimed into the same block.

use crate::common::error::LoadError;
use crate::soc::memory::MemoryImage;

/// Location of a serialized argument vector.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ArgVector {
    /// Number of arguments, program name included.
    pub argc: u16,
    /// Address of the stored `argc` word.
    pub count_addr: u16,
    /// Address of `argv[0]`.
    pub table_addr: u16,
    /// First byte of the block.
    pub block_start: u16,
    /// One past the last byte of the block.
    pub block_end: u16,
}

impl ArgVector {
    /// Bytes needed to serialize `args`.
    pub fn block_size(args: &[Vec<u8>]) -> usize {
        let header = 2 + 2 * (args.len() + 1);
        header + args.iter().map(|a| a.len() + 1).sum::<usize>()
    }

    /// Writes `args` into `mem` so the block ends at `top`.
    ///
    /// # Arguments
    ///
    /// * `mem` - Target memory.
    /// * `args` - Program name followed by the arguments.
    /// * `top` - Exclusive upper bound of the block.
    /// * `floor` - Lowest address the block may use (end of the loaded program).
    ///
    /// # Returns
    ///
    /// The block's location, `LoadError::InteriorNul` for an argument containing NUL, or
    /// `LoadError::ArgumentsTooLarge` when the block would reach below `floor`.
    pub fn serialize(
        mem: &mut MemoryImage,
        args: &[Vec<u8>],
        top: u16,
        floor: u32,
    ) -> Result<Self, LoadError> {
        if let Some(index) = args.iter().position(|a| a.contains(&0)) {
            return Err(LoadError::InteriorNul { index });
        }

        let needed = Self::block_size(args);
        let available = u32::from(top).saturating_sub(floor) as usize;
        if needed > available || args.len() > usize::from(u16::MAX) {
            return Err(LoadError::ArgumentsTooLarge {
                needed,
                available,
                top,
            });
        }

        let block_start = top - needed as u16;
        let table_addr = block_start + 2;
        let argc = args.len() as u16;
        mem.write_u16(block_start, argc);

        let mut string_addr = table_addr + 2 * (argc + 1);
        for (i, arg) in args.iter().enumerate() {
            mem.write_u16(table_addr + 2 * i as u16, string_addr);
            mem.write_bytes(string_addr, arg);
            mem.write_u8(string_addr + arg.len() as u16, 0);
            string_addr += arg.len() as u16 + 1;
        }
        mem.write_u16(table_addr + 2 * argc, 0);

        tracing::debug!(argc, block_start, top, "argument vector serialized");
        Ok(Self {
            argc,
            count_addr: block_start,
            table_addr,
            block_start,
            block_end: top,
        })
    }

    /// Reads the arguments back through the stored pointer table.
    ///
    /// Stops at the NULL terminator or after `argc` entries, whichever comes first.
    pub fn read_back(&self, mem: &MemoryImage) -> Vec<Vec<u8>> {
        let argc = mem.read_u16(self.count_addr);
        (0..argc)
            .map(|i| mem.read_u16(self.table_addr.wrapping_add(2 * i)))
            .take_while(|&ptr| ptr != 0)
            .map(|ptr| {
                let limit = usize::from(self.block_end.wrapping_sub(ptr));
                mem.read_cstring(ptr, limit).unwrap_or_default()
            })
            .collect()
    }
}
