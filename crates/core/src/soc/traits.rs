//! Traits at the CPU/system boundary.
//!
//! This module defines the two seams the instruction emulator sees. It provides:
//! 1. **Bus:** Byte and little-endian word access to the 64 KiB address space.
//! 2. **Trap table:** The set of addresses at which execution must stop and hand control to
//!    the shim layer.

/// Byte-addressable 16-bit address space.
///
/// Addresses wrap modulo 64 KiB. Implementors never fail: every address is backed.
pub trait Bus {
    /// Reads one byte.
    fn read(&mut self, addr: u16) -> u8;

    /// Writes one byte.
    fn write(&mut self, addr: u16, val: u8);

    /// Reads a little-endian word; the high byte comes from `addr + 1` with wrap-around.
    fn read_u16(&mut self, addr: u16) -> u16 {
        let lo = self.read(addr);
        let hi = self.read(addr.wrapping_add(1));
        u16::from_le_bytes([lo, hi])
    }

    /// Writes a little-endian word.
    fn write_u16(&mut self, addr: u16, val: u16) {
        let [lo, hi] = val.to_le_bytes();
        self.write(addr, lo);
        self.write(addr.wrapping_add(1), hi);
    }
}

/// Addresses that divert execution into the shim layer.
pub trait TrapTable {
    /// Returns true if fetching from `addr` must trap instead of executing.
    fn is_trap(&self, addr: u16) -> bool;
}

/// No traps; every address executes normally.
impl TrapTable for () {
    fn is_trap(&self, _addr: u16) -> bool {
        false
    }
}
