//! Program images.
//!
//! A `sim65` image is a 12-byte little-endian header followed by the payload:
//!
//! | offset | size | field                              |
//! |--------|------|------------------------------------|
//! | 0      | 5    | magic `"sim65"`                    |
//! | 5      | 1    | version (`2`)                      |
//! | 6      | 1    | CPU type (`0` 6502, `1` 65C02)     |
//! | 7      | 1    | zero-page address of the C stack pointer |
//! | 8      | 2    | load address                       |
//! | 10     | 2    | entry address                      |
//!
//! Raw images carry no header; load and entry addresses are supplied by the caller.

use std::path::Path;

use crate::common::constants::{SIM65_HEADER_LEN, SIM65_MAGIC, SIM65_VERSION};
use crate::common::error::LoadError;
use crate::isa::CpuVariant;
use crate::sim::labels::SymbolTable;

/// C stack pointer location used by the cc65 `sim6502` target.
pub const DEFAULT_SP_ADDR: u8 = 0x00;

/// Decoded image header.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ImageHeader {
    /// Processor the image was compiled for.
    pub variant: CpuVariant,
    /// Zero-page address of the C stack pointer.
    pub sp_addr: u8,
    /// Address of the first payload byte.
    pub load: u16,
    /// Address execution starts at.
    pub entry: u16,
}

impl ImageHeader {
    /// Decodes and validates a `sim65` header.
    ///
    /// # Returns
    ///
    /// The header, or the `LoadError` for the first field that fails validation.
    pub fn parse(bytes: &[u8]) -> Result<Self, LoadError> {
        if bytes.len() < SIM65_HEADER_LEN {
            if !bytes.is_empty() && !SIM65_MAGIC.starts_with(&bytes[..bytes.len().min(5)]) {
                return Err(LoadError::BadMagic {
                    found: bytes[..bytes.len().min(5)].to_vec(),
                });
            }
            return Err(LoadError::TruncatedHeader {
                len: bytes.len(),
                expected: SIM65_HEADER_LEN,
            });
        }
        if &bytes[..5] != SIM65_MAGIC {
            return Err(LoadError::BadMagic {
                found: bytes[..5].to_vec(),
            });
        }
        if bytes[5] != SIM65_VERSION {
            return Err(LoadError::UnsupportedVersion(bytes[5]));
        }
        let variant = CpuVariant::from_header(bytes[6]).ok_or(LoadError::UnsupportedCpu(bytes[6]))?;
        Ok(Self {
            variant,
            sp_addr: bytes[7],
            load: u16::from_le_bytes([bytes[8], bytes[9]]),
            entry: u16::from_le_bytes([bytes[10], bytes[11]]),
        })
    }

    /// Encodes the header.
    pub fn to_bytes(&self) -> [u8; SIM65_HEADER_LEN] {
        let mut out = [0u8; SIM65_HEADER_LEN];
        out[..5].copy_from_slice(SIM65_MAGIC);
        out[5] = SIM65_VERSION;
        out[6] = self.variant.header_byte();
        out[7] = self.sp_addr;
        out[8..10].copy_from_slice(&self.load.to_le_bytes());
        out[10..12].copy_from_slice(&self.entry.to_le_bytes());
        out
    }
}

/// A program ready to be loaded.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProgramImage {
    /// Placement and entry information.
    pub header: ImageHeader,
    /// Code and static data.
    pub payload: Vec<u8>,
    /// Symbols from the linker's label file, if any.
    pub symbols: SymbolTable,
}

impl ProgramImage {
    /// Parses a complete `sim65` image.
    pub fn parse(bytes: &[u8]) -> Result<Self, LoadError> {
        let header = ImageHeader::parse(bytes)?;
        let payload = bytes[SIM65_HEADER_LEN..].to_vec();
        if payload.is_empty() {
            return Err(LoadError::EmptyPayload);
        }
        Ok(Self {
            header,
            payload,
            symbols: SymbolTable::new(),
        })
    }

    /// Wraps headerless bytes with an explicit load and entry address.
    pub fn raw(payload: Vec<u8>, load: u16, entry: u16, variant: CpuVariant) -> Self {
        Self {
            header: ImageHeader {
                variant,
                sp_addr: DEFAULT_SP_ADDR,
                load,
                entry,
            },
            payload,
            symbols: SymbolTable::new(),
        }
    }

    /// Reads and parses a `sim65` image file.
    pub fn from_path(path: &Path) -> Result<Self, LoadError> {
        let bytes = std::fs::read(path).map_err(|e| LoadError::Io {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        Self::parse(&bytes)
    }

    /// Attaches a symbol table.
    pub fn with_symbols(mut self, symbols: SymbolTable) -> Self {
        self.symbols = symbols;
        self
    }

    /// Overrides the C stack pointer location.
    pub fn with_sp_addr(mut self, sp_addr: u8) -> Self {
        self.header.sp_addr = sp_addr;
        self
    }

    /// Encodes the image in `sim65` format.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = self.header.to_bytes().to_vec();
        out.extend_from_slice(&self.payload);
        out
    }

    /// One past the last payload address, which may be `$10000`.
    pub fn end(&self) -> u32 {
        u32::from(self.header.load) + self.payload.len() as u32
    }
}
