//! Error, Fault and Mismatch definitions.
//!
//! This module defines the error taxonomy of the harness. It provides:
//! 1. **Load errors:** Malformed or out-of-range program images and argument vectors.
//! 2. **Faults:** Conditions that end an emulated run abnormally (illegal opcode, shim
//!    contract violation, exhausted step budget).
//! 3. **Mismatches:** The structured difference between an expected and an observed run.
//! 4. **Umbrella error:** A single `Error` type for callers that do not care which stage failed.

use serde::Deserialize;
use thiserror::Error;

/// Failure to turn a program image and argument list into an initialized machine.
///
/// Load errors are fatal to the test case that triggered them and are never retried.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum LoadError {
    /// The image is shorter than the fixed header.
    #[error("image is {len} bytes, shorter than the {expected}-byte sim65 header")]
    TruncatedHeader {
        /// Actual image length.
        len: usize,
        /// Required header length.
        expected: usize,
    },

    /// The image does not start with `"sim65"`.
    #[error("bad image magic {found:02x?}, expected \"sim65\"")]
    BadMagic {
        /// The first bytes of the image.
        found: Vec<u8>,
    },

    /// The header version is not one this loader understands.
    #[error("unsupported sim65 header version {0}")]
    UnsupportedVersion(u8),

    /// The header names a CPU type this emulator does not model.
    #[error("unsupported CPU type {0} in image header")]
    UnsupportedCpu(u8),

    /// The image carries a header but no code.
    #[error("image has no payload")]
    EmptyPayload,

    /// The C stack pointer location needs two zero-page bytes.
    #[error("C stack pointer at ${0:02X} does not fit in zero page")]
    BadStackPointer(u8),

    /// The payload does not fit between the program floor and the argument block.
    #[error(
        "payload of {len} bytes at ${load:04X} leaves the loadable range ${floor:04X}-${limit:04X}"
    )]
    ImageOutOfBounds {
        /// Requested load address.
        load: u16,
        /// Payload length in bytes.
        len: usize,
        /// Lowest loadable address.
        floor: u16,
        /// Exclusive upper bound of the loadable range.
        limit: u32,
    },

    /// The entry point is not inside the loaded payload.
    #[error("entry point ${entry:04X} lies outside the loaded range ${start:04X}..${end:05X}")]
    EntryOutOfBounds {
        /// Declared entry point.
        entry: u16,
        /// First loaded address.
        start: u16,
        /// One past the last loaded address.
        end: u32,
    },

    /// An argument contains a NUL byte and cannot be represented as a C string.
    #[error("argument {index} contains an interior NUL byte")]
    InteriorNul {
        /// Position of the offending argument in the list.
        index: usize,
    },

    /// The serialized argument vector does not fit above the program.
    #[error("argument vector needs {needed} bytes but only {available} are free below ${top:04X}")]
    ArgumentsTooLarge {
        /// Bytes needed for count, pointer table and strings.
        needed: usize,
        /// Bytes free between the end of the program and the block top.
        available: usize,
        /// Exclusive upper bound of the argument block.
        top: u16,
    },

    /// Two library routines were registered at the same entry address.
    #[error("shim address ${addr:04X} is claimed by both {first} and {second}")]
    ShimConflict {
        /// Contested address.
        addr: u16,
        /// Routine registered first.
        first: &'static str,
        /// Routine that tried to register second.
        second: &'static str,
    },

    /// A label file line could not be parsed.
    #[error("label file line {line}: {reason}")]
    BadLabel {
        /// One-based line number.
        line: usize,
        /// What was wrong with it.
        reason: String,
    },

    /// A file could not be read.
    #[error("could not read {path}: {reason}")]
    Io {
        /// Path that failed.
        path: String,
        /// Operating-system error text.
        reason: String,
    },
}

/// A library call whose arguments do not have the shape the emulated contract requires.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("{routine}: {reason}")]
pub struct ShimMismatch {
    /// Name of the emulated routine.
    pub routine: &'static str,
    /// Description of the violation.
    pub reason: String,
}

impl ShimMismatch {
    /// Creates a mismatch report for `routine`.
    pub fn new(routine: &'static str, reason: impl Into<String>) -> Self {
        Self {
            routine,
            reason: reason.into(),
        }
    }
}

/// Conditions that move the CPU into the `Faulted` state.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum Fault {
    /// The byte at the program counter is not a recognized opcode.
    #[error("illegal instruction ${opcode:02X} at ${addr:04X}")]
    IllegalInstruction {
        /// Address of the offending opcode.
        addr: u16,
        /// The opcode byte.
        opcode: u8,
    },

    /// A trapped library call violated its calling contract.
    #[error("shim mismatch at ${addr:04X}: {mismatch}")]
    ShimMismatch {
        /// Trap address of the routine.
        addr: u16,
        /// Details of the violation.
        mismatch: ShimMismatch,
    },

    /// The step budget ran out before the program halted.
    #[error("step budget of {steps} steps exhausted")]
    Timeout {
        /// Steps executed when the budget was hit.
        steps: u64,
    },
}

impl Fault {
    /// Returns the kind of this fault, without its payload.
    pub fn kind(&self) -> FaultKind {
        match self {
            Self::IllegalInstruction { .. } => FaultKind::IllegalInstruction,
            Self::ShimMismatch { .. } => FaultKind::ShimMismatch,
            Self::Timeout { .. } => FaultKind::Timeout,
        }
    }
}

/// Payload-free fault classification, used by test cases that expect a fault.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Deserialize)]
pub enum FaultKind {
    /// See [`Fault::IllegalInstruction`].
    IllegalInstruction,
    /// See [`Fault::ShimMismatch`].
    ShimMismatch,
    /// See [`Fault::Timeout`].
    Timeout,
}

/// First point at which an observed run diverges from its expectation.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum Mismatch {
    /// The output transcripts differ; `None` means the transcript ended first.
    #[error(
        "output differs at byte {offset}: expected {}, got {}",
        describe_byte(.expected),
        describe_byte(.actual)
    )]
    Output {
        /// Offset of the first differing byte.
        offset: usize,
        /// Expected byte at that offset.
        expected: Option<u8>,
        /// Observed byte at that offset.
        actual: Option<u8>,
    },

    /// The program exited with a different status.
    #[error("exit status {actual}, expected {expected}")]
    ExitStatus {
        /// Expected status.
        expected: i32,
        /// Observed status.
        actual: i32,
    },

    /// The stderr transcripts differ; `None` means the transcript ended first.
    #[error(
        "stderr differs at byte {offset}: expected {}, got {}",
        describe_byte(.expected),
        describe_byte(.actual)
    )]
    Stderr {
        /// Offset of the first differing byte.
        offset: usize,
        /// Expected byte at that offset.
        expected: Option<u8>,
        /// Observed byte at that offset.
        actual: Option<u8>,
    },

    /// A fault was expected but the program exited normally.
    #[error("expected a {expected:?} fault, but the program exited with status {exit_status}")]
    MissingFault {
        /// The fault the test case expected.
        expected: FaultKind,
        /// Status the program actually exited with.
        exit_status: i32,
    },
}

/// Renders an optional transcript byte for mismatch reports.
fn describe_byte(byte: &Option<u8>) -> String {
    match byte {
        Some(b) if b.is_ascii_graphic() || *b == b' ' => format!("{:#04x} ({:?})", b, *b as char),
        Some(b) => format!("{b:#04x}"),
        None => "end of output".to_string(),
    }
}

/// Umbrella error covering every stage of a harness run.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum Error {
    /// The loader rejected the image or arguments.
    #[error("load error: {0}")]
    Load(#[from] LoadError),

    /// The run hit an undecodable opcode.
    #[error("illegal instruction ${opcode:02X} at ${addr:04X}")]
    IllegalInstruction {
        /// Address of the offending opcode.
        addr: u16,
        /// The opcode byte.
        opcode: u8,
    },

    /// A library call violated its emulated contract.
    #[error("shim mismatch: {0}")]
    ShimMismatch(ShimMismatch),

    /// The step budget ran out.
    #[error("timeout after {steps} steps")]
    Timeout {
        /// Steps executed.
        steps: u64,
    },

    /// Observed behavior differs from the expectation.
    #[error("assertion mismatch: {0}")]
    AssertionMismatch(#[from] Mismatch),

    /// A test manifest or configuration file is malformed.
    #[error("manifest error: {0}")]
    Manifest(String),

    /// A suite worker thread ended without reporting this case.
    #[error("worker thread stopped before running this case")]
    WorkerStopped,
}

impl From<Fault> for Error {
    fn from(fault: Fault) -> Self {
        match fault {
            Fault::IllegalInstruction { addr, opcode } => Self::IllegalInstruction { addr, opcode },
            Fault::ShimMismatch { mismatch, .. } => Self::ShimMismatch(mismatch),
            Fault::Timeout { steps } => Self::Timeout { steps },
        }
    }
}
