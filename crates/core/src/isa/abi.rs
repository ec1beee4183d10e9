//! cc65 Application Binary Interface (ABI) constants.
//!
//! Defines the `sim65` paravirtualization hook addresses, the library symbols the shim layer
//! recognizes, and the stream numbers and sentinel values of the C runtime.

/// `open(path, flags, ...)` paravirtualization hook.
pub const PV_OPEN: u16 = 0xFFF4;
/// `close(fd)` paravirtualization hook.
pub const PV_CLOSE: u16 = 0xFFF5;
/// `read(fd, buf, count)` paravirtualization hook.
pub const PV_READ: u16 = 0xFFF6;
/// `write(fd, buf, count)` paravirtualization hook.
pub const PV_WRITE: u16 = 0xFFF7;
/// `args(&argv)` paravirtualization hook; returns `argc`.
pub const PV_ARGS: u16 = 0xFFF8;
/// `exit(status)` paravirtualization hook.
pub const PV_EXIT: u16 = 0xFFF9;

/// Label of `printf` in an ld65 label file.
pub const SYM_PRINTF: &str = "_printf";
/// Label of `puts`.
pub const SYM_PUTS: &str = "_puts";
/// Label of `putchar`.
pub const SYM_PUTCHAR: &str = "_putchar";
/// Label of `getchar`.
pub const SYM_GETCHAR: &str = "_getchar";
/// Label of `exit`.
pub const SYM_EXIT: &str = "_exit";

/// Standard input file descriptor.
pub const STDIN: u16 = 0;
/// Standard output file descriptor.
pub const STDOUT: u16 = 1;
/// Standard error file descriptor.
pub const STDERR: u16 = 2;

/// End-of-file sentinel returned in `A/X` (`$FFFF`).
pub const EOF: i16 = -1;

/// Bytes occupied on the C stack by an `int` or pointer.
pub const INT_SIZE: u8 = 2;
/// Bytes occupied on the C stack by a `long`.
pub const LONG_SIZE: u8 = 4;
