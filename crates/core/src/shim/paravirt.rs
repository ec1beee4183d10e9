//! `sim65` paravirtualization hooks.
//!
//! The `sim65` runtime reaches its host through six fixed addresses at `$FFF4-$FFF9`.
//! Fixed-arity hooks take their last argument in `A/X` and pop the rest from the C stack.
//! Emulated programs never touch the host file system: `open` always fails, and only the
//! three standard descriptors exist.

use super::cc65::VariadicFrame;
use super::libc::read_string;
use super::{ShimAction, ShimContext};
use crate::common::error::ShimMismatch;
use crate::isa::abi::{EOF, INT_SIZE, STDERR, STDIN, STDOUT};
use crate::soc::console::{InputByte, Stream};

/// `int open(const char *name, int flags, ...)`: always `-1`.
///
/// The variadic frame is validated and removed from the C stack.
pub fn open(ctx: &mut ShimContext<'_>) -> Result<ShimAction, ShimMismatch> {
    const NAME: &str = "pv_open";
    let mut frame = VariadicFrame::open(NAME, ctx.memory, ctx.c_stack, ctx.regs.y, 2 * INT_SIZE)?;
    let name_ptr = frame.next_u16(ctx.memory)?;
    let flags = frame.next_u16(ctx.memory)?;
    let name = read_string(NAME, ctx.memory, name_ptr, None)?;
    frame.close(ctx.memory, ctx.c_stack);

    tracing::debug!(name = %name.escape_ascii(), flags, "open refused: no host files");
    ctx.return_int(EOF);
    Ok(ShimAction::Return)
}

/// `int close(int fd)`: `0` for the standard descriptors, `-1` otherwise.
pub fn close(ctx: &mut ShimContext<'_>) -> ShimAction {
    let fd = ctx.regs.ax();
    let result = if fd <= STDERR { 0 } else { EOF };
    ctx.return_int(result);
    ShimAction::Return
}

/// `int read(int fd, void *buf, unsigned count)`
///
/// Reads up to `count` scripted bytes from descriptor 0 and returns how many arrived; `0`
/// at end of input. Other descriptors return `-1`.
pub fn read(ctx: &mut ShimContext<'_>) -> ShimAction {
    let count = ctx.regs.ax();
    let buf = ctx.c_stack.pop_u16(ctx.memory);
    let fd = ctx.c_stack.pop_u16(ctx.memory);

    if fd != STDIN {
        ctx.return_int(EOF);
        return ShimAction::Return;
    }

    let mut n: u16 = 0;
    while n < count {
        match ctx.console.consume(ctx.step) {
            InputByte::Byte(b) => {
                ctx.memory.write_u8(buf.wrapping_add(n), b);
                n += 1;
            }
            InputByte::EndOfInput => break,
        }
    }
    ctx.stats.bytes_read += u64::from(n);
    ctx.return_int(n as i16);
    ShimAction::Return
}

/// `int write(int fd, const void *buf, unsigned count)`
///
/// Descriptors 1 and 2 go to the stdout and stderr streams as one console call. Returns
/// `count`, or `-1` for another descriptor or a failed write.
pub fn write(ctx: &mut ShimContext<'_>) -> ShimAction {
    let count = ctx.regs.ax();
    let buf = ctx.c_stack.pop_u16(ctx.memory);
    let fd = ctx.c_stack.pop_u16(ctx.memory);

    let stream = match fd {
        STDOUT => Stream::Stdout,
        STDERR => Stream::Stderr,
        _ => {
            ctx.return_int(EOF);
            return ShimAction::Return;
        }
    };
    let bytes = ctx.memory.read_bytes(buf, usize::from(count));
    let result = match ctx.write(stream, &bytes) {
        Ok(n) => n as i16,
        Err(_) => EOF,
    };
    ctx.return_int(result);
    ShimAction::Return
}

/// `int args(char ***argv)`
///
/// Stores the argument pointer table at the address in `A/X` and returns `argc`. If the C
/// stack pointer sits above the argument block it is moved below it, so the program's
/// stack never overwrites the arguments.
pub fn args(ctx: &mut ShimContext<'_>) -> ShimAction {
    let dest = ctx.regs.ax();
    ctx.memory.write_u16(dest, ctx.argv.table_addr);

    let sp = ctx.c_stack.sp(ctx.memory);
    if sp > ctx.argv.block_start {
        ctx.c_stack.set_sp(ctx.memory, ctx.argv.block_start);
    }
    ctx.return_int(ctx.argv.argc as i16);
    ShimAction::Return
}

/// `void exit(int status)`: halts with the low byte of `A`.
pub fn exit(ctx: &ShimContext<'_>) -> ShimAction {
    ShimAction::Exit(i32::from(ctx.regs.a))
}
