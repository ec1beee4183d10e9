//! C library routines.
//!
//! Each routine reads its arguments per the cc65 convention, performs at most one console
//! call, and places its C return value in `A/X`. Output routines return `-1` when the
//! console write fails.

use super::cc65::VariadicFrame;
use super::format::{ArgSource, format};
use super::{ShimAction, ShimContext};
use crate::common::constants::MAX_CSTRING_LEN;
use crate::common::error::ShimMismatch;
use crate::isa::abi::{EOF, INT_SIZE};
use crate::soc::console::{InputByte, Stream};
use crate::soc::memory::MemoryImage;

/// Variadic arguments read straight from the caller's C stack frame.
struct FrameArgs<'a> {
    routine: &'static str,
    frame: &'a mut VariadicFrame,
    memory: &'a mut MemoryImage,
}

impl ArgSource for FrameArgs<'_> {
    fn next_int(&mut self) -> Result<u16, ShimMismatch> {
        self.frame.next_u16(self.memory)
    }

    fn next_long(&mut self) -> Result<u32, ShimMismatch> {
        self.frame.next_u32(self.memory)
    }

    fn string(&self, addr: u16, max: Option<usize>) -> Result<Vec<u8>, ShimMismatch> {
        read_string(self.routine, &*self.memory, addr, max)
    }

    fn store(&mut self, addr: u16, value: u32, bytes: u8) {
        let raw = value.to_le_bytes();
        self.memory.write_bytes(addr, &raw[..usize::from(bytes)]);
    }
}

/// Reads a C string for `routine`; with `max`, stops after that many bytes even without NUL.
pub fn read_string(
    routine: &'static str,
    memory: &MemoryImage,
    addr: u16,
    max: Option<usize>,
) -> Result<Vec<u8>, ShimMismatch> {
    if let Some(max) = max {
        let mut s = memory.read_bytes(addr, max.min(MAX_CSTRING_LEN));
        if let Some(nul) = s.iter().position(|&b| b == 0) {
            s.truncate(nul);
        }
        return Ok(s);
    }
    memory.read_cstring(addr, MAX_CSTRING_LEN).ok_or_else(|| {
        ShimMismatch::new(
            routine,
            format!("string at ${addr:04X} is not terminated within {MAX_CSTRING_LEN} bytes"),
        )
    })
}

/// `int printf(const char *fmt, ...)`
///
/// The format pointer sits at `sp + Y - 2`; arguments follow at decreasing addresses. The
/// whole frame is removed from the C stack.
pub fn printf(ctx: &mut ShimContext<'_>) -> Result<ShimAction, ShimMismatch> {
    const NAME: &str = "printf";
    let mut frame = VariadicFrame::open(NAME, ctx.memory, ctx.c_stack, ctx.regs.y, INT_SIZE)?;
    let fmt_ptr = frame.next_u16(ctx.memory)?;
    let fmt = read_string(NAME, ctx.memory, fmt_ptr, None)?;

    let text = {
        let mut args = FrameArgs {
            routine: NAME,
            frame: &mut frame,
            memory: &mut *ctx.memory,
        };
        format(NAME, &fmt, &mut args)?
    };
    frame.close(ctx.memory, ctx.c_stack);

    let result = match ctx.write(Stream::Stdout, &text) {
        Ok(n) => n as i16,
        Err(_) => EOF,
    };
    ctx.return_int(result);
    Ok(ShimAction::Return)
}

/// `int puts(const char *s)`: writes `s` and a newline in one call.
pub fn puts(ctx: &mut ShimContext<'_>) -> Result<ShimAction, ShimMismatch> {
    let mut line = read_string("puts", ctx.memory, ctx.regs.ax(), None)?;
    line.push(b'\n');
    let result = match ctx.write(Stream::Stdout, &line) {
        Ok(_) => 0,
        Err(_) => EOF,
    };
    ctx.return_int(result);
    Ok(ShimAction::Return)
}

/// `int putchar(int c)`: returns `c` as an unsigned char.
pub fn putchar(ctx: &mut ShimContext<'_>) -> Result<ShimAction, ShimMismatch> {
    let c = ctx.regs.a;
    let result = match ctx.write(Stream::Stdout, &[c]) {
        Ok(_) => i16::from(c),
        Err(_) => EOF,
    };
    ctx.return_int(result);
    Ok(ShimAction::Return)
}

/// `int getchar(void)`: the next scripted byte (`X = 0`), or `-1` (`A = X = $FF`) at end of
/// input. End of input is stable across calls.
pub fn getchar(ctx: &mut ShimContext<'_>) -> Result<ShimAction, ShimMismatch> {
    let input = ctx.console.consume(ctx.step);
    if let InputByte::Byte(_) = input {
        ctx.stats.bytes_read += 1;
    }
    ctx.return_int(input.as_c_int());
    Ok(ShimAction::Return)
}

/// `void exit(int status)`: halts with the low byte of the status.
pub fn exit(ctx: &ShimContext<'_>) -> ShimAction {
    ShimAction::Exit(i32::from(ctx.regs.a))
}
