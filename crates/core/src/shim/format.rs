//! `printf`-family formatting.
//!
//! Renders a C format string against arguments drawn from an [`ArgSource`], following the
//! cc65 data model: `int`, `short`, `size_t`, `ptrdiff_t` and pointers are 16 bits;
//! `long` and `intmax_t` are 32 bits.
//!
//! Supported: flags `- + space # 0`, width and precision (literal or `*`), length modifiers
//! `hh h l j z t`, conversions `d i u o x X c s p n %`.

use crate::common::error::ShimMismatch;

/// Supplies the variadic arguments and memory access a format needs.
pub trait ArgSource {
    /// Takes the next `int`-sized argument.
    fn next_int(&mut self) -> Result<u16, ShimMismatch>;

    /// Takes the next `long`-sized argument.
    fn next_long(&mut self) -> Result<u32, ShimMismatch>;

    /// Reads the string at `addr`; stops at NUL or after `max` bytes when given.
    fn string(&self, addr: u16, max: Option<usize>) -> Result<Vec<u8>, ShimMismatch>;

    /// Stores `value` as a `bytes`-wide little-endian integer at `addr` (`%n`).
    fn store(&mut self, addr: u16, value: u32, bytes: u8);
}

/// Argument width selected by a length modifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Length {
    Char,
    Int,
    Long,
}

impl Length {
    fn bytes(self) -> u8 {
        match self {
            Self::Char => 1,
            Self::Int => 2,
            Self::Long => 4,
        }
    }
}

/// One parsed conversion specification.
#[derive(Clone, Copy, Debug, Default)]
struct Spec {
    left: bool,
    plus: bool,
    space: bool,
    alt: bool,
    zero: bool,
    width: usize,
    precision: Option<usize>,
}

/// Formats `fmt` with arguments from `args`.
///
/// # Arguments
///
/// * `routine` - Name of the calling shim, for mismatch reports.
/// * `fmt` - The format string, without its terminating NUL.
/// * `args` - Argument source.
///
/// # Returns
///
/// The rendered bytes, or `ShimMismatch` for an unknown conversion, a truncated
/// specification, or a conversion the supplied arguments cannot satisfy.
pub fn format(
    routine: &'static str,
    fmt: &[u8],
    args: &mut dyn ArgSource,
) -> Result<Vec<u8>, ShimMismatch> {
    let mut out = Vec::with_capacity(fmt.len());
    let mut i = 0;
    let truncated = || ShimMismatch::new(routine, "format string ends inside a conversion");

    while i < fmt.len() {
        let c = fmt[i];
        i += 1;
        if c != b'%' {
            out.push(c);
            continue;
        }

        let mut spec = Spec::default();
        while let Some(&f) = fmt.get(i) {
            match f {
                b'-' => spec.left = true,
                b'+' => spec.plus = true,
                b' ' => spec.space = true,
                b'#' => spec.alt = true,
                b'0' => spec.zero = true,
                _ => break,
            }
            i += 1;
        }

        if fmt.get(i) == Some(&b'*') {
            i += 1;
            let w = args.next_int()? as i16;
            if w < 0 {
                spec.left = true;
            }
            spec.width = usize::from(w.unsigned_abs());
        } else {
            spec.width = parse_number(fmt, &mut i);
        }

        if fmt.get(i) == Some(&b'.') {
            i += 1;
            if fmt.get(i) == Some(&b'*') {
                i += 1;
                let p = args.next_int()? as i16;
                spec.precision = usize::try_from(p).ok();
            } else {
                spec.precision = Some(parse_number(fmt, &mut i));
            }
        }

        let mut length = Length::Int;
        match fmt.get(i) {
            Some(b'h') if fmt.get(i + 1) == Some(&b'h') => {
                length = Length::Char;
                i += 2;
            }
            Some(b'h' | b'z' | b't') => i += 1,
            Some(b'l' | b'j') => {
                length = Length::Long;
                i += 1;
            }
            _ => {}
        }

        let conv = *fmt.get(i).ok_or_else(truncated)?;
        i += 1;

        match conv {
            b'%' => out.push(b'%'),
            b'd' | b'i' => {
                let value = match length {
                    Length::Char => i64::from(args.next_int()? as u8 as i8),
                    Length::Int => i64::from(args.next_int()? as i16),
                    Length::Long => i64::from(args.next_long()? as i32),
                };
                let digits = radix_digits(value.unsigned_abs(), 10, false);
                let sign: &[u8] = if value < 0 {
                    b"-"
                } else if spec.plus {
                    b"+"
                } else if spec.space {
                    b" "
                } else {
                    b""
                };
                push_integer(&mut out, &spec, sign, digits, value == 0);
            }
            b'u' | b'o' | b'x' | b'X' => {
                let value = match length {
                    Length::Char => u64::from(args.next_int()? as u8),
                    Length::Int => u64::from(args.next_int()?),
                    Length::Long => u64::from(args.next_long()?),
                };
                let (radix, upper) = match conv {
                    b'o' => (8, false),
                    b'x' => (16, false),
                    b'X' => (16, true),
                    _ => (10, false),
                };
                let mut digits = radix_digits(value, radix, upper);
                let mut prefix: &[u8] = b"";
                if spec.alt {
                    match conv {
                        b'o' if value != 0 => {
                            let shown = integer_body(&spec, &digits, false);
                            if shown.first() != Some(&b'0') {
                                digits.insert(0, b'0');
                            }
                        }
                        b'x' if value != 0 => prefix = b"0x",
                        b'X' if value != 0 => prefix = b"0X",
                        _ => {}
                    }
                }
                let zero_value = value == 0 && !(spec.alt && conv == b'o');
                push_integer(&mut out, &spec, prefix, digits, zero_value);
            }
            b'c' => {
                let ch = args.next_int()? as u8;
                pad(&mut out, &spec, &[ch]);
            }
            b's' => {
                let ptr = args.next_int()?;
                let text = if ptr == 0 {
                    b"(null)".to_vec()
                } else {
                    args.string(ptr, spec.precision)?
                };
                let shown = match spec.precision {
                    Some(p) if p < text.len() => &text[..p],
                    _ => &text[..],
                };
                pad(&mut out, &spec, shown);
            }
            b'p' => {
                let ptr = args.next_int()?;
                let text = format!("0x{ptr:04x}");
                pad(&mut out, &spec, text.as_bytes());
            }
            b'n' => {
                let ptr = args.next_int()?;
                args.store(ptr, out.len() as u32, length.bytes());
            }
            other => {
                return Err(ShimMismatch::new(
                    routine,
                    format!("unsupported conversion '%{}'", other.escape_ascii()),
                ));
            }
        }
    }
    Ok(out)
}

/// Parses a decimal field at `fmt[*i..]`, advancing `i`; no digits yields 0.
fn parse_number(fmt: &[u8], i: &mut usize) -> usize {
    let mut n = 0usize;
    while let Some(d) = fmt.get(*i).filter(|b| b.is_ascii_digit()) {
        n = n.saturating_mul(10).saturating_add(usize::from(d - b'0'));
        *i += 1;
    }
    n
}

/// Digits of `value` in `radix`, most significant first.
fn radix_digits(mut value: u64, radix: u64, upper: bool) -> Vec<u8> {
    let table: &[u8; 16] = if upper {
        b"0123456789ABCDEF"
    } else {
        b"0123456789abcdef"
    };
    let mut digits = Vec::new();
    loop {
        digits.push(table[(value % radix) as usize]);
        value /= radix;
        if value == 0 {
            break;
        }
    }
    digits.reverse();
    digits
}

/// Applies precision to integer digits: zero-extends to the precision, and an explicit
/// precision of zero prints nothing for a zero value.
fn integer_body(spec: &Spec, digits: &[u8], zero_value: bool) -> Vec<u8> {
    match spec.precision {
        Some(0) if zero_value => Vec::new(),
        Some(p) if p > digits.len() => {
            let mut body = vec![b'0'; p - digits.len()];
            body.extend_from_slice(digits);
            body
        }
        _ => digits.to_vec(),
    }
}

/// Emits a signed or prefixed integer with width, zero padding and justification.
fn push_integer(out: &mut Vec<u8>, spec: &Spec, prefix: &[u8], digits: Vec<u8>, zero_value: bool) {
    let body = integer_body(spec, &digits, zero_value);
    let len = prefix.len() + body.len();
    let fill = spec.width.saturating_sub(len);

    if spec.left {
        out.extend_from_slice(prefix);
        out.extend_from_slice(&body);
        out.extend(std::iter::repeat_n(b' ', fill));
    } else if spec.zero && spec.precision.is_none() {
        out.extend_from_slice(prefix);
        out.extend(std::iter::repeat_n(b'0', fill));
        out.extend_from_slice(&body);
    } else {
        out.extend(std::iter::repeat_n(b' ', fill));
        out.extend_from_slice(prefix);
        out.extend_from_slice(&body);
    }
}

/// Emits `text` padded with spaces to the field width.
fn pad(out: &mut Vec<u8>, spec: &Spec, text: &[u8]) {
    let fill = spec.width.saturating_sub(text.len());
    if spec.left {
        out.extend_from_slice(text);
        out.extend(std::iter::repeat_n(b' ', fill));
    } else {
        out.extend(std::iter::repeat_n(b' ', fill));
        out.extend_from_slice(text);
    }
}
