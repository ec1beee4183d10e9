//! `printf` formatting against a scripted argument list.

use std::collections::HashMap;
use std::collections::VecDeque;

use bug65_core::common::error::ShimMismatch;
use bug65_core::shim::format::{ArgSource, format};
use pretty_assertions::assert_eq;

#[derive(Default)]
struct Args {
    values: VecDeque<u32>,
    strings: HashMap<u16, Vec<u8>>,
    stored: Vec<(u16, u32, u8)>,
}

impl Args {
    fn new(values: &[u32]) -> Self {
        Self {
            values: values.iter().copied().collect(),
            ..Self::default()
        }
    }

    fn with_string(mut self, addr: u16, text: &str) -> Self {
        let _ = self.strings.insert(addr, text.as_bytes().to_vec());
        self
    }
}

impl ArgSource for Args {
    fn next_int(&mut self) -> Result<u16, ShimMismatch> {
        self.values
            .pop_front()
            .map(|v| v as u16)
            .ok_or_else(|| ShimMismatch::new("test", "out of arguments"))
    }

    fn next_long(&mut self) -> Result<u32, ShimMismatch> {
        self.values
            .pop_front()
            .ok_or_else(|| ShimMismatch::new("test", "out of arguments"))
    }

    fn string(&self, addr: u16, max: Option<usize>) -> Result<Vec<u8>, ShimMismatch> {
        let text = self
            .strings
            .get(&addr)
            .cloned()
            .ok_or_else(|| ShimMismatch::new("test", "no string"))?;
        Ok(match max {
            Some(m) => text.into_iter().take(m).collect(),
            None => text,
        })
    }

    fn store(&mut self, addr: u16, value: u32, bytes: u8) {
        self.stored.push((addr, value, bytes));
    }
}

fn render(fmt: &str, args: &mut Args) -> String {
    let out = format("printf", fmt.as_bytes(), args).unwrap();
    String::from_utf8(out).unwrap()
}

fn fmt_ints(fmt: &str, values: &[u32]) -> String {
    render(fmt, &mut Args::new(values))
}

#[test]
fn plain_text_passes_through() {
    assert_eq!(fmt_ints("argc = 3\\n", &[]), "argc = 3\\n");
    assert_eq!(fmt_ints("100%%", &[]), "100%");
}

#[test]
fn signed_decimal_flags_and_width() {
    assert_eq!(fmt_ints("%d", &[(-5i16) as u16 as u32]), "-5");
    assert_eq!(fmt_ints("%5d", &[42]), "   42");
    assert_eq!(fmt_ints("%-5d|", &[42]), "42   |");
    assert_eq!(fmt_ints("%05d", &[(-42i16) as u16 as u32]), "-0042");
    assert_eq!(fmt_ints("%+d % d", &[7, 7]), "+7  7");
    assert_eq!(fmt_ints("%i", &[0x8000]), "-32768");
}

#[test]
fn precision_on_integers() {
    assert_eq!(fmt_ints("%.3d", &[5]), "005");
    assert_eq!(fmt_ints("[%.0d]", &[0]), "[]");
    assert_eq!(fmt_ints("%08.3d", &[5]), "     005");
}

#[test]
fn unsigned_radixes() {
    assert_eq!(fmt_ints("%u", &[0xFFFF]), "65535");
    assert_eq!(fmt_ints("%x %X", &[0xBEEF, 0xBEEF]), "beef BEEF");
    assert_eq!(fmt_ints("%02x", &[0x61]), "61");
    assert_eq!(fmt_ints("%o", &[8]), "10");
    assert_eq!(fmt_ints("%#x %#X %#o", &[255, 255, 8]), "0xff 0XFF 010");
    assert_eq!(fmt_ints("%#x", &[0]), "0");
}

#[test]
fn length_modifiers_select_width() {
    assert_eq!(fmt_ints("%hhd", &[0x01FF]), "-1");
    assert_eq!(fmt_ints("%hhu", &[0x01FF]), "255");
    assert_eq!(fmt_ints("%hd", &[0xFFFF]), "-1");
    assert_eq!(fmt_ints("%ld", &[0xFFFF_FFFF]), "-1");
    assert_eq!(fmt_ints("%lu", &[100_000]), "100000");
    assert_eq!(fmt_ints("%lx", &[0x1234_5678]), "12345678");
    assert_eq!(fmt_ints("%zu %td", &[3, 4]), "3 4");
}

#[test]
fn star_width_and_precision_come_from_arguments() {
    assert_eq!(fmt_ints("%*d|", &[4, 7]), "   7|");
    assert_eq!(fmt_ints("%*d|", &[(-4i16) as u16 as u32, 7]), "7   |");
    assert_eq!(fmt_ints("%.*d", &[3, 7]), "007");
}

#[test]
fn characters_and_pointers() {
    assert_eq!(fmt_ints("%c%c", &[u32::from(b'o'), u32::from(b'k')]), "ok");
    assert_eq!(fmt_ints("%3c", &[u32::from(b'x')]), "  x");
    assert_eq!(fmt_ints("%p", &[0x1234]), "0x1234");
}

#[test]
fn strings_with_precision_and_null() {
    let mut args = Args::new(&[0x3000, 0x3000, 0x3000, 0]).with_string(0x3000, "hello");
    assert_eq!(render("%s|%.3s|%8s|%s", &mut args), "hello|hel|   hello|(null)");
}

#[test]
fn percent_n_stores_count_so_far() {
    let mut args = Args::new(&[0x4000, 0x4002]);
    assert_eq!(render("abc%n%hhn", &mut args), "abc");
    assert_eq!(args.stored, vec![(0x4000, 3, 2), (0x4002, 3, 1)]);
}

#[test]
fn unknown_conversion_is_a_mismatch() {
    let err = format("printf", b"%q", &mut Args::new(&[])).unwrap_err();
    assert_eq!(err.routine, "printf");
    assert_eq!(err.reason, "unsupported conversion '%q'");
}

#[test]
fn dangling_percent_is_a_mismatch() {
    let err = format("printf", b"50%", &mut Args::new(&[])).unwrap_err();
    assert_eq!(err.reason, "format string ends inside a conversion");
}

#[test]
fn missing_argument_propagates() {
    let err = format("printf", b"%d %d", &mut Args::new(&[1])).unwrap_err();
    assert_eq!(err.reason, "out of arguments");
}
