//! Loader validation and initial machine state.

use std::io::Write;

use bug65_core::common::error::LoadError;
use bug65_core::config::Config;
use bug65_core::core::CpuState;
use bug65_core::core::arch::Status;
use bug65_core::isa::{CpuVariant, abi};
use bug65_core::shim::LibraryCall;
use bug65_core::sim::image::ProgramImage;
use bug65_core::sim::labels::SymbolTable;
use bug65_core::sim::loader::{self, load_binary};
use bug65_core::soc::memory::Region;
use pretty_assertions::assert_eq;
use tempfile::NamedTempFile;

fn image(load: u16, len: usize, entry: u16) -> ProgramImage {
    ProgramImage::raw(vec![0xEA; len], load, entry, CpuVariant::Nmos6502)
}

fn argv(list: &[&str]) -> Vec<Vec<u8>> {
    list.iter().map(|a| a.as_bytes().to_vec()).collect()
}

#[test]
fn initial_state_follows_the_image() {
    let args = argv(&["prog", "one"]);
    let program = loader::load(&image(0x0400, 16, 0x0408), &args, &Config::default()).unwrap();

    let regs = program.cpu.regs;
    assert_eq!(regs.pc, 0x0408);
    assert_eq!(regs.s, 0xFF);
    assert_eq!((regs.a, regs.x, regs.y), (0, 0, 0));
    assert!(regs.p.get(Status::INTERRUPT));
    assert!(!regs.p.get(Status::DECIMAL));
    assert_eq!(program.cpu.state, CpuState::Ready);
    assert_eq!(program.cpu.variant(), CpuVariant::Nmos6502);

    assert_eq!(program.memory.read_u16(0xFFFC), 0x0408);
    assert_eq!(program.memory.read_bytes(0x0400, 2), vec![0xEA, 0xEA]);
    assert_eq!(program.argv.argc, 2);
    assert_eq!(program.argv.block_end, 0xFFF0);
    assert_eq!(program.argv.read_back(&program.memory), argv(&["prog", "one"]));
    assert_eq!(program.c_stack.sp(&program.memory), program.argv.block_start);
}

#[test]
fn layout_is_recorded() {
    let program =
        loader::load(&image(0x0400, 16, 0x0400), &argv(&["p"]), &Config::default()).unwrap();
    let mem = &program.memory;
    assert_eq!(mem.region_of(0x0400), Region::Program);
    assert_eq!(mem.region_of(0x0410), Region::Free);
    assert_eq!(mem.region_of(program.argv.block_start), Region::Arguments);
    assert_eq!(mem.region_of(abi::PV_EXIT), Region::Hooks);
}

#[test]
fn paravirt_and_library_shims_are_registered() {
    let mut symbols = SymbolTable::new();
    symbols.insert("_printf", 0xE000);
    symbols.insert("_main", 0x0200);
    let img = image(0x0200, 4, 0x0200).with_symbols(symbols);
    let program = loader::load(&img, &[], &Config::default()).unwrap();

    assert_eq!(program.shims.len(), 7);
    assert_eq!(program.shims.lookup(0xE000), Some(LibraryCall::Printf));
    assert_eq!(program.shims.lookup(0x0200), None);
    assert_eq!(program.shims.lookup(abi::PV_ARGS), Some(LibraryCall::PvArgs));
}

#[test]
fn shim_families_follow_the_config() {
    let mut symbols = SymbolTable::new();
    symbols.insert("_puts", 0xE006);
    let img = image(0x0200, 4, 0x0200).with_symbols(symbols);

    let mut config = Config::default();
    config.shims.paravirt = false;
    let program = loader::load(&img, &[], &config).unwrap();
    assert_eq!(program.shims.len(), 1);

    config.shims.library = false;
    let program = loader::load(&img, &[], &config).unwrap();
    assert!(program.shims.is_empty());
}

#[test]
fn two_routines_at_one_address_conflict() {
    let mut symbols = SymbolTable::new();
    symbols.insert("_printf", 0xE000);
    symbols.insert("_puts", 0xE000);
    let err = loader::load(&image(0x0200, 4, 0x0200).with_symbols(symbols), &[], &Config::default())
        .unwrap_err();
    assert_eq!(
        err,
        LoadError::ShimConflict {
            addr: 0xE000,
            first: "printf",
            second: "puts",
        }
    );
}

#[test]
fn config_overrides_variant_and_fill() {
    let mut config = Config::default();
    config.cpu.variant = Some(CpuVariant::Cmos65C02);
    config.memory.fill = 0x5A;
    config.memory.stack_top = 0xFD;
    let program = loader::load(&image(0x0200, 4, 0x0200), &[], &config).unwrap();

    assert_eq!(program.cpu.variant(), CpuVariant::Cmos65C02);
    assert_eq!(program.memory.read_u8(0x8000), 0x5A);
    assert_eq!(program.cpu.regs.s, 0xFD);
}

#[test]
fn payload_below_the_floor_is_rejected() {
    let err = loader::load(&image(0x0100, 4, 0x0100), &[], &Config::default()).unwrap_err();
    assert_eq!(
        err,
        LoadError::ImageOutOfBounds {
            load: 0x0100,
            len: 4,
            floor: 0x0200,
            limit: 0xFFF0,
        }
    );
}

#[test]
fn payload_reaching_the_hook_page_is_rejected() {
    let err = loader::load(&image(0xFFE0, 0x11, 0xFFE0), &[], &Config::default()).unwrap_err();
    assert!(matches!(err, LoadError::ImageOutOfBounds { load: 0xFFE0, len: 0x11, .. }));
}

#[test]
fn entry_outside_the_payload_is_rejected() {
    let err = loader::load(&image(0x0200, 4, 0x0204), &[], &Config::default()).unwrap_err();
    assert_eq!(
        err,
        LoadError::EntryOutOfBounds {
            entry: 0x0204,
            start: 0x0200,
            end: 0x0204,
        }
    );
    let err = loader::load(&image(0x0200, 4, 0x01FF), &[], &Config::default()).unwrap_err();
    assert!(matches!(err, LoadError::EntryOutOfBounds { .. }));
}

#[test]
fn stack_pointer_must_fit_in_zero_page() {
    let img = image(0x0200, 4, 0x0200).with_sp_addr(0xFF);
    assert_eq!(
        loader::load(&img, &[], &Config::default()).unwrap_err(),
        LoadError::BadStackPointer(0xFF)
    );
}

#[test]
fn empty_payload_is_rejected() {
    let img = ProgramImage::raw(Vec::new(), 0x0200, 0x0200, CpuVariant::Nmos6502);
    assert_eq!(
        loader::load(&img, &[], &Config::default()).unwrap_err(),
        LoadError::EmptyPayload
    );
}

#[test]
fn arguments_must_fit_above_the_program() {
    let big = "x".repeat(64);
    let err = loader::load(&image(0x0200, 0xFDB0, 0x0200), &argv(&["p", &big]), &Config::default())
        .unwrap_err();
    assert!(matches!(err, LoadError::ArgumentsTooLarge { top: 0xFFF0, .. }), "{err}");
}

#[test]
fn argument_with_nul_is_rejected() {
    let list = vec![b"p".to_vec(), b"a\0".to_vec()];
    let err = loader::load(&image(0x0200, 4, 0x0200), &list, &Config::default()).unwrap_err();
    assert_eq!(err, LoadError::InteriorNul { index: 1 });
}

#[test]
fn load_binary_reads_files() {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(&[1, 2, 3]).unwrap();
    file.flush().unwrap();
    assert_eq!(load_binary(file.path()).unwrap(), vec![1, 2, 3]);

    let err = load_binary(std::path::Path::new("/nonexistent/image.bin")).unwrap_err();
    assert!(matches!(err, LoadError::Io { path, .. } if path.ends_with("image.bin")));
}
