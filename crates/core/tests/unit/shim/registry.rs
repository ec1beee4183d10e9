use bug65_core::common::error::LoadError;
use bug65_core::isa::abi;
use bug65_core::shim::{LibraryCall, ShimRegistry};
use bug65_core::soc::traits::TrapTable;

#[test]
fn paravirt_registry_covers_the_hook_page() {
    let registry = ShimRegistry::with_paravirt();
    assert_eq!(registry.len(), 6);
    for addr in abi::PV_OPEN..=abi::PV_EXIT {
        assert!(registry.is_trap(addr), "${addr:04X} must trap");
    }
    assert!(!registry.is_trap(abi::PV_OPEN - 1));
    assert_eq!(registry.lookup(abi::PV_EXIT), Some(LibraryCall::PvExit));
}

#[test]
fn symbols_map_to_routines() {
    assert_eq!(LibraryCall::from_symbol("_printf"), Some(LibraryCall::Printf));
    assert_eq!(LibraryCall::from_symbol("_getchar"), Some(LibraryCall::Getchar));
    assert_eq!(LibraryCall::from_symbol("printf"), None);
    assert_eq!(LibraryCall::from_symbol("_main"), None);
}

#[test]
fn reregistering_the_same_routine_is_harmless() {
    let mut registry = ShimRegistry::new();
    registry.register(0xE000, LibraryCall::Printf).unwrap();
    registry.register(0xE000, LibraryCall::Printf).unwrap();
    assert_eq!(registry.len(), 1);
}

#[test]
fn conflicting_registration_is_rejected() {
    let mut registry = ShimRegistry::new();
    registry.register(0xE000, LibraryCall::Printf).unwrap();
    let err = registry.register(0xE000, LibraryCall::Puts).unwrap_err();
    assert_eq!(
        err,
        LoadError::ShimConflict {
            addr: 0xE000,
            first: "printf",
            second: "puts",
        }
    );
    assert_eq!(registry.lookup(0xE000), Some(LibraryCall::Printf));
}

#[test]
fn iteration_is_in_address_order() {
    let mut registry = ShimRegistry::new();
    registry.register(0xE006, LibraryCall::Puts).unwrap();
    registry.register(0xE000, LibraryCall::Printf).unwrap();
    let addrs: Vec<u16> = registry.iter().map(|(a, _)| a).collect();
    assert_eq!(addrs, vec![0xE000, 0xE006]);
    assert!(!ShimRegistry::new().is_trap(0xE000));
}
