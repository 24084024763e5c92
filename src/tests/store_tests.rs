// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
use core::ptr::NonNull;

use crate::error::KernelError;
use crate::nvm::{program_aligned, DurableStore, MmioStore, PowerFault, RamStore};
use crate::types::id::Addr;

#[test]
fn test_power_fault_cuts_after_budget() {
    let mut store = PowerFault::new(RamStore::<16>::new());
    store.fail_after(2);

    store.write_word(Addr(0), 1).unwrap();
    store.write_word(Addr(1), 2).unwrap();
    assert_eq!(store.write_word(Addr(2), 3), Err(KernelError::PowerLoss));
    assert!(!store.is_powered());

    // Dead until rebooted, and the failed write never landed.
    assert_eq!(store.write_word(Addr(3), 4), Err(KernelError::PowerLoss));
    assert_eq!(store.read_word(Addr(2)), 0xFFFF_FFFF);
    assert_eq!(store.inner().writes(), 2);

    store.reboot();
    store.write_word(Addr(2), 3).unwrap();
    assert_eq!(store.read_word(Addr(2)), 3);
    assert_eq!(store.attempts(), 5);
}

#[test]
fn test_write_if_changed_skips_equal_words() {
    let mut store = RamStore::<4>::new();
    assert!(store.write_if_changed(Addr(0), 7).unwrap());
    assert!(!store.write_if_changed(Addr(0), 7).unwrap());
    assert_eq!(store.writes(), 1);
}

#[test]
fn test_program_aligned_checks_alignment_and_bounds() {
    let mut store = RamStore::<16>::new();

    let res = program_aligned(&mut store, Addr(2), &[1, 2]);
    assert_eq!(res, Err(KernelError::Misaligned(2)));

    program_aligned(&mut store, Addr(4), &[1, 2, 3]).unwrap();
    assert_eq!(&store.as_words()[4..7], &[1, 2, 3]);

    match program_aligned(&mut store, Addr(12), &[0; 8]) {
        Err(KernelError::StoreTooSmall { required: 20, available: 16 }) => (),
        other => panic!("Expected StoreTooSmall, got {:?}", other),
    }
}

#[test]
fn test_torn_bulk_program() {
    let mut store = PowerFault::new(RamStore::<8>::new());
    store.fail_after(2);
    let res = program_aligned(&mut store, Addr(0), &[1, 2, 3, 4]);
    assert_eq!(res, Err(KernelError::PowerLoss));
    assert_eq!(&store.inner().as_words()[0..4], &[1, 2, 0xFFFF_FFFF, 0xFFFF_FFFF]);
}

#[test]
fn test_garbage_is_deterministic() {
    let a = RamStore::<32>::with_garbage(42);
    let b = RamStore::<32>::with_garbage(42);
    let c = RamStore::<32>::with_garbage(43);
    assert_eq!(a.as_words(), b.as_words());
    assert_ne!(a.as_words(), c.as_words());
}

#[test]
fn test_adjacent_seeds_differ() {
    for seed in 0..16u64 {
        let even = RamStore::<16>::with_garbage(seed * 2);
        let odd = RamStore::<16>::with_garbage(seed * 2 + 1);
        assert_ne!(even.as_words(), odd.as_words(), "seed {}", seed * 2);
    }
}

#[test]
fn test_mmio_write_out_of_range() {
    let mut backing = [0u32; 4];
    let base = NonNull::new(backing.as_mut_ptr()).unwrap();
    // SAFETY: `backing` outlives the store and is only accessed through it.
    let mut store = unsafe { MmioStore::new(base, backing.len()) };

    assert_eq!(
        store.write_word(Addr(4), 1),
        Err(KernelError::StoreTooSmall { required: 5, available: 4 })
    );
    drop(store);
    assert_eq!(backing, [0; 4]);
}

#[test]
fn test_mmio_store_round_trip() {
    let mut backing = [0u32; 8];
    let base = NonNull::new(backing.as_mut_ptr()).unwrap();
    // SAFETY: `backing` outlives the store and is only accessed through it.
    let mut store = unsafe { MmioStore::new(base, backing.len()) };

    store.write_word(Addr(3), 0xDEAD_BEEF).unwrap();
    assert_eq!(store.read_word(Addr(3)), 0xDEAD_BEEF);
    assert_eq!(store.capacity_words(), 8);
    drop(store);
    assert_eq!(backing[3], 0xDEAD_BEEF);
}
