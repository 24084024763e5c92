// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
use crate::error::KernelError;
use crate::nvm::{DurableStore, RamStore};
use crate::region::{self, Region};
use crate::types::id::Addr;

fn store_with(words: &[u32]) -> RamStore<16> {
    let mut store = RamStore::<16>::new();
    for (i, &w) in words.iter().enumerate() {
        store.write_word(Addr(i as u32), w).unwrap();
    }
    store
}

#[test]
fn test_copy_diff_writes_only_differences() {
    let mut store = store_with(&[1, 2, 3, 4, 1, 0, 3, 0]);
    let before = store.writes();
    let src = Region::new(Addr(0), 4);
    let dst = Region::new(Addr(4), 4);

    let writes = region::copy_diff(&mut store, src, dst).unwrap();
    assert_eq!(writes, 2);
    assert_eq!(store.writes() - before, 2);
    assert!(region::equal(&store, src, dst));

    // Second pass is a no-op.
    assert_eq!(region::copy_diff(&mut store, src, dst).unwrap(), 0);
}

#[test]
fn test_copy_diff_rejects_mismatched_lengths() {
    let mut store = RamStore::<16>::new();
    let res = region::copy_diff(&mut store, Region::new(Addr(0), 4), Region::new(Addr(4), 3));
    assert_eq!(res, Err(KernelError::RegionMismatch));
}

#[test]
fn test_fill_and_first_difference() {
    let mut store = store_with(&[9, 9, 9, 9, 9, 9, 9, 9]);
    let a = Region::new(Addr(0), 4);
    let b = Region::new(Addr(4), 4);

    assert_eq!(region::fill(&mut store, a, 0).unwrap(), 4);
    assert_eq!(region::fill(&mut store, a, 0).unwrap(), 0);
    assert_eq!(region::first_difference(&store, a, b), Some(0));

    region::fill(&mut store, b, 0).unwrap();
    assert_eq!(region::first_difference(&store, a, b), None);
}

#[test]
fn test_slice_is_clipped() {
    let r = Region::new(Addr(8), 4);
    assert_eq!(r.slice(1, 2), Region::new(Addr(9), 2));
    assert_eq!(r.slice(3, 10), Region::new(Addr(11), 1));
    assert_eq!(r.slice(6, 1).words, 0);
    assert_eq!(r.offset_of(Addr(10)), Some(2));
    assert_eq!(r.offset_of(Addr(12)), None);
}
