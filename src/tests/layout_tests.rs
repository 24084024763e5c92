// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
use crate::config::{RuntimeConfig, BULK_ALIGN_WORDS};
use crate::error::KernelError;
use crate::layout::Layout;
use crate::types::id::{Addr, TaskId};

#[test]
fn test_buffers_are_aligned() {
    let layout = Layout::new(9, 4).unwrap();
    assert_eq!(layout.buffer(0).base, Addr(32));
    assert_eq!(layout.buffer(1).base, Addr(44));
    assert_eq!(layout.words_required(), 53);
    for which in 0..2 {
        assert_eq!(layout.buffer(which).base.0 % BULK_ALIGN_WORDS, 0);
    }
}

#[test]
fn test_huge_crit_words_is_rejected() {
    assert_eq!(Layout::new(u32::MAX, 1), Err(KernelError::CapacityExceeded));
    assert_eq!(Layout::new(u32::MAX / 2, 1), Err(KernelError::CapacityExceeded));
}

#[test]
fn test_huge_dirty_capacity_is_rejected() {
    // Entries end just below u32::MAX; aligning the first buffer overflows.
    assert_eq!(Layout::new(1, 1_431_655_758), Err(KernelError::CapacityExceeded));
    assert_eq!(Layout::new(1, u32::MAX), Err(KernelError::CapacityExceeded));

    let config = RuntimeConfig {
        crit_words: 16,
        dirty_capacity: 1_431_655_758,
        dirty_tracking: true,
        entry_task: TaskId(0),
    };
    assert_eq!(Layout::from_config(&config), Err(KernelError::CapacityExceeded));
}

#[test]
fn test_zero_crit_words_is_invalid() {
    assert_eq!(Layout::new(0, 4), Err(KernelError::InvalidOperation));
}
