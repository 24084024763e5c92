// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Power-failure injection at every durable write.

use super::fixtures::*;
use crate::error::KernelError;
use crate::types::id::TaskId;
use crate::verify;

/// Boots, losing power again during recovery with a growing budget, until
/// a boot completes. Returns the runtime with the fault disarmed.
fn boot_through_faults(mut rt: Rt, build: fn(Store, bool) -> Rt, mut budget: u64) -> (Rt, TaskId) {
    loop {
        rt.store_mut().fail_after(budget);
        match rt.boot() {
            Ok(task) => {
                rt.store_mut().reboot();
                return (rt, task);
            }
            Err(KernelError::PowerLoss) => {
                rt = power_cycle(rt, build);
                budget += 1;
            }
            Err(e) => panic!("Unexpected boot error {:?}", e),
        }
    }
}

#[test]
fn test_handoff_is_atomic_at_every_write() {
    for tracking in [true, false] {
        let (mut not_started, mut handed_off) = (0, 0);
        let mut k = 0u64;
        loop {
            let mut rt = handoff_runtime(garbage_store(21), tracking);
            rt.boot().unwrap();
            rt.store_mut().fail_after(k);
            match rt.step() {
                Ok(_) => break,
                Err(KernelError::PowerLoss) => {}
                Err(e) => panic!("Unexpected error {:?}", e),
            }

            let mut rt = power_cycle(rt, handoff_runtime);
            let task = rt.boot().unwrap();
            verify::check_invariants(rt.store(), rt.layout()).unwrap();
            match task {
                TaskId(0) => {
                    // A never happened: its write was rolled back.
                    assert_eq!(committed(&rt, COUNTER), 0, "k = {}", k);
                    not_started += 1;
                }
                TaskId(1) => {
                    // A completed and B is current.
                    assert_eq!(committed(&rt, COUNTER), 5, "k = {}", k);
                    assert_eq!(rt.manager().index(rt.store()), 1, "k = {}", k);
                    handed_off += 1;
                }
                other => panic!("Unexpected task {:?}", other),
            }

            // Whatever the outcome, the system keeps going.
            if task == TaskId(0) {
                assert_eq!(rt.step().unwrap(), TaskId(1));
            }
            assert_eq!(rt.step().unwrap(), TaskId(0));
            assert_eq!(committed(&rt, LOG), 5);
            k += 1;
        }
        assert!(not_started > 0, "Early interruptions must roll back");
        assert!(handed_off > 0, "Late interruptions must complete the handoff");
    }
}

#[test]
fn test_recovery_itself_can_be_interrupted() {
    for tracking in [true, false] {
        let mut k = 0u64;
        loop {
            let mut rt = handoff_runtime(garbage_store(31), tracking);
            rt.boot().unwrap();
            rt.store_mut().fail_after(k);
            if rt.step().is_ok() {
                break;
            }
            let rt = power_cycle(rt, handoff_runtime);
            let (rt, task) = boot_through_faults(rt, handoff_runtime, 0);
            verify::check_invariants(rt.store(), rt.layout()).unwrap();
            let expected = if task == TaskId(0) { 0 } else { 5 };
            assert_eq!(committed(&rt, COUNTER), expected, "k = {}", k);
            k += 1;
        }
    }
}

#[test]
fn test_counter_survives_periodic_power_failures() {
    for tracking in [true, false] {
        for period in 13..40u64 {
            let mut rt = counter_runtime(garbage_store(period), tracking);
            rt.boot().unwrap();
            let (mut successes, mut attempts) = (0u32, 0u32);

            while attempts < 8 {
                attempts += 1;
                rt.store_mut().fail_after(period);
                match rt.step() {
                    Ok(_) => {
                        rt.store_mut().reboot();
                        successes += 1;
                    }
                    Err(KernelError::PowerLoss) => {
                        let cycled = power_cycle(rt, counter_runtime);
                        rt = boot_through_faults(cycled, counter_runtime, period / 2).0;
                    }
                    Err(e) => panic!("Unexpected error {:?}", e),
                }

                verify::check_invariants(rt.store(), rt.layout()).unwrap();
                let counter = committed(&rt, COUNTER);
                assert_eq!(counter, committed(&rt, MIRROR), "Task must be atomic");
                assert!(counter >= successes, "Completed steps must persist");
                assert!(counter <= attempts, "A step must count at most once");
            }
            assert!(committed(&rt, COUNTER) > 0, "period = {}", period);
        }
    }
}
