// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
use super::fixtures::*;
use crate::config::RuntimeConfig;
use crate::context::ContextSlot;
use crate::engine::{BootKind, Runtime};
use crate::error::{KernelError, KernelResult};
use crate::nvm::{DurableStore, PowerFault, RamStore};
use crate::state::phase::Phase;
use crate::task::{TaskCtx, TaskTable};
use crate::types::id::{TaskId, Var};
use crate::verify;

#[test]
fn test_cold_boot() {
    let mut rt = handoff_runtime(garbage_store(1), true);
    assert_eq!(rt.initialize().unwrap(), BootKind::Cold);
    assert_eq!(rt.boot().unwrap(), TaskId(0));

    let report = rt.report();
    assert!(report.initialized);
    assert_eq!(report.index, 0);
    assert_eq!(report.commit_state, Phase::Ready);
    assert_eq!(report.curctx, ContextSlot::Zero);
    assert_eq!(report.curtsk, TaskId(0));
    assert_eq!(report.contexts[0].state, Phase::Ready);
    for var in 0..8 {
        assert_eq!(committed(&rt, Var(var)), 0);
        assert_eq!(working(&rt, Var(var)), 0);
    }

    // Warm boot afterwards.
    assert_eq!(rt.initialize().unwrap(), BootKind::Warm);
}

#[test]
fn test_normal_handoff() {
    let mut rt = handoff_runtime(garbage_store(2), true);
    rt.boot().unwrap();

    let next = rt.step().unwrap();
    assert_eq!(next, TaskId(1));
    assert_eq!(rt.contexts().current_task(rt.store()), TaskId(1));
    assert_eq!(rt.current_task(), TaskId(1));
    assert_eq!(rt.manager().index(rt.store()), 1);
    assert_eq!(committed(&rt, COUNTER), 5);
    assert_eq!(working(&rt, COUNTER), 5);
    verify::check_invariants(rt.store(), rt.layout()).unwrap();

    // B publishes the committed value and hands back to A.
    assert_eq!(rt.step().unwrap(), TaskId(0));
    assert_eq!(committed(&rt, LOG), 5);
    assert_eq!(rt.manager().index(rt.store()), 0);
    assert_eq!(rt.contexts().current(rt.store()), ContextSlot::Zero);
}

#[test]
fn test_power_loss_mid_mutation_rolls_back() {
    let mut tasks: TaskTable<Store, 4> = TaskTable::new();
    tasks.register("set_five_then_die", set_five_then_die).unwrap();
    let mut rt = Runtime::new(garbage_store(3), config(true), tasks).unwrap();
    rt.boot().unwrap();

    assert_eq!(rt.step(), Err(KernelError::PowerLoss));
    assert_eq!(working(&rt, COUNTER), 5);
    assert_eq!(committed(&rt, COUNTER), 0);

    // Reboot: prologue finds READY and rolls back.
    assert_eq!(rt.boot().unwrap(), TaskId(0));
    assert_eq!(working(&rt, COUNTER), 0);
    assert_eq!(committed(&rt, COUNTER), 0);
    assert_eq!(rt.report().contexts[0].state, Phase::Ready);
    assert!(rt.dirty().is_empty(rt.store()));
}

#[test]
fn test_self_transition_counts_once_per_step() {
    for tracking in [true, false] {
        let mut rt = counter_runtime(garbage_store(4), tracking);
        rt.boot().unwrap();
        rt.run(10).unwrap();
        assert_eq!(committed(&rt, COUNTER), 10);
        assert_eq!(committed(&rt, MIRROR), 10);
        verify::check_invariants(rt.store(), rt.layout()).unwrap();
    }
}

#[test]
fn test_untracked_writes_invalidate_dirty_list() {
    fn write_then_die(ctx: &mut TaskCtx<'_, Store>) -> KernelResult<TaskId> {
        ctx.write(Var(3), 1)?;
        Err(KernelError::PowerLoss)
    }
    let mut tasks: TaskTable<Store, 4> = TaskTable::new();
    tasks.register("write_then_die", write_then_die).unwrap();
    let mut rt = Runtime::new(garbage_store(5), config(false), tasks).unwrap();
    rt.boot().unwrap();

    assert_eq!(rt.step(), Err(KernelError::PowerLoss));
    assert!(rt.dirty().is_overflowed(rt.store()));
    assert!(rt.dirty().is_empty(rt.store()));
}

#[test]
fn test_unknown_successor_is_rejected() {
    fn bad(_: &mut TaskCtx<'_, Store>) -> KernelResult<TaskId> {
        Ok(TaskId(3))
    }
    let mut tasks: TaskTable<Store, 4> = TaskTable::new();
    tasks.register("bad", bad).unwrap();
    let mut rt = Runtime::new(garbage_store(6), config(true), tasks).unwrap();
    rt.boot().unwrap();

    assert_eq!(rt.step(), Err(KernelError::UnknownTask(TaskId(3))));
    // Nothing was handed off.
    assert_eq!(rt.report().contexts[0].state, Phase::Ready);
}

#[test]
fn test_out_of_range_variable() {
    fn wild(ctx: &mut TaskCtx<'_, Store>) -> KernelResult<TaskId> {
        ctx.write(Var(8), 1)?;
        Ok(ctx.task())
    }
    let mut tasks: TaskTable<Store, 4> = TaskTable::new();
    tasks.register("wild", wild).unwrap();
    let mut rt = Runtime::new(garbage_store(7), config(true), tasks).unwrap();
    rt.boot().unwrap();
    assert_eq!(rt.step(), Err(KernelError::VarOutOfRange(8)));
}

#[test]
fn test_runtime_construction_checks() {
    let mut tasks: TaskTable<PowerFault<RamStore<32>>, 2> = TaskTable::new();
    let small = PowerFault::new(RamStore::<32>::new());
    match Runtime::new(small, RuntimeConfig::default(), TaskTable::<_, 2>::new()) {
        Err(KernelError::StoreTooSmall { .. }) => (),
        _ => panic!("Expected StoreTooSmall"),
    }

    fn noop(ctx: &mut TaskCtx<'_, PowerFault<RamStore<32>>>) -> KernelResult<TaskId> {
        Ok(ctx.task())
    }
    tasks.register("noop", noop).unwrap();
    tasks.register("noop2", noop).unwrap();
    assert_eq!(tasks.register("noop3", noop).unwrap_err(), KernelError::CapacityExceeded);

    let cfg = RuntimeConfig { crit_words: 2, dirty_capacity: 0, dirty_tracking: false, entry_task: TaskId(5) };
    let store = PowerFault::new(RamStore::<32>::new());
    match Runtime::new(store, cfg, tasks) {
        Err(KernelError::UnknownTask(TaskId(5))) => (),
        _ => panic!("Expected UnknownTask"),
    }
}

#[test]
fn test_layout_change_forces_cold_start() {
    let mut rt = counter_runtime(garbage_store(8), true);
    rt.boot().unwrap();
    rt.run(3).unwrap();

    let store = rt.into_store();
    let mut tasks: TaskTable<Store, 4> = TaskTable::new();
    tasks.register("increment", increment).unwrap();
    let cfg = RuntimeConfig { crit_words: 12, ..config(true) };
    let mut rt = Runtime::new(store, cfg, tasks).unwrap();
    assert_eq!(rt.initialize().unwrap(), BootKind::Cold);
    rt.prologue().unwrap();
    assert_eq!(committed(&rt, COUNTER), 0);
}

#[test]
fn test_context_need_commit_cleared_on_entry() {
    let mut rt = handoff_runtime(garbage_store(9), true);
    rt.boot().unwrap();
    rt.step().unwrap();
    let report = rt.report();
    assert_eq!(report.curctx, ContextSlot::One);
    assert!(!report.contexts[1].need_commit);
    assert_eq!(report.contexts[0].state, Phase::Commit2);
    assert!(!report.need_commit);
    assert_eq!(rt.store().read_word(rt.layout().buffer(0).addr(0)), 5);
}
