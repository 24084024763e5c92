//! The counter demonstration run by `ember run`.
//!
//! `count` bumps COUNTER and MIRROR in the same task, then hands off to
//! `audit`, which checks the two still agree and bumps CHECKS. Because both
//! writes commit together, any disagreement means a torn commit.

use ember_kernel::layout::Layout;
use ember_kernel::{
    KernelError, KernelResult, PowerFault, Runtime, RuntimeConfig, TaskCtx, TaskId, TaskTable,
    Var,
};
use ember_persistence::MappedStore;

pub type Store = PowerFault<MappedStore>;
pub type DemoRuntime = Runtime<Store, 2>;

pub const COUNTER: Var = Var(0);
pub const MIRROR: Var = Var(1);
pub const CHECKS: Var = Var(2);

pub const COUNT: TaskId = TaskId(0);
pub const AUDIT: TaskId = TaskId(1);

pub fn config() -> RuntimeConfig {
    RuntimeConfig::default()
}

/// Words an NVM file needs for the demo layout.
pub fn nvm_words() -> anyhow::Result<usize> {
    Ok(Layout::from_config(&config())?.words_required())
}

fn count(ctx: &mut TaskCtx<'_, Store>) -> KernelResult<TaskId> {
    let counter = ctx.read(COUNTER)?;
    ctx.write(COUNTER, counter.wrapping_add(1))?;
    let mirror = ctx.read(MIRROR)?;
    ctx.write(MIRROR, mirror.wrapping_add(1))?;
    Ok(AUDIT)
}

fn audit(ctx: &mut TaskCtx<'_, Store>) -> KernelResult<TaskId> {
    if ctx.read(COUNTER)? != ctx.read(MIRROR)? {
        return Err(KernelError::Inconsistent("counter and mirror diverged"));
    }
    let checks = ctx.read(CHECKS)?;
    ctx.write(CHECKS, checks.wrapping_add(1))?;
    Ok(COUNT)
}

pub fn runtime(store: Store) -> anyhow::Result<DemoRuntime> {
    let mut tasks: TaskTable<Store, 2> = TaskTable::new();
    tasks.register("count", count)?;
    tasks.register("audit", audit)?;
    Ok(Runtime::new(store, config(), tasks)?)
}

/// Committed value of `var`.
pub fn committed(rt: &DemoRuntime, var: Var) -> u32 {
    let active = rt.manager().active_region(rt.store());
    ember_kernel::DurableStore::read_word(rt.store(), active.addr(var.0))
}

/// Committed handoffs so far. Every handoff bumps exactly one of COUNTER
/// and CHECKS.
pub fn handoffs(rt: &DemoRuntime) -> u32 {
    committed(rt, COUNTER).wrapping_add(committed(rt, CHECKS))
}
