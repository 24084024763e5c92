// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Tasks and the view a running task gets of persistent state.

use core::fmt;

use crate::error::{KernelError, Result};
use crate::nvm::DurableStore;
use crate::state::dirty::DirtyTracker;
use crate::state::manager::StateManager;
use crate::types::id::{TaskId, Var};

/// Task body. Returns the task to hand off to.
///
/// A task may be re-executed from the start after a power failure, with its
/// partial writes rolled back, so its only side effects must be writes made
/// through the [`TaskCtx`].
pub type TaskEntry<S> = fn(&mut TaskCtx<'_, S>) -> Result<TaskId>;

pub struct Task<S> {
    pub id: TaskId,
    pub name: &'static str,
    pub entry: TaskEntry<S>,
}

impl<S> Clone for Task<S> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<S> Copy for Task<S> {}

impl<S> fmt::Debug for Task<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Task").field("id", &self.id).field("name", &self.name).finish()
    }
}

/// Volatile task registry, rebuilt by the application on every boot. Task
/// ids are registration slots, so registration order must be stable across
/// firmware boots.
pub struct TaskTable<S, const CAP: usize> {
    tasks: [Option<Task<S>>; CAP],
}

impl<S, const CAP: usize> TaskTable<S, CAP> {
    pub fn new() -> Self {
        Self {
            tasks: core::array::from_fn(|_| None),
        }
    }

    /// Registers a task in the first free slot.
    pub fn register(&mut self, name: &'static str, entry: TaskEntry<S>) -> Result<TaskId> {
        for (i, slot) in self.tasks.iter_mut().enumerate() {
            if slot.is_none() {
                let id = TaskId(i as u32);
                *slot = Some(Task { id, name, entry });
                return Ok(id);
            }
        }
        Err(KernelError::CapacityExceeded)
    }

    pub fn get(&self, id: TaskId) -> Result<&Task<S>> {
        self.tasks
            .get(id.0 as usize)
            .and_then(|slot| slot.as_ref())
            .ok_or(KernelError::UnknownTask(id))
    }

    pub fn contains(&self, id: TaskId) -> bool {
        self.get(id).is_ok()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Task<S>> {
        self.tasks.iter().filter_map(|slot| slot.as_ref())
    }

    pub fn len(&self) -> usize {
        self.iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<S, const CAP: usize> Default for TaskTable<S, CAP> {
    fn default() -> Self {
        Self::new()
    }
}

/// Access to the critical variables while a task runs. Reads and writes go
/// to the working buffer; the active buffer only changes at commit.
pub struct TaskCtx<'a, S> {
    pub(crate) store: &'a mut S,
    pub(crate) manager: &'a StateManager,
    pub(crate) dirty: &'a DirtyTracker,
    pub(crate) tracking: bool,
    pub(crate) task: TaskId,
}

impl<'a, S: DurableStore> TaskCtx<'a, S> {
    pub fn task(&self) -> TaskId {
        self.task
    }

    fn check(&self, var: Var, words: u32) -> Result<()> {
        let end = var.0.checked_add(words).ok_or(KernelError::VarOutOfRange(var.0))?;
        if end > self.manager.layout().crit_words() {
            return Err(KernelError::VarOutOfRange(var.0));
        }
        Ok(())
    }

    /// Current value in the working buffer.
    pub fn read(&self, var: Var) -> Result<u32> {
        self.check(var, 1)?;
        Ok(self.store.read_word(self.manager.working_region(&*self.store).addr(var.0)))
    }

    /// Last committed value.
    pub fn read_committed(&self, var: Var) -> Result<u32> {
        self.check(var, 1)?;
        Ok(self.store.read_word(self.manager.active_region(&*self.store).addr(var.0)))
    }

    pub fn write(&mut self, var: Var, value: u32) -> Result<()> {
        self.write_range(var, &[value])
    }

    /// Writes consecutive variables starting at `var`. The range is logged
    /// in the dirty list before the first word is mutated.
    pub fn write_range(&mut self, var: Var, values: &[u32]) -> Result<()> {
        let words = values.len() as u32;
        self.check(var, words)?;
        let active = self.manager.active_region(&*self.store).slice(var.0, words);
        let working = self.manager.working_region(&*self.store).slice(var.0, words);

        let unchanged = working
            .iter()
            .zip(values.iter())
            .all(|(addr, &v)| self.store.read_word(addr) == v);
        if unchanged {
            return Ok(());
        }

        if self.tracking {
            self.dirty.record(&mut *self.store, active.base, working.base, words)?;
        } else {
            self.dirty.invalidate(&mut *self.store)?;
        }
        for (addr, &v) in working.iter().zip(values.iter()) {
            self.store.write_if_changed(addr, v)?;
        }
        Ok(())
    }
}
