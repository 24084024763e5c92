// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Transition engine.
//!
//! Moves execution from one task to the next so that, whatever word the
//! power dies after, the next boot sees either "the task never ran" or
//! "the task completed and its successor is current".
//!
//! Every boot runs [`Runtime::boot`]: cold-start initialization, then the
//! prologue, which finishes an interrupted buffer swap, finishes an
//! interrupted handoff, or rolls back an interrupted task.

use crate::config::RuntimeConfig;
use crate::context::{ContextSlot, Contexts};
use crate::error::Result;
use crate::layout::Layout;
use crate::nvm::DurableStore;
use crate::state::dirty::DirtyTracker;
use crate::state::manager::StateManager;
use crate::state::phase::Phase;
use crate::task::{TaskCtx, TaskTable};
use crate::types::id::TaskId;
use crate::verify::{self, StateReport};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BootKind {
    /// Signature was missing; NVM was formatted.
    Cold,
    /// Signature matched; persisted state was kept.
    Warm,
}

pub struct Runtime<S, const TASKS: usize> {
    store: S,
    config: RuntimeConfig,
    layout: Layout,
    manager: StateManager,
    dirty: DirtyTracker,
    contexts: Contexts,
    tasks: TaskTable<S, TASKS>,
}

impl<S: DurableStore, const TASKS: usize> Runtime<S, TASKS> {
    pub fn new(store: S, config: RuntimeConfig, tasks: TaskTable<S, TASKS>) -> Result<Self> {
        let layout = Layout::from_config(&config)?;
        layout.check_fits(store.capacity_words())?;
        tasks.get(config.entry_task)?;
        Ok(Self {
            store,
            config,
            layout,
            manager: StateManager::new(layout),
            dirty: DirtyTracker::new(layout),
            contexts: Contexts::new(layout),
            tasks,
        })
    }

    // --- Accessors ---

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    pub fn manager(&self) -> &StateManager {
        &self.manager
    }

    pub fn dirty(&self) -> &DirtyTracker {
        &self.dirty
    }

    pub fn contexts(&self) -> &Contexts {
        &self.contexts
    }

    pub fn tasks(&self) -> &TaskTable<S, TASKS> {
        &self.tasks
    }

    /// Task bound to the current context.
    pub fn current_task(&self) -> TaskId {
        let slot = self.contexts.current(&self.store);
        self.contexts.read(&self.store, slot).task
    }

    pub fn report(&self) -> StateReport {
        verify::report(&self.store, &self.layout)
    }

    // --- Boot ---

    /// Signature-gated cold-start initialization.
    pub fn initialize(&mut self) -> Result<BootKind> {
        let contexts = self.contexts;
        let dirty = self.dirty;
        let entry = self.config.entry_task;
        let cold = self.manager.initialize(&mut self.store, |store| {
            contexts.format(store, entry)?;
            dirty.clear(store)
        })?;
        Ok(if cold { BootKind::Cold } else { BootKind::Warm })
    }

    /// Runs on every power-up. Returns the task to execute.
    pub fn boot(&mut self) -> Result<TaskId> {
        let kind = self.initialize()?;
        tracing::debug!(?kind, "boot");
        self.prologue()
    }

    /// Brings persisted state to a point where a task may run, and returns
    /// that task.
    ///
    /// 1. Finish any pending buffer swap.
    /// 2. If the current context is `Ready`, roll the working buffer back to
    ///    the active one; the task starts (again) from scratch.
    /// 3. If it is `Commit1`/`Commit2`, a handoff was cut short: drive it to
    ///    completion and start over, which commits the swap it requested.
    #[tracing::instrument(level = "debug", skip(self))]
    pub fn prologue(&mut self) -> Result<TaskId> {
        loop {
            self.manager.commit(&mut self.store)?;

            let slot = self.contexts.current(&self.store);
            let ctx = self.contexts.read(&self.store, slot);
            match ctx.state {
                Phase::Ready => {
                    self.resynchronize()?;
                    if ctx.need_commit {
                        self.contexts.set_need_commit(&mut self.store, slot, false)?;
                    }
                    self.tasks.get(ctx.task)?;
                    return Ok(ctx.task);
                }
                Phase::Commit1 | Phase::Commit2 => {
                    let next = self.contexts.current_task(&self.store);
                    tracing::debug!(state = ctx.state.as_str(), next = next.0, "resuming handoff");
                    self.transition_to(next)?;
                }
            }
        }
    }

    /// Makes the working buffer equal to the active one and empties the
    /// dirty list. After a swap this is what brings the new working buffer
    /// up to date, so the list is only cleared once the copy is done.
    fn resynchronize(&mut self) -> Result<usize> {
        let writes = if self.config.dirty_tracking {
            self.manager.rollback_tracked(&mut self.store, &self.dirty)?
        } else {
            self.manager.rollback(&mut self.store)?
        };
        self.dirty.clear(&mut self.store)?;
        Ok(writes)
    }

    /// Hands off from the current task to `next`.
    ///
    /// The current context is driven `Ready -> Commit1 -> Commit2`, each
    /// step a single durable write of its state word, and the loop re-reads
    /// that word after every step. `Commit1` requests the buffer swap, but
    /// only while the state manager still flags a commit as needed: a
    /// handoff re-driven after the prologue already swapped must not ask for
    /// a second swap. `Commit2` prepares the other context and repoints
    /// `curctx` last; that write is the point of no return.
    ///
    /// The swap itself happens in the next [`prologue`](Self::prologue).
    #[tracing::instrument(level = "debug", skip(self))]
    pub fn transition_to(&mut self, next: TaskId) -> Result<()> {
        self.tasks.get(next)?;
        self.contexts.set_current_task(&mut self.store, next)?;
        let slot = self.contexts.current(&self.store);

        loop {
            match self.contexts.read(&self.store, slot).state {
                Phase::Ready => {
                    self.manager.need_commit_buffer(&mut self.store, true)?;
                    self.contexts.update_task_state(&mut self.store, slot, Phase::Commit1)?;
                }
                Phase::Commit1 => {
                    if self.manager.need_commit(&self.store) {
                        self.manager.begin_commit(&mut self.store)?;
                    }
                    self.contexts.update_task_state(&mut self.store, slot, Phase::Commit2)?;
                }
                Phase::Commit2 => {
                    self.contexts.update_task_state(&mut self.store, slot, Phase::Commit2)?;
                    self.switch_context(slot.other(), next)?;
                    return Ok(());
                }
            }
        }
    }

    fn switch_context(&mut self, target: ContextSlot, next: TaskId) -> Result<()> {
        self.contexts.set_need_commit(&mut self.store, target, true)?;
        self.contexts.bind_task(&mut self.store, target, next)?;
        self.contexts.update_task_state(&mut self.store, target, Phase::Ready)?;
        self.contexts.set_current(&mut self.store, target)?;
        tracing::debug!(slot = target.to_word(), task = next.0, "context switched");
        Ok(())
    }

    // --- Execution ---

    /// Runs the current task once and hands off to its successor, leaving
    /// persisted state settled (swap committed, buffers identical).
    ///
    /// A power failure surfaces as `Err(KernelError::PowerLoss)`; the caller
    /// restores power and calls [`boot`](Self::boot) again.
    pub fn step(&mut self) -> Result<TaskId> {
        let current = self.prologue()?;
        let task = *self.tasks.get(current)?;

        let mut ctx = TaskCtx {
            store: &mut self.store,
            manager: &self.manager,
            dirty: &self.dirty,
            tracking: self.config.dirty_tracking,
            task: current,
        };
        let next = (task.entry)(&mut ctx)?;

        tracing::debug!(from = task.name, to = next.0, "task finished");
        self.transition_to(next)?;
        self.prologue()
    }

    /// Runs `steps` handoffs. Returns the task that runs next.
    pub fn run(&mut self, steps: usize) -> Result<TaskId> {
        let mut current = self.prologue()?;
        for _ in 0..steps {
            current = self.step()?;
        }
        Ok(current)
    }
}
