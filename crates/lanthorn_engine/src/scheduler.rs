//! The task table and world clock.
//!
//! The scheduler only stores tasks and decides which are due; running them
//! is the world's job, because a running task needs the whole world.

use std::collections::BTreeMap;

use lanthorn_foundation::{EntityId, SymbolId};
use lanthorn_storage::Value;
use tracing::debug;

use crate::interp::Execution;
use crate::task::{Task, TaskId, TaskState, WakeCondition};

/// Live tasks plus the logical clock.
#[derive(Debug, Default)]
pub(crate) struct Scheduler {
    tick: u64,
    next_id: u64,
    tasks: BTreeMap<TaskId, Task>,
}

impl Scheduler {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn tick(&self) -> u64 {
        self.tick
    }

    /// Advances the clock by one tick and returns the new tick.
    pub(crate) fn advance(&mut self) -> u64 {
        self.tick += 1;
        self.tick
    }

    /// Adds a task in `state`, due at `wake_at`.
    pub(crate) fn insert(
        &mut self,
        exec: Execution,
        subject: Option<EntityId>,
        actor: Option<EntityId>,
        label: String,
        state: TaskState,
        wake_at: u64,
    ) -> TaskId {
        self.next_id += 1;
        let id = TaskId(self.next_id);
        debug!(task = %id, %label, ?state, wake_at, "task created");
        self.tasks.insert(
            id,
            Task {
                id,
                subject,
                actor,
                label,
                state,
                wake_at,
                resume_value: None,
                exec,
            },
        );
        id
    }

    /// Removes a task so it can run without borrowing the scheduler.
    pub(crate) fn take(&mut self, id: TaskId) -> Option<Task> {
        self.tasks.remove(&id)
    }

    /// Puts back a task taken with [`Scheduler::take`].
    pub(crate) fn restore(&mut self, task: Task) {
        self.tasks.insert(task.id, task);
    }

    /// Tasks due at `tick`, earliest wake time first, ties by creation order.
    pub(crate) fn due(&self, tick: u64) -> Vec<TaskId> {
        let mut due: Vec<(u64, TaskId)> = self
            .tasks
            .values()
            .filter(|t| t.is_due(tick))
            .map(|t| (t.wake_at, t.id))
            .collect();
        due.sort_unstable();
        due.into_iter().map(|(_, id)| id).collect()
    }

    /// Drops every task whose subject is in `removed`.
    pub(crate) fn cancel_subjects(&mut self, removed: &[EntityId]) -> Vec<TaskId> {
        let cancelled: Vec<TaskId> = self
            .tasks
            .values()
            .filter(|t| t.subject.is_some_and(|s| removed.contains(&s)))
            .map(|t| t.id)
            .collect();
        for id in &cancelled {
            if let Some(task) = self.tasks.remove(id) {
                debug!(task = %id, label = %task.label, "task cancelled");
            }
        }
        cancelled
    }

    /// Wakes tasks of `subject` waiting for `signal`; they run next tick and
    /// their `await` yields `value`. Returns how many woke.
    pub(crate) fn signal(&mut self, subject: EntityId, signal: SymbolId, value: &Value) -> usize {
        let next = self.tick + 1;
        let mut woken = 0;
        for task in self.tasks.values_mut() {
            let waiting = task.subject == Some(subject)
                && task.state == TaskState::Suspended(WakeCondition::Signal(signal));
            if waiting {
                task.state = TaskState::Ready;
                task.wake_at = next;
                task.resume_value = Some(value.clone());
                woken += 1;
            }
        }
        woken
    }

    /// Answers an external request. Returns false if the task is gone or
    /// was not waiting on the host.
    pub(crate) fn resume_external(&mut self, id: TaskId, value: Value) -> bool {
        let next = self.tick + 1;
        match self.tasks.get_mut(&id) {
            Some(task) if task.state == TaskState::Suspended(WakeCondition::External) => {
                task.state = TaskState::Ready;
                task.wake_at = next;
                task.resume_value = Some(value);
                true
            }
            _ => false,
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.tasks.len()
    }

    pub(crate) fn state(&self, id: TaskId) -> Option<&TaskState> {
        self.tasks.get(&id).map(|t| &t.state)
    }

    pub(crate) fn label(&self, id: TaskId) -> Option<&str> {
        self.tasks.get(&id).map(|t| t.label.as_str())
    }

    pub(crate) fn for_subject(&self, subject: EntityId) -> Vec<TaskId> {
        self.tasks
            .values()
            .filter(|t| t.subject == Some(subject))
            .map(|t| t.id)
            .collect()
    }

    pub(crate) fn ids(&self) -> Vec<TaskId> {
        self.tasks.keys().copied().collect()
    }
}
