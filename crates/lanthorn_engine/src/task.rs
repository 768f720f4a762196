//! Tasks: independently suspendable script executions.

use std::fmt;

use lanthorn_foundation::{EntityId, SymbolId};
use lanthorn_storage::Value;

use crate::interp::Execution;

/// Identifies a task. Ids increase in creation order.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskId(pub(crate) u64);

impl TaskId {
    /// The raw id.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "task#{}", self.0)
    }
}

/// What a suspended task is waiting for.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WakeCondition {
    /// The clock reaching a tick.
    At(u64),
    /// A `signal` with this symbol aimed at the task's subject.
    Signal(SymbolId),
    /// The host answering a request via `World::resume_task`.
    External,
}

/// Task lifecycle.
///
/// ```text
/// Ready ──run──▶ Running ──await──▶ Suspended ──wake──▶ Ready
///                   │                   │
///                   ▼                   ▼
///               Completed           Cancelled
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TaskState {
    /// Runnable once the clock reaches its wake tick.
    Ready,
    /// Executing right now.
    Running,
    /// Parked at an `await`.
    Suspended(WakeCondition),
    /// Finished normally or by fault.
    Completed,
    /// Dropped because its subject was removed.
    Cancelled,
}

impl TaskState {
    /// True for `Completed` and `Cancelled`.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }
}

/// A schedulable execution context.
pub(crate) struct Task {
    pub(crate) id: TaskId,
    /// The entity the task acts for; removing it cancels the task.
    pub(crate) subject: Option<EntityId>,
    /// The entity whose action started the task, for fault reports.
    pub(crate) actor: Option<EntityId>,
    /// `<entity>.<event>` style description for logs.
    pub(crate) label: String,
    pub(crate) state: TaskState,
    /// Tick at which a `Ready` or `Suspended(At)` task becomes due.
    pub(crate) wake_at: u64,
    /// Value the pending `await` evaluates to on resumption.
    pub(crate) resume_value: Option<Value>,
    pub(crate) exec: Execution,
}

impl Task {
    /// True if the task should run at `tick`.
    pub(crate) fn is_due(&self, tick: u64) -> bool {
        match self.state {
            TaskState::Ready | TaskState::Suspended(WakeCondition::At(_)) => self.wake_at <= tick,
            _ => false,
        }
    }
}

impl fmt::Debug for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Task")
            .field("id", &self.id)
            .field("label", &self.label)
            .field("subject", &self.subject)
            .field("state", &self.state)
            .field("wake_at", &self.wake_at)
            .finish_non_exhaustive()
    }
}
