//! Tree-walking evaluator.
//!
//! Expressions are evaluated recursively. Statements run on an explicit
//! frame stack ([`Execution`]) so that a handler can stop at an `await`,
//! be stored as data, and continue later from the same point. `await` only
//! appears at statement level, which keeps expression evaluation free of
//! suspension.

mod exec;
mod expr;

use lanthorn_foundation::{EntityId, Error, ErrorKind, Result};
use lanthorn_storage::Scope;

use crate::world::World;

pub use exec::Execution;
pub(crate) use exec::{Outcome, Suspension};

/// Evaluation context: the innermost scope and the `self` entity.
#[derive(Clone, Debug)]
pub(crate) struct Ctx {
    pub(crate) scope: Scope,
    pub(crate) this: Option<EntityId>,
}

impl Ctx {
    pub(crate) fn new(scope: Scope, this: Option<EntityId>) -> Self {
        Self { scope, this }
    }
}

impl World {
    /// Charges one evaluator step against the current run's budget.
    pub(crate) fn step(&mut self) -> Result<()> {
        self.charge(1)
    }

    /// Charges `n` steps.
    pub(crate) fn charge(&mut self, n: u64) -> Result<()> {
        self.steps = self.steps.saturating_add(n);
        if self.steps > self.config.step_budget {
            return Err(Error::new(ErrorKind::StepBudgetExceeded {
                budget: self.config.step_budget,
            }));
        }
        Ok(())
    }

    /// Enters a nested call or handler.
    pub(crate) fn enter(&mut self) -> Result<()> {
        if self.depth >= self.config.max_call_depth {
            return Err(Error::new(ErrorKind::CallDepthExceeded {
                limit: self.config.max_call_depth,
            }));
        }
        self.depth += 1;
        Ok(())
    }

    /// Leaves a nested call or handler.
    pub(crate) fn leave(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    /// Resets per-run counters before a task, command, or initializer runs.
    pub(crate) fn begin_run(&mut self) {
        self.steps = 0;
        self.depth = 0;
    }
}
